use super::{CommandCode, Direction, FanState, Frame, FrameCodec, FrameFields};

const FALLBACK_SPEED: u8 = 1;
const FALLBACK_LIGHT_PERCENT: u8 = 100;

/// Builds SET frames that change the rotation direction.
pub struct DirectionHandler;

impl DirectionHandler {
    /// Builds the SET frame for a new direction.
    ///
    /// Without a valid `reference` the frame assumes low speed with the light fully on, so a
    /// direction change never switches the light off on a device that has not reported yet.
    ///
    /// ```
    /// use fansync::{Direction, DirectionHandler, FanState};
    ///
    /// let frame = DirectionHandler::frame_for(Direction::Reverse, &FanState::placeholder());
    /// assert_eq!(1, frame.fields().direction);
    /// assert_eq!(1, frame.fields().speed);
    /// assert_eq!(100, frame.fields().down);
    /// ```
    #[must_use]
    pub fn frame_for(direction: Direction, reference: &FanState) -> Frame {
        let fields = if reference.is_valid() {
            FrameFields {
                direction: direction.as_byte(),
                ..reference.fields()
            }
        } else {
            FrameFields {
                speed: FALLBACK_SPEED,
                direction: direction.as_byte(),
                down: FALLBACK_LIGHT_PERCENT,
                ..FrameFields::default()
            }
        };
        FrameCodec::encode(CommandCode::Control, fields)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn frame_for_valid_reference_changes_only_direction() {
        let reference = FanState::reported(FrameFields {
            speed: 1,
            direction: 0,
            up: 0,
            down: 10,
            timer_low: 2,
            timer_high: 0,
            fan_type: 1,
        });

        let frame = DirectionHandler::frame_for(Direction::Reverse, &reference);

        assert_eq!(
            FrameFields {
                direction: 1,
                ..reference.fields()
            },
            frame.fields()
        );
    }

    #[rstest]
    #[case(Direction::Forward, 0)]
    #[case(Direction::Reverse, 1)]
    fn frame_for_placeholder_uses_safe_fallback(
        #[case] direction: Direction,
        #[case] expected_byte: u8,
    ) {
        let frame = DirectionHandler::frame_for(direction, &FanState::placeholder());

        assert_eq!(
            FrameFields {
                speed: 1,
                direction: expected_byte,
                down: 100,
                ..FrameFields::default()
            },
            frame.fields()
        );
    }
}

use bon::Builder;
use serde::Serialize;

use super::FrameFields;

/// Decoded fan/light status.
///
/// A state is either *valid* (decoded from a genuine REPORT frame, or merged from one) or the
/// *placeholder*, which carries all-zero fields and means "no information".
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize)]
pub struct FanState {
    #[serde(flatten)]
    fields: FrameFields,
    valid: bool,
}

impl FanState {
    /// Returns the "no information" placeholder.
    ///
    /// ```
    /// use fansync::FanState;
    ///
    /// let state = FanState::placeholder();
    /// assert!(!state.is_valid());
    /// assert_eq!(0, state.speed());
    /// ```
    #[must_use]
    pub const fn placeholder() -> Self {
        Self {
            fields: FrameFields {
                speed: 0,
                direction: 0,
                up: 0,
                down: 0,
                timer_low: 0,
                timer_high: 0,
                fan_type: 0,
            },
            valid: false,
        }
    }

    /// Creates a valid state from device-reported fields.
    #[must_use]
    pub const fn reported(fields: FrameFields) -> Self {
        Self {
            fields,
            valid: true,
        }
    }

    #[must_use]
    pub fn fields(&self) -> FrameFields {
        self.fields
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Fan speed, `0` (off) to `3` (high).
    #[must_use]
    pub fn speed(&self) -> u8 {
        self.fields.speed
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        Direction::from(self.fields.direction)
    }

    #[must_use]
    pub fn up(&self) -> u8 {
        self.fields.up
    }

    /// Light brightness percent.
    #[must_use]
    pub fn down(&self) -> u8 {
        self.fields.down
    }

    #[must_use]
    pub fn timer_low(&self) -> u8 {
        self.fields.timer_low
    }

    #[must_use]
    pub fn timer_high(&self) -> u8 {
        self.fields.timer_high
    }

    #[must_use]
    pub fn fan_type(&self) -> u8 {
        self.fields.fan_type
    }

    /// Remaining timer in minutes.
    ///
    /// ```
    /// use fansync::{FanState, FrameFields};
    ///
    /// let state = FanState::reported(FrameFields {
    ///     timer_low: 0xFE,
    ///     timer_high: 0xAB,
    ///     ..FrameFields::default()
    /// });
    /// assert_eq!(0xABFE, state.minutes());
    /// ```
    #[must_use]
    pub fn minutes(&self) -> u16 {
        u16::from_le_bytes([self.fields.timer_low, self.fields.timer_high])
    }

    /// Returns a new valid state with `overrides` applied on top of this one.
    ///
    /// ```
    /// use fansync::{FanState, StateOverrides};
    ///
    /// let merged = FanState::placeholder().merged(&StateOverrides::builder().speed(3).build());
    /// assert!(merged.is_valid());
    /// assert_eq!(3, merged.speed());
    /// ```
    #[must_use]
    pub fn merged(&self, overrides: &StateOverrides) -> Self {
        let base = self.fields;
        Self::reported(FrameFields {
            speed: overrides.speed.unwrap_or(base.speed),
            direction: overrides
                .direction
                .map_or(base.direction, Direction::as_byte),
            up: overrides.up.unwrap_or(base.up),
            down: overrides.down.unwrap_or(base.down),
            timer_low: overrides.timer_low.unwrap_or(base.timer_low),
            timer_high: overrides.timer_high.unwrap_or(base.timer_high),
            fan_type: overrides.fan_type.unwrap_or(base.fan_type),
        })
    }
}

/// Fields to replace when merging a locally known change into a state.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Builder)]
pub struct StateOverrides {
    speed: Option<u8>,
    direction: Option<Direction>,
    up: Option<u8>,
    down: Option<u8>,
    timer_low: Option<u8>,
    timer_high: Option<u8>,
    fan_type: Option<u8>,
}

/// Fan rotation direction.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    derive_more::Display,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    #[display("forward")]
    Forward,
    #[display("reverse")]
    Reverse,
}

impl Direction {
    /// Returns the protocol byte for this direction.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::Forward => 0,
            Self::Reverse => 1,
        }
    }
}

/// Any non-zero byte normalizes to [`Direction::Reverse`].
impl From<u8> for Direction {
    fn from(value: u8) -> Self {
        if value == 0 {
            Self::Forward
        } else {
            Self::Reverse
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn sample() -> FanState {
        FanState::reported(FrameFields {
            speed: 1,
            direction: 0,
            up: 4,
            down: 80,
            timer_low: 0x34,
            timer_high: 0x12,
            fan_type: 9,
        })
    }

    #[rstest]
    #[case(0x00, 0x00, 0)]
    #[case(0x34, 0x12, 0x1234)]
    #[case(0xFE, 0xAB, 0xABFE)]
    #[case(0xFF, 0xFF, 0xFFFF)]
    fn minutes_combines_high_and_low_bytes(
        #[case] timer_low: u8,
        #[case] timer_high: u8,
        #[case] expected: u16,
    ) {
        let state = FanState::reported(FrameFields {
            timer_low,
            timer_high,
            ..FrameFields::default()
        });
        assert_eq!(expected, state.minutes());
    }

    #[test]
    fn merged_replaces_only_overridden_fields() {
        let base = sample();
        let overrides = StateOverrides::builder()
            .speed(3)
            .direction(Direction::Reverse)
            .build();

        let merged = base.merged(&overrides);

        assert_eq!(3, merged.speed());
        assert_eq!(Direction::Reverse, merged.direction());
        assert_eq!(base.down(), merged.down());
        assert_eq!(base.minutes(), merged.minutes());
        assert_eq!(base.fan_type(), merged.fan_type());
        assert_eq!(1, base.speed(), "base must not change");
    }

    #[test]
    fn merged_marks_placeholder_valid() {
        let merged = FanState::placeholder().merged(&StateOverrides::builder().down(75).build());

        assert!(merged.is_valid());
        assert_eq!(75, merged.down());
        assert_eq!(0, merged.speed());
    }

    #[rstest]
    #[case(0, Direction::Forward)]
    #[case(1, Direction::Reverse)]
    #[case(7, Direction::Reverse)]
    fn direction_normalizes_non_zero_to_reverse(#[case] raw: u8, #[case] expected: Direction) {
        assert_eq!(expected, Direction::from(raw));
    }

    #[test]
    fn state_serializes_flat() {
        insta::assert_json_snapshot!(sample(), @r#"
        {
          "speed": 1,
          "direction": 0,
          "up": 4,
          "down": 80,
          "timer_low": 52,
          "timer_high": 18,
          "fan_type": 9,
          "valid": true
        }
        "#);
    }
}

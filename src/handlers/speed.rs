use super::{CommandCode, FanState, Frame, FrameCodec, FrameFields, LightLevel};

/// Light level written alongside a speed change when the device has never reported its status.
pub const DEFAULT_ASSUMED_LIGHT_PERCENT: i32 = 100;

/// Builds SET frames that change the fan speed.
pub struct SpeedHandler;

impl SpeedHandler {
    /// Builds the SET frame for a new speed.
    ///
    /// The speed byte is written as given. A valid `reference` keeps every other field;
    /// otherwise the frame assumes forward rotation, no timer, fan type `0` and a light level of
    /// `assumed_light_percent` clamped to `0..=100` (default `100`).
    ///
    /// ```
    /// use fansync::{FanState, SpeedHandler};
    ///
    /// let frame = SpeedHandler::frame_for(2, &FanState::placeholder(), None);
    /// assert_eq!(2, frame.fields().speed);
    /// assert_eq!(100, frame.fields().down);
    /// ```
    #[must_use]
    pub fn frame_for(speed: u8, reference: &FanState, assumed_light_percent: Option<i32>) -> Frame {
        let fields = if reference.is_valid() {
            FrameFields {
                speed,
                ..reference.fields()
            }
        } else {
            let light = LightLevel::clamped(
                assumed_light_percent.unwrap_or(DEFAULT_ASSUMED_LIGHT_PERCENT),
            );
            FrameFields {
                speed,
                down: light.percent(),
                ..FrameFields::default()
            }
        };
        FrameCodec::encode(CommandCode::Control, fields)
    }
}

use super::{CommandCode, FanState, Frame, FrameCodec, FrameFields};

const MIN_LIGHT_PERCENT: i32 = 0;
const MAX_LIGHT_PERCENT: i32 = 100;

/// Speed written alongside a light change when the device has never reported its status.
pub const DEFAULT_ASSUMED_SPEED: u8 = 1;

/// Light level clamped to the inclusive range `0..=100`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, derive_more::Display, derive_more::Into)]
#[display("{_0}%")]
pub struct LightLevel(u8);

impl LightLevel {
    /// Full brightness.
    pub const FULL: Self = Self(100);

    /// Light off.
    pub const OFF: Self = Self(0);

    /// Creates a light level, clamping out-of-range input.
    ///
    /// ```
    /// use fansync::LightLevel;
    ///
    /// assert_eq!(100, LightLevel::clamped(300).percent());
    /// assert_eq!(0, LightLevel::clamped(-5).percent());
    /// assert_eq!(42, LightLevel::clamped(42).percent());
    /// ```
    #[must_use]
    pub fn clamped(percent: i32) -> Self {
        let clamped = percent.clamp(MIN_LIGHT_PERCENT, MAX_LIGHT_PERCENT);
        Self(u8::try_from(clamped).unwrap_or(u8::MAX))
    }

    /// Returns the percentage byte.
    #[must_use]
    pub fn percent(self) -> u8 {
        self.0
    }
}

/// Builds SET frames that change the light level.
pub struct LightHandler;

impl LightHandler {
    /// Builds the SET frame for a new light level.
    ///
    /// A valid `reference` keeps every other field. Otherwise the frame assumes
    /// `assumed_speed` (default `1`) and zeroes the remaining fields.
    ///
    /// ```
    /// use fansync::{FanState, LightHandler, LightLevel};
    ///
    /// let frame = LightHandler::frame_for(LightLevel::clamped(300), &FanState::placeholder(), None);
    /// assert_eq!(100, frame.fields().down);
    /// assert_eq!(1, frame.fields().speed);
    /// ```
    #[must_use]
    pub fn frame_for(level: LightLevel, reference: &FanState, assumed_speed: Option<u8>) -> Frame {
        let fields = if reference.is_valid() {
            FrameFields {
                down: level.percent(),
                ..reference.fields()
            }
        } else {
            FrameFields {
                speed: assumed_speed.unwrap_or(DEFAULT_ASSUMED_SPEED),
                down: level.percent(),
                ..FrameFields::default()
            }
        };
        FrameCodec::encode(CommandCode::Control, fields)
    }
}

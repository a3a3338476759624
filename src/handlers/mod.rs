mod direction;
mod fan_state;
mod frame_codec;
mod light;
mod speed;
mod status;

pub use self::direction::DirectionHandler;
pub use self::fan_state::{Direction, FanState, StateOverrides};
pub use self::frame_codec::{CommandCode, Frame, FrameCodec, FrameCodecError, FrameFields};
pub use self::light::{DEFAULT_ASSUMED_SPEED, LightHandler, LightLevel};
pub use self::speed::{DEFAULT_ASSUMED_LIGHT_PERCENT, SpeedHandler};
pub use self::status::StatusHandler;

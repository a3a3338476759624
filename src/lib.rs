mod app;
mod cli;
mod client;
mod config;
mod controller;
mod coordinator;
mod discovery;
mod error;
mod handlers;
mod hw;
mod protocol;
mod telemetry;
mod terminal;
mod utils;

pub use app::{fake_transport, real_transport, run, run_with_clients, run_with_log_level};
pub use cli::{
    Args, Command, ControlAction, ControlArgs, FakeArgs, LogLevel, OutputFormat, ScanArgs,
    SetAction, SetArgs, StatusArgs, WatchArgs,
};
pub use client::FanClient;
pub use config::{
    DEFAULT_NAME_HINT, DEFAULT_SCAN_TIMEOUT, FanOptions, SessionTiming, normalize_poll_interval,
    normalize_turn_on_speed,
};
pub use controller::{FanController, percentage_for_speed, speed_for_percentage};
pub use coordinator::{
    CoordinatorDiagnostics, CoordinatorSnapshot, PollingCoordinator, TIMEOUT_ERROR,
};
pub use discovery::discover_candidates;
pub use error::{FixtureError, InteractionError};
pub use handlers::{
    CommandCode, DEFAULT_ASSUMED_LIGHT_PERCENT, DEFAULT_ASSUMED_SPEED, Direction,
    DirectionHandler, FanState, Frame, FrameCodec, FrameCodecError, FrameFields, LightHandler,
    LightLevel, SpeedHandler, StateOverrides, StatusHandler,
};
pub use hw::{
    FakeTransport, FakeTransportConfig, FanTransport, FoundDevice, GattLink, NotificationStream,
    RecordedWrite, ScanFixture, StateFixture, WriteMode,
};
pub use protocol::EndpointId;
pub use terminal::TerminalClient;

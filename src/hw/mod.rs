mod btleplug_backend;
mod fake_backend;
mod hardware;
mod model;
mod session;

pub use self::fake_backend::{
    FakeTransport, FakeTransportConfig, RecordedWrite, ScanFixture, StateFixture,
};
pub use self::hardware::{FanTransport, GattLink, NotificationStream, WriteMode};
pub(crate) use self::hardware::{TransportBackend, transport_from_backend};
pub use self::model::FoundDevice;
pub(crate) use self::session::TransportSession;

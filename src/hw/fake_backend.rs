use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bon::Builder;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, trace};

use super::hardware::{FanTransport, GattLink, NotificationStream, WriteMode};
use super::model::FoundDevice;
use crate::error::{FixtureError, InteractionError};
use crate::handlers::{CommandCode, FanState, FrameCodec, FrameFields};
use crate::protocol::EndpointId;
use crate::utils::format_hex;

/// Parsed fake scan fixture records.
#[derive(Debug, Clone, derive_more::Into)]
pub struct ScanFixture {
    devices: Vec<FoundDevice>,
}

impl FromStr for ScanFixture {
    type Err = FixtureError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let devices = parse_scan_fixture(value)?;
        Ok(Self { devices })
    }
}

/// Fake device status parsed from a hexadecimal REPORT frame.
#[derive(Debug, Clone, Copy, derive_more::Into)]
pub struct StateFixture {
    fields: FrameFields,
}

impl FromStr for StateFixture {
    type Err = FixtureError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let cleaned: String = value.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = hex::decode(cleaned)?;
        let frame = FrameCodec::parse(&bytes, CommandCode::Report)?;
        Ok(Self {
            fields: frame.fields(),
        })
    }
}

/// Settings for a simulated fan.
#[derive(Debug, Clone, Builder)]
pub struct FakeTransportConfig {
    /// Peripherals returned by discovery. An empty list accepts connections to any address.
    #[builder(default)]
    devices: Vec<FoundDevice>,
    /// Status the simulated fan starts with.
    #[builder(default)]
    state: FrameFields,
    /// Number of initial connection attempts that fail.
    #[builder(default)]
    connect_failures: u32,
    /// Rejects every connection attempt.
    #[builder(default)]
    unreachable: bool,
    /// Never answers GET requests.
    #[builder(default)]
    silent: bool,
    /// Rejects acknowledged writes so callers must fall back.
    #[builder(default)]
    reject_acknowledged_writes: bool,
    /// Rejects notification subscriptions.
    #[builder(default)]
    reject_subscribe: bool,
    /// Whether services are resolved as soon as a connection opens.
    #[builder(default = true)]
    services_resolved: bool,
    #[builder(default)]
    connect_delay: Duration,
    #[builder(default)]
    discovery_delay: Duration,
}

/// One write observed by the simulated fan.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RecordedWrite {
    pub payload: Vec<u8>,
    pub mode: WriteMode,
}

/// In-memory fan used in tests and non-hardware environments.
///
/// Clones share the same simulated device, so a test can keep one handle for inspection while
/// a client owns another.
#[derive(Debug, Clone)]
pub struct FakeTransport {
    config: Arc<FakeTransportConfig>,
    device: Arc<Mutex<FakeDevice>>,
}

#[derive(Debug, Default)]
struct FakeDevice {
    fields: FrameFields,
    unreachable: bool,
    silent: bool,
    remaining_connect_failures: u32,
    connect_attempts: usize,
    active_sessions: usize,
    max_concurrent_sessions: usize,
    discover_services_calls: usize,
    unsubscribe_calls: usize,
    disconnect_calls: usize,
    writes: Vec<RecordedWrite>,
    notifier: Option<mpsc::UnboundedSender<Vec<u8>>>,
}

impl FakeTransport {
    /// Creates a simulated fan from explicit settings.
    #[must_use]
    pub fn new(config: FakeTransportConfig) -> Self {
        let device = FakeDevice {
            fields: config.state,
            unreachable: config.unreachable,
            silent: config.silent,
            remaining_connect_failures: config.connect_failures,
            ..FakeDevice::default()
        };
        Self {
            config: Arc::new(config),
            device: Arc::new(Mutex::new(device)),
        }
    }

    fn device(&self) -> MutexGuard<'_, FakeDevice> {
        lock(&self.device)
    }

    /// Returns the status the simulated fan currently holds.
    #[must_use]
    pub fn current_state(&self) -> FanState {
        FanState::reported(self.device().fields)
    }

    /// Makes subsequent connection attempts fail or succeed.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.device().unreachable = unreachable;
    }

    /// Makes subsequent GET requests go unanswered or answered.
    pub fn set_silent(&self, silent: bool) {
        self.device().silent = silent;
    }

    /// Returns every write in the order it arrived.
    #[must_use]
    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.device().writes.clone()
    }

    #[must_use]
    pub fn connect_attempts(&self) -> usize {
        self.device().connect_attempts
    }

    /// Returns the highest number of simultaneously open connections.
    #[must_use]
    pub fn max_concurrent_sessions(&self) -> usize {
        self.device().max_concurrent_sessions
    }

    #[must_use]
    pub fn active_sessions(&self) -> usize {
        self.device().active_sessions
    }

    #[must_use]
    pub fn discover_services_calls(&self) -> usize {
        self.device().discover_services_calls
    }

    #[must_use]
    pub fn unsubscribe_calls(&self) -> usize {
        self.device().unsubscribe_calls
    }

    #[must_use]
    pub fn disconnect_calls(&self) -> usize {
        self.device().disconnect_calls
    }

    /// Returns whether a notification stream handed out by `subscribe` is still being read.
    #[must_use]
    pub fn has_notification_listener(&self) -> bool {
        self.device()
            .notifier
            .as_ref()
            .is_some_and(|notifier| !notifier.is_closed())
    }
}

#[async_trait]
impl FanTransport for FakeTransport {
    async fn discover(&self, scan_timeout: Duration) -> Result<Vec<FoundDevice>, InteractionError> {
        let delay = self.config.discovery_delay.min(scan_timeout);
        if !delay.is_zero() {
            sleep(delay).await;
        }
        Ok(self.config.devices.clone())
    }

    async fn connect(&self, address: &str) -> Result<Box<dyn GattLink>, InteractionError> {
        self.device().connect_attempts += 1;
        if !self.config.connect_delay.is_zero() {
            sleep(self.config.connect_delay).await;
        }

        let known = self.config.devices.is_empty()
            || self
                .config
                .devices
                .iter()
                .any(|device| device.address().eq_ignore_ascii_case(address));
        if !known {
            return Err(InteractionError::DeviceNotFound {
                address: address.to_string(),
            });
        }

        {
            let mut device = self.device();
            if device.unreachable {
                return Err(InteractionError::FakeUnreachable {
                    address: address.to_string(),
                });
            }
            if device.remaining_connect_failures > 0 {
                device.remaining_connect_failures -= 1;
                return Err(InteractionError::FakeUnreachable {
                    address: address.to_string(),
                });
            }
            device.active_sessions += 1;
            device.max_concurrent_sessions =
                device.max_concurrent_sessions.max(device.active_sessions);
        }
        debug!(address, "fake connection opened");

        Ok(Box::new(FakeLink {
            config: Arc::clone(&self.config),
            device: Arc::clone(&self.device),
            connected: AtomicBool::new(true),
        }))
    }
}

struct FakeLink {
    config: Arc<FakeTransportConfig>,
    device: Arc<Mutex<FakeDevice>>,
    connected: AtomicBool,
}

impl FakeLink {
    fn respond_to_get(&self) {
        let device = lock(&self.device);
        if device.silent {
            trace!("fake device ignoring GET");
            return;
        }
        let report = FrameCodec::encode(CommandCode::Report, device.fields);
        if let Some(notifier) = device.notifier.as_ref() {
            let _ = notifier.send(report.as_bytes().to_vec());
        }
    }
}

#[async_trait]
impl GattLink for FakeLink {
    fn services_resolved(&self) -> bool {
        self.config.services_resolved
    }

    async fn discover_services(&self) -> Result<(), InteractionError> {
        lock(&self.device).discover_services_calls += 1;
        Ok(())
    }

    async fn subscribe(
        &self,
        endpoint: EndpointId,
    ) -> Result<NotificationStream, InteractionError> {
        if endpoint != EndpointId::NotifyCharacteristic {
            return Err(InteractionError::MissingEndpoint { endpoint });
        }
        if self.config.reject_subscribe {
            return Err(InteractionError::FakeSubscribeRejected);
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        lock(&self.device).notifier = Some(sender);
        Ok(Box::pin(UnboundedReceiverStream::new(receiver)))
    }

    async fn unsubscribe(&self, _endpoint: EndpointId) -> Result<(), InteractionError> {
        let mut device = lock(&self.device);
        device.unsubscribe_calls += 1;
        device.notifier = None;
        Ok(())
    }

    async fn write(
        &self,
        endpoint: EndpointId,
        payload: &[u8],
        mode: WriteMode,
    ) -> Result<(), InteractionError> {
        if endpoint != EndpointId::WriteCharacteristic {
            return Err(InteractionError::MissingEndpoint { endpoint });
        }
        if mode == WriteMode::WithResponse && self.config.reject_acknowledged_writes {
            return Err(InteractionError::FakeWriteRejected { mode });
        }

        lock(&self.device).writes.push(RecordedWrite {
            payload: payload.to_vec(),
            mode,
        });

        if FrameCodec::parse(payload, CommandCode::Get).is_ok() {
            self.respond_to_get();
        } else if let Ok(frame) = FrameCodec::parse(payload, CommandCode::Control) {
            lock(&self.device).fields = frame.fields();
        } else {
            trace!(payload = %format_hex(payload), "fake device ignoring unknown frame");
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), InteractionError> {
        let mut device = lock(&self.device);
        device.disconnect_calls += 1;
        if self.connected.swap(false, Ordering::SeqCst) {
            device.active_sessions = device.active_sessions.saturating_sub(1);
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn parse_scan_fixture(raw_fixture: &str) -> Result<Vec<FoundDevice>, FixtureError> {
    if raw_fixture.trim().is_empty() {
        return Err(FixtureError::EmptyFixture);
    }

    raw_fixture
        .split(';')
        .map(parse_scan_record)
        .collect::<Result<Vec<_>, _>>()
}

fn parse_scan_record(raw_record: &str) -> Result<FoundDevice, FixtureError> {
    let fields: Vec<&str> = raw_record.split('|').map(str::trim).collect();
    let &[address, name, rssi] = fields.as_slice() else {
        return Err(FixtureError::InvalidRecordFieldCount);
    };
    if address.is_empty() {
        return Err(FixtureError::EmptyAddress);
    }

    let local_name = match name {
        "" | "-" => None,
        value => Some(value.to_string()),
    };
    let rssi = match rssi {
        "" | "-" => None,
        value => Some(value.parse::<i16>()?),
    };

    Ok(FoundDevice::new(address, local_name, rssi))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("AA:BB|CeilingFan|-43", 1)]
    #[case("AA:BB|CeilingFan|-43;CC:DD|-|-", 2)]
    fn parse_scan_fixture_parses_records(#[case] fixture: &str, #[case] expected_count: usize) {
        let devices = parse_scan_fixture(fixture).expect("fixture should parse");
        assert_eq!(expected_count, devices.len());
    }

    #[test]
    fn parse_scan_record_maps_dashes_to_absent_values() {
        let device = parse_scan_record("CC:DD|-|-").expect("record should parse");
        assert_eq!(FoundDevice::new("CC:DD", None, None), device);
    }

    #[rstest]
    #[case::too_few("AA:BB|CeilingFan")]
    #[case::too_many("hci0|AA:BB|CeilingFan|-43")]
    fn parse_scan_fixture_rejects_invalid_field_count(#[case] fixture: &str) {
        assert_matches!(
            parse_scan_fixture(fixture),
            Err(FixtureError::InvalidRecordFieldCount)
        );
    }

    #[test]
    fn parse_scan_fixture_rejects_bad_rssi() {
        assert_matches!(
            parse_scan_fixture("AA:BB|Fan|loud"),
            Err(FixtureError::InvalidRssi(_))
        );
    }

    #[test]
    fn state_fixture_parses_report_frames_only() {
        let report = FrameCodec::encode(
            CommandCode::Report,
            FrameFields {
                speed: 2,
                down: 50,
                ..FrameFields::default()
            },
        );
        let fixture: StateFixture = hex::encode(report.as_bytes())
            .parse()
            .expect("report frame should parse");
        let fields: FrameFields = fixture.into();
        assert_eq!(2, fields.speed);
        assert_eq!(50, fields.down);

        assert_matches!("zz".parse::<StateFixture>(), Err(FixtureError::InvalidHex(_)));
        assert_matches!(
            "53300000000000000083".parse::<StateFixture>(),
            Err(FixtureError::InvalidStateFrame(_))
        );
    }
}

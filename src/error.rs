use std::time::Duration;

use thiserror::Error;

use crate::protocol::{EndpointId, endpoint_metadata};

/// Errors returned by BLE interaction operations.
#[derive(Debug, Error)]
pub enum InteractionError {
    #[error("BLE operation failed: {0}")]
    Ble(#[from] btleplug::Error),
    #[error("no BLE adapters were found")]
    NoAdapters,
    #[error("no peripheral with address `{address}` is known to the adapter")]
    DeviceNotFound { address: String },
    #[error(
        "connecting to `{address}` timed out after {}",
        humantime::format_duration(*timeout)
    )]
    ConnectTimeout { address: String, timeout: Duration },
    #[error(
        "required endpoint `{name}` ({uuid}) was not found on the connected device",
        name = endpoint_metadata(*endpoint).name(),
        uuid = endpoint_metadata(*endpoint).uuid()
    )]
    MissingEndpoint { endpoint: EndpointId },
    #[error("fake device `{address}` is unreachable")]
    FakeUnreachable { address: String },
    #[error("fake device rejected a {mode} write")]
    FakeWriteRejected { mode: crate::hw::WriteMode },
    #[error("fake device rejected the notification subscription")]
    FakeSubscribeRejected,
    #[error("this fan does not support changing direction")]
    DirectionUnsupported,
    #[error("this fan has no light")]
    LightUnsupported,
    #[error("failed while waiting for Ctrl+C")]
    CtrlC { source: std::io::Error },
    #[error(transparent)]
    Fixture(#[from] FixtureError),
}

impl InteractionError {
    /// Returns whether this error represents a bounded wait running out.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ConnectTimeout { .. })
    }
}

/// Errors returned when parsing fake interaction fixtures.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("the fake discovery fixture is empty")]
    EmptyFixture,
    #[error("fixture records must contain three pipe-delimited fields")]
    InvalidRecordFieldCount,
    #[error("fixture records cannot have an empty address")]
    EmptyAddress,
    #[error("failed to parse RSSI value")]
    InvalidRssi(#[from] std::num::ParseIntError),
    #[error("fake state is not valid hexadecimal")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("fake state is not a valid REPORT frame")]
    InvalidStateFrame(#[from] crate::handlers::FrameCodecError),
}

/// Errors returned when validating runtime backend options.
#[derive(Debug, Error)]
pub(crate) enum CliConfigError {
    #[error("`--fake-scan`, `--fake-state` and the other fake options require `--fake`")]
    FakeOptionsWithoutFake,
}

/// Errors returned by telemetry initialisation.
#[derive(Debug, Error)]
pub(crate) enum TelemetryError {
    #[error("failed to install tracing subscriber")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn connect_timeout_is_a_timeout_and_renders_duration() {
        let error = InteractionError::ConnectTimeout {
            address: "AA:BB".to_string(),
            timeout: Duration::from_secs(15),
        };

        assert!(error.is_timeout());
        assert_eq!("connecting to `AA:BB` timed out after 15s", error.to_string());
    }

    #[test]
    fn missing_endpoint_names_the_characteristic() {
        let error = InteractionError::MissingEndpoint {
            endpoint: EndpointId::NotifyCharacteristic,
        };

        assert!(!error.is_timeout());
        assert_eq!(
            "required endpoint `FanSync status notify` (0000e002-0000-1000-8000-00805f9b34fb) was not found on the connected device",
            error.to_string()
        );
    }
}

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_stream::Stream;
use tracing::info;

use super::btleplug_backend::BtleplugTransport;
use super::fake_backend::{FakeTransport, FakeTransportConfig};
use super::model::FoundDevice;
use crate::error::InteractionError;
use crate::protocol::EndpointId;

/// Raw notification payloads from one characteristic.
pub type NotificationStream = Pin<Box<dyn Stream<Item = Vec<u8>> + Send>>;

/// Runtime BLE backend selection.
#[derive(Debug)]
pub(crate) enum TransportBackend {
    Real,
    Fake(FakeTransportConfig),
}

/// Builds a shared transport for the selected runtime backend.
pub(crate) async fn transport_from_backend(
    backend: TransportBackend,
) -> Result<Arc<dyn FanTransport>, InteractionError> {
    let transport: Arc<dyn FanTransport> = match backend {
        TransportBackend::Real => Arc::new(BtleplugTransport::new().await?),
        TransportBackend::Fake(config) => {
            info!("using fake BLE backend");
            Arc::new(FakeTransport::new(config))
        }
    };

    Ok(transport)
}

/// BLE write mode used for command frames.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, derive_more::Display)]
pub enum WriteMode {
    /// Acknowledged write.
    #[display("acknowledged")]
    WithResponse,
    /// Unacknowledged write.
    #[display("unacknowledged")]
    WithoutResponse,
}

/// Entry point to a BLE stack: discovery plus connection establishment.
#[async_trait]
pub trait FanTransport: Send + Sync {
    /// Scans for `scan_timeout` and returns every peripheral seen.
    async fn discover(&self, scan_timeout: Duration) -> Result<Vec<FoundDevice>, InteractionError>;

    /// Resolves `address` and opens one connection to it.
    ///
    /// Implementations may wait for the device to appear; callers bound the wait.
    async fn connect(&self, address: &str) -> Result<Box<dyn GattLink>, InteractionError>;
}

/// One open GATT connection.
#[async_trait]
pub trait GattLink: Send + Sync {
    /// Returns whether service and characteristic handles are already known.
    fn services_resolved(&self) -> bool;

    /// Resolves service and characteristic handles.
    async fn discover_services(&self) -> Result<(), InteractionError>;

    /// Enables notifications on `endpoint` and returns its payload stream.
    async fn subscribe(&self, endpoint: EndpointId)
    -> Result<NotificationStream, InteractionError>;

    /// Disables notifications on `endpoint`.
    async fn unsubscribe(&self, endpoint: EndpointId) -> Result<(), InteractionError>;

    /// Writes `payload` to `endpoint`.
    async fn write(
        &self,
        endpoint: EndpointId,
        payload: &[u8],
        mode: WriteMode,
    ) -> Result<(), InteractionError>;

    /// Closes the connection.
    async fn disconnect(&self) -> Result<(), InteractionError>;
}

use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{
    BDAddr, Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use tokio::time::sleep;
use tokio_stream::StreamExt;
use tracing::{debug, info, instrument, trace};

use super::hardware::{FanTransport, GattLink, NotificationStream, WriteMode};
use super::model::FoundDevice;
use crate::error::InteractionError;
use crate::protocol::{EndpointId, characteristic_for_uuid};

const ADDRESS_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Transport backed by the platform BLE stack through `btleplug`.
#[derive(Debug)]
pub(crate) struct BtleplugTransport {
    manager: Manager,
}

impl BtleplugTransport {
    /// Creates the real BLE transport.
    pub(crate) async fn new() -> Result<Self, InteractionError> {
        let manager = Manager::new().await?;
        Ok(Self { manager })
    }

    #[instrument(skip(self), level = "trace")]
    async fn adapters(&self) -> Result<Vec<Adapter>, InteractionError> {
        let adapters = self.manager.adapters().await?;
        if adapters.is_empty() {
            return Err(InteractionError::NoAdapters);
        }
        Ok(adapters)
    }
}

#[async_trait]
impl FanTransport for BtleplugTransport {
    #[instrument(skip(self), level = "debug")]
    async fn discover(&self, scan_timeout: Duration) -> Result<Vec<FoundDevice>, InteractionError> {
        let adapters = self.adapters().await?;
        info!(adapter_count = adapters.len(), ?scan_timeout, "starting BLE scan");
        for adapter in &adapters {
            adapter.start_scan(ScanFilter::default()).await?;
        }

        sleep(scan_timeout).await;

        let mut devices = Vec::new();
        for adapter in &adapters {
            if let Err(error) = adapter.stop_scan().await {
                debug!(?error, "failed to stop adapter scan cleanly");
            }
            for peripheral in adapter.peripherals().await? {
                let Some(properties) = peripheral.properties().await? else {
                    continue;
                };
                devices.push(FoundDevice::new(
                    display_address(&peripheral, properties.address),
                    properties.local_name,
                    properties.rssi,
                ));
            }
        }
        Ok(devices)
    }

    /// Looks the address up among known peripherals, scanning until it appears.
    #[instrument(skip(self), level = "debug")]
    async fn connect(&self, address: &str) -> Result<Box<dyn GattLink>, InteractionError> {
        let adapters = self.adapters().await?;
        let mut scan: Option<ScanGuard> = None;

        loop {
            for adapter in &adapters {
                let Some(peripheral) = find_peripheral(adapter, address).await? else {
                    continue;
                };
                if let Some(scan) = scan.take() {
                    scan.stop().await;
                }

                if !peripheral.is_connected().await? {
                    peripheral.connect().await?;
                }
                info!(address, "connected to peripheral");
                return Ok(Box::new(BtleplugLink { peripheral }));
            }

            if scan.is_none() {
                debug!(address, "peripheral not cached, scanning");
                scan = Some(ScanGuard::start(&adapters).await?);
            }
            sleep(ADDRESS_POLL_INTERVAL).await;
        }
    }
}

/// A scan started while resolving an address.
///
/// Dropping the guard without [`ScanGuard::stop`], for example when a connect timeout drops the
/// connect future, stops the scan from a spawned task.
struct ScanGuard {
    adapters: Vec<Adapter>,
}

impl ScanGuard {
    async fn start(adapters: &[Adapter]) -> Result<Self, InteractionError> {
        let mut guard = Self {
            adapters: Vec::with_capacity(adapters.len()),
        };
        for adapter in adapters {
            adapter.start_scan(ScanFilter::default()).await?;
            guard.adapters.push(adapter.clone());
        }
        Ok(guard)
    }

    async fn stop(mut self) {
        stop_scans(std::mem::take(&mut self.adapters)).await;
    }
}

impl Drop for ScanGuard {
    fn drop(&mut self) {
        if self.adapters.is_empty() {
            return;
        }
        let adapters = std::mem::take(&mut self.adapters);
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(stop_scans(adapters));
            }
            Err(error) => debug!(%error, "no runtime left to stop the adapter scan"),
        }
    }
}

async fn stop_scans(adapters: Vec<Adapter>) {
    for adapter in adapters {
        if let Err(error) = adapter.stop_scan().await {
            debug!(?error, "failed to stop adapter scan cleanly");
        }
    }
}

async fn find_peripheral(
    adapter: &Adapter,
    address: &str,
) -> Result<Option<Peripheral>, InteractionError> {
    for peripheral in adapter.peripherals().await? {
        let matches = peripheral.address().to_string().eq_ignore_ascii_case(address)
            || peripheral.id().to_string().eq_ignore_ascii_case(address);
        if matches {
            return Ok(Some(peripheral));
        }
    }
    Ok(None)
}

/// Prefers the hardware address, falling back to the platform identifier where addresses are
/// hidden.
fn display_address(peripheral: &Peripheral, address: BDAddr) -> String {
    if address == BDAddr::from([0u8; 6]) {
        peripheral.id().to_string()
    } else {
        address.to_string()
    }
}

/// An open connection to a real peripheral.
struct BtleplugLink {
    peripheral: Peripheral,
}

impl BtleplugLink {
    async fn characteristic_for(
        &self,
        endpoint: EndpointId,
    ) -> Result<Characteristic, InteractionError> {
        if let Some(characteristic) = self.find_characteristic(endpoint) {
            return Ok(characteristic);
        }
        trace!(?endpoint, "characteristic not resolved yet, discovering services");
        self.peripheral.discover_services().await?;
        self.find_characteristic(endpoint)
            .ok_or(InteractionError::MissingEndpoint { endpoint })
    }

    fn find_characteristic(&self, endpoint: EndpointId) -> Option<Characteristic> {
        self.peripheral.characteristics().into_iter().find(|characteristic| {
            characteristic_for_uuid(&characteristic.uuid.to_string()) == Some(endpoint)
        })
    }
}

#[async_trait]
impl GattLink for BtleplugLink {
    fn services_resolved(&self) -> bool {
        !self.peripheral.services().is_empty()
    }

    async fn discover_services(&self) -> Result<(), InteractionError> {
        self.peripheral.discover_services().await?;
        Ok(())
    }

    #[instrument(skip(self), level = "trace", fields(?endpoint))]
    async fn subscribe(
        &self,
        endpoint: EndpointId,
    ) -> Result<NotificationStream, InteractionError> {
        let characteristic = self.characteristic_for(endpoint).await?;
        let notifications = self.peripheral.notifications().await?;
        self.peripheral.subscribe(&characteristic).await?;

        let expected = characteristic.uuid;
        let payloads = notifications.filter_map(move |notification| {
            (notification.uuid == expected).then_some(notification.value)
        });
        Ok(Box::pin(payloads))
    }

    #[instrument(skip(self), level = "trace", fields(?endpoint))]
    async fn unsubscribe(&self, endpoint: EndpointId) -> Result<(), InteractionError> {
        let characteristic = self.characteristic_for(endpoint).await?;
        self.peripheral.unsubscribe(&characteristic).await?;
        Ok(())
    }

    #[instrument(skip(self, payload), level = "trace", fields(?endpoint, ?mode, payload_len = payload.len()))]
    async fn write(
        &self,
        endpoint: EndpointId,
        payload: &[u8],
        mode: WriteMode,
    ) -> Result<(), InteractionError> {
        let characteristic = self.characteristic_for(endpoint).await?;
        let write_type = match mode {
            WriteMode::WithResponse => WriteType::WithResponse,
            WriteMode::WithoutResponse => WriteType::WithoutResponse,
        };
        self.peripheral
            .write(&characteristic, payload, write_type)
            .await?;
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn disconnect(&self) -> Result<(), InteractionError> {
        if self.peripheral.is_connected().await? {
            self.peripheral.disconnect().await?;
        }
        Ok(())
    }
}

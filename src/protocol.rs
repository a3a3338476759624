use std::collections::HashMap;
use std::sync::LazyLock;

use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

/// Sync byte opening every frame.
pub(crate) const SYNC_BYTE: u8 = 0x53;

/// Total frame length including the trailing checksum byte.
pub(crate) const FRAME_LEN: usize = 10;

/// Number of leading bytes covered by the checksum.
pub(crate) const CHECKSUM_SPAN: usize = FRAME_LEN - 1;

/// Known FanSync GATT endpoints.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, EnumIter, Display)]
pub enum EndpointId {
    /// FanSync primary control service.
    #[strum(to_string = "control_service")]
    ControlService,
    /// Characteristic accepting command frames.
    #[strum(to_string = "write_characteristic")]
    WriteCharacteristic,
    /// Characteristic emitting REPORT frames.
    #[strum(to_string = "notify_characteristic")]
    NotifyCharacteristic,
}

/// Endpoint category in GATT.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Display)]
pub(crate) enum EndpointKind {
    #[strum(to_string = "service")]
    Service,
    #[strum(to_string = "characteristic")]
    Characteristic,
}

/// Descriptive metadata for one protocol endpoint.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) struct EndpointMetadata {
    name: &'static str,
    uuid: &'static str,
    kind: EndpointKind,
}

impl EndpointMetadata {
    /// Human-readable endpoint name.
    pub(crate) fn name(self) -> &'static str {
        self.name
    }

    /// Endpoint UUID.
    pub(crate) fn uuid(self) -> &'static str {
        self.uuid
    }

    pub(crate) fn kind(self) -> EndpointKind {
        self.kind
    }
}

static ENDPOINTS_BY_ID: LazyLock<HashMap<EndpointId, EndpointMetadata>> = LazyLock::new(|| {
    EndpointId::iter()
        .map(|endpoint| (endpoint, metadata_for(endpoint)))
        .collect()
});

/// Returns metadata for one endpoint.
pub(crate) fn endpoint_metadata(endpoint: EndpointId) -> EndpointMetadata {
    *ENDPOINTS_BY_ID
        .get(&endpoint)
        .unwrap_or(&metadata_for(endpoint))
}

/// Returns the characteristic endpoint matching a UUID, ignoring case.
pub(crate) fn characteristic_for_uuid(uuid: &str) -> Option<EndpointId> {
    EndpointId::iter().find(|endpoint| {
        let metadata = endpoint_metadata(*endpoint);
        metadata.kind() == EndpointKind::Characteristic && metadata.uuid().eq_ignore_ascii_case(uuid)
    })
}

fn metadata_for(endpoint: EndpointId) -> EndpointMetadata {
    match endpoint {
        EndpointId::ControlService => EndpointMetadata {
            name: "FanSync control service",
            uuid: "0000e000-0000-1000-8000-00805f9b34fb",
            kind: EndpointKind::Service,
        },
        EndpointId::WriteCharacteristic => EndpointMetadata {
            name: "FanSync command write",
            uuid: "0000e001-0000-1000-8000-00805f9b34fb",
            kind: EndpointKind::Characteristic,
        },
        EndpointId::NotifyCharacteristic => EndpointMetadata {
            name: "FanSync status notify",
            uuid: "0000e002-0000-1000-8000-00805f9b34fb",
            kind: EndpointKind::Characteristic,
        },
    }
}

use std::fmt::{self, Display, Formatter};

use crate::hw::FoundDevice;
use crate::utils::format_rssi;

use super::painter::Painter;
use super::table::Table;

/// Renders discovery candidates as one table row per device.
pub(crate) struct DeviceListView<'a> {
    devices: &'a [FoundDevice],
    painter: &'a Painter,
}

impl<'a> DeviceListView<'a> {
    pub(crate) fn new(devices: &'a [FoundDevice], painter: &'a Painter) -> Self {
        Self { devices, painter }
    }
}

impl Display for DeviceListView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.devices.is_empty() {
            return write!(f, "{}", self.painter.notice("No matching fans found."));
        }

        let table = Table::columns(
            ["address", "name", "rssi"],
            self.devices.iter().map(|device| {
                [
                    self.painter.reading(device.address()),
                    device.local_name().unwrap_or("<unknown>").to_string(),
                    format_rssi(device.rssi()),
                ]
            }),
        );

        write!(
            f,
            "{}",
            self.painter
                .heading(format!("Found {} fan(s):", self.devices.len()))
        )?;
        write!(f, "\n{table}")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn lists_every_candidate() {
        let devices = vec![
            FoundDevice::new("AA:BB", Some("CeilingFan Den".to_string()), Some(-60)),
            FoundDevice::new("CC:DD", Some("CeilingFan Patio".to_string()), None),
        ];
        let painter = Painter::new(false);

        let rendered = DeviceListView::new(&devices, &painter).to_string();

        assert!(rendered.starts_with("Found 2 fan(s):"));
        assert!(rendered.contains("│ AA:BB   │ CeilingFan Den   │ -60 dBm │"));
        assert!(rendered.contains("│ CC:DD   │ CeilingFan Patio │ -       │"));
    }

    #[test]
    fn empty_scan_prints_a_notice() {
        let painter = Painter::new(false);

        let rendered = DeviceListView::new(&[], &painter).to_string();

        assert_eq!("No matching fans found.", rendered);
    }
}

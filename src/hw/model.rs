use serde::Serialize;

/// A BLE peripheral seen during discovery.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct FoundDevice {
    address: String,
    local_name: Option<String>,
    rssi: Option<i16>,
}

impl FoundDevice {
    /// Creates a new discovered-device record.
    #[must_use]
    pub fn new(address: impl Into<String>, local_name: Option<String>, rssi: Option<i16>) -> Self {
        Self {
            address: address.into(),
            local_name,
            rssi,
        }
    }

    /// Returns the platform address used to connect to this device.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns the advertised local name, if present.
    #[must_use]
    pub fn local_name(&self) -> Option<&str> {
        self.local_name.as_deref()
    }

    /// Returns the latest observed RSSI value, if present.
    #[must_use]
    pub fn rssi(&self) -> Option<i16> {
        self.rssi
    }

    /// Returns whether the advertised name contains `hint`, ignoring case.
    ///
    /// Devices without a name never match. An empty hint matches every named device.
    ///
    /// ```
    /// use fansync::FoundDevice;
    ///
    /// let fan = FoundDevice::new("AA:BB", Some("Hunter CeilingFan".to_string()), None);
    /// assert!(fan.matches_name_hint("ceilingfan"));
    /// assert!(!FoundDevice::new("CC:DD", None, None).matches_name_hint(""));
    /// ```
    #[must_use]
    pub fn matches_name_hint(&self, hint: &str) -> bool {
        let Some(name) = self.local_name.as_deref() else {
            return false;
        };
        hint.is_empty() || name.to_lowercase().contains(&hint.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Some("CeilingFan-1"), "CeilingFan", true)]
    #[case(Some("my ceilingfan"), "CEILINGFAN", true)]
    #[case(Some("Speaker"), "CeilingFan", false)]
    #[case(Some("Speaker"), "", true)]
    #[case(None, "", false)]
    #[case(None, "CeilingFan", false)]
    fn matches_name_hint_is_case_insensitive_substring(
        #[case] name: Option<&str>,
        #[case] hint: &str,
        #[case] expected: bool,
    ) {
        let device = FoundDevice::new("AA:BB", name.map(str::to_string), Some(-40));
        assert_eq!(expected, device.matches_name_hint(hint));
    }
}

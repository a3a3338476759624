use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Formats bytes as uppercase hexadecimal pairs separated by spaces.
pub(crate) fn format_hex(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return "<empty>".to_string();
    }

    bytes
        .iter()
        .map(|byte| hex::encode_upper([*byte]))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Formats an optional RSSI for terminal output.
pub(crate) fn format_rssi(rssi: Option<i16>) -> String {
    match rssi {
        Some(value) => format!("{value} dBm"),
        None => "-".to_string(),
    }
}

/// Formats an optional timestamp as RFC 3339, or `never`.
pub(crate) fn format_timestamp(timestamp: Option<OffsetDateTime>) -> String {
    timestamp
        .and_then(|value| value.format(&Rfc3339).ok())
        .unwrap_or_else(|| "never".to_string())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use time::macros::datetime;

    use super::*;

    #[test]
    fn format_hex_handles_empty_payload() {
        assert_eq!("<empty>", format_hex(&[]));
    }

    #[test]
    fn format_hex_formats_uppercase_pairs() {
        assert_eq!("53 30 A1 FF", format_hex(&[0x53, 0x30, 0xA1, 0xFF]));
    }

    #[test]
    fn format_rssi_handles_unknown() {
        assert_eq!("-", format_rssi(None));
        assert_eq!("-61 dBm", format_rssi(Some(-61)));
    }

    #[test]
    fn format_timestamp_renders_rfc3339_or_never() {
        assert_eq!("never", format_timestamp(None));
        assert_eq!(
            "2026-01-02T03:04:05Z",
            format_timestamp(Some(datetime!(2026-01-02 03:04:05 UTC)))
        );
    }
}

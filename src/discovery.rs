use std::time::Duration;

use tracing::{debug, instrument};

use crate::error::InteractionError;
use crate::hw::{FanTransport, FoundDevice};

/// Scans for `scan_timeout` and returns named devices whose name contains `name_hint`.
///
/// Matching ignores case. Devices without an advertised name are always dropped; an absent or
/// empty hint keeps every named device.
///
/// # Errors
///
/// Returns an error when the BLE stack cannot scan.
#[instrument(skip(transport), level = "info")]
pub async fn discover_candidates(
    transport: &dyn FanTransport,
    scan_timeout: Duration,
    name_hint: Option<&str>,
) -> Result<Vec<FoundDevice>, InteractionError> {
    let hint = name_hint.unwrap_or_default();
    let seen = transport.discover(scan_timeout).await?;
    let seen_count = seen.len();

    let candidates: Vec<FoundDevice> = seen
        .into_iter()
        .filter(|device| device.matches_name_hint(hint))
        .collect();
    debug!(seen_count, candidate_count = candidates.len(), "discovery finished");
    Ok(candidates)
}

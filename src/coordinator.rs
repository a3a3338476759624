use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_with::{DurationSeconds, serde_as};
use time::OffsetDateTime;
use tokio::sync::{Notify, watch};
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::client::FanClient;
use crate::error::InteractionError;
use crate::handlers::{FanState, StateOverrides};

/// Error tag recorded when a poll produced no report in time.
pub const TIMEOUT_ERROR: &str = "timeout";

/// Polling bookkeeping for one fan.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoordinatorSnapshot {
    last_state: Option<FanState>,
    #[serde(with = "time::serde::rfc3339::option")]
    last_success_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    last_attempt_at: Option<OffsetDateTime>,
    consecutive_failures: u32,
    last_error: Option<String>,
}

impl CoordinatorSnapshot {
    /// Last stored status. Failed polls never replace a stored status.
    #[must_use]
    pub fn last_state(&self) -> Option<FanState> {
        self.last_state
    }

    #[must_use]
    pub fn last_success_at(&self) -> Option<OffsetDateTime> {
        self.last_success_at
    }

    #[must_use]
    pub fn last_attempt_at(&self) -> Option<OffsetDateTime> {
        self.last_attempt_at
    }

    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// `"timeout"` or the transport error message of the most recent failed poll.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn record_success(&mut self, state: FanState, now: OffsetDateTime) {
        self.last_state = Some(state);
        self.consecutive_failures = 0;
        self.last_error = None;
        self.last_success_at = Some(now);
        self.last_attempt_at = Some(now);
    }

    fn record_failure(&mut self, error: String, now: OffsetDateTime) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_error = Some(error);
        self.last_attempt_at = Some(now);
        if self.last_state.is_none() {
            self.last_state = Some(FanState::placeholder());
        }
    }
}

/// Read-only projection of the coordinator for external inspection.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinatorDiagnostics {
    pub address: String,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub poll_interval: Duration,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_success_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_attempt_at: Option<OffsetDateTime>,
    pub last_state: Option<FanState>,
}

/// Periodically refreshes one fan and tracks poll failures.
///
/// ```
/// # async fn demo() {
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use fansync::{FakeTransport, FakeTransportConfig, FanClient, PollingCoordinator};
///
/// let client = FanClient::builder()
///     .address("AA:BB")
///     .transport(Arc::new(FakeTransport::new(FakeTransportConfig::builder().build())))
///     .build();
/// let coordinator = PollingCoordinator::new(Arc::new(client), Duration::from_secs(15));
/// coordinator.refresh().await;
/// assert_eq!(0, coordinator.diagnostics().consecutive_failures);
/// # }
/// ```
#[derive(Debug)]
pub struct PollingCoordinator {
    client: Arc<FanClient>,
    poll_interval: Duration,
    snapshot: watch::Sender<CoordinatorSnapshot>,
    refresh_requested: Notify,
}

impl PollingCoordinator {
    /// Creates a coordinator with an empty snapshot.
    #[must_use]
    pub fn new(client: Arc<FanClient>, poll_interval: Duration) -> Self {
        let (snapshot, _) = watch::channel(CoordinatorSnapshot::default());
        Self {
            client,
            poll_interval,
            snapshot,
            refresh_requested: Notify::new(),
        }
    }

    #[must_use]
    pub fn client(&self) -> &Arc<FanClient> {
        &self.client
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Returns a copy of the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> CoordinatorSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Returns the last stored status, if any.
    #[must_use]
    pub fn last_state(&self) -> Option<FanState> {
        self.snapshot.borrow().last_state
    }

    /// Subscribes to snapshot changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CoordinatorSnapshot> {
        self.snapshot.subscribe()
    }

    /// Polls the fan once and records the outcome.
    ///
    /// Returns the stored status after the poll.
    #[instrument(skip(self), level = "debug", fields(address = %self.client.address()))]
    pub async fn refresh(&self) -> Option<FanState> {
        let outcome = self.client.query_state(None).await;
        let now = OffsetDateTime::now_utc();

        match outcome {
            Ok(state) if state.is_valid() => {
                debug!(?state, "poll succeeded");
                self.snapshot
                    .send_modify(|snapshot| snapshot.record_success(state, now));
            }
            Ok(_) => {
                warn!("poll produced no status report");
                self.snapshot
                    .send_modify(|snapshot| snapshot.record_failure(TIMEOUT_ERROR.to_string(), now));
            }
            Err(error) => {
                warn!(%error, "poll failed");
                let tag = failure_tag(&error);
                self.snapshot
                    .send_modify(|snapshot| snapshot.record_failure(tag, now));
            }
        }

        self.last_state()
    }

    /// Merges locally known fields into the stored status and marks it valid.
    ///
    /// Subscribers are notified even though no poll took place.
    #[instrument(skip(self), level = "debug")]
    pub fn apply_local_state(&self, overrides: StateOverrides) -> FanState {
        let mut merged = FanState::placeholder();
        self.snapshot.send_modify(|snapshot| {
            let base = snapshot.last_state.unwrap_or_else(FanState::placeholder);
            merged = base.merged(&overrides);
            snapshot.last_state = Some(merged);
        });
        merged
    }

    /// Asks the polling loop to refresh now instead of waiting for the next tick.
    ///
    /// Returns immediately. Requests made while no loop is running are kept until one starts.
    pub fn schedule_immediate_refresh(&self) {
        debug!("immediate refresh requested");
        self.refresh_requested.notify_one();
    }

    /// Returns the diagnostics projection without side effects.
    #[must_use]
    pub fn diagnostics(&self) -> CoordinatorDiagnostics {
        let snapshot = self.snapshot.borrow();
        CoordinatorDiagnostics {
            address: self.client.address().to_string(),
            poll_interval: self.poll_interval,
            consecutive_failures: snapshot.consecutive_failures,
            last_error: snapshot.last_error.clone(),
            last_success_at: snapshot.last_success_at,
            last_attempt_at: snapshot.last_attempt_at,
            last_state: snapshot.last_state,
        }
    }

    /// Polls on the configured interval, and on demand, until `shutdown` is cancelled.
    ///
    /// The first poll happens immediately. Cancellation is only observed between polls; a poll
    /// that has started always runs through session teardown.
    #[instrument(skip(self, shutdown), level = "info", fields(address = %self.client.address(), poll_interval = ?self.poll_interval))]
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("polling loop started");

        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                () = self.refresh_requested.notified() => {
                    ticker.reset();
                }
                _ = ticker.tick() => {}
            }
            self.refresh().await;
        }

        info!("polling loop stopped");
    }
}

fn failure_tag(error: &InteractionError) -> String {
    if error.is_timeout() {
        TIMEOUT_ERROR.to_string()
    } else {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use time::macros::datetime;

    use super::*;
    use crate::handlers::FrameFields;

    #[test]
    fn record_failure_keeps_existing_state() {
        let state = FanState::reported(FrameFields {
            speed: 2,
            ..FrameFields::default()
        });
        let mut snapshot = CoordinatorSnapshot::default();
        snapshot.record_success(state, datetime!(2026-01-01 00:00 UTC));

        snapshot.record_failure("boom".to_string(), datetime!(2026-01-01 00:01 UTC));

        assert_eq!(Some(state), snapshot.last_state());
        assert_eq!(1, snapshot.consecutive_failures());
        assert_eq!(Some("boom"), snapshot.last_error());
        assert_eq!(
            Some(datetime!(2026-01-01 00:00 UTC)),
            snapshot.last_success_at()
        );
    }

    #[test]
    fn record_failure_without_state_stores_placeholder() {
        let mut snapshot = CoordinatorSnapshot::default();

        snapshot.record_failure(TIMEOUT_ERROR.to_string(), datetime!(2026-01-01 00:00 UTC));

        assert_eq!(Some(FanState::placeholder()), snapshot.last_state());
        assert_eq!(None, snapshot.last_success_at());
    }

    #[test]
    fn connect_timeouts_are_tagged_as_timeout() {
        let timeout = InteractionError::ConnectTimeout {
            address: "AA:BB".to_string(),
            timeout: Duration::from_secs(15),
        };
        let other = InteractionError::NoAdapters;

        assert_eq!("timeout", failure_tag(&timeout));
        assert_eq!("no BLE adapters were found", failure_tag(&other));
    }

    #[test]
    fn snapshot_serializes_timestamps_as_rfc3339() {
        let mut snapshot = CoordinatorSnapshot::default();
        snapshot.record_failure(TIMEOUT_ERROR.to_string(), datetime!(2026-03-04 05:06:07 UTC));

        insta::assert_json_snapshot!(snapshot, @r#"
        {
          "last_state": {
            "speed": 0,
            "direction": 0,
            "up": 0,
            "down": 0,
            "timer_low": 0,
            "timer_high": 0,
            "fan_type": 0,
            "valid": false
          },
          "last_success_at": null,
          "last_attempt_at": "2026-03-04T05:06:07Z",
          "consecutive_failures": 1,
          "last_error": "timeout"
        }
        "#);
    }
}

use std::time::Duration;

use bon::{Builder, bon};
use serde::Serialize;
use serde_with::{DurationMilliSeconds, DurationSeconds, serde_as};

/// Advertised-name fragment used when scanning for fans.
pub const DEFAULT_NAME_HINT: &str = "CeilingFan";

/// Default discovery scan window.
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(8);

const DEFAULT_POLL_INTERVAL_SECS: u64 = 15;
const MIN_POLL_INTERVAL_SECS: i64 = 5;
const MAX_POLL_INTERVAL_SECS: i64 = 300;

const DEFAULT_TURN_ON_SPEED: u8 = 2;
const MIN_TURN_ON_SPEED: u8 = 1;
const MAX_TURN_ON_SPEED: u8 = 3;

/// Empirical hardware timing for one transport session.
///
/// The defaults are the values the fan firmware is known to tolerate.
#[serde_as]
#[derive(Debug, Clone, Copy, Eq, PartialEq, Builder, Serialize)]
pub struct SessionTiming {
    /// Connection attempts before the last error is surfaced.
    #[builder(default = 3)]
    connect_attempts: u32,
    /// Upper bound for one connection attempt, including address resolution.
    #[builder(default = Duration::from_secs(15))]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    connect_timeout: Duration,
    /// Pause after a failed connection attempt.
    #[builder(default = Duration::from_millis(800))]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    connect_backoff: Duration,
    /// Pause between subscribing and sending a GET.
    #[builder(default = Duration::from_millis(100))]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    notify_settle: Duration,
    /// Default wait for a REPORT after a GET.
    #[builder(default = Duration::from_secs(2))]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    response_timeout: Duration,
    /// Pause after a SET write so the device can actuate.
    #[builder(default = Duration::from_millis(600))]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    post_write_settle: Duration,
    /// Pause after disconnecting before the next session may start.
    #[builder(default = Duration::from_millis(400))]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    cooldown: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl SessionTiming {
    #[must_use]
    pub fn connect_attempts(&self) -> u32 {
        self.connect_attempts
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    #[must_use]
    pub fn connect_backoff(&self) -> Duration {
        self.connect_backoff
    }

    #[must_use]
    pub fn notify_settle(&self) -> Duration {
        self.notify_settle
    }

    #[must_use]
    pub fn response_timeout(&self) -> Duration {
        self.response_timeout
    }

    #[must_use]
    pub fn post_write_settle(&self) -> Duration {
        self.post_write_settle
    }

    #[must_use]
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }
}

/// Per-fan feature switches and polling preferences.
#[serde_as]
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct FanOptions {
    has_light: bool,
    dimmable: bool,
    direction_supported: bool,
    #[serde_as(as = "DurationSeconds<u64>")]
    poll_interval: Duration,
    turn_on_speed: u8,
}

#[bon]
impl FanOptions {
    /// Builds fan options. `turn_on_speed` is the speed a plain "turn on" uses while the fan is
    /// off, clamped to `1..=3`.
    ///
    /// ```
    /// use fansync::FanOptions;
    ///
    /// assert_eq!(3, FanOptions::builder().turn_on_speed(7).build().turn_on_speed());
    /// ```
    #[builder]
    pub fn new(
        #[builder(default = true)] has_light: bool,
        #[builder(default = true)] dimmable: bool,
        #[builder(default)] direction_supported: bool,
        #[builder(default = Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS))]
        poll_interval: Duration,
        #[builder(default = DEFAULT_TURN_ON_SPEED)] turn_on_speed: u8,
    ) -> Self {
        Self {
            has_light,
            dimmable,
            direction_supported,
            poll_interval,
            turn_on_speed: turn_on_speed.clamp(MIN_TURN_ON_SPEED, MAX_TURN_ON_SPEED),
        }
    }
}

impl Default for FanOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl FanOptions {
    #[must_use]
    pub fn has_light(&self) -> bool {
        self.has_light
    }

    #[must_use]
    pub fn dimmable(&self) -> bool {
        self.dimmable
    }

    #[must_use]
    pub fn direction_supported(&self) -> bool {
        self.direction_supported
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    #[must_use]
    pub fn turn_on_speed(&self) -> u8 {
        self.turn_on_speed
    }
}

/// Parses a poll interval in seconds, clamped to `5..=300`.
///
/// Unparsable input falls back to 15 seconds.
///
/// ```
/// use std::time::Duration;
///
/// use fansync::normalize_poll_interval;
///
/// assert_eq!(Duration::from_secs(5), normalize_poll_interval("1"));
/// assert_eq!(Duration::from_secs(15), normalize_poll_interval("soon"));
/// ```
#[must_use]
pub fn normalize_poll_interval(raw: &str) -> Duration {
    let seconds = raw.trim().parse::<i64>().map_or(DEFAULT_POLL_INTERVAL_SECS, |value| {
        value
            .clamp(MIN_POLL_INTERVAL_SECS, MAX_POLL_INTERVAL_SECS)
            .unsigned_abs()
    });
    Duration::from_secs(seconds)
}

/// Parses a turn-on speed, clamped to `1..=3`.
///
/// Unparsable input falls back to medium (`2`).
#[must_use]
pub fn normalize_turn_on_speed(raw: &str) -> u8 {
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(|value| {
            let clamped = value.clamp(i64::from(MIN_TURN_ON_SPEED), i64::from(MAX_TURN_ON_SPEED));
            u8::try_from(clamped).ok()
        })
        .unwrap_or(DEFAULT_TURN_ON_SPEED)
}

use std::time::Duration;

use bon::Builder;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::filter::LevelFilter;

use crate::cli::control::ControlArgs;
use crate::cli::scan::ScanArgs;
use crate::cli::set::SetArgs;
use crate::cli::status::StatusArgs;
use crate::cli::watch::WatchArgs;
use crate::error::{CliConfigError, FixtureError};
use crate::hw::{FakeTransportConfig, ScanFixture, StateFixture};

/// Command-line options for the FanSync BLE tool.
#[derive(Debug, Parser)]
#[command(name = "fansync", about = "Control FanSync Bluetooth ceiling fans.")]
pub struct Args {
    /// Log verbosity. Overrides `RUST_LOG`.
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,
    /// Output format. Defaults to `pretty` on a terminal and `json` otherwise.
    #[arg(long, global = true, value_enum)]
    output: Option<OutputFormat>,
    /// Uses the in-memory fan instead of a Bluetooth adapter.
    #[arg(long, global = true)]
    fake: bool,
    /// Fake scan records in the form `address|name|rssi;...` (`-` for an absent name or RSSI).
    #[arg(long, global = true, requires = "fake")]
    fake_scan: Option<ScanFixture>,
    /// Status the fake fan starts with, as a hexadecimal REPORT frame.
    #[arg(long, global = true, requires = "fake")]
    fake_state: Option<StateFixture>,
    /// Makes every fake connection attempt fail.
    #[arg(long, global = true, requires = "fake")]
    fake_unreachable: bool,
    /// Makes the fake fan ignore status requests.
    #[arg(long, global = true, requires = "fake")]
    fake_silent: bool,
    /// Artificial fake scan delay (e.g. `250ms`, `2s`).
    #[arg(long, global = true, requires = "fake", value_parser = parse_duration)]
    fake_discovery_delay: Option<Duration>,
    #[command(subcommand)]
    command: Command,
}

impl Args {
    /// Creates argument values directly without CLI parsing.
    ///
    /// ```
    /// use fansync::{Args, Command, ScanArgs};
    ///
    /// let args = Args::new(Command::Scan(ScanArgs::default()));
    /// assert_eq!(None, args.log_level());
    /// ```
    #[must_use]
    pub fn new(command: Command) -> Self {
        Self {
            log_level: None,
            output: None,
            fake: false,
            fake_scan: None,
            fake_state: None,
            fake_unreachable: false,
            fake_silent: false,
            fake_discovery_delay: None,
            command,
        }
    }

    /// Enables fake backend mode with pre-parsed fake configuration.
    #[must_use]
    pub fn with_fake(mut self, fake: FakeArgs) -> Self {
        let FakeArgs {
            scan_fixture,
            state,
            unreachable,
            silent,
            discovery_delay,
        } = fake;

        self.fake = true;
        self.fake_scan = scan_fixture;
        self.fake_state = state;
        self.fake_unreachable = unreachable;
        self.fake_silent = silent;
        self.fake_discovery_delay = Some(discovery_delay);
        self
    }

    #[must_use]
    pub fn log_level(&self) -> Option<LogLevel> {
        self.log_level
    }

    #[must_use]
    pub fn output_format(&self) -> Option<OutputFormat> {
        self.output
    }

    /// Splits parsed CLI arguments into command and optional fake-backend settings.
    ///
    /// # Errors
    ///
    /// Returns an error if fake options are set without `--fake`.
    pub fn into_command_and_fake_args(self) -> anyhow::Result<(Command, Option<FakeArgs>)> {
        let Args {
            fake,
            fake_scan,
            fake_state,
            fake_unreachable,
            fake_silent,
            fake_discovery_delay,
            command,
            ..
        } = self;

        if !fake {
            let has_fake_options = fake_scan.is_some()
                || fake_state.is_some()
                || fake_unreachable
                || fake_silent
                || fake_discovery_delay.is_some();
            if has_fake_options {
                return Err(CliConfigError::FakeOptionsWithoutFake.into());
            }
            return Ok((command, None));
        }

        Ok((
            command,
            Some(FakeArgs {
                scan_fixture: fake_scan,
                state: fake_state,
                unreachable: fake_unreachable,
                silent: fake_silent,
                discovery_delay: fake_discovery_delay.unwrap_or(Duration::ZERO),
            }),
        ))
    }
}

/// Fake backend arguments for programmatic runs.
///
/// ```
/// let fake = fansync::FakeArgs::builder()
///     .scan_fixture("AA:BB:CC:DD:EE:01|CeilingFan Den|-60")?
///     .state("533202000032000000B9")?
///     .silent(true)
///     .build();
/// let _ = fake;
/// # Ok::<(), fansync::FixtureError>(())
/// ```
#[derive(Debug, Builder)]
pub struct FakeArgs {
    #[builder(with = |value: &str| -> std::result::Result<_, FixtureError> { value.parse() })]
    scan_fixture: Option<ScanFixture>,
    #[builder(with = |value: &str| -> std::result::Result<_, FixtureError> { value.parse() })]
    state: Option<StateFixture>,
    #[builder(default)]
    unreachable: bool,
    #[builder(default)]
    silent: bool,
    #[builder(default)]
    discovery_delay: Duration,
}

impl FakeArgs {
    pub(crate) fn into_backend_config(self) -> FakeTransportConfig {
        let Self {
            scan_fixture,
            state,
            unreachable,
            silent,
            discovery_delay,
        } = self;

        FakeTransportConfig::builder()
            .devices(scan_fixture.map(Into::into).unwrap_or_default())
            .state(state.map(Into::into).unwrap_or_default())
            .unreachable(unreachable)
            .silent(silent)
            .discovery_delay(discovery_delay)
            .build()
    }
}

/// Log verbosity accepted by `--log-level`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub(crate) fn as_level_filter(self) -> LevelFilter {
        match self {
            Self::Off => LevelFilter::OFF,
            Self::Error => LevelFilter::ERROR,
            Self::Warn => LevelFilter::WARN,
            Self::Info => LevelFilter::INFO,
            Self::Debug => LevelFilter::DEBUG,
            Self::Trace => LevelFilter::TRACE,
        }
    }
}

/// How command results are written to stdout.
#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Tables and coloured labels.
    Pretty,
    /// Pretty-printed JSON documents.
    Json,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan for advertising fans and list the candidates.
    Scan(ScanArgs),
    /// Read the current status of one fan.
    Status(StatusArgs),
    /// Write one raw status change and print the frame sent.
    Set(SetArgs),
    /// Refresh once, then run a fan or light action with the cached status.
    Control(ControlArgs),
    /// Poll one fan on an interval and print every snapshot.
    Watch(WatchArgs),
}

pub(crate) fn parse_duration(value: &str) -> Result<Duration, String> {
    humantime::parse_duration(value).map_err(|error| error.to_string())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use clap::error::ErrorKind;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn fake_state_requires_fake_mode() {
        let result = Args::try_parse_from([
            "fansync",
            "--fake-state",
            "53320000000000000085",
            "status",
            "--address",
            "AA:BB",
        ]);

        let error = result.expect_err("--fake-state should require --fake");
        assert_eq!(ErrorKind::MissingRequiredArgument, error.kind());
    }

    #[test]
    fn fake_scan_requires_fake_mode() {
        let result = Args::try_parse_from(["fansync", "--fake-scan", "AA:BB|CeilingFan|-50", "scan"]);

        let error = result.expect_err("--fake-scan should require --fake");
        assert_eq!(ErrorKind::MissingRequiredArgument, error.kind());
    }

    #[test]
    fn malformed_fake_state_is_rejected() {
        let result = Args::try_parse_from([
            "fansync",
            "--fake",
            "--fake-state",
            "5330",
            "status",
            "--address",
            "AA:BB",
        ]);

        let error = result.expect_err("a short frame is not a valid fake state");
        assert_eq!(ErrorKind::ValueValidation, error.kind());
    }

    #[test]
    fn fake_mode_builds_fake_settings() {
        let cli = Args::try_parse_from([
            "fansync",
            "--fake",
            "--fake-scan",
            "AA:BB|CeilingFan|-50",
            "--fake-silent",
            "scan",
        ])
        .expect("valid fake arguments should parse");

        let (command, fake_args) = cli
            .into_command_and_fake_args()
            .expect("valid fake arguments should resolve fake settings");
        assert_matches!(command, Command::Scan(_));
        assert_matches!(fake_args, Some(FakeArgs { silent: true, .. }));
    }

    #[test]
    fn real_mode_has_no_fake_settings() {
        let cli = Args::try_parse_from([
            "fansync",
            "--log-level",
            "debug",
            "--output",
            "json",
            "status",
            "--address",
            "AA:BB",
        ])
        .expect("valid arguments should parse");

        assert_eq!(Some(LogLevel::Debug), cli.log_level());
        assert_eq!(Some(OutputFormat::Json), cli.output_format());
        let (command, fake_args) = cli
            .into_command_and_fake_args()
            .expect("real mode should resolve");
        assert_matches!(command, Command::Status(_));
        assert_matches!(fake_args, None);
    }

    #[test]
    fn durations_use_humantime_syntax() {
        assert_eq!(Ok(Duration::from_millis(250)), parse_duration("250ms"));
        assert!(parse_duration("soon").is_err());
    }
}

use std::io;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use tracing::instrument;

use crate::cli::command::parse_duration;
use crate::cli::{OutputFormat, show_failure, show_progress, write_json_line};
use crate::config::{DEFAULT_NAME_HINT, DEFAULT_SCAN_TIMEOUT};
use crate::discovery::discover_candidates;
use crate::hw::FanTransport;
use crate::terminal::TerminalClient;

use super::ui::{DeviceListView, Painter};

/// Arguments for the `scan` command.
#[derive(Debug, Clone, Args)]
pub struct ScanArgs {
    /// How long to scan (e.g. `8s`, `1500ms`).
    #[arg(long, default_value = "8s", value_parser = parse_duration)]
    timeout: Duration,
    /// Case-insensitive substring the advertised name must contain. Empty keeps every named device.
    #[arg(long, default_value = DEFAULT_NAME_HINT)]
    name_hint: String,
}

impl ScanArgs {
    /// Creates scan arguments.
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// let args = fansync::ScanArgs::new(Duration::from_secs(2), "Patio");
    /// let _ = args;
    /// ```
    #[must_use]
    pub fn new(timeout: Duration, name_hint: impl Into<String>) -> Self {
        Self {
            timeout,
            name_hint: name_hint.into(),
        }
    }
}

impl Default for ScanArgs {
    fn default() -> Self {
        Self::new(DEFAULT_SCAN_TIMEOUT, DEFAULT_NAME_HINT)
    }
}

/// Executes the `scan` command.
#[instrument(skip(transport, out, terminal_client), level = "info", fields(?output_format, progress = true))]
pub(crate) async fn run<W>(
    transport: &dyn FanTransport,
    args: &ScanArgs,
    out: &mut W,
    terminal_client: &dyn TerminalClient,
    output_format: OutputFormat,
) -> Result<()>
where
    W: io::Write,
{
    show_progress(
        &format!(
            "Scanning for fans for {}",
            humantime::format_duration(args.timeout)
        ),
        "Scan finished",
    );
    let devices = discover_candidates(transport, args.timeout, Some(args.name_hint.as_str()))
        .await
        .inspect_err(|_error| show_failure("Scan failed"))?;

    match output_format {
        OutputFormat::Pretty => {
            let painter = Painter::new(terminal_client.stdout_is_terminal());
            writeln!(out, "{}", DeviceListView::new(&devices, &painter))?;
        }
        OutputFormat::Json => write_json_line(out, &devices)?,
    }

    Ok(())
}

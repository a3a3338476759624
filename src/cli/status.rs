use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use tracing::instrument;

use crate::cli::command::parse_duration;
use crate::cli::{OutputFormat, show_failure, show_progress, write_json_line};
use crate::client::FanClient;
use crate::hw::FanTransport;
use crate::terminal::TerminalClient;

use super::ui::{Painter, StateView};

/// Arguments for the `status` command.
#[derive(Debug, Clone, Args)]
pub struct StatusArgs {
    /// Platform address of the fan.
    #[arg(long)]
    address: String,
    /// How long to wait for the status report (e.g. `2s`).
    #[arg(long, value_parser = parse_duration)]
    timeout: Option<Duration>,
}

impl StatusArgs {
    #[must_use]
    pub fn new(address: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            address: address.into(),
            timeout,
        }
    }
}

/// Executes the `status` command.
#[instrument(skip(transport, out, terminal_client), level = "info", fields(?output_format, progress = true))]
pub(crate) async fn run<W>(
    transport: Arc<dyn FanTransport>,
    args: &StatusArgs,
    out: &mut W,
    terminal_client: &dyn TerminalClient,
    output_format: OutputFormat,
) -> Result<()>
where
    W: io::Write,
{
    let client = FanClient::builder()
        .address(args.address.as_str())
        .transport(transport)
        .build();
    show_progress(
        &format!("Reading status from {}", args.address),
        "Status read",
    );
    let state = client
        .query_state(args.timeout)
        .await
        .inspect_err(|_error| show_failure("Status read failed"))?;

    match output_format {
        OutputFormat::Pretty => {
            let painter = Painter::new(terminal_client.stdout_is_terminal());
            writeln!(out, "{}", StateView::new(&state, &painter))?;
        }
        OutputFormat::Json => write_json_line(out, &state)?,
    }

    Ok(())
}

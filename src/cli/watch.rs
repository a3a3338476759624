use std::io;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::cli::{OutputFormat, show_progress, write_json_line};
use crate::client::FanClient;
use crate::config::normalize_poll_interval;
use crate::coordinator::PollingCoordinator;
use crate::error::InteractionError;
use crate::hw::FanTransport;
use crate::terminal::TerminalClient;

use super::ui::{DiagnosticsView, Painter};

/// Arguments for the `watch` command.
#[derive(Debug, Clone, Args)]
pub struct WatchArgs {
    /// Platform address of the fan.
    #[arg(long)]
    address: String,
    /// Seconds between polls, clamped to `5..=300`.
    #[arg(long, default_value = "15", allow_hyphen_values = true)]
    poll_interval: String,
    /// Stop after this many polls. If omitted, watch until Ctrl+C.
    #[arg(long)]
    max_polls: Option<usize>,
}

impl WatchArgs {
    /// Creates watch arguments.
    ///
    /// ```
    /// let args = fansync::WatchArgs::new("AA:BB", "30", Some(2));
    /// let _ = args;
    /// ```
    #[must_use]
    pub fn new(
        address: impl Into<String>,
        poll_interval: impl Into<String>,
        max_polls: Option<usize>,
    ) -> Self {
        Self {
            address: address.into(),
            poll_interval: poll_interval.into(),
            max_polls,
        }
    }
}

/// Executes the `watch` command.
///
/// Every snapshot change is printed; the polling loop is cancelled when the poll limit is
/// reached or Ctrl+C arrives.
#[instrument(skip(transport, out, terminal_client), level = "info", fields(?output_format, progress = true))]
pub(crate) async fn run<W>(
    transport: Arc<dyn FanTransport>,
    args: &WatchArgs,
    out: &mut W,
    terminal_client: &dyn TerminalClient,
    output_format: OutputFormat,
) -> Result<()>
where
    W: io::Write,
{
    let poll_interval = normalize_poll_interval(&args.poll_interval);
    let client = FanClient::builder()
        .address(args.address.as_str())
        .transport(transport)
        .build();
    let coordinator = Arc::new(PollingCoordinator::new(Arc::new(client), poll_interval));
    let mut snapshots = coordinator.subscribe();
    let shutdown = CancellationToken::new();

    let polling = tokio::spawn({
        let coordinator = Arc::clone(&coordinator);
        let shutdown = shutdown.clone();
        async move { coordinator.run(shutdown).await }
    });

    show_progress(
        &format!(
            "Watching {} every {}",
            args.address,
            humantime::format_duration(poll_interval)
        ),
        "Watch stopped",
    );
    let painter = Painter::new(terminal_client.stdout_is_terminal());
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut polls = 0usize;

    let outcome: Result<()> = loop {
        if args.max_polls.is_some_and(|max_polls| polls >= max_polls) {
            info!(polls, "poll limit reached");
            break Ok(());
        }

        tokio::select! {
            signal = &mut ctrl_c => {
                break signal
                    .map(|()| info!("interrupted"))
                    .map_err(|source| InteractionError::CtrlC { source }.into());
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    debug!("snapshot channel closed");
                    break Ok(());
                }
                polls += 1;
                let diagnostics = coordinator.diagnostics();
                let written: Result<()> = match output_format {
                    OutputFormat::Pretty => {
                        writeln!(out, "{}", DiagnosticsView::new(&diagnostics, &painter))
                            .and_then(|()| writeln!(out))
                            .map_err(Into::into)
                    }
                    OutputFormat::Json => write_json_line(out, &diagnostics),
                };
                if let Err(error) = written {
                    break Err(error);
                }
            }
        }
    };

    shutdown.cancel();
    if let Err(error) = polling.await {
        debug!(%error, "polling task ended abnormally");
    }
    outcome
}

use std::io;
use std::sync::Arc;

use anyhow::Result;
use tracing::instrument;

use crate::cli::{Command, FakeArgs, LogLevel, OutputFormat};
use crate::error::InteractionError;
use crate::hw::{FanTransport, TransportBackend, transport_from_backend};
use crate::telemetry;
use crate::terminal::{SystemTerminalClient, TerminalClient};

/// Creates a transport backed by the system's Bluetooth adapters.
///
/// # Errors
///
/// Returns an error if the BLE manager cannot be created.
pub async fn real_transport() -> Result<Arc<dyn FanTransport>, InteractionError> {
    transport_from_backend(TransportBackend::Real).await
}

/// Creates a transport backed by the in-memory fan.
///
/// # Errors
///
/// Never fails for the fake backend; the signature matches [`real_transport`].
pub async fn fake_transport(
    fake_args: FakeArgs,
) -> Result<Arc<dyn FanTransport>, InteractionError> {
    transport_from_backend(TransportBackend::Fake(fake_args.into_backend_config())).await
}

/// Runs one CLI command against `transport`, writing results to `out`.
///
/// ```
/// # async fn run() -> anyhow::Result<()> {
/// use clap::Parser;
///
/// let args = fansync::Args::try_parse_from([
///     "fansync",
///     "--fake",
///     "--fake-scan",
///     "AA:BB|CeilingFan Den|-60",
///     "scan",
///     "--timeout",
///     "10ms",
/// ])?;
/// let (command, maybe_fake_args) = args.into_command_and_fake_args()?;
/// let transport = match maybe_fake_args {
///     Some(fake_args) => fansync::fake_transport(fake_args).await?,
///     None => fansync::real_transport().await?,
/// };
/// let mut out = Vec::new();
/// fansync::run(command, &mut out, transport, fansync::OutputFormat::Json).await?;
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns an error if tracing initialisation fails, BLE interaction fails, or
/// output writing fails.
pub async fn run<W>(
    command: Command,
    out: &mut W,
    transport: Arc<dyn FanTransport>,
    output_format: OutputFormat,
) -> Result<()>
where
    W: io::Write,
{
    run_with_log_level(command, out, transport, None, output_format).await
}

/// Runs one CLI command with an explicit telemetry log-level override.
///
/// # Errors
///
/// Returns an error if tracing initialisation fails, BLE interaction fails, or
/// output writing fails.
pub async fn run_with_log_level<W>(
    command: Command,
    out: &mut W,
    transport: Arc<dyn FanTransport>,
    log_level: Option<LogLevel>,
    output_format: OutputFormat,
) -> Result<()>
where
    W: io::Write,
{
    run_with_clients(
        command,
        out,
        &SystemTerminalClient,
        transport,
        log_level,
        output_format,
    )
    .await
}

/// Runs one CLI command with injected clients and explicit telemetry settings.
///
/// ```
/// # async fn run() -> anyhow::Result<()> {
/// use clap::Parser;
///
/// struct FakeTerminal;
/// impl fansync::TerminalClient for FakeTerminal {
///     fn stdout_is_terminal(&self) -> bool { false }
///     fn stderr_is_terminal(&self) -> bool { false }
/// }
///
/// let args = fansync::Args::try_parse_from([
///     "fansync",
///     "--log-level",
///     "trace",
///     "--fake",
///     "--fake-state",
///     "533202000032000000B9",
///     "status",
///     "--address",
///     "AA:BB",
/// ])?;
/// let log_level = args.log_level();
/// let (command, maybe_fake_args) = args.into_command_and_fake_args()?;
/// let transport = match maybe_fake_args {
///     Some(fake_args) => fansync::fake_transport(fake_args).await?,
///     None => fansync::real_transport().await?,
/// };
/// let mut out = Vec::new();
/// fansync::run_with_clients(
///     command,
///     &mut out,
///     &FakeTerminal,
///     transport,
///     log_level,
///     fansync::OutputFormat::Pretty,
/// ).await?;
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns an error if tracing initialisation fails, BLE interaction fails, or
/// output writing fails.
#[instrument(
    skip(out, terminal_client, transport),
    level = "info",
    fields(command = %command_name(&command), ?log_level)
)]
pub async fn run_with_clients<W>(
    command: Command,
    out: &mut W,
    terminal_client: &dyn TerminalClient,
    transport: Arc<dyn FanTransport>,
    log_level: Option<LogLevel>,
    output_format: OutputFormat,
) -> Result<()>
where
    W: io::Write,
{
    telemetry::initialise_tracing(
        "fansync",
        terminal_client.stderr_is_terminal(),
        log_level.map(LogLevel::as_level_filter),
    )?;

    match command {
        Command::Scan(args) => {
            crate::cli::scan::run(
                transport.as_ref(),
                &args,
                out,
                terminal_client,
                output_format,
            )
            .await
        }
        Command::Status(args) => {
            crate::cli::status::run(transport, &args, out, terminal_client, output_format).await
        }
        Command::Set(args) => {
            crate::cli::set::run(transport, &args, out, terminal_client, output_format).await
        }
        Command::Control(args) => {
            crate::cli::control::run(transport, &args, out, terminal_client, output_format).await
        }
        Command::Watch(args) => {
            crate::cli::watch::run(transport, &args, out, terminal_client, output_format).await
        }
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Scan(_args) => "scan",
        Command::Status(_args) => "status",
        Command::Set(_args) => "set",
        Command::Control(_args) => "control",
        Command::Watch(_args) => "watch",
    }
}

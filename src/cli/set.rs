use std::io;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use tracing::instrument;

use crate::cli::{OutputFormat, show_failure, show_progress, write_json_line};
use crate::client::FanClient;
use crate::handlers::{Direction, Frame, FrameFields};
use crate::hw::FanTransport;
use crate::terminal::TerminalClient;
use crate::utils::format_hex;

use super::ui::{FrameView, Painter};

/// JSON description of a frame written to the fan.
#[derive(Debug, Serialize)]
pub(crate) struct WrittenFrame {
    bytes: String,
    fields: FrameFields,
    checksum: u8,
}

impl From<&Frame> for WrittenFrame {
    fn from(frame: &Frame) -> Self {
        Self {
            bytes: format_hex(frame.as_bytes()),
            fields: frame.fields(),
            checksum: frame.checksum(),
        }
    }
}

/// JSON result emitted by a `set` action.
#[derive(Serialize)]
struct SetResult {
    #[serde(flatten)]
    action: SetAction,
    frame: WrittenFrame,
}

/// Arguments for the `set` command.
#[derive(Debug, Clone, Args)]
pub struct SetArgs {
    /// Platform address of the fan.
    #[arg(long)]
    address: String,
    #[command(subcommand)]
    action: SetAction,
}

impl SetArgs {
    /// Creates raw-write arguments.
    ///
    /// ```
    /// use fansync::{SetAction, SetArgs};
    ///
    /// let args = SetArgs::new("AA:BB", SetAction::Speed { speed: 3 });
    /// let _ = args;
    /// ```
    #[must_use]
    pub fn new(address: impl Into<String>, action: SetAction) -> Self {
        Self {
            address: address.into(),
            action,
        }
    }
}

/// Field changed by the `set` command.
///
/// Every other field is copied from a status read over the same connection.
#[derive(Debug, Clone, Copy, Subcommand, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SetAction {
    /// Fan speed step (`0` is off).
    Speed { speed: u8 },
    /// Downlight level in percent. Out-of-range values are clamped to `0..=100`.
    Light {
        #[arg(allow_hyphen_values = true)]
        percent: i32,
    },
    /// Rotation direction.
    Direction {
        #[arg(value_enum)]
        direction: Direction,
    },
}

/// Executes the `set` command.
#[instrument(skip(transport, out, terminal_client), level = "info", fields(?output_format, progress = true))]
pub(crate) async fn run<W>(
    transport: Arc<dyn FanTransport>,
    args: &SetArgs,
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
    show_progress(&format!("Writing to {}", args.address), "Frame written");
    let written = match args.action {
        SetAction::Speed { speed } => client.set_speed(speed, None, None).await,
        SetAction::Light { percent } => client.set_light(percent, None, None).await,
        SetAction::Direction { direction } => client.set_direction(direction, None).await,
    };
    let frame = written.inspect_err(|_error| show_failure("Write failed"))?;

    match output_format {
        OutputFormat::Pretty => {
            let painter = Painter::new(terminal_client.stdout_is_terminal());
            writeln!(out, "{}", FrameView::new(&frame, &painter))?;
        }
        OutputFormat::Json => write_json_line(
            out,
            &SetResult {
                action: args.action,
                frame: WrittenFrame::from(&frame),
            },
        )?,
    }

    Ok(())
}

use std::io;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use tracing::instrument;

use crate::cli::set::WrittenFrame;
use crate::cli::{OutputFormat, show_failure, show_progress, write_json_line};
use crate::client::FanClient;
use crate::config::{FanOptions, normalize_turn_on_speed};
use crate::controller::FanController;
use crate::coordinator::{CoordinatorDiagnostics, PollingCoordinator};
use crate::error::InteractionError;
use crate::handlers::{Direction, Frame};
use crate::hw::FanTransport;
use crate::terminal::TerminalClient;

use super::ui::{DiagnosticsView, FrameView, Painter};

/// JSON result emitted by a `control` action.
#[derive(Serialize)]
struct ControlResult {
    #[serde(flatten)]
    action: ControlAction,
    frame: WrittenFrame,
    diagnostics: CoordinatorDiagnostics,
}

/// Arguments for the `control` command.
#[derive(Debug, Clone, Args)]
pub struct ControlArgs {
    /// Platform address of the fan.
    #[arg(long)]
    address: String,
    /// The fan has no downlight.
    #[arg(long)]
    no_light: bool,
    /// The downlight only switches on and off.
    #[arg(long)]
    not_dimmable: bool,
    /// The fan accepts direction changes.
    #[arg(long)]
    direction_supported: bool,
    /// Speed step used by `fan-on` while the fan is stopped (`1..=3`).
    #[arg(long, default_value = "2", allow_hyphen_values = true)]
    turn_on_speed: String,
    #[command(subcommand)]
    action: ControlAction,
}

impl ControlArgs {
    /// Creates control arguments for one action with default fan options.
    ///
    /// ```
    /// use fansync::{ControlAction, ControlArgs};
    ///
    /// let args = ControlArgs::new("AA:BB", ControlAction::FanOff);
    /// let _ = args;
    /// ```
    #[must_use]
    pub fn new(address: impl Into<String>, action: ControlAction) -> Self {
        Self {
            address: address.into(),
            no_light: false,
            not_dimmable: false,
            direction_supported: false,
            turn_on_speed: "2".to_string(),
            action,
        }
    }

    fn fan_options(&self) -> FanOptions {
        FanOptions::builder()
            .has_light(!self.no_light)
            .dimmable(!self.not_dimmable)
            .direction_supported(self.direction_supported)
            .turn_on_speed(normalize_turn_on_speed(&self.turn_on_speed))
            .build()
    }
}

/// Action performed by the `control` command.
#[derive(Debug, Clone, Copy, Subcommand, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ControlAction {
    /// Start the fan, at the given percentage or the turn-on speed.
    FanOn {
        #[arg(long)]
        percentage: Option<u8>,
    },
    /// Stop the fan.
    FanOff,
    /// Set the fan speed from a percentage (`0..=100`).
    Percentage { percentage: u8 },
    /// Set the rotation direction.
    Direction {
        #[arg(value_enum)]
        direction: Direction,
    },
    /// Switch the light on, at the given brightness (`0..=255`) or full.
    LightOn {
        #[arg(long)]
        brightness: Option<u8>,
    },
    /// Switch the light off.
    LightOff,
}

impl ControlAction {
    async fn apply(self, controller: &FanController) -> Result<Frame, InteractionError> {
        match self {
            Self::FanOn { percentage } => controller.turn_on(percentage).await,
            Self::FanOff => controller.turn_off().await,
            Self::Percentage { percentage } => controller.set_percentage(percentage).await,
            Self::Direction { direction } => controller.set_direction(direction).await,
            Self::LightOn { brightness } => controller.light_on(brightness).await,
            Self::LightOff => controller.light_off().await,
        }
    }
}

/// Executes the `control` command.
#[instrument(skip(transport, out, terminal_client), level = "info", fields(?output_format, progress = true))]
pub(crate) async fn run<W>(
    transport: Arc<dyn FanTransport>,
    args: &ControlArgs,
    out: &mut W,
    terminal_client: &dyn TerminalClient,
    output_format: OutputFormat,
) -> Result<()>
where
    W: io::Write,
{
    let options = args.fan_options();
    let client = FanClient::builder()
        .address(args.address.as_str())
        .transport(transport)
        .build();
    let coordinator = Arc::new(PollingCoordinator::new(
        Arc::new(client),
        options.poll_interval(),
    ));
    let controller = FanController::new(Arc::clone(&coordinator), options);

    show_progress(
        &format!("Reading status from {}", args.address),
        "Action applied",
    );
    coordinator.refresh().await;
    show_progress(&format!("Writing to {}", args.address), "Action applied");
    let frame = args
        .action
        .apply(&controller)
        .await
        .inspect_err(|_error| show_failure("Action failed"))?;
    let diagnostics = coordinator.diagnostics();

    match output_format {
        OutputFormat::Pretty => {
            let painter = Painter::new(terminal_client.stdout_is_terminal());
            writeln!(out, "{}", FrameView::new(&frame, &painter))?;
            writeln!(out)?;
            writeln!(out, "{}", DiagnosticsView::new(&diagnostics, &painter))?;
        }
        OutputFormat::Json => write_json_line(
            out,
            &ControlResult {
                action: args.action,
                frame: WrittenFrame::from(&frame),
                diagnostics,
            },
        )?,
    }

    Ok(())
}

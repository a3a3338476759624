pub(crate) mod command;
pub(crate) mod control;
pub(crate) mod scan;
pub(crate) mod set;
pub(crate) mod status;
pub(crate) mod ui;
pub(crate) mod watch;

use std::io;

use anyhow::Result;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::Span;
use tracing_indicatif::span_ext::IndicatifSpanExt;

pub use self::command::{Args, Command, FakeArgs, LogLevel, OutputFormat};
pub use self::control::{ControlAction, ControlArgs};
pub use self::scan::ScanArgs;
pub use self::set::{SetAction, SetArgs};
pub use self::status::StatusArgs;
pub use self::watch::WatchArgs;

pub(crate) fn write_json_line(out: &mut impl io::Write, value: &impl Serialize) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Labels the current progress span and the line it leaves behind on success.
pub(crate) fn show_progress(message: &str, finished: &str) {
    let span = Span::current();
    span.pb_set_message(message);
    span.pb_set_finish_message(&format!("{} {finished}", "✓".green()));
}

/// Replaces the finish line of the current progress span after a failure.
pub(crate) fn show_failure(finished: &str) {
    Span::current().pb_set_finish_message(&format!("{} {finished}", "✗".red()));
}

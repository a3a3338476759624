use std::fmt::{self, Display, Formatter};

use crate::coordinator::CoordinatorDiagnostics;
use crate::utils::format_timestamp;

use super::painter::Painter;
use super::state_view::StateView;
use super::table::Table;

/// Renders the coordinator's polling bookkeeping, followed by the stored status.
pub(crate) struct DiagnosticsView<'a> {
    diagnostics: &'a CoordinatorDiagnostics,
    painter: &'a Painter,
}

impl<'a> DiagnosticsView<'a> {
    pub(crate) fn new(diagnostics: &'a CoordinatorDiagnostics, painter: &'a Painter) -> Self {
        Self {
            diagnostics,
            painter,
        }
    }
}

impl Display for DiagnosticsView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let painter = self.painter;
        let diagnostics = self.diagnostics;

        let table = Table::fields(
            painter,
            [
                ("address", painter.reading(&diagnostics.address)),
                (
                    "poll_interval",
                    humantime::format_duration(diagnostics.poll_interval).to_string(),
                ),
                (
                    "consecutive_failures",
                    painter.failure_count(diagnostics.consecutive_failures),
                ),
                (
                    "last_error",
                    painter.last_error(diagnostics.last_error.as_deref()),
                ),
                (
                    "last_success_at",
                    format_timestamp(diagnostics.last_success_at),
                ),
                (
                    "last_attempt_at",
                    format_timestamp(diagnostics.last_attempt_at),
                ),
            ],
        );

        write!(f, "{}", painter.heading("Coordinator:"))?;
        write!(f, "\n{table}")?;
        if let Some(state) = &diagnostics.last_state {
            write!(f, "\n\n{}", StateView::new(state, painter))?;
        }
        Ok(())
    }
}

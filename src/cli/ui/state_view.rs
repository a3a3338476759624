use std::fmt::{self, Display, Formatter};

use crate::handlers::FanState;

use super::painter::Painter;
use super::table::Table;

/// Renders a decoded fan status.
pub(crate) struct StateView<'a> {
    state: &'a FanState,
    painter: &'a Painter,
}

impl<'a> StateView<'a> {
    pub(crate) fn new(state: &'a FanState, painter: &'a Painter) -> Self {
        Self { state, painter }
    }

    fn table(&self) -> Table {
        let painter = self.painter;
        let state = self.state;
        Table::fields(
            painter,
            [
                ("status", painter.report_source(state.is_valid())),
                ("speed", painter.reading(state.speed().to_string())),
                ("direction", painter.reading(state.direction().to_string())),
                ("light", painter.reading(format!("{}%", state.down()))),
                ("uplight", state.up().to_string()),
                ("timer", format!("{} min", state.minutes())),
                ("fan_type", state.fan_type().to_string()),
            ],
        )
    }
}

impl Display for StateView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.painter.heading("Fan status:"))?;
        write!(f, "\n{}", self.table())
    }
}

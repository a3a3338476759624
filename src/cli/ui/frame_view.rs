use std::fmt::{self, Display, Formatter};

use crate::handlers::{CommandCode, Frame};

use super::painter::Painter;
use super::table::Table;

/// Renders a frame that was written to the fan.
pub(crate) struct FrameView<'a> {
    frame: &'a Frame,
    painter: &'a Painter,
}

impl<'a> FrameView<'a> {
    pub(crate) fn new(frame: &'a Frame, painter: &'a Painter) -> Self {
        Self { frame, painter }
    }
}

impl Display for FrameView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let command = match CommandCode::try_from(self.frame.command_byte()) {
            Ok(code) => code.to_string(),
            Err(raw) => format!("unknown ({raw:#04x})"),
        };
        let fields = self.frame.fields();
        let table = Table::fields(
            self.painter,
            [
                ("command", self.painter.reading(command)),
                ("bytes", self.painter.reading(self.frame.to_string())),
                ("speed", fields.speed.to_string()),
                ("direction", fields.direction.to_string()),
                ("light", format!("{}%", fields.down)),
                ("checksum", format!("{:#04x}", self.frame.checksum())),
            ],
        );

        write!(f, "{}", self.painter.heading("Frame written:"))?;
        write!(f, "\n{table}")
    }
}

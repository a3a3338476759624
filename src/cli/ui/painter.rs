use owo_colors::{OwoColorize, Style};
use strum_macros::EnumIter;

/// Meaning of a piece of output, mapped to a terminal style.
#[derive(Debug, Clone, Copy, Eq, PartialEq, EnumIter)]
pub(crate) enum Tone {
    Heading,
    Healthy,
    Degraded,
    Fault,
    Label,
    Reading,
}

impl Tone {
    fn style(self) -> Style {
        match self {
            Self::Heading => Style::new().bold().cyan(),
            Self::Healthy => Style::new().bold().green(),
            Self::Degraded => Style::new().bold().yellow(),
            Self::Fault => Style::new().bold().red(),
            Self::Label => Style::new().dimmed(),
            Self::Reading => Style::new().bold(),
        }
    }
}

/// Colours view text by [`Tone`]. Plain painters return text untouched.
#[derive(Debug)]
pub(crate) struct Painter {
    use_colour: bool,
}

impl Painter {
    pub(crate) fn new(use_colour: bool) -> Self {
        Self { use_colour }
    }

    pub(crate) fn paint(&self, tone: Tone, text: impl AsRef<str>) -> String {
        let text = text.as_ref();
        if self.use_colour {
            text.style(tone.style()).to_string()
        } else {
            text.to_owned()
        }
    }

    pub(crate) fn heading(&self, text: impl AsRef<str>) -> String {
        self.paint(Tone::Heading, text)
    }

    pub(crate) fn label(&self, text: impl AsRef<str>) -> String {
        self.paint(Tone::Label, text)
    }

    pub(crate) fn reading(&self, text: impl AsRef<str>) -> String {
        self.paint(Tone::Reading, text)
    }

    pub(crate) fn notice(&self, text: impl AsRef<str>) -> String {
        self.paint(Tone::Degraded, text)
    }

    /// Whether the shown status came from a device report.
    pub(crate) fn report_source(&self, reported: bool) -> String {
        if reported {
            self.paint(Tone::Healthy, "reported")
        } else {
            self.paint(Tone::Degraded, "no report")
        }
    }

    /// Consecutive poll failures; zero is healthy.
    pub(crate) fn failure_count(&self, count: u32) -> String {
        let tone = if count == 0 {
            Tone::Healthy
        } else {
            Tone::Degraded
        };
        self.paint(tone, count.to_string())
    }

    pub(crate) fn last_error(&self, error: Option<&str>) -> String {
        match error {
            Some(error) => self.paint(Tone::Fault, error),
            None => self.label("-"),
        }
    }
}

//! Terminal rendition of the agent window

use std::io::{self, Write};

use chrono::{DateTime, Local};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

use super::{format_last_run, EntryFields, Indication, Severity, StatusView};
use crate::security::Sanitizer;

fn color_for(severity: Severity) -> Color {
    match severity {
        Severity::Ok => Color::Green,
        Severity::Warning => Color::DarkYellow,
        Severity::Error => Color::Red,
    }
}

/// Prints the window's contents to stdout
///
/// While hidden (minimized to the tray) nothing is printed; updates are
/// only logged.
pub struct ConsoleView<W: Write = io::Stdout> {
    out: W,
    visible: bool,
}

impl ConsoleView {
    /// A view writing to stdout
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleView<W> {
    pub fn new(out: W) -> Self {
        Self { out, visible: true }
    }

    /// Consumes the view, returning its writer
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, color: Option<Color>, text: &str) {
        let result = match color {
            Some(color) => crossterm::queue!(
                self.out,
                SetForegroundColor(color),
                Print(text),
                ResetColor,
                Print("\n")
            ),
            None => crossterm::queue!(self.out, Print(text), Print("\n")),
        };
        if let Err(e) = result.and_then(|_| self.out.flush()) {
            tracing::warn!("Failed to write to console: {}", e);
        }
    }
}

impl<W: Write> StatusView for ConsoleView<W> {
    fn show_status(&mut self, indication: &Indication) {
        if !self.visible {
            tracing::debug!("(hidden) {}", indication);
            return;
        }
        let text = indication.to_string();
        self.line(Some(color_for(indication.severity())), &text);
    }

    fn show_last_run(&mut self, at: DateTime<Local>) {
        let text = format_last_run(Some(at));
        if !self.visible {
            tracing::debug!("(hidden) {}", text);
            return;
        }
        self.line(None, &text);
    }

    fn show_fields(&mut self, fields: &EntryFields) {
        if !self.visible {
            return;
        }
        let url = if fields.url.trim().is_empty() {
            "<empty>".to_string()
        } else {
            Sanitizer::sanitize_url(&fields.url)
        };
        self.line(None, &format!("DDNS URL:            {}", url));
        self.line(None, &format!("Interval (minutes):  {}", fields.interval));
    }

    fn show_notice(&mut self, text: &str) {
        if self.visible {
            self.line(None, text);
        }
    }

    fn set_visible(&mut self, visible: bool) {
        if self.visible == visible {
            return;
        }
        self.visible = visible;
        if visible {
            self.line(None, "Dynamic DNS Agent");
        }
    }
}

//! Text-mode tray for sessions without a desktop

use std::io::{self, Write};

use super::{Tray, TrayCommand, TrayError};

/// Announces the tray and its menu on the console; the menu entries are
/// then typed as commands
pub struct ConsoleTray<W: Write = io::Stdout> {
    out: W,
    shown: bool,
}

impl ConsoleTray {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleTray<W> {
    pub fn new(out: W) -> Self {
        Self { out, shown: false }
    }
}

impl<W: Write> Tray for ConsoleTray<W> {
    fn show(&mut self) -> Result<(), TrayError> {
        if self.shown {
            return Ok(());
        }

        let entries: Vec<String> = TrayCommand::MENU
            .iter()
            .map(|cmd| format!("'{}'", cmd.label().to_lowercase()))
            .collect();

        writeln!(
            self.out,
            "Dynamic DNS Agent is running in the tray. Menu: {}",
            entries.join(", ")
        )
        .and_then(|_| self.out.flush())
        .map_err(|e| TrayError::Unavailable(e.to_string()))?;

        self.shown = true;
        tracing::debug!("Console tray shown");
        Ok(())
    }

    fn release(&mut self) {
        if self.shown {
            self.shown = false;
            tracing::debug!("Console tray released");
        }
    }

    fn is_shown(&self) -> bool {
        self.shown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_tray_lifecycle() {
        let mut tray = ConsoleTray::new(Vec::new());
        assert!(!tray.is_shown());

        tray.show().unwrap();
        assert!(tray.is_shown());
        tray.show().unwrap();

        tray.release();
        assert!(!tray.is_shown());

        let out = String::from_utf8(tray.out).unwrap();
        assert_eq!(out.matches("running in the tray").count(), 1);
        assert!(out.contains("'open', 'exit'"));
    }
}

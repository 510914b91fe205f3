//! Tray boundary
//!
//! The tray menu has exactly two entries. Selecting one produces a
//! [`TrayCommand`] which the controller handles in a single place, so no
//! menu item needs to capture any state of its own.

mod console;
#[cfg(feature = "system-tray")]
mod system;

pub use console::ConsoleTray;
#[cfg(feature = "system-tray")]
pub use system::SystemTray;

use thiserror::Error;

/// Errors that can occur when showing the tray icon
#[derive(Debug, Error)]
pub enum TrayError {
    /// The platform has no tray, or it couldn't be reached
    #[error("Tray unavailable: {0}")]
    Unavailable(String),
}

/// Actions offered by the tray menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayCommand {
    /// Restore the main window
    Open,
    /// Stop the agent and terminate the process
    Exit,
}

impl TrayCommand {
    /// Menu entries in display order
    pub const MENU: [TrayCommand; 2] = [TrayCommand::Open, TrayCommand::Exit];

    /// Menu label
    pub fn label(&self) -> &'static str {
        match self {
            TrayCommand::Open => "Open",
            TrayCommand::Exit => "Exit",
        }
    }

    /// Looks a command up by its label, ignoring case
    pub fn from_label(label: &str) -> Option<Self> {
        Self::MENU
            .into_iter()
            .find(|cmd| cmd.label().eq_ignore_ascii_case(label.trim()))
    }
}

/// A tray icon with the [`TrayCommand::MENU`] menu
pub trait Tray {
    /// Installs the icon and menu
    fn show(&mut self) -> Result<(), TrayError>;

    /// Removes the icon and releases its resources
    fn release(&mut self);

    /// Returns true while the icon is installed
    fn is_shown(&self) -> bool;
}

/// Uses `primary` until it fails to show, then `fallback` from then on
pub struct FallbackTray {
    primary: Box<dyn Tray>,
    fallback: Box<dyn Tray>,
    primary_failed: bool,
}

impl FallbackTray {
    pub fn new(primary: Box<dyn Tray>, fallback: Box<dyn Tray>) -> Self {
        Self {
            primary,
            fallback,
            primary_failed: false,
        }
    }
}

impl Tray for FallbackTray {
    fn show(&mut self) -> Result<(), TrayError> {
        if !self.primary_failed {
            match self.primary.show() {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!("{}, falling back to the console tray", e);
                    self.primary_failed = true;
                }
            }
        }
        self.fallback.show()
    }

    fn release(&mut self) {
        if self.primary.is_shown() {
            self.primary.release();
        }
        if self.fallback.is_shown() {
            self.fallback.release();
        }
    }

    fn is_shown(&self) -> bool {
        self.primary.is_shown() || self.fallback.is_shown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct CountingTray {
        fail: bool,
        shown: bool,
        shows: Arc<AtomicU32>,
    }

    impl CountingTray {
        fn boxed(fail: bool) -> (Box<dyn Tray>, Arc<AtomicU32>) {
            let shows = Arc::new(AtomicU32::new(0));
            let tray = CountingTray {
                fail,
                shown: false,
                shows: shows.clone(),
            };
            (Box::new(tray), shows)
        }
    }

    impl Tray for CountingTray {
        fn show(&mut self) -> Result<(), TrayError> {
            self.shows.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(TrayError::Unavailable("no desktop".into()));
            }
            self.shown = true;
            Ok(())
        }

        fn release(&mut self) {
            self.shown = false;
        }

        fn is_shown(&self) -> bool {
            self.shown
        }
    }

    #[test]
    fn test_menu_order_and_labels() {
        let labels: Vec<&str> = TrayCommand::MENU.iter().map(|c| c.label()).collect();
        assert_eq!(labels, vec!["Open", "Exit"]);
    }

    #[test]
    fn test_from_label() {
        assert_eq!(TrayCommand::from_label("open"), Some(TrayCommand::Open));
        assert_eq!(TrayCommand::from_label(" EXIT "), Some(TrayCommand::Exit));
        assert_eq!(TrayCommand::from_label("close"), None);
    }

    #[test]
    fn test_fallback_prefers_primary() {
        let (primary, primary_shows) = CountingTray::boxed(false);
        let (fallback, fallback_shows) = CountingTray::boxed(false);
        let mut tray = FallbackTray::new(primary, fallback);

        tray.show().unwrap();
        assert!(tray.is_shown());
        assert_eq!(primary_shows.load(Ordering::SeqCst), 1);
        assert_eq!(fallback_shows.load(Ordering::SeqCst), 0);

        tray.release();
        assert!(!tray.is_shown());
    }

    #[test]
    fn test_fallback_after_primary_fails() {
        let (primary, primary_shows) = CountingTray::boxed(true);
        let (fallback, fallback_shows) = CountingTray::boxed(false);
        let mut tray = FallbackTray::new(primary, fallback);

        tray.show().unwrap();
        assert!(tray.is_shown());
        tray.release();
        assert!(!tray.is_shown());

        // The failed primary is not retried
        tray.show().unwrap();
        assert_eq!(primary_shows.load(Ordering::SeqCst), 1);
        assert_eq!(fallback_shows.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_fallback_failure_is_reported() {
        let (primary, _) = CountingTray::boxed(true);
        let (fallback, _) = CountingTray::boxed(true);
        let mut tray = FallbackTray::new(primary, fallback);

        assert!(matches!(tray.show(), Err(TrayError::Unavailable(_))));
        assert!(!tray.is_shown());
    }
}

//! Console commands
//!
//! Every line typed into the console frontend becomes one [`UserCommand`],
//! the text-mode equivalent of the window's buttons and fields.

use crate::tray::TrayCommand;

/// Help text listing every command
pub const HELP: &str = "\
Commands:
  url <text>        set the DDNS URL field
  interval <text>   set the interval field (minutes)
  save              save the fields to the config file
  start             start the agent
  pause             stop the agent without exiting
  minimize          minimize to the tray
  open              restore the window from the tray
  exit              stop the agent and quit
  show              show the fields and agent state
  help              show this help";

/// A user action entered on the console
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// Replace the URL field
    SetUrl(String),
    /// Replace the interval field
    SetInterval(String),
    Save,
    Start,
    Pause,
    Minimize,
    /// A tray menu entry
    Tray(TrayCommand),
    Show,
    Help,
    /// Blank input
    Nothing,
    /// Anything not understood
    Unknown(String),
}

impl UserCommand {
    /// Parses one input line
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_ascii_lowercase().as_str() {
            "" => UserCommand::Nothing,
            "url" => UserCommand::SetUrl(rest.to_string()),
            "interval" => UserCommand::SetInterval(rest.to_string()),
            "save" => UserCommand::Save,
            "start" => UserCommand::Start,
            "pause" | "stop" => UserCommand::Pause,
            "minimize" | "min" => UserCommand::Minimize,
            "quit" => UserCommand::Tray(TrayCommand::Exit),
            "help" | "?" => UserCommand::Help,
            "show" | "status" => UserCommand::Show,
            other => match TrayCommand::from_label(other) {
                Some(cmd) => UserCommand::Tray(cmd),
                None => UserCommand::Unknown(line.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fields() {
        assert_eq!(
            UserCommand::parse("url https://dyn.example.com/update?h=home&t=x"),
            UserCommand::SetUrl("https://dyn.example.com/update?h=home&t=x".into())
        );
        assert_eq!(
            UserCommand::parse("  interval   10  "),
            UserCommand::SetInterval("10".into())
        );
        assert_eq!(UserCommand::parse("url"), UserCommand::SetUrl(String::new()));
    }

    #[test]
    fn test_parse_buttons() {
        assert_eq!(UserCommand::parse("save"), UserCommand::Save);
        assert_eq!(UserCommand::parse("START"), UserCommand::Start);
        assert_eq!(UserCommand::parse("pause"), UserCommand::Pause);
        assert_eq!(UserCommand::parse("minimize"), UserCommand::Minimize);
        assert_eq!(UserCommand::parse("show"), UserCommand::Show);
        assert_eq!(UserCommand::parse("help"), UserCommand::Help);
    }

    #[test]
    fn test_parse_tray_entries() {
        assert_eq!(
            UserCommand::parse("open"),
            UserCommand::Tray(TrayCommand::Open)
        );
        assert_eq!(
            UserCommand::parse("exit"),
            UserCommand::Tray(TrayCommand::Exit)
        );
        assert_eq!(
            UserCommand::parse("quit"),
            UserCommand::Tray(TrayCommand::Exit)
        );
    }

    #[test]
    fn test_parse_blank_and_unknown() {
        assert_eq!(UserCommand::parse("   "), UserCommand::Nothing);
        assert_eq!(
            UserCommand::parse("reboot now"),
            UserCommand::Unknown("reboot now".into())
        );
    }
}

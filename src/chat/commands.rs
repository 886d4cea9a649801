//! Slash command parsing for the chat application.
//!
//! Input starting with `/` controls the session instead of being sent to
//! the backend as a turn.

use crate::types::{ChatType, Role};

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Upload a document and start a session.
    Init {
        /// Path to the document.
        pdf: String,
        /// Role to play; the configured role when absent.
        role: Option<Role>,
    },

    /// Set the chat type used for subsequent turns.
    Mode(ChatType),

    /// Show the current chat type.
    ShowMode,

    /// Reprint the whole transcript.
    History,

    /// Save the transcript to a specific file immediately.
    Save(String),

    /// Drop the current session.
    Reset,

    /// Display session statistics.
    Stats,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be sent as a turn.
///
/// # Examples
///
/// ```
/// # use defacto::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/mode feedback").is_some());
/// assert!(parse_command("Objection, your honor!").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "init" | "start" => parse_init(argument),
        "mode" => match argument {
            Some(arg) => match arg.parse::<ChatType>() {
                Ok(chat_type) => ChatCommand::Mode(chat_type),
                Err(_) => {
                    ChatCommand::Invalid("/mode expects 'simulate' or 'feedback'".to_string())
                }
            },
            None => ChatCommand::ShowMode,
        },
        "feedback" => ChatCommand::Mode(ChatType::Feedback),
        "simulate" => ChatCommand::Mode(ChatType::Simulate),
        "history" | "transcript" => ChatCommand::History,
        "save" => match argument {
            Some(arg) => ChatCommand::Save(arg.to_string()),
            None => ChatCommand::Invalid("/save requires a file path".to_string()),
        },
        "reset" => ChatCommand::Reset,
        "stats" | "status" => ChatCommand::Stats,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

fn parse_init(argument: Option<&str>) -> ChatCommand {
    let Some(arg) = argument else {
        return ChatCommand::Invalid("/init requires a PDF path".to_string());
    };

    // The role, if any, is the last word; paths may contain spaces.
    if let Some((pdf, last)) = arg.rsplit_once(' ')
        && let Ok(role) = last.parse::<Role>()
    {
        return ChatCommand::Init {
            pdf: pdf.trim().to_string(),
            role: Some(role),
        };
    }
    ChatCommand::Init {
        pdf: arg.to_string(),
        role: None,
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /init <pdf> [DA|PA]    Upload a case document and start a session
  /mode simulate|feedback
                         Route turns to the simulation or to the tutor
  /mode                  Show the current mode
  /history               Reprint the transcript
  /save <file>           Save the transcript immediately
  /reset                 Drop the current session
  /stats                 Show session statistics
  /help                  Show this help message
  /quit                  Exit the chat"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /quit  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_mode() {
        assert_eq!(
            parse_command("/mode feedback"),
            Some(ChatCommand::Mode(ChatType::Feedback))
        );
        assert_eq!(
            parse_command("/MODE Simulate"),
            Some(ChatCommand::Mode(ChatType::Simulate))
        );
        assert_eq!(parse_command("/mode"), Some(ChatCommand::ShowMode));
        assert_eq!(
            parse_command("/feedback"),
            Some(ChatCommand::Mode(ChatType::Feedback))
        );
        assert!(matches!(
            parse_command("/mode analyze"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("expects")
        ));
    }

    #[test]
    fn parse_init() {
        assert_eq!(
            parse_command("/init case.pdf"),
            Some(ChatCommand::Init {
                pdf: "case.pdf".to_string(),
                role: None,
            })
        );
        assert_eq!(
            parse_command("/init case files/state v doe.pdf PA"),
            Some(ChatCommand::Init {
                pdf: "case files/state v doe.pdf".to_string(),
                role: Some(Role::ProsecutingAttorney),
            })
        );
        assert_eq!(
            parse_command("/init"),
            Some(ChatCommand::Invalid("/init requires a PDF path".to_string()))
        );
    }

    #[test]
    fn parse_save_and_history() {
        assert_eq!(
            parse_command("/save trial.json"),
            Some(ChatCommand::Save("trial.json".to_string()))
        );
        assert!(matches!(
            parse_command("/save"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("requires")
        ));
        assert_eq!(parse_command("/history"), Some(ChatCommand::History));
        assert_eq!(parse_command("/reset"), Some(ChatCommand::Reset));
        assert_eq!(parse_command("/stats"), Some(ChatCommand::Stats));
    }

    #[test]
    fn unknown_command() {
        assert_eq!(
            parse_command("/objection"),
            Some(ChatCommand::Invalid("Unknown command: /objection".to_string()))
        );
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("Objection, your honor!"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("  "), None);
    }

    #[test]
    fn help_text_not_empty() {
        let help = help_text();
        assert!(help.contains("/quit"));
        assert!(help.contains("/mode"));
        assert!(help.contains("/init"));
    }
}

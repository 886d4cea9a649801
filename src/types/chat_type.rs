use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Per-turn mode selecting which endpoint a turn is routed to.
///
/// The chat type affects routing only; replies land in the transcript the
/// same way regardless of mode.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatType {
    /// Continue the conversation with the backend's agents.
    #[default]
    Simulate,

    /// Ask the tutor for feedback on the user's performance so far.
    Feedback,
}

impl fmt::Display for ChatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatType::Simulate => write!(f, "simulate"),
            ChatType::Feedback => write!(f, "feedback"),
        }
    }
}

/// Error returned when parsing an invalid chat type string.
#[derive(Debug)]
pub struct ChatTypeParseError {
    /// The invalid string value that could not be parsed.
    pub invalid_value: String,
}

impl fmt::Display for ChatTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown chat type: {}", self.invalid_value)
    }
}

impl std::error::Error for ChatTypeParseError {}

impl FromStr for ChatType {
    type Err = ChatTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simulate" | "sim" => Ok(ChatType::Simulate),
            "feedback" | "fb" => Ok(ChatType::Feedback),
            _ => Err(ChatTypeParseError {
                invalid_value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_simulate() {
        assert_eq!(ChatType::default(), ChatType::Simulate);
    }

    #[test]
    fn parse_and_display() {
        assert_eq!("feedback".parse::<ChatType>().unwrap(), ChatType::Feedback);
        assert_eq!(" Simulate ".parse::<ChatType>().unwrap(), ChatType::Simulate);
        assert!("analyze".parse::<ChatType>().is_err());
        assert_eq!(ChatType::Feedback.to_string(), "feedback");
    }
}

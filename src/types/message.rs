use serde::{Deserialize, Serialize};

/// Sender label for turns typed by the user.
pub const USER_SENDER: &str = "You";

/// Sender label the backend gives its tutor (feedback and analysis) agent.
pub const FEEDBACK_AGENT_SENDER: &str = "Tutor Donny Defacto";

/// Sender label used when the backend names no speaker.
pub const UNKNOWN_SENDER: &str = "Unknown";

/// A message in the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    /// Who said it: `"You"` for user turns, otherwise the backend's agent label.
    pub sender: String,

    /// What was said.
    pub content: String,
}

impl Message {
    /// Creates a new message.
    pub fn new(sender: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            content: content.into(),
        }
    }

    /// Creates a message labelled as the user's own turn.
    pub fn from_user(content: impl Into<String>) -> Self {
        Self::new(USER_SENDER, content)
    }

    /// Returns true if this message is the user's own turn.
    pub fn is_from_user(&self) -> bool {
        self.sender == USER_SENDER
    }
}

/// A message as the backend sends it: `{ "name": ..., "content": ... }`.
///
/// The backend emits `null` for speakers it cannot label, and occasionally
/// omits content for non-text turns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    /// Speaker label.
    #[serde(default)]
    pub name: Option<String>,

    /// Text of the message.
    #[serde(default)]
    pub content: Option<String>,
}

impl WireMessage {
    /// Creates a wire message with both fields set.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            content: Some(content.into()),
        }
    }
}

impl From<WireMessage> for Message {
    fn from(wire: WireMessage) -> Self {
        Message {
            sender: wire
                .name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| UNKNOWN_SENDER.to_string()),
            content: wire.content.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_maps_name_to_sender() {
        let wire: WireMessage =
            serde_json::from_str(r#"{"name": "Judge", "content": "Begin."}"#).unwrap();
        let message = Message::from(wire);
        assert_eq!(message, Message::new("Judge", "Begin."));
    }

    #[test]
    fn null_name_maps_to_unknown() {
        let wire: WireMessage =
            serde_json::from_str(r#"{"name": null, "content": "Order."}"#).unwrap();
        let message = Message::from(wire);
        assert_eq!(message.sender, UNKNOWN_SENDER);
        assert_eq!(message.content, "Order.");
    }

    #[test]
    fn missing_content_is_empty() {
        let wire: WireMessage = serde_json::from_str(r#"{"name": "Witness"}"#).unwrap();
        assert_eq!(Message::from(wire).content, "");
    }

    #[test]
    fn extra_wire_fields_ignored() {
        let wire: WireMessage = serde_json::from_str(
            r#"{"name": "Judge", "content": "Sustained.", "role": "user"}"#,
        )
        .unwrap();
        assert_eq!(wire, WireMessage::new("Judge", "Sustained."));
    }

    #[test]
    fn user_messages() {
        let message = Message::from_user("Objection");
        assert!(message.is_from_user());
        assert_eq!(message.sender, "You");
        assert!(!Message::new("Judge", "Overruled.").is_from_user());
    }
}

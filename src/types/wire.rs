//! Request and response bodies exchanged with the backend.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Message, SessionId, WireMessage};

/// Body of a successful initialize call.
///
/// Both fields are optional on the wire so that a partial body can be
/// reported as malformed instead of failing deserialization outright.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InitializeResponse {
    /// Identifier of the newly created session.
    #[serde(default)]
    pub session_id: Option<String>,

    /// The opening transcript.
    #[serde(default)]
    pub response: Option<Vec<WireMessage>>,
}

impl InitializeResponse {
    /// Checks that both fields are present and maps the opening transcript.
    pub fn into_session(self) -> Result<(SessionId, Vec<Message>)> {
        let session_id = self
            .session_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::malformed_response("initialize response has no session_id"))?;
        let messages = self
            .response
            .ok_or_else(|| Error::malformed_response("initialize response has no response"))?;
        Ok((
            SessionId::new(session_id),
            messages.into_iter().map(Message::from).collect(),
        ))
    }
}

/// Body of a turn request (continue or feedback).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRequest {
    /// Session the turn belongs to.
    pub session_id: SessionId,

    /// What the user typed.
    pub user_message: String,
}

impl TurnRequest {
    /// Creates a new turn request.
    pub fn new(session_id: SessionId, user_message: impl Into<String>) -> Self {
        Self {
            session_id,
            user_message: user_message.into(),
        }
    }
}

/// Body of a successful turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnResponse {
    /// The backend's reply messages, in order.
    #[serde(default)]
    pub response: Option<Vec<WireMessage>>,
}

impl TurnResponse {
    /// Checks that the reply list is present and maps it.
    pub fn into_messages(self) -> Result<Vec<Message>> {
        let messages = self
            .response
            .ok_or_else(|| Error::malformed_response("turn response has no response"))?;
        Ok(messages.into_iter().map(Message::from).collect())
    }
}

/// Body the backend returns alongside a non-success status.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Picks the most useful message out of an error body, falling back to
    /// the raw text.
    pub fn message(body: &str) -> String {
        let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) else {
            return body.to_string();
        };
        if let Some(error) = parsed.error {
            return error;
        }
        match parsed.detail {
            Some(serde_json::Value::String(detail)) => detail,
            Some(detail) => detail.to_string(),
            None => body.to_string(),
        }
    }

    /// Returns the backend's own `error` text, if the body carries one.
    ///
    /// Framework-generated errors (an unknown route, for instance) use
    /// `detail` instead and yield `None`.
    pub fn backend_error(body: &str) -> Option<String> {
        serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|parsed| parsed.error)
    }
}

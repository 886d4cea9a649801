use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend-issued session identifier.
///
/// Opaque to the client; it is only echoed back on every turn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps a session identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transparent_serialization() {
        let id = SessionId::new("3f2a");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""3f2a""#);
        let parsed: SessionId = serde_json::from_str(r#""3f2a""#).unwrap();
        assert_eq!(parsed, id);
    }
}

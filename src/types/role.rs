use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The courtroom role the user plays for the lifetime of a session.
///
/// On the wire a role is its two-letter code (`DA` or `PA`), sent as the
/// `role` field of the multipart initialize request.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Defense attorney (`DA`).
    #[default]
    #[serde(rename = "DA")]
    DefenseAttorney,

    /// Prosecuting attorney (`PA`).
    #[serde(rename = "PA")]
    ProsecutingAttorney,
}

impl Role {
    /// Returns the wire code for this role.
    pub fn code(&self) -> &'static str {
        match self {
            Role::DefenseAttorney => "DA",
            Role::ProsecutingAttorney => "PA",
        }
    }

    /// Returns the human-readable name for this role.
    pub fn description(&self) -> &'static str {
        match self {
            Role::DefenseAttorney => "Defense Attorney",
            Role::ProsecutingAttorney => "Prosecuting Attorney",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Error returned when parsing an invalid role string.
#[derive(Debug)]
pub struct RoleParseError {
    /// The invalid string value that could not be parsed.
    pub invalid_value: String,
}

impl fmt::Display for RoleParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown role: {} (expected DA or PA)",
            self.invalid_value
        )
    }
}

impl std::error::Error for RoleParseError {}

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "da" | "defense" | "defense attorney" => Ok(Role::DefenseAttorney),
            "pa" | "prosecution" | "prosecutor" | "prosecuting attorney" => {
                Ok(Role::ProsecutingAttorney)
            }
            _ => Err(RoleParseError {
                invalid_value: s.to_string(),
            }),
        }
    }
}

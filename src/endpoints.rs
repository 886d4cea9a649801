//! Endpoint selection.
//!
//! The backend exposes the same initialize/continue pair under several
//! prefixes, plus a feedback route on the simulation flow. Which paths a
//! client talks to is configuration, captured by [`Endpoints`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::types::ChatType;

/// The backend flows a session can be created on.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    /// Discuss a legal document with the tutor (`/initialize`, `/continue`).
    Analyze,

    /// Run a mock trial (`/simulation/initialize`, `/simulation/continue`,
    /// `/simulation/feedback`).
    #[default]
    Simulate,

    /// Document analysis under its own prefix (`/analysis/initialize`,
    /// `/analysis/continue`).
    Analysis,
}

impl Flow {
    /// Returns the endpoint set for this flow.
    pub fn endpoints(&self) -> Endpoints {
        Endpoints::for_flow(*self)
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flow::Analyze => write!(f, "analyze"),
            Flow::Simulate => write!(f, "simulate"),
            Flow::Analysis => write!(f, "analysis"),
        }
    }
}

/// Error returned when parsing an invalid flow string.
#[derive(Debug)]
pub struct FlowParseError {
    /// The invalid string value that could not be parsed.
    pub invalid_value: String,
}

impl fmt::Display for FlowParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown flow: {} (expected analyze, simulate, or analysis)",
            self.invalid_value
        )
    }
}

impl std::error::Error for FlowParseError {}

impl FromStr for Flow {
    type Err = FlowParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "analyze" => Ok(Flow::Analyze),
            "simulate" | "simulation" => Ok(Flow::Simulate),
            "analysis" => Ok(Flow::Analysis),
            _ => Err(FlowParseError {
                invalid_value: s.to_string(),
            }),
        }
    }
}

/// Paths, relative to the backend's base URL, for one flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    /// Multipart session creation.
    pub initialize: String,

    /// JSON turn for [`ChatType::Simulate`].
    #[serde(rename = "continue")]
    pub continue_turn: String,

    /// JSON turn for [`ChatType::Feedback`], if the flow has one.
    #[serde(default)]
    pub feedback: Option<String>,
}

impl Endpoints {
    /// Returns the stock endpoints for a flow.
    pub fn for_flow(flow: Flow) -> Self {
        match flow {
            Flow::Analyze => Self::new("initialize", "continue", None),
            Flow::Simulate => Self::new(
                "simulation/initialize",
                "simulation/continue",
                Some("simulation/feedback"),
            ),
            Flow::Analysis => Self::new("analysis/initialize", "analysis/continue", None),
        }
    }

    /// Creates a custom endpoint set. Leading slashes are stripped so the
    /// paths always resolve under the base URL.
    pub fn new(initialize: &str, continue_turn: &str, feedback: Option<&str>) -> Self {
        Self {
            initialize: relative(initialize),
            continue_turn: relative(continue_turn),
            feedback: feedback.map(relative),
        }
    }

    /// Returns true if turns may be routed to a feedback endpoint.
    pub fn supports_feedback(&self) -> bool {
        self.feedback.is_some()
    }

    /// Picks the endpoint a turn of the given type is sent to.
    ///
    /// # Errors
    ///
    /// Returns a validation error for feedback turns on a flow without a
    /// feedback route.
    pub fn turn(&self, chat_type: ChatType) -> Result<&str> {
        match chat_type {
            ChatType::Simulate => Ok(&self.continue_turn),
            ChatType::Feedback => self.feedback.as_deref().ok_or_else(|| {
                Error::validation(
                    "feedback is not available on this flow",
                    Some("chat_type".to_string()),
                )
            }),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::for_flow(Flow::default())
    }
}

fn relative(path: &str) -> String {
    path.trim_start_matches('/').to_string()
}

//! Client for the DeFacto session chat protocol.
//!
//! A client uploads a case document and a role to create a backend session,
//! then exchanges turns under that session until the user stops. See
//! [`SessionController`] for the state machine and [`DeFacto`] for the HTTP
//! transport.

// Public modules
pub mod backend;
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod controller;
pub mod endpoints;
pub mod error;
pub mod observability;
pub mod render;
pub mod types;
pub mod utils;

// Re-exports
pub use backend::Backend;
pub use client::DeFacto;
pub use client_logger::{ExchangeLogger, StderrLogger};
pub use controller::{ActiveSession, SessionController, SessionState, SessionStats, TurnOutcome};
pub use endpoints::{Endpoints, Flow, FlowParseError};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use render::{PlainTextRenderer, Renderer, SenderStyle, format_message, render_messages};
pub use types::*;

//! Logging trait for DeFacto client operations.
//!
//! This module provides the [`ExchangeLogger`] trait that allows users to
//! capture every protocol exchange passing through the [`DeFacto`] client.
//!
//! [`DeFacto`]: crate::DeFacto

use std::io::Write;

use crate::error::Error;
use crate::types::{Document, InitializeResponse, Role, TurnRequest, TurnResponse};

/// A trait for logging DeFacto client operations.
///
/// # Example
///
/// ```rust,ignore
/// use defacto::{ExchangeLogger, TurnRequest, TurnResponse};
///
/// struct CountingLogger(std::sync::atomic::AtomicU64);
///
/// impl ExchangeLogger for CountingLogger {
///     fn log_turn(&self, _: &str, _: &TurnRequest, _: &TurnResponse) {
///         self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
///     }
///     // ...
/// }
/// ```
pub trait ExchangeLogger: Send + Sync {
    /// Log a successful initialize call.
    ///
    /// Called once per session with the raw response before it is validated,
    /// so partial responses are visible here too.
    fn log_initialize(
        &self,
        url: &str,
        document: &Document,
        role: Role,
        response: &InitializeResponse,
    );

    /// Log a successful turn (continue or feedback).
    fn log_turn(&self, url: &str, request: &TurnRequest, response: &TurnResponse);

    /// Log a failed request.
    fn log_error(&self, url: &str, error: &Error);
}

/// Writes one line per exchange to standard error.
#[derive(Debug, Default)]
pub struct StderrLogger;

impl StderrLogger {
    fn write_line(&self, line: &str) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{line}");
    }
}

impl ExchangeLogger for StderrLogger {
    fn log_initialize(
        &self,
        url: &str,
        document: &Document,
        role: Role,
        response: &InitializeResponse,
    ) {
        self.write_line(&format!(
            "[defacto] POST {url} pdf={} ({} bytes) role={role} -> session_id={} messages={}",
            document.file_name(),
            document.len(),
            response.session_id.as_deref().unwrap_or("<missing>"),
            response
                .response
                .as_ref()
                .map(|messages| messages.len().to_string())
                .unwrap_or_else(|| "<missing>".to_string()),
        ));
    }

    fn log_turn(&self, url: &str, request: &TurnRequest, response: &TurnResponse) {
        self.write_line(&format!(
            "[defacto] POST {url} session_id={} chars={} -> messages={}",
            request.session_id,
            request.user_message.chars().count(),
            response
                .response
                .as_ref()
                .map(|messages| messages.len().to_string())
                .unwrap_or_else(|| "<missing>".to_string()),
        ));
    }

    fn log_error(&self, url: &str, error: &Error) {
        self.write_line(&format!("[defacto] POST {url} failed: {error}"));
    }
}

//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg`, an optional YAML
//! config file, and the resolved [`ChatConfig`]. Command-line values win
//! over file values, which win over defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use arrrg_derive::CommandLine;
use serde::{Deserialize, Serialize};

use crate::client::{BASE_URL_ENV, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::endpoints::{Endpoints, Flow};
use crate::error::{Error, Result};
use crate::types::Role;

/// Command-line arguments for the defacto-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Backend base URL.
    #[arrrg(optional, "Backend base URL (default: http://localhost:8000/)", "URL")]
    pub base_url: Option<String>,

    /// Which backend flow to use.
    #[arrrg(optional, "Flow: analyze, simulate, analysis (default: simulate)", "FLOW")]
    pub flow: Option<String>,

    /// Role to play.
    #[arrrg(optional, "Role: DA or PA (default: DA)", "ROLE")]
    pub role: Option<String>,

    /// Case document to upload at startup.
    #[arrrg(optional, "PDF to upload when the session starts", "PDF")]
    pub pdf: Option<String>,

    /// Per-request timeout.
    #[arrrg(optional, "Request timeout in seconds (default: 300)", "SECONDS")]
    pub timeout: Option<u64>,

    /// YAML file with defaults for the options above.
    #[arrrg(optional, "YAML config file", "FILE")]
    pub config: Option<String>,

    /// Path to auto-save the transcript after each turn.
    #[arrrg(optional, "Auto-save the transcript to FILE after each turn", "FILE")]
    pub transcript: Option<String>,

    /// Log every exchange to stderr.
    #[arrrg(flag, "Log every request to stderr")]
    pub verbose: bool,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Settings read from a YAML config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Backend base URL.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Flow to use.
    #[serde(default)]
    pub flow: Option<Flow>,
    /// Role to play.
    #[serde(default)]
    pub role: Option<Role>,
    /// Case document to upload at startup.
    #[serde(default)]
    pub pdf: Option<PathBuf>,
    /// Request timeout in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Endpoint paths overriding the flow's defaults.
    #[serde(default)]
    pub endpoints: Option<Endpoints>,
    /// Transcript auto-save path.
    #[serde(default)]
    pub transcript: Option<PathBuf>,
    /// Whether to use ANSI styling.
    #[serde(default)]
    pub color: Option<bool>,
}

impl ConfigFile {
    /// Reads a config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| {
            Error::io(format!("failed to read config {}", path.display()), err)
        })?;
        Ok(serde_yaml::from_str(&content)?)
    }
}

/// Configuration for a chat session.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// Backend base URL.
    pub base_url: String,

    /// Flow sessions are created on.
    pub flow: Flow,

    /// Endpoint paths; the flow's defaults unless overridden.
    pub endpoints: Endpoints,

    /// Role to play.
    pub role: Role,

    /// Case document to upload at startup, if any.
    pub pdf: Option<PathBuf>,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Path to persist transcripts automatically after each turn.
    pub transcript_path: Option<PathBuf>,

    /// Whether to log exchanges to stderr.
    pub verbose: bool,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Base URL: DEFACTO_BASE_URL, else http://localhost:8000/
    /// - Flow: simulate
    /// - Role: DA
    /// - Timeout: 300 seconds
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            base_url: std::env::var(BASE_URL_ENV)
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            flow: Flow::default(),
            endpoints: Flow::default().endpoints(),
            role: Role::default(),
            pdf: None,
            timeout: DEFAULT_TIMEOUT,
            transcript_path: None,
            verbose: false,
            use_color: true,
        }
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the flow and resets the endpoints to that flow's defaults.
    pub fn with_flow(mut self, flow: Flow) -> Self {
        self.flow = flow;
        self.endpoints = flow.endpoints();
        self
    }

    /// Overrides the endpoint paths.
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Sets the role.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Sets the document uploaded at startup.
    pub fn with_pdf(mut self, pdf: Option<PathBuf>) -> Self {
        self.pdf = pdf;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the transcript auto-save path.
    pub fn with_transcript_path(mut self, path: Option<PathBuf>) -> Self {
        self.transcript_path = path;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Layers a config file over these settings.
    pub fn merge_file(mut self, file: ConfigFile) -> Self {
        if let Some(base_url) = file.base_url {
            self.base_url = base_url;
        }
        if let Some(flow) = file.flow {
            self = self.with_flow(flow);
        }
        if let Some(endpoints) = file.endpoints {
            self.endpoints = endpoints;
        }
        if let Some(role) = file.role {
            self.role = role;
        }
        if file.pdf.is_some() {
            self.pdf = file.pdf;
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if file.transcript.is_some() {
            self.transcript_path = file.transcript;
        }
        if let Some(color) = file.color {
            self.use_color = color;
        }
        self
    }

    /// Resolves command-line arguments, reading `--config` if given.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read, if `--flow` or
    /// `--role` does not parse, or if the resolved timeout is zero.
    pub fn from_args(args: ChatArgs) -> Result<Self> {
        let mut config = ChatConfig::new();
        let mut file_endpoints = None;
        if let Some(path) = &args.config {
            let file = ConfigFile::from_file(path)?;
            file_endpoints = file.endpoints.clone();
            config = config.merge_file(file);
        }
        if let Some(base_url) = args.base_url {
            config.base_url = base_url;
        }
        if let Some(flow) = args.flow {
            let flow = flow
                .parse::<Flow>()
                .map_err(|err| Error::validation(err.to_string(), Some("flow".to_string())))?;
            config = config.with_flow(flow);
            // Routes named in the file outlive the flow's defaults.
            if let Some(endpoints) = file_endpoints {
                config.endpoints = endpoints;
            }
        }
        if let Some(role) = args.role {
            config.role = role
                .parse::<Role>()
                .map_err(|err| Error::validation(err.to_string(), Some("role".to_string())))?;
        }
        if let Some(pdf) = args.pdf {
            config.pdf = Some(PathBuf::from(pdf));
        }
        if let Some(secs) = args.timeout {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(path) = args.transcript {
            config.transcript_path = Some(PathBuf::from(path));
        }
        if config.timeout.is_zero() {
            return Err(Error::validation(
                "timeout must be at least one second",
                Some("timeout".to_string()),
            ));
        }
        config.verbose = args.verbose;
        if args.no_color {
            config.use_color = false;
        }
        Ok(config)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

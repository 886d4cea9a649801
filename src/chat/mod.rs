//! Building blocks for the interactive `defacto-chat` client.
//!
//! - [`config`]: CLI argument parsing, YAML config files, resolved settings
//! - [`commands`]: Slash command parsing

mod commands;
mod config;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig, ConfigFile};

// Public modules
pub mod chat_type;
pub mod document;
pub mod message;
pub mod role;
pub mod session_id;
pub mod transcript;
pub mod wire;

// Re-exports
pub use chat_type::{ChatType, ChatTypeParseError};
pub use document::{Document, PDF_MEDIA_TYPE};
pub use message::{FEEDBACK_AGENT_SENDER, Message, UNKNOWN_SENDER, USER_SENDER, WireMessage};
pub use role::{Role, RoleParseError};
pub use session_id::SessionId;
pub use transcript::{Transcript, TranscriptFile};
pub use wire::{InitializeResponse, TurnRequest, TurnResponse};

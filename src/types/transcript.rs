use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{from_reader, to_writer_pretty};
use time::OffsetDateTime;

use crate::endpoints::Flow;
use crate::error::{Error, Result};
use crate::types::{Message, Role, SessionId};

/// Ordered, append-only list of everything said in a session.
///
/// Messages are never edited or reordered once appended. A user turn and the
/// backend's replies to it are appended together so a failed exchange leaves
/// no trace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
    turns: u64,
}

impl Transcript {
    /// Creates an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transcript seeded with the backend's opening messages.
    pub fn seeded(messages: Vec<Message>) -> Self {
        Self { messages, turns: 0 }
    }

    /// Appends a completed turn: the user's message, then every reply in order.
    pub fn push_turn(&mut self, user_message: impl Into<String>, replies: Vec<Message>) {
        self.messages.reserve(replies.len() + 1);
        self.messages.push(Message::from_user(user_message));
        self.messages.extend(replies);
        self.turns = self.turns.saturating_add(1);
    }

    /// Returns the messages in transcript order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Iterates over the messages in transcript order.
    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    /// Returns the number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if there are no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns the number of completed user turns.
    pub fn turns(&self) -> u64 {
        self.turns
    }

    /// Returns the messages appended at or after `index`.
    pub fn since(&self, index: usize) -> &[Message] {
        self.messages.get(index..).unwrap_or(&[])
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

/// On-disk form of a saved transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptFile {
    /// Format version.
    pub version: u8,
    /// Session the transcript belongs to.
    pub session_id: SessionId,
    /// Flow the session was created on.
    pub flow: Flow,
    /// Role the user played.
    pub role: Role,
    /// When the file was written.
    #[serde(with = "crate::utils::time")]
    pub saved_at: OffsetDateTime,
    /// The transcript itself.
    pub messages: Vec<Message>,
}

impl TranscriptFile {
    const VERSION: u8 = 1;

    /// Snapshots a transcript for saving.
    pub fn new(session_id: &SessionId, flow: Flow, role: Role, transcript: &Transcript) -> Self {
        Self {
            version: Self::VERSION,
            session_id: session_id.clone(),
            flow,
            role,
            saved_at: OffsetDateTime::now_utc(),
            messages: transcript.messages().to_vec(),
        }
    }

    /// Writes the file as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())
            .map_err(|err| Error::io("failed to create transcript file", err))?;
        let mut writer = BufWriter::new(file);
        to_writer_pretty(&mut writer, self).map_err(|err| {
            Error::serialization("failed to serialize transcript", Some(Box::new(err)))
        })?;
        writer
            .flush()
            .map_err(|err| Error::io("failed to write transcript file", err))
    }

    /// Reads a previously saved file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())
            .map_err(|err| Error::io("failed to open transcript file", err))?;
        let reader = BufReader::new(file);
        let transcript: TranscriptFile = from_reader(reader).map_err(|err| {
            Error::serialization("failed to parse transcript", Some(Box::new(err)))
        })?;
        if transcript.version != Self::VERSION {
            return Err(Error::validation(
                format!("unsupported transcript version {}", transcript.version),
                Some("version".to_string()),
            ));
        }
        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_turn_appends_user_then_replies() {
        let mut transcript = Transcript::seeded(vec![Message::new("Judge", "Begin.")]);
        transcript.push_turn("Objection", vec![Message::new("Judge", "Overruled.")]);

        assert_eq!(
            transcript.messages(),
            &[
                Message::new("Judge", "Begin."),
                Message::new("You", "Objection"),
                Message::new("Judge", "Overruled."),
            ]
        );
        assert_eq!(transcript.turns(), 1);
    }

    #[test]
    fn push_turn_with_no_replies() {
        let mut transcript = Transcript::new();
        transcript.push_turn("Hello?", Vec::new());
        assert_eq!(transcript.len(), 1);
        assert!(transcript.messages()[0].is_from_user());
    }

    #[test]
    fn since_returns_tail() {
        let mut transcript = Transcript::seeded(vec![Message::new("Judge", "Begin.")]);
        let mark = transcript.len();
        transcript.push_turn("Objection", vec![Message::new("Judge", "Overruled.")]);
        assert_eq!(transcript.since(mark).len(), 2);
        assert!(transcript.since(100).is_empty());
    }

    #[test]
    fn transcript_file_save_and_load() {
        let mut transcript = Transcript::seeded(vec![Message::new("Judge", "Begin.")]);
        transcript.push_turn("Objection", vec![Message::new("Judge", "Overruled.")]);
        let file = TranscriptFile::new(
            &SessionId::new("s1"),
            Flow::Simulate,
            Role::ProsecutingAttorney,
            &transcript,
        );

        let path = std::env::temp_dir().join(format!(
            "defacto-transcript-{}.json",
            std::process::id()
        ));
        file.save(&path).unwrap();
        let loaded = TranscriptFile::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.session_id.as_str(), "s1");
        assert_eq!(loaded.flow, Flow::Simulate);
        assert_eq!(loaded.role, Role::ProsecutingAttorney);
        assert_eq!(loaded.messages, transcript.messages());
        assert_eq!(loaded.saved_at.unix_timestamp(), file.saved_at.unix_timestamp());
    }

    #[test]
    fn transcript_file_save_reports_write_failure() {
        // Writes to /dev/full fail with ENOSPC once the buffer is flushed.
        let full = Path::new("/dev/full");
        if !full.exists() {
            eprintln!("Skipping test: /dev/full not available");
            return;
        }
        let transcript = Transcript::seeded(vec![Message::new("Judge", "Begin.")]);
        let file = TranscriptFile::new(
            &SessionId::new("s1"),
            Flow::Simulate,
            Role::DefenseAttorney,
            &transcript,
        );
        let err = file.save(full).unwrap_err();
        assert!(matches!(err, Error::Io { .. }), "{err:?}");
    }

    #[test]
    fn transcript_file_rejects_unknown_version() {
        let path = std::env::temp_dir().join(format!(
            "defacto-transcript-v9-{}.json",
            std::process::id()
        ));
        std::fs::write(
            &path,
            r#"{"version": 9, "session_id": "s1", "flow": "simulate", "role": "DA",
                "saved_at": "2024-10-01T12:00:00Z", "messages": []}"#,
        )
        .unwrap();
        let err = TranscriptFile::load(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(err.is_validation());
    }
}

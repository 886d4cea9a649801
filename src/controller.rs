//! The session controller.
//!
//! A [`SessionController`] owns the one piece of mutable state a DeFacto
//! client has: whether a session exists, and if so its identifier and
//! transcript. It moves between two states:
//!
//! ```text
//! NoSession --initialize--> Active{session_id, transcript} --send--> Active{..., transcript'}
//! ```
//!
//! Every operation takes `&mut self`, so at most one request per controller
//! is ever in flight. State is only touched after a complete, valid response
//! arrives; dropping an in-flight future leaves the controller unchanged.

use std::path::Path;

use crate::backend::Backend;
use crate::endpoints::{Endpoints, Flow};
use crate::error::{Error, Result};
use crate::observability::{
    SESSION_FEEDBACK_TURNS, SESSION_INITIALIZE_ERRORS, SESSION_INITIALIZED,
    SESSION_REPLIES_PER_TURN, SESSION_TURN_ERRORS, SESSION_TURNS,
};
use crate::types::{
    ChatType, Document, Message, Role, SessionId, Transcript, TranscriptFile, TurnRequest,
};

/// Whether a session has been established.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing initialized yet, or the last session was reset.
    #[default]
    NoSession,
    /// A backend session is open.
    Active(ActiveSession),
}

/// An open session and everything said in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    /// Identifier the backend issued.
    pub session_id: SessionId,
    /// Role chosen at initialize time.
    pub role: Role,
    /// Transcript so far.
    pub transcript: Transcript,
}

/// What became of a call to [`SessionController::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Nothing was sent: no session is active or the draft was empty.
    Skipped,
    /// The turn round-tripped and was appended to the transcript.
    Completed {
        /// Index of the user's message in the transcript; the replies follow it.
        first_message: usize,
        /// Number of reply messages the backend returned.
        replies: usize,
    },
}

/// Aggregated stats for a controller.
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// Flow sessions are created on.
    pub flow: Flow,
    /// The active session, if any.
    pub session_id: Option<SessionId>,
    /// The active role, if any.
    pub role: Option<Role>,
    /// Messages in the active transcript.
    pub message_count: usize,
    /// Completed turns in the active session.
    pub turns: u64,
    /// Completed turns routed to the feedback endpoint.
    pub feedback_turns: u64,
    /// Requests that failed since the controller was created.
    pub failed_requests: u64,
}

/// Owns the session state and drives the protocol through a [`Backend`].
pub struct SessionController<B: Backend> {
    backend: B,
    flow: Flow,
    endpoints: Endpoints,
    state: SessionState,
    feedback_turns: u64,
    failed_requests: u64,
}

impl<B: Backend> SessionController<B> {
    /// Creates a controller using the stock endpoints for `flow`.
    pub fn new(backend: B, flow: Flow) -> Self {
        Self::with_endpoints(backend, flow, flow.endpoints())
    }

    /// Creates a controller with custom endpoint paths.
    pub fn with_endpoints(backend: B, flow: Flow, endpoints: Endpoints) -> Self {
        Self {
            backend,
            flow,
            endpoints,
            state: SessionState::NoSession,
            feedback_turns: 0,
            failed_requests: 0,
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Returns true if a session is open.
    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active(_))
    }

    /// Returns the open session's identifier.
    pub fn session_id(&self) -> Option<&SessionId> {
        self.active().map(|session| &session.session_id)
    }

    /// Returns the open session's role.
    pub fn role(&self) -> Option<Role> {
        self.active().map(|session| session.role)
    }

    /// Returns the open session's transcript.
    pub fn transcript(&self) -> Option<&Transcript> {
        self.active().map(|session| &session.transcript)
    }

    /// Returns the flow this controller creates sessions on.
    pub fn flow(&self) -> Flow {
        self.flow
    }

    /// Returns the endpoint paths in use.
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Returns the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn active(&self) -> Option<&ActiveSession> {
        match &self.state {
            SessionState::Active(session) => Some(session),
            SessionState::NoSession => None,
        }
    }

    /// Creates a session from a document and role.
    ///
    /// `role` defaults to [`Role::DefenseAttorney`]. On success the
    /// transcript is seeded with the backend's opening messages.
    ///
    /// # Errors
    ///
    /// - Validation error, with nothing sent, if `document` is `None` or a
    ///   session is already active.
    /// - Malformed-response error if the reply lacks `session_id` or
    ///   `response`.
    /// - Any transport or HTTP error from the backend.
    ///
    /// On error no session is established; retrying is safe.
    pub async fn initialize(
        &mut self,
        document: Option<&Document>,
        role: Option<Role>,
    ) -> Result<()> {
        if self.is_active() {
            return Err(Error::validation(
                "a session is already active; reset it first",
                None,
            ));
        }
        let Some(document) = document else {
            return Err(Error::validation(
                "Please upload a PDF file.",
                Some("pdf".to_string()),
            ));
        };
        let role = role.unwrap_or_default();

        let result = self
            .backend
            .initialize(&self.endpoints.initialize, document, role)
            .await
            .and_then(|response| response.into_session());
        let (session_id, messages) = match result {
            Ok(parts) => parts,
            Err(err) => {
                SESSION_INITIALIZE_ERRORS.click();
                self.failed_requests = self.failed_requests.saturating_add(1);
                return Err(err);
            }
        };

        SESSION_INITIALIZED.click();
        self.feedback_turns = 0;
        self.state = SessionState::Active(ActiveSession {
            session_id,
            role,
            transcript: Transcript::seeded(messages),
        });
        Ok(())
    }

    /// Sends the draft as one turn.
    ///
    /// Does nothing if no session is active or the draft is blank, where a
    /// draft of only whitespace counts as blank. Any other draft is sent
    /// verbatim, surrounding whitespace included. On success the user's
    /// message (labelled `"You"`) and every reply are appended in order, and
    /// the draft is cleared. On failure neither the transcript nor the draft
    /// is touched.
    ///
    /// # Errors
    ///
    /// - Validation error, with nothing sent, for a feedback turn on a flow
    ///   without a feedback route.
    /// - [`Error::SessionNotFound`] if the backend has forgotten the session.
    /// - Malformed-response, transport and HTTP errors.
    pub async fn send(&mut self, draft: &mut String, chat_type: ChatType) -> Result<TurnOutcome> {
        let SessionState::Active(session) = &mut self.state else {
            return Ok(TurnOutcome::Skipped);
        };
        if draft.trim().is_empty() {
            return Ok(TurnOutcome::Skipped);
        }
        let path = self.endpoints.turn(chat_type)?;

        let request = TurnRequest::new(session.session_id.clone(), draft.as_str());
        let result = self
            .backend
            .turn(path, &request)
            .await
            .and_then(|response| response.into_messages());
        let replies = match result {
            Ok(replies) => replies,
            Err(err) => {
                SESSION_TURN_ERRORS.click();
                self.failed_requests = self.failed_requests.saturating_add(1);
                return Err(err);
            }
        };

        SESSION_TURNS.click();
        SESSION_REPLIES_PER_TURN.add(replies.len() as f64);
        if chat_type == ChatType::Feedback {
            SESSION_FEEDBACK_TURNS.click();
            self.feedback_turns = self.feedback_turns.saturating_add(1);
        }

        let first_message = session.transcript.len();
        let reply_count = replies.len();
        session
            .transcript
            .push_turn(std::mem::take(draft), replies);
        Ok(TurnOutcome::Completed {
            first_message,
            replies: reply_count,
        })
    }

    /// Drops the open session, returning to [`SessionState::NoSession`].
    ///
    /// The backend is not told; its sessions expire on their own.
    pub fn reset(&mut self) -> Option<ActiveSession> {
        self.feedback_turns = 0;
        match std::mem::take(&mut self.state) {
            SessionState::Active(session) => Some(session),
            SessionState::NoSession => None,
        }
    }

    /// Returns the messages appended by a completed turn.
    pub fn turn_messages(&self, outcome: TurnOutcome) -> &[Message] {
        match (outcome, self.transcript()) {
            (TurnOutcome::Completed { first_message, .. }, Some(transcript)) => {
                transcript.since(first_message)
            }
            _ => &[],
        }
    }

    /// Saves the open session's transcript.
    pub fn save_transcript_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let session = self.active().ok_or_else(|| {
            Error::validation("no active session to save", None)
        })?;
        TranscriptFile::new(&session.session_id, self.flow, session.role, &session.transcript)
            .save(path)
    }

    /// Returns the current statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        let session = self.active();
        SessionStats {
            flow: self.flow,
            session_id: session.map(|s| s.session_id.clone()),
            role: session.map(|s| s.role),
            message_count: session.map(|s| s.transcript.len()).unwrap_or(0),
            turns: session.map(|s| s.transcript.turns()).unwrap_or(0),
            feedback_turns: self.feedback_turns,
            failed_requests: self.failed_requests,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::types::{InitializeResponse, TurnResponse, WireMessage};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Initialize { path: String, role: Role },
        Turn { path: String, request: TurnRequest },
    }

    /// Replays scripted responses and records every call.
    #[derive(Default)]
    struct ScriptedBackend {
        calls: Mutex<Vec<Call>>,
        initialize: Mutex<VecDeque<Result<InitializeResponse>>>,
        turns: Mutex<VecDeque<Result<TurnResponse>>>,
    }

    impl ScriptedBackend {
        fn with_initialize(self, response: Result<InitializeResponse>) -> Self {
            self.initialize.lock().unwrap().push_back(response);
            self
        }

        fn with_turn(self, response: Result<TurnResponse>) -> Self {
            self.turns.lock().unwrap().push_back(response);
            self
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Backend for ScriptedBackend {
        async fn initialize(
            &self,
            path: &str,
            _document: &Document,
            role: Role,
        ) -> Result<InitializeResponse> {
            self.calls.lock().unwrap().push(Call::Initialize {
                path: path.to_string(),
                role,
            });
            self.initialize
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected initialize call")
        }

        async fn turn(&self, path: &str, request: &TurnRequest) -> Result<TurnResponse> {
            self.calls.lock().unwrap().push(Call::Turn {
                path: path.to_string(),
                request: request.clone(),
            });
            self.turns
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected turn call")
        }
    }

    fn document() -> Document {
        Document::new("case.pdf", b"%PDF-1.7 case".to_vec()).unwrap()
    }

    fn opening() -> InitializeResponse {
        InitializeResponse {
            session_id: Some("s1".to_string()),
            response: Some(vec![WireMessage::new("Judge", "Begin.")]),
        }
    }

    fn reply(name: &str, content: &str) -> TurnResponse {
        TurnResponse {
            response: Some(vec![WireMessage::new(name, content)]),
        }
    }

    async fn active(backend: ScriptedBackend, flow: Flow) -> SessionController<ScriptedBackend> {
        let mut controller = SessionController::new(backend.with_initialize(Ok(opening())), flow);
        controller
            .initialize(Some(&document()), Some(Role::DefenseAttorney))
            .await
            .unwrap();
        controller
    }

    #[tokio::test]
    async fn initialize_without_document_sends_nothing() {
        let mut controller = SessionController::new(ScriptedBackend::default(), Flow::Simulate);
        let err = controller.initialize(None, None).await.unwrap_err();
        assert!(err.is_validation());
        assert!(controller.backend().calls().is_empty());
        assert_eq!(controller.state(), &SessionState::NoSession);
    }

    #[tokio::test]
    async fn initialize_seeds_transcript() {
        let backend = ScriptedBackend::default().with_initialize(Ok(opening()));
        let mut controller = SessionController::new(backend, Flow::Simulate);

        controller.initialize(Some(&document()), None).await.unwrap();
        assert_eq!(
            controller.transcript().unwrap().messages(),
            &[Message::new("Judge", "Begin.")]
        );
        assert_eq!(controller.session_id().unwrap().as_str(), "s1");
        assert_eq!(controller.role(), Some(Role::DefenseAttorney));
        assert_eq!(
            controller.backend().calls(),
            vec![Call::Initialize {
                path: "simulation/initialize".to_string(),
                role: Role::DefenseAttorney,
            }]
        );
    }

    #[tokio::test]
    async fn initialize_uses_flow_path_and_role() {
        let backend = ScriptedBackend::default().with_initialize(Ok(opening()));
        let mut controller = SessionController::new(backend, Flow::Analyze);
        controller
            .initialize(Some(&document()), Some(Role::ProsecutingAttorney))
            .await
            .unwrap();
        assert_eq!(
            controller.backend().calls(),
            vec![Call::Initialize {
                path: "initialize".to_string(),
                role: Role::ProsecutingAttorney,
            }]
        );
    }

    #[tokio::test]
    async fn initialize_with_incomplete_response_leaves_no_session() {
        let backend = ScriptedBackend::default()
            .with_initialize(Ok(InitializeResponse {
                session_id: Some("s1".to_string()),
                response: None,
            }))
            .with_initialize(Ok(opening()));
        let mut controller = SessionController::new(backend, Flow::Simulate);

        let err = controller.initialize(Some(&document()), None).await.unwrap_err();
        assert!(err.is_malformed_response());
        assert!(!controller.is_active());
        assert_eq!(controller.stats().failed_requests, 1);

        // A retry starts clean.
        controller.initialize(Some(&document()), None).await.unwrap();
        assert!(controller.is_active());
    }

    #[tokio::test]
    async fn initialize_network_failure_leaves_no_session() {
        let backend = ScriptedBackend::default()
            .with_initialize(Err(Error::connection("connection refused", None)));
        let mut controller = SessionController::new(backend, Flow::Simulate);
        let err = controller.initialize(Some(&document()), None).await.unwrap_err();
        assert!(err.is_connection());
        assert_eq!(controller.state(), &SessionState::NoSession);
    }

    #[tokio::test]
    async fn initialize_twice_is_rejected() {
        let mut controller = active(ScriptedBackend::default(), Flow::Simulate).await;
        let err = controller.initialize(Some(&document()), None).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(controller.backend().calls().len(), 1);
    }

    #[tokio::test]
    async fn send_appends_user_turn_then_replies() {
        let backend = ScriptedBackend::default().with_turn(Ok(reply("Judge", "Overruled.")));
        let mut controller = active(backend, Flow::Simulate).await;

        let mut draft = "Objection".to_string();
        let outcome = controller.send(&mut draft, ChatType::Simulate).await.unwrap();

        assert_eq!(
            outcome,
            TurnOutcome::Completed {
                first_message: 1,
                replies: 1
            }
        );
        assert_eq!(
            controller.turn_messages(outcome),
            &[
                Message::new("You", "Objection"),
                Message::new("Judge", "Overruled."),
            ]
        );
        assert_eq!(controller.transcript().unwrap().len(), 3);
        assert!(draft.is_empty());
        assert_eq!(
            controller.backend().calls()[1],
            Call::Turn {
                path: "simulation/continue".to_string(),
                request: TurnRequest::new(SessionId::new("s1"), "Objection"),
            }
        );
    }

    #[tokio::test]
    async fn draft_is_sent_as_typed() {
        let backend = ScriptedBackend::default().with_turn(Ok(reply("Judge", "Noted.")));
        let mut controller = active(backend, Flow::Simulate).await;

        let mut draft = "  Objection,\n  hearsay.  ".to_string();
        controller.send(&mut draft, ChatType::Simulate).await.unwrap();

        assert_eq!(
            controller.backend().calls()[1],
            Call::Turn {
                path: "simulation/continue".to_string(),
                request: TurnRequest::new(SessionId::new("s1"), "  Objection,\n  hearsay.  "),
            }
        );
        assert_eq!(
            controller.transcript().unwrap().messages()[1],
            Message::new("You", "  Objection,\n  hearsay.  ")
        );
    }

    #[tokio::test]
    async fn failed_send_changes_nothing() {
        let backend = ScriptedBackend::default()
            .with_turn(Err(Error::connection("connection reset", None)));
        let mut controller = active(backend, Flow::Simulate).await;
        let before = controller.transcript().unwrap().clone();

        let mut draft = "Objection".to_string();
        let err = controller.send(&mut draft, ChatType::Simulate).await.unwrap_err();

        assert!(err.is_connection());
        assert_eq!(controller.transcript().unwrap(), &before);
        assert_eq!(draft, "Objection");
    }

    #[tokio::test]
    async fn malformed_turn_response_changes_nothing() {
        let backend = ScriptedBackend::default().with_turn(Ok(TurnResponse { response: None }));
        let mut controller = active(backend, Flow::Simulate).await;

        let mut draft = "Objection".to_string();
        let err = controller.send(&mut draft, ChatType::Simulate).await.unwrap_err();
        assert!(err.is_malformed_response());
        assert_eq!(controller.transcript().unwrap().len(), 1);
        assert_eq!(draft, "Objection");
    }

    #[tokio::test]
    async fn empty_draft_is_a_no_op() {
        let mut controller = active(ScriptedBackend::default(), Flow::Simulate).await;
        let mut draft = String::new();
        let outcome = controller.send(&mut draft, ChatType::Simulate).await.unwrap();
        assert_eq!(outcome, TurnOutcome::Skipped);

        let mut draft = "   ".to_string();
        let outcome = controller.send(&mut draft, ChatType::Simulate).await.unwrap();
        assert_eq!(outcome, TurnOutcome::Skipped);
        assert_eq!(draft, "   ");

        assert_eq!(controller.backend().calls().len(), 1);
        assert_eq!(controller.transcript().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn send_without_session_is_a_no_op() {
        let mut controller = SessionController::new(ScriptedBackend::default(), Flow::Simulate);
        let mut draft = "Objection".to_string();
        let outcome = controller.send(&mut draft, ChatType::Simulate).await.unwrap();
        assert_eq!(outcome, TurnOutcome::Skipped);
        assert!(controller.backend().calls().is_empty());
        assert_eq!(draft, "Objection");
    }

    #[tokio::test]
    async fn feedback_routes_to_feedback_endpoint() {
        let backend =
            ScriptedBackend::default().with_turn(Ok(reply("Tutor Donny Defacto", "Good start.")));
        let mut controller = active(backend, Flow::Simulate).await;

        let mut draft = "How am I doing?".to_string();
        controller.send(&mut draft, ChatType::Feedback).await.unwrap();

        let calls = controller.backend().calls();
        assert!(matches!(
            &calls[1],
            Call::Turn { path, .. } if path == "simulation/feedback"
        ));
        assert_eq!(controller.stats().feedback_turns, 1);
    }

    #[tokio::test]
    async fn feedback_on_flow_without_route_sends_nothing() {
        let mut controller = active(ScriptedBackend::default(), Flow::Analyze).await;
        let mut draft = "How am I doing?".to_string();
        let err = controller.send(&mut draft, ChatType::Feedback).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(controller.backend().calls().len(), 1);
        assert_eq!(draft, "How am I doing?");
    }

    #[tokio::test]
    async fn lost_session_stays_active() {
        let backend = ScriptedBackend::default()
            .with_turn(Err(Error::session_not_found("Session not found.", "s1")));
        let mut controller = active(backend, Flow::Simulate).await;
        let mut draft = "Objection".to_string();
        let err = controller.send(&mut draft, ChatType::Simulate).await.unwrap_err();
        assert!(err.is_session_lost());
        assert!(controller.is_active());
    }

    #[tokio::test]
    async fn turns_are_appended_in_send_order() {
        let backend = ScriptedBackend::default()
            .with_turn(Ok(reply("Witness", "I was at home.")))
            .with_turn(Ok(TurnResponse {
                response: Some(vec![
                    WireMessage::new("Prosecuting Attorney", "Objection!"),
                    WireMessage::new("Judge", "Sustained."),
                ]),
            }));
        let mut controller = active(backend, Flow::Simulate).await;

        let mut draft = "Where were you?".to_string();
        controller.send(&mut draft, ChatType::Simulate).await.unwrap();
        let mut draft = "Alone?".to_string();
        controller.send(&mut draft, ChatType::Simulate).await.unwrap();

        let senders: Vec<&str> = controller
            .transcript()
            .unwrap()
            .iter()
            .map(|m| m.sender.as_str())
            .collect();
        assert_eq!(
            senders,
            vec!["Judge", "You", "Witness", "You", "Prosecuting Attorney", "Judge"]
        );
        assert_eq!(controller.stats().turns, 2);
    }

    #[tokio::test]
    async fn reset_returns_to_no_session() {
        let backend = ScriptedBackend::default().with_initialize(Ok(InitializeResponse {
            session_id: Some("s2".to_string()),
            response: Some(Vec::new()),
        }));
        let mut controller = active(backend, Flow::Simulate).await;

        let previous = controller.reset().unwrap();
        assert_eq!(previous.session_id.as_str(), "s1");
        assert!(!controller.is_active());
        assert!(controller.reset().is_none());

        controller.initialize(Some(&document()), None).await.unwrap();
        assert_eq!(controller.session_id().unwrap().as_str(), "s2");
    }

    #[tokio::test]
    async fn save_requires_session() {
        let controller = SessionController::new(ScriptedBackend::default(), Flow::Simulate);
        let err = controller
            .save_transcript_to(std::env::temp_dir().join("defacto-unused.json"))
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn save_writes_session_metadata() {
        let controller = active(ScriptedBackend::default(), Flow::Simulate).await;
        let path = std::env::temp_dir().join(format!(
            "defacto-controller-{}.json",
            std::process::id()
        ));
        controller.save_transcript_to(&path).unwrap();
        let loaded = TranscriptFile::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded.session_id.as_str(), "s1");
        assert_eq!(loaded.flow, Flow::Simulate);
        assert_eq!(loaded.messages, vec![Message::new("Judge", "Begin.")]);
    }
}

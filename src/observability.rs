use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("defacto.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("defacto.client.request_errors");
pub(crate) static CLIENT_UPLOAD_BYTES: Counter = Counter::new("defacto.client.upload_bytes");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("defacto.client.request_duration_seconds");

pub(crate) static SESSION_INITIALIZED: Counter = Counter::new("defacto.session.initialized");
pub(crate) static SESSION_INITIALIZE_ERRORS: Counter =
    Counter::new("defacto.session.initialize_errors");
pub(crate) static SESSION_TURNS: Counter = Counter::new("defacto.session.turns");
pub(crate) static SESSION_FEEDBACK_TURNS: Counter = Counter::new("defacto.session.feedback_turns");
pub(crate) static SESSION_TURN_ERRORS: Counter = Counter::new("defacto.session.turn_errors");
pub(crate) static SESSION_REPLIES_PER_TURN: Moments =
    Moments::new("defacto.session.replies_per_turn");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_counter(&CLIENT_UPLOAD_BYTES);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&SESSION_INITIALIZED);
    collector.register_counter(&SESSION_INITIALIZE_ERRORS);
    collector.register_counter(&SESSION_TURNS);
    collector.register_counter(&SESSION_FEEDBACK_TURNS);
    collector.register_counter(&SESSION_TURN_ERRORS);
    collector.register_moments(&SESSION_REPLIES_PER_TURN);
}

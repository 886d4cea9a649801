//! The seam between the session controller and the transport.

use crate::error::Result;
use crate::types::{Document, InitializeResponse, Role, TurnRequest, TurnResponse};

/// A remote service speaking the DeFacto session protocol.
///
/// Paths are relative to whatever base the implementation is bound to. The
/// controller chooses the path; implementations only carry the request.
/// Responses are returned raw; validating them is the controller's job.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Uploads a document and role as a multipart form to create a session.
    async fn initialize(
        &self,
        path: &str,
        document: &Document,
        role: Role,
    ) -> Result<InitializeResponse>;

    /// Sends one turn as a JSON body.
    async fn turn(&self, path: &str, request: &TurnRequest) -> Result<TurnResponse>;
}

#[async_trait::async_trait]
impl<B: Backend + ?Sized> Backend for std::sync::Arc<B> {
    async fn initialize(
        &self,
        path: &str,
        document: &Document,
        role: Role,
    ) -> Result<InitializeResponse> {
        (**self).initialize(path, document, role).await
    }

    async fn turn(&self, path: &str, request: &TurnRequest) -> Result<TurnResponse> {
        (**self).turn(path, request).await
    }
}

//! Session management: list the caller's active sessions and revoke them one
//! at a time or all at once.
//!
//! [`SessionViewer`] holds the view state and is driven through the
//! [`SessionsApi`] seam so it can be exercised without a backend.

mod view;
mod viewer;

pub use view::{SessionRow, render};
pub use viewer::{
    LOAD_FAILED, LoadOutcome, LoadTicket, MISSING_CSRF, MutationOutcome, NOT_SIGNED_IN,
    REVOKE_ALL_FAILED, REVOKE_FAILED, SessionViewer,
};

use crate::api::{ApiClient, AppError, Session};
use std::future::Future;

/// Backend operations the session viewer depends on.
pub trait SessionsApi {
    /// Fetches the full session list for the bearer `token`.
    fn fetch_sessions(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Vec<Session>, AppError>> + Send;

    /// Revokes one session identified by `session_id`.
    fn revoke(
        &self,
        token: &str,
        csrf: &str,
        session_id: &str,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Revokes every session of the caller.
    fn revoke_all(
        &self,
        token: &str,
        csrf: &str,
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}

impl SessionsApi for ApiClient {
    async fn fetch_sessions(&self, token: &str) -> Result<Vec<Session>, AppError> {
        self.list_sessions(token).await
    }

    async fn revoke(&self, token: &str, csrf: &str, session_id: &str) -> Result<(), AppError> {
        self.revoke_session(token, csrf, session_id).await.map(|_| ())
    }

    async fn revoke_all(&self, token: &str, csrf: &str) -> Result<(), AppError> {
        self.revoke_all_sessions(token, csrf).await.map(|_| ())
    }
}

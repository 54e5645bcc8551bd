use super::{SessionsApi, view};
use crate::{
    api::{AppError, Session},
    context::AuthContext,
};
use tracing::{debug, info, instrument, warn};

pub const NOT_SIGNED_IN: &str = "Not signed in";
pub const LOAD_FAILED: &str = "Failed to load sessions";
pub const MISSING_CSRF: &str = "Missing CSRF token";
pub const REVOKE_FAILED: &str = "Failed to revoke session";
pub const REVOKE_ALL_FAILED: &str = "Failed to revoke sessions";

/// Identifies one in-flight load. Only the most recently issued ticket may
/// update the list; completions for older tickets are dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

#[derive(Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No access token; nothing was requested.
    NotSignedIn,
    /// The list was replaced with this many sessions.
    Loaded(usize),
    /// The request failed and the previous list was kept.
    Failed(AppError),
    /// A newer load was started before this one completed.
    Stale,
}

#[derive(Debug, PartialEq, Eq)]
pub enum MutationOutcome {
    NotSignedIn,
    MissingCsrf,
    /// The backend rejected the mutation or could not be reached.
    Failed(AppError),
    /// The mutation succeeded and the list was reloaded.
    Reloaded(LoadOutcome),
}

/// View state for the session list.
#[derive(Debug, Default)]
pub struct SessionViewer {
    sessions: Vec<Session>,
    message: Option<String>,
    generation: u64,
}

impl SessionViewer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions in the order the backend returned them.
    #[must_use]
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Starts a load, returning its ticket and the bearer token to send.
    /// Returns `None` and sets the "not signed in" message when the context
    /// has no access token.
    pub fn begin_load<'a>(&mut self, ctx: &'a AuthContext) -> Option<(LoadTicket, &'a str)> {
        let Some(token) = ctx.token() else {
            self.message = Some(NOT_SIGNED_IN.to_string());
            return None;
        };
        self.generation += 1;
        let ticket = LoadTicket {
            generation: self.generation,
        };
        Some((ticket, token))
    }

    /// Applies the result of the load identified by `ticket`.
    ///
    /// A success replaces the whole list and clears any message; a failure
    /// keeps the previous list and sets the load failure message.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<Session>, AppError>,
    ) -> LoadOutcome {
        if ticket.generation != self.generation {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "dropping stale session list"
            );
            return LoadOutcome::Stale;
        }

        match result {
            Ok(sessions) => {
                let count = sessions.len();
                self.sessions = sessions;
                self.message = None;
                debug!(count, "session list replaced");
                LoadOutcome::Loaded(count)
            }
            Err(err) => {
                warn!("failed to load sessions: {err}");
                self.message = Some(LOAD_FAILED.to_string());
                LoadOutcome::Failed(err)
            }
        }
    }

    /// Fetches the session list and replaces the current one.
    #[instrument(skip_all)]
    pub async fn load<A: SessionsApi>(&mut self, api: &A, ctx: &AuthContext) -> LoadOutcome {
        let Some((ticket, token)) = self.begin_load(ctx) else {
            return LoadOutcome::NotSignedIn;
        };
        let result = api.fetch_sessions(token).await;
        self.finish_load(ticket, result)
    }

    /// Revokes one session, then reloads the list on success.
    #[instrument(skip(self, api, ctx))]
    pub async fn revoke<A: SessionsApi>(
        &mut self,
        api: &A,
        ctx: &AuthContext,
        session_id: &str,
    ) -> MutationOutcome {
        let (token, csrf) = match self.mutation_credentials(ctx) {
            Ok(credentials) => credentials,
            Err(outcome) => return outcome,
        };

        match api.revoke(token, csrf, session_id).await {
            Ok(()) => {
                info!("session revoked");
                MutationOutcome::Reloaded(self.load(api, ctx).await)
            }
            Err(err) => {
                warn!("failed to revoke session: {err}");
                self.message = Some(REVOKE_FAILED.to_string());
                MutationOutcome::Failed(err)
            }
        }
    }

    /// Revokes every session of the caller, then reloads the list on success.
    #[instrument(skip_all)]
    pub async fn revoke_all<A: SessionsApi>(
        &mut self,
        api: &A,
        ctx: &AuthContext,
    ) -> MutationOutcome {
        let (token, csrf) = match self.mutation_credentials(ctx) {
            Ok(credentials) => credentials,
            Err(outcome) => return outcome,
        };

        match api.revoke_all(token, csrf).await {
            Ok(()) => {
                info!("all sessions revoked");
                MutationOutcome::Reloaded(self.load(api, ctx).await)
            }
            Err(err) => {
                warn!("failed to revoke sessions: {err}");
                self.message = Some(REVOKE_ALL_FAILED.to_string());
                MutationOutcome::Failed(err)
            }
        }
    }

    /// Text rendering of the current state.
    #[must_use]
    pub fn render(&self) -> String {
        view::render(self.message(), self.sessions())
    }

    fn mutation_credentials<'a>(
        &mut self,
        ctx: &'a AuthContext,
    ) -> Result<(&'a str, &'a str), MutationOutcome> {
        let Some(token) = ctx.token() else {
            self.message = Some(NOT_SIGNED_IN.to_string());
            return Err(MutationOutcome::NotSignedIn);
        };
        let Some(csrf) = ctx.csrf_token() else {
            self.message = Some(MISSING_CSRF.to_string());
            return Err(MutationOutcome::MissingCsrf);
        };
        Ok((token, csrf))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use std::{collections::VecDeque, sync::Mutex};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Fetch { token: String },
        Revoke { csrf: String, session_id: String },
        RevokeAll { csrf: String },
    }

    /// Records calls and replays queued responses in order.
    #[derive(Default)]
    struct FakeApi {
        calls: Mutex<Vec<Call>>,
        lists: Mutex<VecDeque<Result<Vec<Session>, AppError>>>,
        mutations: Mutex<VecDeque<Result<(), AppError>>>,
    }

    impl FakeApi {
        fn with_lists(lists: Vec<Result<Vec<Session>, AppError>>) -> Self {
            Self {
                lists: Mutex::new(lists.into()),
                ..Self::default()
            }
        }

        fn queue_mutation(&self, result: Result<(), AppError>) {
            self.mutations.lock().unwrap().push_back(result);
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn fetch_count(&self) -> usize {
            self.calls()
                .iter()
                .filter(|call| matches!(call, Call::Fetch { .. }))
                .count()
        }
    }

    impl SessionsApi for FakeApi {
        async fn fetch_sessions(&self, token: &str) -> Result<Vec<Session>, AppError> {
            self.calls.lock().unwrap().push(Call::Fetch {
                token: token.to_string(),
            });
            self.lists
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn revoke(&self, _token: &str, csrf: &str, session_id: &str) -> Result<(), AppError> {
            self.calls.lock().unwrap().push(Call::Revoke {
                csrf: csrf.to_string(),
                session_id: session_id.to_string(),
            });
            self.mutations.lock().unwrap().pop_front().unwrap_or(Ok(()))
        }

        async fn revoke_all(&self, _token: &str, csrf: &str) -> Result<(), AppError> {
            self.calls.lock().unwrap().push(Call::RevokeAll {
                csrf: csrf.to_string(),
            });
            self.mutations.lock().unwrap().pop_front().unwrap_or(Ok(()))
        }
    }

    fn session(id: &str) -> Session {
        Session {
            id: id.to_string(),
            device_info: Some(format!("device-{id}")),
            created_at: Some("2024-01-01T00:00:00".to_string()),
            expires_at: Some("2024-01-15T00:00:00".to_string()),
            revoked: false,
        }
    }

    fn signed_in() -> AuthContext {
        AuthContext::new(
            Some(SecretString::from("access-1".to_string())),
            Some(SecretString::from("csrf-1".to_string())),
        )
    }

    fn server_error() -> AppError {
        AppError::Http {
            status: 500,
            message: "boom".to_string(),
        }
    }

    #[tokio::test]
    async fn load_without_token_makes_no_request() {
        let api = FakeApi::default();
        let mut viewer = SessionViewer::new();

        let outcome = viewer.load(&api, &AuthContext::default()).await;

        assert_eq!(outcome, LoadOutcome::NotSignedIn);
        assert_eq!(viewer.message(), Some(NOT_SIGNED_IN));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn load_sends_stored_token() {
        let api = FakeApi::with_lists(vec![Ok(vec![session("1")])]);
        let mut viewer = SessionViewer::new();

        viewer.load(&api, &signed_in()).await;

        assert_eq!(
            api.calls(),
            vec![Call::Fetch {
                token: "access-1".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn successful_load_replaces_list_wholesale() {
        let api = FakeApi::with_lists(vec![
            Ok(vec![session("1"), session("2")]),
            Ok(vec![session("3")]),
        ]);
        let mut viewer = SessionViewer::new();
        let ctx = signed_in();

        assert_eq!(viewer.load(&api, &ctx).await, LoadOutcome::Loaded(2));
        assert_eq!(viewer.load(&api, &ctx).await, LoadOutcome::Loaded(1));

        assert_eq!(viewer.sessions(), &[session("3")]);
    }

    #[tokio::test]
    async fn failed_load_keeps_stale_list() {
        let api = FakeApi::with_lists(vec![Ok(vec![session("1")]), Err(server_error())]);
        let mut viewer = SessionViewer::new();
        let ctx = signed_in();

        viewer.load(&api, &ctx).await;
        let outcome = viewer.load(&api, &ctx).await;

        assert_eq!(outcome, LoadOutcome::Failed(server_error()));
        assert_eq!(viewer.sessions(), &[session("1")]);
        assert_eq!(viewer.message(), Some(LOAD_FAILED));
    }

    #[tokio::test]
    async fn successful_load_clears_previous_failure() {
        let api = FakeApi::with_lists(vec![Err(server_error()), Ok(vec![session("9")])]);
        let mut viewer = SessionViewer::new();
        let ctx = signed_in();

        viewer.load(&api, &ctx).await;
        assert_eq!(viewer.message(), Some(LOAD_FAILED));

        viewer.load(&api, &ctx).await;
        assert_eq!(viewer.message(), None);
        assert_eq!(viewer.sessions(), &[session("9")]);
    }

    #[tokio::test]
    async fn revoke_success_reloads_exactly_once() {
        let api = FakeApi::with_lists(vec![Ok(vec![session("5")]), Ok(Vec::new())]);
        let mut viewer = SessionViewer::new();
        let ctx = signed_in();
        viewer.load(&api, &ctx).await;
        let fetches_before = api.fetch_count();

        let outcome = viewer.revoke(&api, &ctx, "5").await;

        assert_eq!(outcome, MutationOutcome::Reloaded(LoadOutcome::Loaded(0)));
        assert_eq!(api.fetch_count(), fetches_before + 1);
        assert!(api.calls().contains(&Call::Revoke {
            csrf: "csrf-1".to_string(),
            session_id: "5".to_string()
        }));
        assert!(viewer.sessions().is_empty());
    }

    #[tokio::test]
    async fn revoke_all_carries_no_session_id() {
        let api = FakeApi::with_lists(vec![Ok(Vec::new())]);
        let mut viewer = SessionViewer::new();

        let outcome = viewer.revoke_all(&api, &signed_in()).await;

        assert_eq!(outcome, MutationOutcome::Reloaded(LoadOutcome::Loaded(0)));
        assert_eq!(
            api.calls(),
            vec![
                Call::RevokeAll {
                    csrf: "csrf-1".to_string()
                },
                Call::Fetch {
                    token: "access-1".to_string()
                }
            ]
        );
    }

    #[tokio::test]
    async fn failed_revoke_keeps_list_and_reports() {
        let api = FakeApi::with_lists(vec![Ok(vec![session("5")])]);
        let mut viewer = SessionViewer::new();
        let ctx = signed_in();
        viewer.load(&api, &ctx).await;
        api.queue_mutation(Err(server_error()));

        let outcome = viewer.revoke(&api, &ctx, "5").await;

        assert_eq!(outcome, MutationOutcome::Failed(server_error()));
        assert_eq!(api.fetch_count(), 1);
        assert_eq!(viewer.sessions(), &[session("5")]);
        assert_eq!(viewer.message(), Some(REVOKE_FAILED));
    }

    #[tokio::test]
    async fn failed_revoke_all_reports_plural_message() {
        let api = FakeApi::default();
        api.queue_mutation(Err(server_error()));
        let mut viewer = SessionViewer::new();

        let outcome = viewer.revoke_all(&api, &signed_in()).await;

        assert_eq!(outcome, MutationOutcome::Failed(server_error()));
        assert_eq!(viewer.message(), Some(REVOKE_ALL_FAILED));
        assert_eq!(api.fetch_count(), 0);
    }

    #[tokio::test]
    async fn mutations_require_token_and_csrf() {
        let api = FakeApi::default();
        let mut viewer = SessionViewer::new();

        let outcome = viewer.revoke(&api, &AuthContext::default(), "1").await;
        assert_eq!(outcome, MutationOutcome::NotSignedIn);
        assert_eq!(viewer.message(), Some(NOT_SIGNED_IN));

        let token_only = AuthContext::new(Some(SecretString::from("access-1".to_string())), None);
        let outcome = viewer.revoke_all(&api, &token_only).await;
        assert_eq!(outcome, MutationOutcome::MissingCsrf);
        assert_eq!(viewer.message(), Some(MISSING_CSRF));

        assert!(api.calls().is_empty());
    }

    #[test]
    fn stale_completion_is_ignored() {
        let mut viewer = SessionViewer::new();
        let ctx = signed_in();

        let (first, _) = viewer.begin_load(&ctx).unwrap();
        let (second, _) = viewer.begin_load(&ctx).unwrap();

        assert_eq!(
            viewer.finish_load(second, Ok(vec![session("new")])),
            LoadOutcome::Loaded(1)
        );
        assert_eq!(
            viewer.finish_load(first, Ok(vec![session("old")])),
            LoadOutcome::Stale
        );
        assert_eq!(viewer.sessions(), &[session("new")]);

        let (third, _) = viewer.begin_load(&ctx).unwrap();
        assert_eq!(
            viewer.finish_load(first, Err(server_error())),
            LoadOutcome::Stale
        );
        assert_eq!(viewer.message(), None);
        assert_eq!(viewer.finish_load(third, Ok(Vec::new())), LoadOutcome::Loaded(0));
    }

    #[test]
    fn begin_load_hands_back_the_bearer_token() {
        let mut viewer = SessionViewer::new();
        let ctx = signed_in();
        let (_, token) = viewer.begin_load(&ctx).unwrap();
        assert_eq!(Some(token), ctx.token());

        assert!(viewer.begin_load(&AuthContext::default()).is_none());
        assert_eq!(viewer.message(), Some(NOT_SIGNED_IN));
    }
}

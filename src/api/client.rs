//! Client wrappers for the `/api/auth` endpoints. These keep header handling in
//! one place so callers never assemble `Authorization`, `x-csrf` or `Cookie`
//! headers by hand, and never log what goes into them.

use super::{
    errors::AppError,
    http::{Reply, build_url_with_base, handle_json_response, send},
    types::{
        EmailRequest, MessageResponse, ResetPasswordRequest, RevokeSessionRequest, Session,
        SignInRequest, SignUpRequest, TokenResponse, VerifyEmailRequest,
    },
};
use reqwest::{Client, Method, RequestBuilder, header::COOKIE};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Header carrying the CSRF cookie value on mutating requests.
pub const CSRF_HEADER: &str = "x-csrf";

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Default request timeout applied to every call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// OAuth providers the backend can redirect to.
pub const OAUTH_PROVIDERS: [&str; 3] = ["google", "microsoft", "github"];

#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Builds a client against `base_url` with the given request timeout.
    ///
    /// # Errors
    /// Returns an error if the base URL is empty or the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let base_url = base_url.trim();
        if base_url.is_empty() {
            return Err(AppError::Config("Backend URL is not configured.".to_string()));
        }
        let parsed = Url::parse(base_url)
            .map_err(|err| AppError::Config(format!("Invalid backend URL {base_url}: {err}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::Config(format!(
                "Backend URL must use http or https: {base_url}"
            )));
        }

        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    /// Absolute URL for `path` on the configured backend.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        build_url_with_base(&self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!(%method, %url, "api request");
        self.client.request(method, url)
    }

    /// Lists the caller's sessions in backend order.
    ///
    /// # Errors
    /// Returns an error on transport failure, a non-success status, or an undecodable body.
    #[instrument(skip_all)]
    pub async fn list_sessions(&self, token: &str) -> Result<Vec<Session>, AppError> {
        let builder = self
            .request(Method::GET, "/api/auth/sessions")
            .bearer_auth(token);
        let reply: Reply<Vec<Session>> = handle_json_response(send(builder).await?).await?;
        Ok(reply.body)
    }

    /// Revokes a single session by id.
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-success status.
    #[instrument(skip(self, token, csrf))]
    pub async fn revoke_session(
        &self,
        token: &str,
        csrf: &str,
        session_id: &str,
    ) -> Result<MessageResponse, AppError> {
        let builder = self
            .request(Method::POST, "/api/auth/sessions/revoke")
            .bearer_auth(token)
            .header(CSRF_HEADER, csrf)
            .json(&RevokeSessionRequest { session_id });
        let reply: Reply<MessageResponse> = handle_json_response(send(builder).await?).await?;
        Ok(reply.body)
    }

    /// Revokes every session of the caller. No body is sent.
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-success status.
    #[instrument(skip_all)]
    pub async fn revoke_all_sessions(
        &self,
        token: &str,
        csrf: &str,
    ) -> Result<MessageResponse, AppError> {
        let builder = self
            .request(Method::POST, "/api/auth/sessions/revoke-all")
            .bearer_auth(token)
            .header(CSRF_HEADER, csrf);
        let reply: Reply<MessageResponse> = handle_json_response(send(builder).await?).await?;
        Ok(reply.body)
    }

    /// Registers a new account. The password must never be logged.
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-success status.
    #[instrument(skip_all)]
    pub async fn signup(&self, request: &SignUpRequest<'_>) -> Result<MessageResponse, AppError> {
        let builder = self.request(Method::POST, "/api/auth/signup").json(request);
        let reply: Reply<MessageResponse> = handle_json_response(send(builder).await?).await?;
        Ok(reply.body)
    }

    /// Signs in and returns the access token plus the refresh/CSRF cookies.
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-success status.
    #[instrument(skip_all)]
    pub async fn signin(
        &self,
        request: &SignInRequest<'_>,
        cookies: Option<&str>,
    ) -> Result<Reply<TokenResponse>, AppError> {
        let builder = with_cookies(
            self.request(Method::POST, "/api/auth/signin").json(request),
            cookies,
        );
        handle_json_response(send(builder).await?).await
    }

    /// Requests 24h trial access for an unverified account.
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-success status.
    #[instrument(skip_all)]
    pub async fn trial(
        &self,
        request: &EmailRequest<'_>,
        cookies: Option<&str>,
    ) -> Result<Reply<TokenResponse>, AppError> {
        let builder = with_cookies(
            self.request(Method::POST, "/api/auth/trial").json(request),
            cookies,
        );
        handle_json_response(send(builder).await?).await
    }

    /// Asks the backend to email a reset link. The answer does not reveal
    /// whether the account exists.
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-success status.
    #[instrument(skip_all)]
    pub async fn forgot_password(
        &self,
        request: &EmailRequest<'_>,
    ) -> Result<MessageResponse, AppError> {
        let builder = self
            .request(Method::POST, "/api/auth/forgot-password")
            .json(request);
        let reply: Reply<MessageResponse> = handle_json_response(send(builder).await?).await?;
        Ok(reply.body)
    }

    /// # Errors
    /// Returns an error on transport failure or a non-success status.
    #[instrument(skip_all)]
    pub async fn reset_password(
        &self,
        request: &ResetPasswordRequest<'_>,
    ) -> Result<MessageResponse, AppError> {
        let builder = self
            .request(Method::POST, "/api/auth/reset-password")
            .json(request);
        let reply: Reply<MessageResponse> = handle_json_response(send(builder).await?).await?;
        Ok(reply.body)
    }

    /// # Errors
    /// Returns an error on transport failure or a non-success status.
    #[instrument(skip_all)]
    pub async fn verify_email(
        &self,
        request: &VerifyEmailRequest<'_>,
    ) -> Result<MessageResponse, AppError> {
        let builder = self
            .request(Method::POST, "/api/auth/verify-email")
            .json(request);
        let reply: Reply<MessageResponse> = handle_json_response(send(builder).await?).await?;
        Ok(reply.body)
    }

    /// Invalidates the refresh token server side. Requires the cookie pair the
    /// backend issued at sign-in and the matching CSRF header.
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-success status.
    #[instrument(skip_all)]
    pub async fn logout(
        &self,
        csrf: &str,
        cookies: Option<&str>,
    ) -> Result<Reply<MessageResponse>, AppError> {
        let builder = with_cookies(
            self.request(Method::POST, "/api/auth/logout")
                .header(CSRF_HEADER, csrf),
            cookies,
        );
        handle_json_response(send(builder).await?).await
    }

    /// Browser entry point for an OAuth provider.
    #[must_use]
    pub fn oauth_url(&self, provider: &str) -> String {
        self.url(&format!("/api/auth/oauth/{provider}"))
    }
}

fn with_cookies(builder: RequestBuilder, cookies: Option<&str>) -> RequestBuilder {
    match cookies {
        Some(value) if !value.is_empty() => builder.header(COOKIE, value),
        _ => builder,
    }
}

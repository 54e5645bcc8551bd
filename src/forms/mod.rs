//! Submit logic for the account pages: sign up, sign in, trial access,
//! password recovery, email verification and logout.
//!
//! Each flow validates its fields locally, issues a single request, and
//! returns the message the page shows. Flows that establish or end a sign-in
//! update the [`CredentialStore`] and persist it before returning.

pub mod validation;

use crate::{
    api::{
        ApiClient, AppError, EmailRequest, Reply, ResetPasswordRequest, SignInRequest,
        SignUpRequest, TokenResponse, VerifyEmailRequest,
    },
    storage::CredentialStore,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument};

/// Shown after sign-up when the backend omits a detail.
pub const REGISTERED: &str = "Registered successfully";
pub const SIGNED_IN: &str = "Signed in";
pub const TRIAL_GRANTED: &str = "Trial access granted";
pub const SIGNED_OUT: &str = "Logged out";

#[derive(Debug)]
pub struct SignUpForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: SecretString,
}

#[derive(Debug)]
pub struct SignInForm {
    pub email: String,
    pub password: SecretString,
}

#[derive(Debug)]
pub struct ResetPasswordForm {
    pub token: SecretString,
    pub new_password: SecretString,
}

/// Registers an account. The backend emails a verification link.
///
/// # Errors
/// Returns a validation error without contacting the backend when a field is
/// blank or the email is malformed, otherwise any request failure.
#[instrument(skip_all)]
pub async fn sign_up(api: &ApiClient, form: &SignUpForm) -> Result<String, AppError> {
    let request = SignUpRequest {
        first_name: validation::required("First name", &form.first_name)?,
        last_name: validation::required("Last name", &form.last_name)?,
        email: validation::email(&form.email)?,
        password: validation::password("Password", form.password.expose_secret())?,
    };

    let reply = api.signup(&request).await?;
    info!("account registered");
    Ok(detail_or(reply.detail, REGISTERED))
}

/// Signs in, storing the access token and the cookies the backend sets.
///
/// # Errors
/// Returns a validation error, any request failure, or a storage error if the
/// credentials cannot be persisted.
#[instrument(skip_all)]
pub async fn sign_in(
    api: &ApiClient,
    store: &mut CredentialStore,
    form: &SignInForm,
) -> Result<String, AppError> {
    let request = SignInRequest {
        email: validation::email(&form.email)?,
        password: validation::password("Password", form.password.expose_secret())?,
    };

    let reply = api.signin(&request, store.cookie_header().as_deref()).await?;
    remember_token(store, reply)?;
    info!("signed in");
    Ok(SIGNED_IN.to_string())
}

/// Requests 24h trial access for an account that has not verified its email.
///
/// # Errors
/// Returns a validation error, any request failure, or a storage error.
#[instrument(skip_all)]
pub async fn request_trial(
    api: &ApiClient,
    store: &mut CredentialStore,
    email: &str,
) -> Result<String, AppError> {
    let request = EmailRequest {
        email: validation::email(email)?,
    };

    let reply = api.trial(&request, store.cookie_header().as_deref()).await?;
    remember_token(store, reply)?;
    info!("trial access granted");
    Ok(TRIAL_GRANTED.to_string())
}

/// # Errors
/// Returns a validation error or any request failure.
#[instrument(skip_all)]
pub async fn forgot_password(api: &ApiClient, email: &str) -> Result<String, AppError> {
    let request = EmailRequest {
        email: validation::email(email)?,
    };
    Ok(api.forgot_password(&request).await?.detail)
}

/// # Errors
/// Returns a validation error or any request failure.
#[instrument(skip_all)]
pub async fn reset_password(api: &ApiClient, form: &ResetPasswordForm) -> Result<String, AppError> {
    let request = ResetPasswordRequest {
        token: validation::required("Reset token", form.token.expose_secret())?,
        new_password: validation::password("New password", form.new_password.expose_secret())?,
    };
    Ok(api.reset_password(&request).await?.detail)
}

/// Consumes the token from a verification link.
///
/// # Errors
/// Returns a validation error or any request failure.
#[instrument(skip_all)]
pub async fn verify_email(api: &ApiClient, token: &SecretString) -> Result<String, AppError> {
    let request = VerifyEmailRequest {
        token: validation::required("Verification token", token.expose_secret())?,
    };
    Ok(api.verify_email(&request).await?.detail)
}

/// Ends the sign-in. When a CSRF cookie is held the backend is asked to drop
/// the refresh token first; local credentials are cleared only once that
/// succeeds. Without one there is nothing to revoke remotely and only the
/// local store is cleared.
///
/// # Errors
/// Returns any request failure or a storage error.
#[instrument(skip_all)]
pub async fn logout(api: &ApiClient, store: &mut CredentialStore) -> Result<String, AppError> {
    let message = match store.csrf_token() {
        Some(csrf) => {
            let csrf = csrf.expose_secret().to_string();
            let reply = api
                .logout(&csrf, store.cookie_header().as_deref())
                .await?;
            detail_or(reply.body.detail, SIGNED_OUT)
        }
        None => SIGNED_OUT.to_string(),
    };

    store.clear();
    store.save()?;
    info!("signed out");
    Ok(message)
}

fn remember_token(
    store: &mut CredentialStore,
    reply: Reply<TokenResponse>,
) -> Result<(), AppError> {
    if reply.body.access_token.trim().is_empty() {
        return Err(AppError::Parse(
            "Response did not include an access token.".to_string(),
        ));
    }
    store.set_access_token(SecretString::from(reply.body.access_token));
    store.absorb_set_cookies(&reply.set_cookies);
    store.save()
}

fn detail_or(detail: String, fallback: &str) -> String {
    if detail.trim().is_empty() {
        fallback.to_string()
    } else {
        detail
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::{DEFAULT_TIMEOUT, GENERIC_ERROR};
    use serde_json::json;
    use std::net::TcpListener;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    #[tokio::test]
    async fn sign_up_rejects_bad_email_without_request() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        let api = ApiClient::new(&server.uri(), DEFAULT_TIMEOUT).unwrap();

        let err = sign_up(
            &api,
            &SignUpForm {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: "ada-at-example".to_string(),
                password: secret("pw"),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sign_up_posts_all_fields_and_returns_detail() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/signup"))
            .and(body_json(json!({
                "first_name": "Ada",
                "last_name": "Lovelace",
                "email": "ada@example.com",
                "password": "pw"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "detail": "Sign-up successful. Check email for verification link."
            })))
            .expect(1)
            .mount(&server)
            .await;
        let api = ApiClient::new(&server.uri(), DEFAULT_TIMEOUT).unwrap();

        let message = sign_up(
            &api,
            &SignUpForm {
                first_name: " Ada ".to_string(),
                last_name: "Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                password: secret("pw"),
            },
        )
        .await
        .unwrap();

        assert_eq!(
            message,
            "Sign-up successful. Check email for verification link."
        );
    }

    #[tokio::test]
    async fn sign_up_failure_without_detail_shows_generic_error() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/signup"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({})))
            .mount(&server)
            .await;
        let api = ApiClient::new(&server.uri(), DEFAULT_TIMEOUT).unwrap();

        let err = sign_up(
            &api,
            &SignUpForm {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                password: secret("pw"),
            },
        )
        .await
        .unwrap_err();

        assert_eq!(err.status(), Some(500));
        assert_eq!(err.user_message(), GENERIC_ERROR);
    }

    #[tokio::test]
    async fn sign_in_persists_token_and_csrf_cookie() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/signin"))
            .and(body_json(json!({"email": "ada@example.com", "password": "pw"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": "jwt-1", "token_type": "bearer"}))
                    .append_header("set-cookie", "refresh_token=r1; HttpOnly; Path=/")
                    .append_header("set-cookie", "csrf_token=c1; Path=/"),
            )
            .expect(1)
            .mount(&server)
            .await;
        let api = ApiClient::new(&server.uri(), DEFAULT_TIMEOUT).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut store = CredentialStore::empty(&path);

        let message = sign_in(
            &api,
            &mut store,
            &SignInForm {
                email: "ada@example.com".to_string(),
                password: secret("pw"),
            },
        )
        .await
        .unwrap();
        assert_eq!(message, SIGNED_IN);

        let reopened = CredentialStore::open(&path).unwrap();
        let ctx = reopened.auth_context();
        assert_eq!(ctx.token(), Some("jwt-1"));
        assert_eq!(ctx.csrf_token(), Some("c1"));
        assert_eq!(
            reopened.cookie("refresh_token").map(|value| value.expose_secret().to_string()),
            Some("r1".to_string())
        );
    }

    #[tokio::test]
    async fn sign_in_failure_surfaces_detail_and_stores_nothing() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/signin"))
            .respond_with(
                ResponseTemplate::new(403).set_body_json(json!({"detail": "Email not verified"})),
            )
            .mount(&server)
            .await;
        let api = ApiClient::new(&server.uri(), DEFAULT_TIMEOUT).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut store = CredentialStore::empty(dir.path().join("state.json"));

        let err = sign_in(
            &api,
            &mut store,
            &SignInForm {
                email: "ada@example.com".to_string(),
                password: secret("pw"),
            },
        )
        .await
        .unwrap_err();

        assert_eq!(err.user_message(), "Email not verified");
        assert!(store.access_token().is_none());
        assert!(!dir.path().join("state.json").exists());
    }

    #[tokio::test]
    async fn trial_stores_token() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/trial"))
            .and(body_json(json!({"email": "ada@example.com"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"access_token": "trial-jwt"})),
            )
            .mount(&server)
            .await;
        let api = ApiClient::new(&server.uri(), DEFAULT_TIMEOUT).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut store = CredentialStore::empty(dir.path().join("state.json"));

        let message = request_trial(&api, &mut store, "ada@example.com")
            .await
            .unwrap();

        assert_eq!(message, TRIAL_GRANTED);
        assert_eq!(store.auth_context().token(), Some("trial-jwt"));
    }

    #[tokio::test]
    async fn forgot_password_returns_detail_even_on_error() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/forgot-password"))
            .respond_with(
                ResponseTemplate::new(429).set_body_json(json!({"detail": "Too many requests"})),
            )
            .mount(&server)
            .await;
        let api = ApiClient::new(&server.uri(), DEFAULT_TIMEOUT).unwrap();

        let err = forgot_password(&api, "ada@example.com").await.unwrap_err();
        assert_eq!(err.status(), Some(429));
        assert_eq!(err.user_message(), "Too many requests");
    }

    #[tokio::test]
    async fn reset_password_sends_token_and_new_password() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/reset-password"))
            .and(body_json(json!({"token": "reset-1", "new_password": "new-pw"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"detail": "Password has been reset"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        let api = ApiClient::new(&server.uri(), DEFAULT_TIMEOUT).unwrap();

        let message = reset_password(
            &api,
            &ResetPasswordForm {
                token: secret("reset-1"),
                new_password: secret("new-pw"),
            },
        )
        .await
        .unwrap();
        assert_eq!(message, "Password has been reset");
    }

    #[tokio::test]
    async fn verify_email_requires_token() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/verify-email"))
            .and(body_json(json!({"token": "verify-1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"detail": "Email verified"})))
            .mount(&server)
            .await;
        let api = ApiClient::new(&server.uri(), DEFAULT_TIMEOUT).unwrap();

        assert!(matches!(
            verify_email(&api, &secret(" ")).await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(
            verify_email(&api, &secret("verify-1")).await.unwrap(),
            "Email verified"
        );
    }

    #[tokio::test]
    async fn logout_clears_store_after_backend_confirms() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/logout"))
            .and(header("x-csrf", "c1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"detail": "Logged out"}))
                    .append_header("set-cookie", "csrf_token=\"\"; Max-Age=0; Path=/"),
            )
            .expect(1)
            .mount(&server)
            .await;
        let api = ApiClient::new(&server.uri(), DEFAULT_TIMEOUT).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut store = CredentialStore::empty(&path);
        store.set_access_token(secret("jwt"));
        store.import_cookie_header("csrf_token=c1; refresh_token=r1");

        let message = logout(&api, &mut store).await.unwrap();

        assert_eq!(message, "Logged out");
        assert!(store.access_token().is_none());
        let reopened = CredentialStore::open(&path).unwrap();
        assert!(reopened.access_token().is_none());
        assert!(reopened.cookie_header().is_none());
    }
}

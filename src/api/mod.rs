//! Typed access to the remote authentication API.
//!
//! Every call carries a bounded timeout and maps failures into [`AppError`].
//! Bearer tokens, CSRF values and cookies are supplied by callers for each
//! request; the client itself holds no credentials.

pub mod client;
pub mod errors;
mod http;
pub mod types;

pub use client::{ApiClient, CSRF_HEADER, DEFAULT_TIMEOUT, OAUTH_PROVIDERS};
pub use errors::AppError;
pub use http::{GENERIC_ERROR, Reply};
pub use types::{
    EmailRequest, MessageResponse, ResetPasswordRequest, Session, SignInRequest, SignUpRequest,
    TokenResponse, UNKNOWN_DEVICE, VerifyEmailRequest,
};

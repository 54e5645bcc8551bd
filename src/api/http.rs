//! Request plumbing shared by every endpoint wrapper: URL joining, a bounded
//! timeout, error mapping, and detail extraction from error bodies. Nothing in
//! here stores tokens; callers attach whatever headers the endpoint needs.

use super::errors::AppError;
use reqwest::{RequestBuilder, Response, header::SET_COOKIE};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Maximum number of error body characters surfaced to the user.
const MAX_ERROR_CHARS: usize = 200;

/// Shown when a JSON error body carries no usable `detail`.
pub const GENERIC_ERROR: &str = "Error";

/// A decoded response body plus the raw `Set-Cookie` values the server sent.
#[derive(Debug)]
pub struct Reply<T> {
    pub body: T,
    pub set_cookies: Vec<String>,
}

/// Joins an API base URL and a path without doubling or dropping slashes.
pub(crate) fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

/// Maps transport errors into `AppError` variants with timeout detection.
pub(crate) fn map_request_error(err: &reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::Timeout("Request timed out. Please try again.".to_string())
    } else if err.is_builder() {
        AppError::Serialization(format!("Failed to build request: {err}"))
    } else {
        AppError::Network(format!("Unable to reach the server: {err}"))
    }
}

pub(crate) async fn send(builder: RequestBuilder) -> Result<Response, AppError> {
    builder.send().await.map_err(|err| map_request_error(&err))
}

/// Parses JSON responses and surfaces HTTP errors with the server's detail.
pub(crate) async fn handle_json_response<T: DeserializeOwned>(
    response: Response,
) -> Result<Reply<T>, AppError> {
    let status = response.status();
    let set_cookies = collect_set_cookies(&response);
    let body = response
        .text()
        .await
        .map_err(|err| map_request_error(&err))?;

    if !status.is_success() {
        return Err(AppError::Http {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }

    // Mutations may answer 2xx with no body; decode that as an empty object.
    let text = if body.trim().is_empty() { "{}" } else { body.as_str() };
    let body = serde_json::from_str::<T>(text)
        .map_err(|err| AppError::Parse(format!("Failed to decode response: {err}")))?;

    Ok(Reply { body, set_cookies })
}

fn collect_set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::to_string)
        .collect()
}

/// Pulls a user-facing message out of an error body.
///
/// `{"detail": "text"}` yields the text, `{"detail": [{"msg": ..}, ..]}` (request
/// validation failures) yields the messages joined with `; `. Other JSON bodies
/// yield [`GENERIC_ERROR`]; non-JSON bodies are trimmed and truncated.
pub(crate) fn error_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => detail_text(&value).unwrap_or_else(|| GENERIC_ERROR.to_string()),
        Err(_) => sanitize_body(body),
    }
}

fn detail_text(value: &Value) -> Option<String> {
    match value.get("detail")? {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        _ => None,
    }
}

/// Sanitizes HTTP error bodies for user-facing messages by trimming and truncating.
fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{build_url_with_base, error_message};

    #[test]
    fn build_url_joins_without_duplicate_slashes() {
        assert_eq!(
            build_url_with_base("http://localhost:9003/", "/api/auth/sessions"),
            "http://localhost:9003/api/auth/sessions"
        );
        assert_eq!(
            build_url_with_base(" http://api.test ", "api/auth/signin"),
            "http://api.test/api/auth/signin"
        );
        assert_eq!(build_url_with_base("", "/api/auth/trial"), "/api/auth/trial");
    }

    #[test]
    fn error_message_prefers_detail_string() {
        assert_eq!(
            error_message(r#"{"detail":"Invalid credentials"}"#),
            "Invalid credentials"
        );
    }

    #[test]
    fn error_message_joins_validation_details() {
        let body = r#"{"detail":[{"loc":["body","email"],"msg":"value is not a valid email address"},{"loc":["body","password"],"msg":"field required"}]}"#;
        assert_eq!(
            error_message(body),
            "value is not a valid email address; field required"
        );
    }

    #[test]
    fn error_message_falls_back_to_truncated_body() {
        assert_eq!(error_message("   "), "Request failed.");
        assert_eq!(error_message("<h1>Bad Gateway</h1>"), "<h1>Bad Gateway</h1>");
        let long = "x".repeat(500);
        assert_eq!(error_message(&long).len(), 200);
    }

    #[test]
    fn error_message_uses_generic_text_for_json_without_detail() {
        assert_eq!(error_message("{}"), "Error");
        assert_eq!(error_message(r#"{"detail":null}"#), "Error");
        assert_eq!(error_message(r#"{"detail":""}"#), "Error");
        assert_eq!(error_message(r#"{"detail":[]}"#), "Error");
    }
}

//! Wire types for the `/api/auth` endpoints.

use serde::{Deserialize, Deserializer, Serialize};

/// Label shown for sessions the backend did not attach device details to.
pub const UNKNOWN_DEVICE: &str = "Unknown device";

/// A backend-tracked login instance as returned by `GET /api/auth/sessions`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Session {
    #[serde(deserialize_with = "deserialize_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub device_info: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub revoked: bool,
}

impl Session {
    /// Device label, falling back to [`UNKNOWN_DEVICE`] when absent or empty.
    #[must_use]
    pub fn device_label(&self) -> &str {
        match self.device_info.as_deref() {
            Some(label) if !label.is_empty() => label,
            _ => UNKNOWN_DEVICE,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RevokeSessionRequest<'a> {
    pub session_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SignUpRequest<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SignInRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct EmailRequest<'a> {
    pub email: &'a str,
}

#[derive(Debug, Serialize)]
pub struct VerifyEmailRequest<'a> {
    pub token: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ResetPasswordRequest<'a> {
    pub token: &'a str,
    pub new_password: &'a str,
}

/// Issued by sign-in and trial.
#[derive(Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

/// Generic `{"detail": ..}` body returned by most endpoints.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    #[serde(default)]
    pub detail: String,
}

// Session ids are strings on the wire today, but older backends sent integers.
fn deserialize_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct StringOrNumber;

    impl Visitor<'_> for StringOrNumber {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a number")
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value)
        }
    }

    deserializer.deserialize_any(StringOrNumber)
}

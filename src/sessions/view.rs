use crate::api::Session;
use serde::Serialize;
use std::fmt::Write;

/// Display projection of a session, one line per field as the page shows it.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SessionRow<'a> {
    pub id: &'a str,
    pub device: &'a str,
    pub created: &'a str,
    pub expires: &'a str,
    pub revoked: &'a str,
}

impl<'a> From<&'a Session> for SessionRow<'a> {
    fn from(session: &'a Session) -> Self {
        Self {
            id: &session.id,
            device: session.device_label(),
            created: session.created_at.as_deref().unwrap_or_default(),
            expires: session.expires_at.as_deref().unwrap_or_default(),
            revoked: if session.revoked { "Yes" } else { "No" },
        }
    }
}

/// Renders the status message (if any) followed by one block per session.
#[must_use]
pub fn render(message: Option<&str>, sessions: &[Session]) -> String {
    let mut out = String::from("Active Sessions\n");

    if let Some(message) = message {
        let _ = writeln!(out, "{message}");
    }

    for row in sessions.iter().map(SessionRow::from) {
        let _ = writeln!(out);
        let _ = writeln!(out, "{} [{}]", row.device, row.id);
        let _ = writeln!(out, "  Created: {}", row.created);
        let _ = writeln!(out, "  Expires: {}", row.expires);
        let _ = writeln!(out, "  Revoked: {}", row.revoked);
    }

    out
}

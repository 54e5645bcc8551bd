//! Minimal cookie handling: enough to keep the pair of cookies the backend
//! issues at sign-in and echo them back, without a full RFC 6265 jar.

/// Effect of a single `Set-Cookie` header on the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CookieUpdate {
    Set { name: String, value: String },
    Remove { name: String },
}

/// Parses one `Set-Cookie` header value. Attributes other than `Max-Age` are
/// ignored; `Max-Age` of zero or less deletes the cookie.
#[must_use]
pub fn parse_set_cookie(header: &str) -> Option<CookieUpdate> {
    let mut parts = header.split(';');
    let (name, value) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let expired = parts.any(|attribute| {
        attribute
            .split_once('=')
            .filter(|(key, _)| key.trim().eq_ignore_ascii_case("max-age"))
            .and_then(|(_, age)| age.trim().parse::<i64>().ok())
            .is_some_and(|age| age <= 0)
    });

    if expired {
        Some(CookieUpdate::Remove {
            name: name.to_string(),
        })
    } else {
        Some(CookieUpdate::Set {
            name: name.to_string(),
            value: unquote(value.trim()).to_string(),
        })
    }
}

/// Splits a `Cookie`-style string into name/value pairs, skipping malformed entries.
pub fn parse_cookie_header(cookie_header: &str) -> impl Iterator<Item = (&str, &str)> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .map(|(key, value)| (key.trim(), unquote(value.trim())))
        .filter(|(key, _)| !key.is_empty())
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(value)
}

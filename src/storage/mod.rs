//! Persistent credential store: the access token and the cookies the backend
//! set, kept in a small JSON file so that separate CLI invocations share a
//! sign-in. The file is written with owner-only permissions on unix.

pub mod cookies;

use crate::{api::AppError, context::AuthContext};
use cookies::{CookieUpdate, parse_cookie_header, parse_set_cookie};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs::{self, File, OpenOptions},
    io::{self, ErrorKind, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, instrument};

/// Cookie holding the CSRF value echoed in the `x-csrf` header.
pub const CSRF_COOKIE: &str = "csrf_token";

#[derive(Default, Serialize, Deserialize)]
struct StoredState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default)]
    cookies: BTreeMap<String, String>,
}

#[derive(Debug)]
pub struct CredentialStore {
    path: PathBuf,
    access_token: Option<SecretString>,
    cookies: BTreeMap<String, SecretString>,
}

impl CredentialStore {
    /// An empty store that will be written to `path` on [`save`](Self::save).
    #[must_use]
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            access_token: None,
            cookies: BTreeMap::new(),
        }
    }

    /// Loads the store at `path`. A missing file yields an empty store.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or decoded.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("no credential file yet");
                return Ok(Self::empty(path));
            }
            Err(err) => {
                return Err(AppError::Storage(format!(
                    "Failed to read {}: {err}",
                    path.display()
                )));
            }
        };

        let state: StoredState = serde_json::from_str(&raw).map_err(|err| {
            AppError::Storage(format!("Failed to decode {}: {err}", path.display()))
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            access_token: state.access_token.map(SecretString::from),
            cookies: state
                .cookies
                .into_iter()
                .map(|(name, value)| (name, SecretString::from(value)))
                .collect(),
        })
    }

    /// Writes the store to disk, replacing the previous file.
    ///
    /// # Errors
    /// Returns an error if the parent directory or file cannot be written.
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub fn save(&self) -> Result<(), AppError> {
        let state = StoredState {
            access_token: self
                .access_token
                .as_ref()
                .map(|token| token.expose_secret().to_string()),
            cookies: self
                .cookies
                .iter()
                .map(|(name, value)| (name.clone(), value.expose_secret().to_string()))
                .collect(),
        };
        let payload = serde_json::to_string_pretty(&state)
            .map_err(|err| AppError::Serialization(format!("Failed to encode state: {err}")))?;

        let storage_error = |err: io::Error| {
            AppError::Storage(format!("Failed to write {}: {err}", self.path.display()))
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(storage_error)?;
        }

        let tmp = self.path.with_extension("tmp");
        if let Err(err) = write_private(&tmp, payload.as_bytes()) {
            let _ = fs::remove_file(&tmp);
            return Err(storage_error(err));
        }
        if let Err(err) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(storage_error(err));
        }

        debug!("credentials saved");
        Ok(())
    }

    #[must_use]
    pub fn access_token(&self) -> Option<&SecretString> {
        self.access_token.as_ref()
    }

    pub fn set_access_token(&mut self, token: SecretString) {
        self.access_token = Some(token);
    }

    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&SecretString> {
        self.cookies.get(name)
    }

    #[must_use]
    pub fn csrf_token(&self) -> Option<&SecretString> {
        self.cookie(CSRF_COOKIE)
    }

    /// Applies the `Set-Cookie` headers of a response.
    pub fn absorb_set_cookies(&mut self, headers: &[String]) {
        for header in headers {
            match parse_set_cookie(header) {
                Some(CookieUpdate::Set { name, value }) => {
                    debug!(cookie = %name, "cookie set");
                    self.cookies.insert(name, SecretString::from(value));
                }
                Some(CookieUpdate::Remove { name }) => {
                    debug!(cookie = %name, "cookie removed");
                    self.cookies.remove(&name);
                }
                None => debug!("ignoring malformed set-cookie header"),
            }
        }
    }

    /// Imports cookies from a browser-style `a=1; b=2` string.
    /// Returns the number of cookies stored.
    pub fn import_cookie_header(&mut self, header: &str) -> usize {
        let mut imported = 0;
        for (name, value) in parse_cookie_header(header) {
            self.cookies
                .insert(name.to_string(), SecretString::from(value.to_string()));
            imported += 1;
        }
        imported
    }

    /// `Cookie` header value for requests that include credentials.
    #[must_use]
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{name}={}", value.expose_secret()))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Drops the access token and every cookie.
    pub fn clear(&mut self) {
        self.access_token = None;
        self.cookies.clear();
    }

    /// Snapshot of the credentials for view-model operations.
    #[must_use]
    pub fn auth_context(&self) -> AuthContext {
        AuthContext::new(self.access_token.clone(), self.csrf_token().cloned())
    }
}

// The file is owner-only from creation, before any secret is written.
fn write_private(path: &Path, payload: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    // `mode` only applies on creation; a leftover file keeps its old bits.
    restrict_permissions(&file)?;
    file.write_all(payload)?;
    file.sync_all()
}

#[cfg(unix)]
fn restrict_permissions(file: &File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &File) -> io::Result<()> {
    Ok(())
}

//! # planner-auth
//!
//! Client for the Next Planner authentication API: account forms (sign up,
//! sign in, trial access, password recovery, email verification, logout) and
//! the session manager, which lists the caller's sessions and revokes them.
//!
//! ## Credentials
//!
//! Sign-in and trial return an access token and set two cookies:
//! `refresh_token` (HTTP-only) and `csrf_token` (script readable). Both are
//! kept in a [`storage::CredentialStore`] file between invocations. Reads go
//! out with `Authorization: Bearer <token>`; session revocation and logout
//! additionally echo the `csrf_token` cookie in the `x-csrf` header.
//!
//! ## Session viewer
//!
//! [`sessions::SessionViewer`] loads the full list on mount and replaces it
//! wholesale on every successful load. A revoke never edits the list locally;
//! it triggers a reload. Loads are ticketed, so a slow response cannot
//! overwrite the result of a newer one.

pub mod api;
pub mod cli;
pub mod context;
pub mod forms;
pub mod sessions;
pub mod storage;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

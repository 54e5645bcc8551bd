//! Maps validated CLI arguments to an [`Action`].

use crate::cli::{
    actions::{Action, account, sessions},
    commands::{
        ARG_BACKEND_URL, ARG_COOKIES, ARG_EMAIL, ARG_FIRST_NAME, ARG_JSON, ARG_LAST_NAME,
        ARG_NEW_PASSWORD, ARG_PASSWORD, ARG_PROVIDER, ARG_SESSION_ID, ARG_STATE_FILE,
        ARG_TIMEOUT, ARG_TOKEN,
    },
    globals::GlobalArgs,
};
use crate::forms::{ResetPasswordForm, SignInForm, SignUpForm};
use anyhow::{Context, Result, anyhow};
use clap::{ArgMatches, parser::ValueSource};
use secrecy::SecretString;
use std::{env, path::PathBuf, time::Duration};

/// Backend URL variable understood by the web frontend build.
const LEGACY_BACKEND_ENV: &str = "NEXT_PUBLIC_BACKEND_URL";

const STATE_DIR: &str = "planner-auth";
const STATE_FILE: &str = "state.json";

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or no state file location
/// can be determined.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let (name, sub_m) = matches
        .subcommand()
        .context("missing subcommand, see --help")?;
    let globals = global_args(sub_m)?;

    let command = match name {
        "sessions" => {
            let command = match sub_m.subcommand() {
                None | Some(("list", _)) => sessions::Command::List,
                Some(("revoke", revoke_m)) => sessions::Command::Revoke {
                    session_id: required_string(revoke_m, ARG_SESSION_ID)?,
                },
                Some(("revoke-all", _)) => sessions::Command::RevokeAll,
                Some((other, _)) => return Err(anyhow!("unknown sessions command: {other}")),
            };
            return Ok(Action::Sessions(sessions::Args {
                globals,
                command,
                json: sub_m.get_flag(ARG_JSON),
            }));
        }
        "signup" => account::Command::SignUp(SignUpForm {
            first_name: required_string(sub_m, ARG_FIRST_NAME)?,
            last_name: required_string(sub_m, ARG_LAST_NAME)?,
            email: required_string(sub_m, ARG_EMAIL)?,
            password: required_secret(sub_m, ARG_PASSWORD)?,
        }),
        "signin" => account::Command::SignIn(SignInForm {
            email: required_string(sub_m, ARG_EMAIL)?,
            password: required_secret(sub_m, ARG_PASSWORD)?,
        }),
        "trial" => account::Command::Trial {
            email: required_string(sub_m, ARG_EMAIL)?,
        },
        "forgot-password" => account::Command::ForgotPassword {
            email: required_string(sub_m, ARG_EMAIL)?,
        },
        "reset-password" => account::Command::ResetPassword(ResetPasswordForm {
            token: required_secret(sub_m, ARG_TOKEN)?,
            new_password: required_secret(sub_m, ARG_NEW_PASSWORD)?,
        }),
        "verify-email" => account::Command::VerifyEmail {
            token: required_secret(sub_m, ARG_TOKEN)?,
        },
        "logout" => account::Command::Logout,
        "oauth" => account::Command::OAuth {
            provider: sub_m.get_one::<String>(ARG_PROVIDER).cloned(),
        },
        "import-cookies" => account::Command::ImportCookies {
            cookies: required_secret(sub_m, ARG_COOKIES)?,
        },
        other => return Err(anyhow!("unknown command: {other}")),
    };

    Ok(Action::Account(account::Args { globals, command }))
}

fn global_args(matches: &ArgMatches) -> Result<GlobalArgs> {
    let backend_url = backend_url(matches, env::var(LEGACY_BACKEND_ENV).ok())?;

    let state_file = match matches.get_one::<String>(ARG_STATE_FILE) {
        Some(path) => PathBuf::from(path),
        None => default_state_file(
            env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
            env::var_os("HOME").map(PathBuf::from),
        )
        .context("cannot determine where to store credentials, pass --state-file")?,
    };

    let timeout = matches.get_one::<u64>(ARG_TIMEOUT).copied().unwrap_or(10);

    Ok(GlobalArgs::new(backend_url, state_file).with_timeout(Duration::from_secs(timeout)))
}

// An explicit flag or PLANNER_BACKEND_URL wins; the frontend's variable only
// replaces the built-in default.
fn backend_url(matches: &ArgMatches, legacy: Option<String>) -> Result<String> {
    let configured = matches
        .get_one::<String>(ARG_BACKEND_URL)
        .cloned()
        .context("missing required argument: --backend-url")?;

    let from_default = matches.value_source(ARG_BACKEND_URL) == Some(ValueSource::DefaultValue);
    match legacy.map(|value| value.trim().to_string()) {
        Some(value) if from_default && !value.is_empty() => Ok(value),
        _ => Ok(configured),
    }
}

fn default_state_file(xdg_config_home: Option<PathBuf>, home: Option<PathBuf>) -> Option<PathBuf> {
    let config_dir = xdg_config_home
        .filter(|dir| dir.is_absolute())
        .or_else(|| home.map(|home| home.join(".config")))?;
    Some(config_dir.join(STATE_DIR).join(STATE_FILE))
}

fn required_string(matches: &ArgMatches, id: &str) -> Result<String> {
    matches
        .get_one::<String>(id)
        .cloned()
        .with_context(|| format!("missing required argument: --{id}"))
}

fn required_secret(matches: &ArgMatches, id: &str) -> Result<SecretString> {
    required_string(matches, id).map(SecretString::from)
}

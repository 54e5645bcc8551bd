use crate::{
    api::{ApiClient, OAUTH_PROVIDERS},
    cli::globals::GlobalArgs,
    forms::{self, ResetPasswordForm, SignInForm, SignUpForm},
    storage::CredentialStore,
};
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

#[derive(Debug)]
pub enum Command {
    SignUp(SignUpForm),
    SignIn(SignInForm),
    Trial { email: String },
    ForgotPassword { email: String },
    ResetPassword(ResetPasswordForm),
    VerifyEmail { token: SecretString },
    Logout,
    OAuth { provider: Option<String> },
    ImportCookies { cookies: SecretString },
}

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub command: Command,
}

/// Runs one account form and prints the message the page would show.
///
/// # Errors
/// Returns an error when validation, the request, or credential storage fails.
pub async fn execute(args: Args) -> Result<()> {
    let Args { globals, command } = args;
    let api = ApiClient::new(&globals.backend_url, globals.timeout)?;

    let message = match command {
        Command::SignUp(form) => forms::sign_up(&api, &form).await?,
        Command::SignIn(form) => {
            let mut store = open_store(&globals)?;
            forms::sign_in(&api, &mut store, &form).await?
        }
        Command::Trial { email } => {
            let mut store = open_store(&globals)?;
            forms::request_trial(&api, &mut store, &email).await?
        }
        Command::ForgotPassword { email } => forms::forgot_password(&api, &email).await?,
        Command::ResetPassword(form) => forms::reset_password(&api, &form).await?,
        Command::VerifyEmail { token } => forms::verify_email(&api, &token).await?,
        Command::Logout => {
            let mut store = open_store(&globals)?;
            forms::logout(&api, &mut store).await?
        }
        Command::OAuth { provider } => oauth_links(&api, provider.as_deref()),
        Command::ImportCookies { cookies } => {
            let mut store = open_store(&globals)?;
            let imported = store.import_cookie_header(cookies.expose_secret());
            store.save()?;
            info!(imported, "cookies imported");
            format!("Imported {imported} cookie(s)")
        }
    };

    println!("{message}");
    Ok(())
}

fn open_store(globals: &GlobalArgs) -> Result<CredentialStore> {
    CredentialStore::open(&globals.state_file)
        .with_context(|| format!("reading {}", globals.state_file.display()))
}

fn oauth_links(api: &ApiClient, provider: Option<&str>) -> String {
    match provider {
        Some(provider) => api.oauth_url(provider),
        None => OAUTH_PROVIDERS
            .iter()
            .map(|provider| format!("{provider}: {}", api.oauth_url(provider)))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

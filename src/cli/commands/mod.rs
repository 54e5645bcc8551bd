pub mod logging;

use crate::api::OAUTH_PROVIDERS;
use clap::{
    Arg, ArgAction, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub const ARG_BACKEND_URL: &str = "backend-url";
pub const ARG_STATE_FILE: &str = "state-file";
pub const ARG_TIMEOUT: &str = "timeout";
pub const ARG_EMAIL: &str = "email";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_FIRST_NAME: &str = "first-name";
pub const ARG_LAST_NAME: &str = "last-name";
pub const ARG_TOKEN: &str = "token";
pub const ARG_NEW_PASSWORD: &str = "new-password";
pub const ARG_PROVIDER: &str = "provider";
pub const ARG_COOKIES: &str = "cookies";
pub const ARG_SESSION_ID: &str = "session-id";
pub const ARG_JSON: &str = "json";

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:9003";

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let command = Command::new("planner-auth")
        .about("Next Planner account and session management")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new(ARG_BACKEND_URL)
                .long("backend-url")
                .help("Base URL of the authentication API")
                .env("PLANNER_BACKEND_URL")
                .global(true)
                .default_value(DEFAULT_BACKEND_URL),
        )
        .arg(
            Arg::new(ARG_STATE_FILE)
                .long("state-file")
                .help("Where the access token and cookies are kept, default: $XDG_CONFIG_HOME/planner-auth/state.json")
                .env("PLANNER_STATE_FILE")
                .global(true),
        )
        .arg(
            Arg::new(ARG_TIMEOUT)
                .long("timeout")
                .help("HTTP request timeout in seconds")
                .env("PLANNER_HTTP_TIMEOUT")
                .global(true)
                .default_value("10")
                .value_parser(clap::value_parser!(u64).range(1..=300)),
        )
        .subcommand(
            Command::new("signup")
                .about("Create an account; a verification link is emailed")
                .arg(
                    Arg::new(ARG_FIRST_NAME)
                        .long("first-name")
                        .help("First name")
                        .required(true),
                )
                .arg(
                    Arg::new(ARG_LAST_NAME)
                        .long("last-name")
                        .help("Last name")
                        .required(true),
                )
                .arg(email_arg())
                .arg(password_arg()),
        )
        .subcommand(
            Command::new("signin")
                .about("Sign in and store the access token")
                .arg(email_arg())
                .arg(password_arg()),
        )
        .subcommand(
            Command::new("trial")
                .about("Request 24h trial access for an unverified account")
                .arg(email_arg()),
        )
        .subcommand(
            Command::new("forgot-password")
                .about("Email a password reset link")
                .arg(email_arg()),
        )
        .subcommand(
            Command::new("reset-password")
                .about("Set a new password using a reset token")
                .arg(
                    Arg::new(ARG_TOKEN)
                        .long("token")
                        .help("Token from the reset link")
                        .env("PLANNER_RESET_TOKEN")
                        .hide_env_values(true)
                        .required(true),
                )
                .arg(
                    Arg::new(ARG_NEW_PASSWORD)
                        .long("new-password")
                        .help("New password")
                        .env("PLANNER_NEW_PASSWORD")
                        .hide_env_values(true)
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("verify-email")
                .about("Verify an email address with the token from the link")
                .arg(
                    Arg::new(ARG_TOKEN)
                        .help("Verification token")
                        .required(true),
                ),
        )
        .subcommand(Command::new("logout").about("Sign out and forget stored credentials"))
        .subcommand(
            Command::new("oauth")
                .about("Print the sign-in URL of an OAuth provider")
                .arg(
                    Arg::new(ARG_PROVIDER)
                        .help("Provider; all are listed when omitted")
                        .value_parser(OAUTH_PROVIDERS),
                ),
        )
        .subcommand(
            Command::new("import-cookies")
                .about("Store cookies copied from a browser, e.g. 'csrf_token=..; refresh_token=..'")
                .arg(
                    Arg::new(ARG_COOKIES)
                        .help("Cookie string")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("sessions")
                .about("List and revoke active sessions")
                .arg(
                    Arg::new(ARG_JSON)
                        .long("json")
                        .help("Print the session list as JSON")
                        .global(true)
                        .action(ArgAction::SetTrue),
                )
                .subcommand(Command::new("list").about("List active sessions (default)"))
                .subcommand(
                    Command::new("revoke").about("Revoke one session").arg(
                        Arg::new(ARG_SESSION_ID)
                            .help("Session id as shown by `sessions list`")
                            .required(true),
                    ),
                )
                .subcommand(Command::new("revoke-all").about("Revoke every session")),
        );

    logging::with_args(command)
}

fn email_arg() -> Arg {
    Arg::new(ARG_EMAIL)
        .short('e')
        .long("email")
        .help("Account email address")
        .env("PLANNER_EMAIL")
        .required(true)
}

fn password_arg() -> Arg {
    Arg::new(ARG_PASSWORD)
        .short('p')
        .long("password")
        .help("Account password")
        .env("PLANNER_PASSWORD")
        .hide_env_values(true)
        .required(true)
}

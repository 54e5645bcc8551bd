use crate::{
    api::ApiClient,
    cli::globals::GlobalArgs,
    sessions::{LoadOutcome, MutationOutcome, SessionRow, SessionViewer},
    storage::CredentialStore,
};
use anyhow::{Context, Result, bail};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Revoke { session_id: String },
    RevokeAll,
}

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub command: Command,
    pub json: bool,
}

/// Mounts the session viewer (one load), applies the requested mutation, and
/// prints the resulting view.
///
/// # Errors
/// Returns an error if the credentials cannot be read, or when the requested
/// operation did not succeed; the view is printed first in that case.
pub async fn execute(args: Args) -> Result<()> {
    let api = ApiClient::new(&args.globals.backend_url, args.globals.timeout)?;
    let store = CredentialStore::open(&args.globals.state_file)
        .with_context(|| format!("reading {}", args.globals.state_file.display()))?;
    let ctx = store.auth_context();

    let mut viewer = SessionViewer::new();
    let mounted = viewer.load(&api, &ctx).await;
    debug!(?mounted, "initial load");

    let succeeded = match &args.command {
        Command::List => matches!(mounted, LoadOutcome::Loaded(_)),
        Command::Revoke { session_id } => reloaded(&viewer.revoke(&api, &ctx, session_id).await),
        Command::RevokeAll => reloaded(&viewer.revoke_all(&api, &ctx).await),
    };

    print_view(&viewer, args.json)?;

    if succeeded {
        Ok(())
    } else {
        bail!("{}", viewer.message().unwrap_or("Session operation failed"))
    }
}

fn reloaded(outcome: &MutationOutcome) -> bool {
    matches!(outcome, MutationOutcome::Reloaded(LoadOutcome::Loaded(_)))
}

fn print_view(viewer: &SessionViewer, json: bool) -> Result<()> {
    if json {
        let rows: Vec<SessionRow<'_>> = viewer.sessions().iter().map(SessionRow::from).collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print!("{}", viewer.render());
    }
    Ok(())
}

//! Commands that start a new editing session, replacing any session in progress.

use crate::args::{LoadArgs, NewArgs};
use crate::commands::{today, Out};
use crate::hydrate::hydrate_json;
use crate::{utils, Config, Result, Session};
use anyhow::Context;
use tracing::info;

/// Starts a new, empty budget.
pub async fn new_budget(config: Config, args: NewArgs) -> Result<Out<()>> {
    let name = args.name().unwrap_or(config.default_root_name());
    let effective_date = args.effective_date().unwrap_or_else(today);
    let session = Session::create(name, effective_date).with_history_limit(config.history_limit());
    replace_session(&config, &session).await?;
    Ok(format!("Started a new budget '{name}' effective {effective_date}").into())
}

/// Starts editing a stored budget from the rows the backend returned for it.
pub async fn load(config: Config, args: LoadArgs) -> Result<Out<()>> {
    let json = utils::read(args.rows()).await?;
    let tree = hydrate_json(&json)
        .with_context(|| format!("Unable to load budget rows from {}", args.rows().display()))?;
    let effective_date = args.effective_date().unwrap_or_else(today);
    let count = tree.len();
    let session = Session::edit(tree, effective_date).with_history_limit(config.history_limit());
    replace_session(&config, &session).await?;
    Ok(format!(
        "Loaded '{}' with {count} node(s) effective {effective_date}",
        session.tree().root().name()
    )
    .into())
}

async fn replace_session(config: &Config, session: &Session) -> Result<()> {
    if let Some(path) = config.backup().copy_session().await? {
        info!("Backed up the previous session to {}", path.display());
    }
    config.save_session(session).await
}

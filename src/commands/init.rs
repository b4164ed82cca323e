use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the budget home directory, its backups subdirectory and an initial `config.json` with
/// default settings.
///
/// # Arguments
/// - `budget_home` - The directory that will hold the configuration and the session being
///   edited, e.g. `$HOME/budget-tree`
///
/// # Errors
/// - Returns an error if any file operations fail.
pub async fn init(budget_home: &Path) -> Result<Out<()>> {
    let config = Config::create(budget_home)
        .await
        .context("Unable to create the budget home directory and config")?;
    Ok(format!(
        "Successfully created the budget home at {}",
        config.root().display()
    )
    .into())
}

//! Configuration file handling for the budget editor.
//!
//! The configuration file is stored at `$BUDGET_HOME/config.json` and contains settings such as
//! the undo depth and how many backups to keep. The session being edited lives next to it in
//! `$BUDGET_HOME/session.json`.

use crate::backup::Backup;
use crate::session::{Session, DEFAULT_HISTORY_LIMIT};
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_NAME: &str = "budget-tree";
const CONFIG_VERSION: u8 = 1;
const BACKUP_COPIES: u32 = 5;
const DEFAULT_ROOT_NAME: &str = "Budget";
const BACKUPS: &str = ".backups";
const CONFIG_JSON: &str = "config.json";
const SESSION_JSON: &str = "session.json";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$BUDGET_HOME` and from there it loads `$BUDGET_HOME/config.json`. It provides
/// paths to other items that are expected in a certain location within the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    backups: PathBuf,
    config_path: PathBuf,
    session_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the home directory, its backups subdirectory and an initial `config.json` with
    /// default settings.
    ///
    /// # Errors
    /// - Returns an error if any file operations fail.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the budget home directory")?;

        let root = utils::canonicalize(&maybe_relative).await?;

        let backups_dir = root.join(BACKUPS);
        utils::make_dir(&backups_dir).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile::default();
        config_file.save(&config_path).await?;

        Ok(Self {
            session_path: root.join(SESSION_JSON),
            root,
            backups: backups_dir,
            config_path,
            config_file,
        })
    }

    /// This will
    /// - validate that `budget_home` exists and that the config file exists
    /// - load the config file
    /// - validate that the backups directory exists
    /// - return the loaded configuration object
    pub async fn load(budget_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = budget_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("Budget home is missing, run 'budget init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let config = Self {
            backups: root.join(BACKUPS),
            session_path: root.join(SESSION_JSON),
            root,
            config_path,
            config_file,
        };
        if !config.backups.is_dir() {
            bail!(
                "The backups directory is missing '{}'",
                config.backups.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn backups(&self) -> &Path {
        &self.backups
    }

    pub fn session_path(&self) -> &Path {
        &self.session_path
    }

    pub fn backup_copies(&self) -> u32 {
        self.config_file.backup_copies
    }

    pub fn history_limit(&self) -> usize {
        self.config_file.history_limit
    }

    pub fn default_root_name(&self) -> &str {
        &self.config_file.default_root_name
    }

    /// Creates a new `Backup` instance for managing backup files.
    pub fn backup(&self) -> Backup {
        Backup::new(self)
    }

    pub fn has_session(&self) -> bool {
        self.session_path.is_file()
    }

    /// Loads the session being edited, applying the configured undo depth.
    pub async fn load_session(&self) -> Result<Session> {
        if !self.has_session() {
            bail!("There is no budget being edited, run 'budget new' or 'budget load' first")
        }
        let session: Session = utils::deserialize(&self.session_path).await?;
        Ok(session.with_history_limit(self.history_limit()))
    }

    /// Writes the session next to its final location and then moves it into place, so an
    /// interrupted write never leaves a truncated `session.json`.
    pub async fn save_session(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string_pretty(session).context("Unable to serialize session")?;
        let tmp = self.session_path.with_extension("json.tmp");
        utils::write(&tmp, json).await?;
        utils::rename(&tmp, &self.session_path).await?;
        debug!("Saved session to {}", self.session_path.display());
        Ok(())
    }
}

/// Represents the serialization and deserialization format of the `config.json` file.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    app_name: String,
    config_version: u8,
    #[serde(default = "default_backup_copies")]
    backup_copies: u32,
    #[serde(default = "default_history_limit")]
    history_limit: usize,
    #[serde(default = "default_root_name")]
    default_root_name: String,
}

fn default_backup_copies() -> u32 {
    BACKUP_COPIES
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_root_name() -> String {
    DEFAULT_ROOT_NAME.to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            backup_copies: BACKUP_COPIES,
            history_limit: DEFAULT_HISTORY_LIMIT,
            default_root_name: DEFAULT_ROOT_NAME.to_string(),
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.config_version <= CONFIG_VERSION,
            "Config version {} is newer than this program supports ({})",
            config.config_version,
            CONFIG_VERSION
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }
}

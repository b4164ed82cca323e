//! Command handlers for the budget CLI.
//!
//! Each handler loads what it needs from the budget home, does its work and returns an `Out`.
//! Handlers that edit the budget write the session back before returning.

mod edit;
mod init;
mod save;
mod schema;
mod session;
mod view;

use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use edit::{add, drop_node, move_node, remove, set, undo};
pub use init::init;
pub use save::{payload, saved};
pub use schema::{schema, Schemas};
pub use session::{load, new_budget};
pub use view::{render, show};

/// The output type for a command: a message for the user and, optionally, structured data that
/// the caller may print or inspect.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to stdout.
    pub fn print_json(&self) -> crate::Result<()> {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            println!("{}", serde_json::to_string_pretty(structure)?);
        }
        Ok(())
    }
}

/// Today's date in local time, used when no effective date is given.
fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

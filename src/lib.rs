//! budget-tree: the editing core of a hierarchical construction budget.
//!
//! A budget is an ordered tree of categories and costed line items. The `tree` module holds the
//! editing operations, `payload` and `hydrate` convert to and from the backend's wire formats,
//! and `session` is the state container an editor drives.

mod backup;
pub mod args;
pub mod commands;
mod config;
mod error;
pub mod hydrate;
pub mod model;
pub mod payload;
pub mod session;
pub mod tree;
mod utils;


pub use backup::Backup;
pub use config::Config;
pub use error::Error;
pub use error::Result;
pub use session::{Mode, Session};
pub use tree::{BudgetTree, InvalidMove};

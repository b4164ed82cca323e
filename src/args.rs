//! These structs provide the CLI interface for the budget CLI.

use crate::model::Field;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// budget: edit hierarchical construction budgets from the command line.
///
/// A budget is a tree of categories and costed line items. You either start a new one with
/// `budget new` or load a stored one from the rows your backend returned with `budget load`.
/// Edits are kept in $BUDGET_HOME/session.json until you produce a save payload with
/// `budget payload` and confirm it with `budget saved`.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the budget home directory and its configuration file.
    Init,
    /// Start a new budget. Any budget currently being edited is backed up first.
    New(NewArgs),
    /// Start editing a stored budget from the JSON rows returned by the backend.
    Load(LoadArgs),
    /// Add a category, or a line item with --item.
    Add(AddArgs),
    /// Change the name, unit, quantity or rate of a node.
    Set(SetArgs),
    /// Remove a node and everything below it.
    Remove(IdArgs),
    /// Move a node, with everything below it, under another category.
    Move(MoveArgs),
    /// Drop a node onto another node as a drag-and-drop would.
    ///
    /// Dropping onto a category nests the node inside it. Dropping onto an item places the node
    /// next to that item.
    Drop(DropArgs),
    /// Undo the last edit.
    Undo,
    /// Print the budget tree with totals.
    Show,
    /// Print, or write with --out, the JSON body of the save request.
    Payload(PayloadArgs),
    /// Confirm that the last payload was saved by the backend.
    Saved,
    /// Print the JSON Schemas of the save payload and of the rows accepted by `load`.
    Schema,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where the budget session and configuration are held. Defaults to
    /// ~/budget-tree
    #[arg(long, env = "BUDGET_HOME", default_value_t = default_budget_home())]
    budget_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, budget_home: PathBuf) -> Self {
        Self {
            log_level,
            budget_home: budget_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn budget_home(&self) -> &DisplayPath {
        &self.budget_home
    }
}

/// Args for the `budget new` command.
#[derive(Debug, Parser, Clone)]
pub struct NewArgs {
    /// The name of the top-level category. Defaults to the configured default root name.
    #[arg(long)]
    name: Option<String>,

    /// The date the budget takes effect, YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    effective_date: Option<NaiveDate>,
}

impl NewArgs {
    pub fn new(name: Option<String>, effective_date: Option<NaiveDate>) -> Self {
        Self {
            name,
            effective_date,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn effective_date(&self) -> Option<NaiveDate> {
        self.effective_date
    }
}

/// Args for the `budget load` command.
#[derive(Debug, Parser, Clone)]
pub struct LoadArgs {
    /// Path to the JSON rows returned by the backend for the budget.
    rows: PathBuf,

    /// The date the budget takes effect, YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    effective_date: Option<NaiveDate>,
}

impl LoadArgs {
    pub fn new(rows: impl Into<PathBuf>, effective_date: Option<NaiveDate>) -> Self {
        Self {
            rows: rows.into(),
            effective_date,
        }
    }

    pub fn rows(&self) -> &Path {
        &self.rows
    }

    pub fn effective_date(&self) -> Option<NaiveDate> {
        self.effective_date
    }
}

/// Args for the `budget add` command.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    /// The id of the category to add to. Defaults to the top level.
    #[arg(long)]
    parent: Option<String>,

    /// The display name of the new node.
    #[arg(long)]
    name: String,

    /// Add a line item instead of a category.
    #[arg(long)]
    item: bool,

    /// Unit of measure of the line item, e.g. m3.
    #[arg(long, requires = "item", default_value = "")]
    unit: String,

    /// Quantity of the line item.
    #[arg(long, requires = "item", default_value = "")]
    quantity: String,

    /// Rate per unit of the line item.
    #[arg(long, requires = "item", default_value = "")]
    rate: String,
}

impl AddArgs {
    pub fn category(parent: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            parent: parent.map(String::from),
            name: name.into(),
            item: false,
            unit: String::new(),
            quantity: String::new(),
            rate: String::new(),
        }
    }

    pub fn item(
        parent: Option<&str>,
        name: impl Into<String>,
        unit: impl Into<String>,
        quantity: impl Into<String>,
        rate: impl Into<String>,
    ) -> Self {
        Self {
            parent: parent.map(String::from),
            name: name.into(),
            item: true,
            unit: unit.into(),
            quantity: quantity.into(),
            rate: rate.into(),
        }
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_item(&self) -> bool {
        self.item
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn quantity(&self) -> &str {
        &self.quantity
    }

    pub fn rate(&self) -> &str {
        &self.rate
    }
}

/// Args for the `budget set` command.
#[derive(Debug, Parser, Clone)]
pub struct SetArgs {
    /// The id of the node to change.
    id: String,

    /// The field to change.
    #[arg(value_enum)]
    field: Field,

    /// The new value. Quantities and rates are kept as typed.
    value: String,
}

impl SetArgs {
    pub fn new(id: impl Into<String>, field: Field, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            field,
            value: value.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn field(&self) -> Field {
        self.field
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Args for commands that take a single node id.
#[derive(Debug, Parser, Clone)]
pub struct IdArgs {
    /// The id of the node.
    id: String,
}

impl IdArgs {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Args for the `budget move` command.
#[derive(Debug, Parser, Clone)]
pub struct MoveArgs {
    /// The id of the node to move.
    id: String,

    /// The id of the new parent. An unknown id moves the node to the top level.
    parent: String,
}

impl MoveArgs {
    pub fn new(id: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent: parent.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn parent(&self) -> &str {
        &self.parent
    }
}

/// Args for the `budget drop` command.
#[derive(Debug, Parser, Clone)]
pub struct DropArgs {
    /// The id of the dragged node.
    dragged: String,

    /// The id of the node it is dropped onto.
    target: String,
}

impl DropArgs {
    pub fn new(dragged: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            dragged: dragged.into(),
            target: target.into(),
        }
    }

    pub fn dragged(&self) -> &str {
        &self.dragged
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

/// Args for the `budget payload` command.
#[derive(Debug, Parser, Clone)]
pub struct PayloadArgs {
    /// Write the payload to this file instead of printing it.
    #[arg(long)]
    out: Option<PathBuf>,
}

impl PayloadArgs {
    pub fn new(out: Option<PathBuf>) -> Self {
        Self { out }
    }

    pub fn out(&self) -> Option<&Path> {
        self.out.as_deref()
    }
}

fn default_budget_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("budget-tree"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --budget-home or BUDGET_HOME instead of relying on the default \
                budget home directory.",
            );
            PathBuf::from("budget-tree")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

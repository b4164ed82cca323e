//! Types that represent the core data model: node ids, amounts and the nodes of a budget tree.
mod amount;
mod id;
mod node;

pub use amount::{Amount, AmountError, AmountFormat, MONEY_FORMAT, WIRE_DECIMAL_PLACES};
pub use id::NodeId;
pub use node::{Field, LineItem, Node, NodeKind};

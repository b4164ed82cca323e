use crate::model::{Amount, NodeId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One element of a budget tree: a category or a costed line item.
///
/// Every node carries a child list, even items, so that tree walks treat both kinds the same way.
/// Items never receive children through the editor.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Node {
    id: NodeId,
    name: String,
    kind: NodeKind,
    children: Vec<Node>,
}

/// Whether a node is a category or a line item. Fixed for the node's lifetime.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum NodeKind {
    Category,
    Item(LineItem),
}

/// The cost data of an item. Quantity and rate are kept exactly as typed.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LineItem {
    pub(crate) unit: String,
    pub(crate) quantity: String,
    pub(crate) rate: String,
    /// The persisted item row this node was loaded from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) server_item_id: Option<i64>,
}

/// The editable fields of a node.
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Unit,
    Quantity,
    Rate,
}

serde_plain::derive_display_from_serialize!(Field);
serde_plain::derive_fromstr_from_deserialize!(Field);

impl LineItem {
    pub fn new(
        unit: impl Into<String>,
        quantity: impl Into<String>,
        rate: impl Into<String>,
    ) -> Self {
        Self {
            unit: unit.into(),
            quantity: quantity.into(),
            rate: rate.into(),
            server_item_id: None,
        }
    }

    pub(crate) fn with_server_item_id(mut self, server_item_id: Option<i64>) -> Self {
        self.server_item_id = server_item_id;
        self
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

    pub fn server_item_id(&self) -> Option<i64> {
        self.server_item_id
    }

    /// `quantity * rate`, for display only. Never stored and never rounded.
    pub fn total(&self) -> Amount {
        (Amount::coerce(&self.quantity) * Amount::coerce(&self.rate)).as_money()
    }
}

impl Node {
    /// Creates a category with no children.
    pub fn category(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            kind: NodeKind::Category,
            children: Vec::new(),
        }
    }

    /// Creates a line item.
    pub fn item(id: NodeId, name: impl Into<String>, line: LineItem) -> Self {
        Self {
            id,
            name: name.into(),
            kind: NodeKind::Item(line),
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn is_item(&self) -> bool {
        matches!(self.kind, NodeKind::Item(_))
    }

    pub fn line_item(&self) -> Option<&LineItem> {
        match &self.kind {
            NodeKind::Item(line) => Some(line),
            NodeKind::Category => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    /// Builder used when assembling a tree from nested data.
    pub(crate) fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// Replaces one field. Cost fields on a category do not exist, so setting them does nothing.
    pub(crate) fn set_field(&mut self, field: Field, value: String) {
        match (field, &mut self.kind) {
            (Field::Name, _) => self.name = value,
            (Field::Unit, NodeKind::Item(line)) => line.unit = value,
            (Field::Quantity, NodeKind::Item(line)) => line.quantity = value,
            (Field::Rate, NodeKind::Item(line)) => line.rate = value,
            (field, NodeKind::Category) => {
                debug!("Ignoring {field} on category {}", self.id);
            }
        }
    }

    /// Depth-first search of this subtree, including this node.
    pub fn find(&self, id: &NodeId) -> Option<&Node> {
        if &self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    pub(crate) fn find_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        if &self.id == id {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_mut(id))
    }

    /// Returns the node whose children contain `id`.
    pub fn find_parent(&self, id: &NodeId) -> Option<&Node> {
        if self.children.iter().any(|child| &child.id == id) {
            return Some(self);
        }
        self.children
            .iter()
            .find_map(|child| child.find_parent(id))
    }

    /// Detaches the node with `id` from anywhere below this node and returns it.
    pub(crate) fn detach(&mut self, id: &NodeId) -> Option<Node> {
        if let Some(ix) = self.children.iter().position(|child| &child.id == id) {
            return Some(self.children.remove(ix));
        }
        self.children
            .iter_mut()
            .find_map(|child| child.detach(id))
    }

    /// Visits this node and every descendant in depth-first pre-order.
    pub fn walk(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// The server item ids of every item in this subtree.
    pub fn server_item_ids(&self) -> Vec<i64> {
        self.walk()
            .into_iter()
            .filter_map(|node| node.line_item().and_then(LineItem::server_item_id))
            .collect()
    }

    /// The sum of the totals of every item in this subtree.
    pub fn subtotal(&self) -> Amount {
        self.walk()
            .into_iter()
            .filter_map(Node::line_item)
            .map(LineItem::total)
            .sum::<Amount>()
            .as_money()
    }
}

//! The budget tree and its editing operations.
//!
//! Every operation takes `&self` and returns a new `BudgetTree`, so a caller can keep old values
//! around as snapshots. A lookup miss is never an error here: the operation hands back an
//! unchanged tree. Moves are the exception, they report why they were refused with `InvalidMove`.

use crate::model::{Field, Node, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use tracing::{debug, trace};

/// An ordered tree of categories and line items under a single root.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BudgetTree {
    root: Node,
}

/// Why a move or drop was refused. The tree is left untouched in every case.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum InvalidMove {
    /// The node being moved does not exist. Callers treat this as a silent no-op.
    NotFound,
    /// The root cannot be moved.
    Root,
    /// The destination is the moved node itself or one of its descendants.
    IntoOwnSubtree,
}

impl InvalidMove {
    /// Whether the editor should show this refusal to the user.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, InvalidMove::NotFound)
    }
}

impl Display for InvalidMove {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidMove::NotFound => f.write_str("the node being moved no longer exists"),
            InvalidMove::Root => f.write_str("the top level of the budget cannot be moved"),
            InvalidMove::IntoOwnSubtree => f.write_str("cannot move into its own child"),
        }
    }
}

impl std::error::Error for InvalidMove {}

impl Default for BudgetTree {
    fn default() -> Self {
        Self::new("")
    }
}

impl BudgetTree {
    /// A fresh tree: a root category with no children.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            root: Node::category(NodeId::root(), root_name),
        }
    }

    /// A root with the given top-level nodes already in place.
    pub(crate) fn with_children(root_name: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            root: Node::category(NodeId::root(), root_name).with_children(children),
        }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Depth-first search by id.
    pub fn find_node(&self, id: &NodeId) -> Option<&Node> {
        self.root.find(id)
    }

    /// Returns the parent of `id`, or `None` for the root and for unknown ids.
    pub fn find_parent(&self, id: &NodeId) -> Option<&Node> {
        self.root.find_parent(id)
    }

    /// True iff `candidate` is `ancestor` or lies anywhere below it.
    pub fn is_descendant(&self, ancestor: &NodeId, candidate: &NodeId) -> bool {
        self.find_node(ancestor)
            .map(|node| node.find(candidate).is_some())
            .unwrap_or(false)
    }

    /// Replaces one field of one node.
    pub fn update_field(&self, id: &NodeId, field: Field, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        match next.root.find_mut(id) {
            Some(node) => node.set_field(field, value.into()),
            None => debug!("update_field: no node with id {id}"),
        }
        next
    }

    /// Appends `node` as the last child of `parent_id`, or of the root if the parent is unknown.
    pub fn add_child(&self, parent_id: &NodeId, node: Node) -> Self {
        let mut next = self.clone();
        match next.root.find_mut(parent_id) {
            Some(parent) => parent.children_mut().push(node),
            None => {
                debug!("add_child: no node with id {parent_id}, attaching to the root");
                next.root.children_mut().push(node)
            }
        }
        next
    }

    /// Detaches `id` and its whole subtree. The root cannot be removed.
    pub fn remove_node(&self, id: &NodeId) -> (Self, Option<Node>) {
        if id.is_root() {
            debug!("remove_node: refusing to remove the root");
            return (self.clone(), None);
        }
        let mut next = self.clone();
        match next.root.detach(id) {
            Some(removed) => (next, Some(removed)),
            None => {
                debug!("remove_node: no node with id {id}");
                (self.clone(), None)
            }
        }
    }

    /// Re-parents `node_id` under `new_parent_id`, appending it after the existing children.
    ///
    /// The node is detached first, then the destination is checked against the detached subtree,
    /// so a node can never end up below itself. A destination that does not exist means the root.
    pub fn move_node(
        &self,
        node_id: &NodeId,
        new_parent_id: &NodeId,
    ) -> Result<Self, InvalidMove> {
        if node_id.is_root() {
            return Err(InvalidMove::Root);
        }
        let (detached, moved) = self.remove_node(node_id);
        let moved = moved.ok_or(InvalidMove::NotFound)?;
        if moved.find(new_parent_id).is_some() {
            return Err(InvalidMove::IntoOwnSubtree);
        }
        let parent = if detached.find_node(new_parent_id).is_some() {
            new_parent_id.clone()
        } else {
            trace!("move_node: destination {new_parent_id} not found, using the root");
            NodeId::root()
        };
        Ok(detached.add_child(&parent, moved))
    }

    /// Drag-and-drop policy. Dropping onto a category nests the dragged node inside it; dropping
    /// onto an item makes the dragged node a sibling of that item.
    pub fn handle_drop(&self, dragged: &NodeId, target: &NodeId) -> Result<Self, InvalidMove> {
        if dragged.is_root() {
            return Err(InvalidMove::Root);
        }
        if self.find_node(dragged).is_none() {
            return Err(InvalidMove::NotFound);
        }
        if self.is_descendant(dragged, target) {
            return Err(InvalidMove::IntoOwnSubtree);
        }
        let new_parent = match self.find_node(target) {
            Some(node) if node.is_item() => self
                .find_parent(target)
                .map(|parent| parent.id().clone())
                .unwrap_or_else(NodeId::root),
            Some(node) => node.id().clone(),
            None => NodeId::root(),
        };
        self.move_node(dragged, &new_parent)
    }

    /// Ids of every non-root node whose name is blank.
    pub fn unnamed_nodes(&self) -> Vec<NodeId> {
        self.root
            .walk()
            .into_iter()
            .filter(|node| !node.id().is_root() && node.name().trim().is_empty())
            .map(|node| node.id().clone())
            .collect()
    }

    /// Number of nodes, including the root.
    pub fn len(&self) -> usize {
        self.root.walk().len()
    }

    /// True when the root has no children.
    pub fn is_empty(&self) -> bool {
        self.root.children().is_empty()
    }

    /// Checks the structural invariants: a single sentinel root, unique ids, no sentinel below
    /// the root. Cycles cannot be represented by an owned tree.
    pub fn check_invariants(&self) -> crate::Result<()> {
        anyhow::ensure!(self.root.id().is_root(), "The root does not carry the root id");
        let mut seen = HashSet::new();
        for node in self.root.walk() {
            anyhow::ensure!(
                seen.insert(node.id().clone()),
                "Node id {} appears more than once",
                node.id()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LineItem;

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    fn item(i: &str, name: &str) -> Node {
        Node::item(id(i), name, LineItem::new("ea", "1", "1"))
    }

    /// Root -> CatA -> [ItemX, ItemY], Root -> CatB -> CatC
    fn sample() -> BudgetTree {
        let tree = BudgetTree::new("Budget");
        let tree = tree.add_child(&NodeId::root(), Node::category(id("a"), "CatA"));
        let tree = tree.add_child(&id("a"), item("x", "ItemX"));
        let tree = tree.add_child(&id("a"), item("y", "ItemY"));
        let tree = tree.add_child(&NodeId::root(), Node::category(id("b"), "CatB"));
        tree.add_child(&id("b"), Node::category(id("c"), "CatC"))
    }

    fn child_ids(tree: &BudgetTree, parent: &str) -> Vec<String> {
        tree.find_node(&id(parent))
            .unwrap()
            .children()
            .iter()
            .map(|n| n.id().to_string())
            .collect()
    }

    #[test]
    fn test_new_tree() {
        let tree = BudgetTree::new("Budget");
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 1);
        assert!(tree.root().id().is_root());
        assert_eq!(tree.root().name(), "Budget");
    }

    #[test]
    fn test_add_child_appends_in_order() {
        let tree = sample();
        assert_eq!(child_ids(&tree, "a"), vec!["x", "y"]);
        assert_eq!(child_ids(&tree, "root"), vec!["a", "b"]);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_add_child_unknown_parent_goes_to_root() {
        let tree = sample().add_child(&id("nope"), item("n", "New"));
        assert_eq!(child_ids(&tree, "root"), vec!["a", "b", "n"]);
    }

    #[test]
    fn test_add_child_leaves_input_untouched() {
        let before = sample();
        let _after = before.add_child(&id("a"), item("n", "New"));
        assert_eq!(child_ids(&before, "a"), vec!["x", "y"]);
    }

    #[test]
    fn test_update_field() {
        let tree = sample().update_field(&id("x"), Field::Quantity, "3");
        let line = tree.find_node(&id("x")).unwrap().line_item().unwrap();
        assert_eq!(line.quantity(), "3");
        let tree = tree.update_field(&id("a"), Field::Name, "Earthworks");
        assert_eq!(tree.find_node(&id("a")).unwrap().name(), "Earthworks");
    }

    #[test]
    fn test_update_field_miss_is_noop() {
        let tree = sample();
        assert_eq!(tree.update_field(&id("ghost"), Field::Name, "x"), tree);
    }

    #[test]
    fn test_remove_node_returns_subtree() {
        let (tree, removed) = sample().remove_node(&id("a"));
        let removed = removed.unwrap();
        assert_eq!(removed.name(), "CatA");
        assert_eq!(removed.children().len(), 2);
        assert!(tree.find_node(&id("x")).is_none());
        assert_eq!(child_ids(&tree, "root"), vec!["b"]);
    }

    #[test]
    fn test_remove_root_is_noop() {
        let tree = sample();
        let (after, removed) = tree.remove_node(&NodeId::root());
        assert!(removed.is_none());
        assert_eq!(after, tree);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let tree = sample();
        let (after, removed) = tree.remove_node(&id("ghost"));
        assert!(removed.is_none());
        assert_eq!(after, tree);
    }

    #[test]
    fn test_move_node() {
        let tree = sample().move_node(&id("x"), &id("c")).unwrap();
        assert_eq!(child_ids(&tree, "a"), vec!["y"]);
        assert_eq!(child_ids(&tree, "c"), vec!["x"]);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_move_into_own_subtree_is_rejected() {
        let tree = sample();
        assert_eq!(
            tree.move_node(&id("b"), &id("c")),
            Err(InvalidMove::IntoOwnSubtree)
        );
        assert_eq!(
            tree.move_node(&id("b"), &id("b")),
            Err(InvalidMove::IntoOwnSubtree)
        );
    }

    #[test]
    fn test_move_root_is_rejected() {
        assert_eq!(
            sample().move_node(&NodeId::root(), &id("a")),
            Err(InvalidMove::Root)
        );
    }

    #[test]
    fn test_move_missing_node() {
        assert_eq!(
            sample().move_node(&id("ghost"), &id("a")),
            Err(InvalidMove::NotFound)
        );
        assert!(!InvalidMove::NotFound.is_user_facing());
    }

    #[test]
    fn test_move_to_unknown_parent_goes_to_root() {
        let tree = sample().move_node(&id("c"), &id("ghost")).unwrap();
        assert_eq!(child_ids(&tree, "root"), vec!["a", "b", "c"]);
        assert!(child_ids(&tree, "b").is_empty());
    }

    #[test]
    fn test_is_descendant() {
        let tree = sample();
        assert!(tree.is_descendant(&id("b"), &id("c")));
        assert!(tree.is_descendant(&id("b"), &id("b")));
        assert!(tree.is_descendant(&NodeId::root(), &id("x")));
        assert!(!tree.is_descendant(&id("c"), &id("b")));
        assert!(!tree.is_descendant(&id("ghost"), &id("b")));
    }

    #[test]
    fn test_drop_on_item_becomes_sibling() {
        let tree = sample().add_child(&NodeId::root(), item("z", "Z"));
        let tree = tree.handle_drop(&id("z"), &id("x")).unwrap();
        assert_eq!(child_ids(&tree, "a"), vec!["x", "y", "z"]);
        assert!(tree.find_node(&id("x")).unwrap().children().is_empty());
    }

    #[test]
    fn test_drop_on_top_level_item_goes_to_root() {
        let tree = sample().add_child(&NodeId::root(), item("t", "Top"));
        let tree = tree.handle_drop(&id("y"), &id("t")).unwrap();
        assert_eq!(child_ids(&tree, "root"), vec!["a", "b", "t", "y"]);
        assert_eq!(child_ids(&tree, "a"), vec!["x"]);
    }

    #[test]
    fn test_drop_on_sibling_moves_to_end() {
        let tree = sample().add_child(&id("a"), item("w", "ItemW"));
        let tree = tree.handle_drop(&id("x"), &id("y")).unwrap();
        assert_eq!(child_ids(&tree, "a"), vec!["y", "w", "x"]);
    }

    #[test]
    fn test_drop_on_category_nests() {
        let tree = sample().handle_drop(&id("a"), &id("c")).unwrap();
        assert_eq!(child_ids(&tree, "c"), vec!["a"]);
        assert_eq!(child_ids(&tree, "root"), vec!["b"]);
    }

    #[test]
    fn test_drop_on_own_descendant_item_is_rejected() {
        let tree = sample();
        assert_eq!(
            tree.handle_drop(&id("a"), &id("x")),
            Err(InvalidMove::IntoOwnSubtree)
        );
        assert_eq!(
            tree.handle_drop(&id("x"), &id("x")),
            Err(InvalidMove::IntoOwnSubtree)
        );
    }

    #[test]
    fn test_drop_root_is_rejected() {
        let err = sample().handle_drop(&NodeId::root(), &id("c")).unwrap_err();
        assert_eq!(err, InvalidMove::Root);
        assert!(err.is_user_facing());
    }

    #[test]
    fn test_rejection_message() {
        assert_eq!(
            InvalidMove::IntoOwnSubtree.to_string(),
            "cannot move into its own child"
        );
    }

    #[test]
    fn test_unnamed_nodes() {
        let tree = sample().update_field(&id("y"), Field::Name, "  ");
        assert_eq!(tree.unnamed_nodes(), vec![id("y")]);
        assert!(BudgetTree::default().unnamed_nodes().is_empty());
    }

    #[test]
    fn test_duplicate_ids_fail_invariants() {
        let tree = sample().add_child(&id("b"), item("x", "Dup"));
        assert!(tree.check_invariants().is_err());
    }
}

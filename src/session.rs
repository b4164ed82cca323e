//! The editing session: the single owner of the budget being edited.
//!
//! A `Session` holds the current `BudgetTree` value and replaces it with the value returned by
//! each tree operation. It also keeps what the tree alone cannot: the persisted items deleted
//! so far, whether the budget is new or already stored, and an undo history.

use crate::model::{Field, LineItem, Node, NodeId};
use crate::payload::{serialize, CreatePayload, SavePayload, UpdatePayload};
use crate::tree::{BudgetTree, InvalidMove};
use crate::Result;
use anyhow::bail;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Undo depth used when none is configured.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Whether saving creates a new budget or updates a stored one.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Create,
    Update,
}

serde_plain::derive_display_from_serialize!(Mode);
serde_plain::derive_fromstr_from_deserialize!(Mode);

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
struct Snapshot {
    tree: BudgetTree,
    deleted_item_ids: BTreeSet<i64>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Session {
    mode: Mode,
    effective_date: NaiveDate,
    tree: BudgetTree,
    /// Persisted items removed since the last confirmed save.
    deleted_item_ids: BTreeSet<i64>,
    #[serde(default)]
    history: Vec<Snapshot>,
    #[serde(default = "default_history_limit")]
    history_limit: usize,
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

impl Session {
    /// Starts a new budget.
    pub fn create(root_name: impl Into<String>, effective_date: NaiveDate) -> Self {
        Self::with_tree(Mode::Create, BudgetTree::new(root_name), effective_date)
    }

    /// Starts editing a budget that was loaded from the backend.
    pub fn edit(tree: BudgetTree, effective_date: NaiveDate) -> Self {
        Self::with_tree(Mode::Update, tree, effective_date)
    }

    fn with_tree(mode: Mode, tree: BudgetTree, effective_date: NaiveDate) -> Self {
        Self {
            mode,
            effective_date,
            tree,
            deleted_item_ids: BTreeSet::new(),
            history: Vec::new(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn with_history_limit(mut self, history_limit: usize) -> Self {
        self.history_limit = history_limit;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn effective_date(&self) -> NaiveDate {
        self.effective_date
    }

    pub fn set_effective_date(&mut self, effective_date: NaiveDate) {
        self.effective_date = effective_date;
    }

    pub fn tree(&self) -> &BudgetTree {
        &self.tree
    }

    pub fn deleted_item_ids(&self) -> &BTreeSet<i64> {
        &self.deleted_item_ids
    }

    /// Number of edits that can be undone.
    pub fn undo_depth(&self) -> usize {
        self.history.len()
    }

    /// Replaces the current tree, remembering the previous state for `undo`.
    fn commit(&mut self, next: BudgetTree) {
        if next == self.tree {
            return;
        }
        let previous = std::mem::replace(&mut self.tree, next);
        self.history.push(Snapshot {
            tree: previous,
            deleted_item_ids: self.deleted_item_ids.clone(),
        });
        if self.history.len() > self.history_limit {
            let excess = self.history.len() - self.history_limit;
            self.history.drain(..excess);
        }
    }

    /// Adds a category under `parent` and returns its new id.
    pub fn add_category(&mut self, parent: &NodeId, name: impl Into<String>) -> Result<NodeId> {
        let id = NodeId::generate();
        self.add(parent, Node::category(id.clone(), name))?;
        Ok(id)
    }

    /// Adds a line item under `parent` and returns its new id.
    pub fn add_item(
        &mut self,
        parent: &NodeId,
        name: impl Into<String>,
        line: LineItem,
    ) -> Result<NodeId> {
        let id = NodeId::generate();
        self.add(parent, Node::item(id.clone(), name, line))?;
        Ok(id)
    }

    fn add(&mut self, parent: &NodeId, node: Node) -> Result<()> {
        if let Some(existing) = self.tree.find_node(parent) {
            if existing.is_item() {
                bail!(
                    "'{}' is an item, items cannot contain other nodes",
                    existing.name()
                );
            }
        }
        debug!("Adding {} under {parent}", node.id());
        let next = self.tree.add_child(parent, node);
        self.commit(next);
        Ok(())
    }

    pub fn update_field(&mut self, id: &NodeId, field: Field, value: impl Into<String>) {
        let next = self.tree.update_field(id, field, value);
        self.commit(next);
    }

    /// Removes a node and its subtree, remembering every persisted item inside it.
    pub fn remove(&mut self, id: &NodeId) -> Option<Node> {
        let (next, removed) = self.tree.remove_node(id);
        let removed = removed?;
        self.commit(next);
        let server_ids = removed.server_item_ids();
        if !server_ids.is_empty() {
            debug!("Pending deletion of items {server_ids:?}");
        }
        self.deleted_item_ids.extend(server_ids);
        Some(removed)
    }

    pub fn move_node(
        &mut self,
        id: &NodeId,
        new_parent: &NodeId,
    ) -> std::result::Result<(), InvalidMove> {
        let result = self.tree.move_node(id, new_parent);
        self.apply_move(result)
    }

    /// Applies the drag-and-drop policy of `BudgetTree::handle_drop`.
    pub fn drop_onto(
        &mut self,
        dragged: &NodeId,
        target: &NodeId,
    ) -> std::result::Result<(), InvalidMove> {
        let result = self.tree.handle_drop(dragged, target);
        self.apply_move(result)
    }

    fn apply_move(
        &mut self,
        result: std::result::Result<BudgetTree, InvalidMove>,
    ) -> std::result::Result<(), InvalidMove> {
        match result {
            Ok(next) => {
                self.commit(next);
                Ok(())
            }
            Err(e) => {
                if e.is_user_facing() {
                    warn!("Move refused: {e}");
                } else {
                    debug!("Move ignored: {e}");
                }
                Err(e)
            }
        }
    }

    /// Restores the state before the last edit. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.history.pop() {
            Some(snapshot) => {
                self.tree = snapshot.tree;
                self.deleted_item_ids = snapshot.deleted_item_ids;
                true
            }
            None => false,
        }
    }

    /// The request body for saving the current tree.
    pub fn payload(&self) -> SavePayload {
        let data = serialize(self.tree.root());
        match self.mode {
            Mode::Create => SavePayload::Create(CreatePayload {
                effective_date: self.effective_date,
                data,
            }),
            Mode::Update => SavePayload::Update(UpdatePayload {
                effective_date: self.effective_date,
                data,
                deleted_item_ids: self.deleted_item_ids.iter().copied().collect(),
            }),
        }
    }

    /// Call once the backend has confirmed a save. Clears pending deletions and undo history.
    pub fn mark_saved(&mut self) {
        info!(
            "Save confirmed, clearing {} pending deletion(s)",
            self.deleted_item_ids.len()
        );
        self.deleted_item_ids.clear();
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hydrate::hydrate_json;
    use crate::payload::SavePayload;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn loaded() -> Session {
        let tree = hydrate_json(
            r#"[{"id": 1, "name": "Works", "isLeaf": 0, "children": [
                {"id": 2, "name": "Brick", "isLeaf": 1, "quantity": 10, "itemRate": 2, "itemId": 42},
                {"id": 3, "name": "Mortar", "isLeaf": 1, "quantity": 1, "itemRate": 5, "itemId": 7},
                {"id": 4, "name": "Sub", "isLeaf": 0, "children": [
                    {"id": 5, "name": "Lintel", "isLeaf": 1, "itemId": 99}
                ]}
            ]},
            {"id": 6, "name": "Prelims", "isLeaf": 0}]"#,
        )
        .unwrap();
        Session::edit(tree, date())
    }

    fn deleted(session: &Session) -> Vec<i64> {
        match session.payload() {
            SavePayload::Update(update) => update.deleted_item_ids,
            SavePayload::Create(_) => panic!("expected an update payload"),
        }
    }

    #[test]
    fn test_deletions_accumulate_in_any_order() {
        let mut a = loaded();
        a.remove(&NodeId::from(2)).unwrap();
        a.remove(&NodeId::from(3)).unwrap();

        let mut b = loaded();
        b.remove(&NodeId::from(3)).unwrap();
        b.remove(&NodeId::from(2)).unwrap();

        assert_eq!(deleted(&a), vec![7, 42]);
        assert_eq!(deleted(&a), deleted(&b));
    }

    #[test]
    fn test_removing_new_node_records_nothing() {
        let mut session = loaded();
        let fresh = session
            .add_item(&NodeId::from(1), "Scaffold", LineItem::new("wk", "2", "300"))
            .unwrap();
        session.remove(&fresh).unwrap();
        assert!(deleted(&session).is_empty());
    }

    #[test]
    fn test_removing_category_records_nested_items() {
        let mut session = loaded();
        session.remove(&NodeId::from(4)).unwrap();
        assert_eq!(deleted(&session), vec![99]);
    }

    #[test]
    fn test_remove_missing_records_nothing() {
        let mut session = loaded();
        assert!(session.remove(&NodeId::from(1234)).is_none());
        assert_eq!(session.undo_depth(), 0);
    }

    #[test]
    fn test_undo_restores_deletions() {
        let mut session = loaded();
        session.remove(&NodeId::from(2)).unwrap();
        assert!(session.undo());
        assert!(deleted(&session).is_empty());
        assert!(session.tree().find_node(&NodeId::from(2)).is_some());
        assert!(!session.undo());
    }

    #[test]
    fn test_mark_saved_clears_deletions() {
        let mut session = loaded();
        session.remove(&NodeId::from(2)).unwrap();
        session.mark_saved();
        assert!(deleted(&session).is_empty());
        assert_eq!(session.undo_depth(), 0);
    }

    #[test]
    fn test_create_mode_payload() {
        let mut session = Session::create("Clinic", date());
        let cat = session.add_category(&NodeId::root(), "MEP").unwrap();
        session
            .add_item(&cat, "Ducting", LineItem::new("m", "15", "42.10"))
            .unwrap();
        match session.payload() {
            SavePayload::Create(create) => {
                assert_eq!(create.effective_date, date());
                assert_eq!(create.data.name, "Clinic");
                assert_eq!(create.data.children[0].children[0].name, "Ducting");
            }
            SavePayload::Update(_) => panic!("expected a create payload"),
        }
        assert_eq!(session.mode(), Mode::Create);
    }

    #[test]
    fn test_cannot_add_under_item() {
        let mut session = loaded();
        let result = session.add_category(&NodeId::from(2), "Nested");
        assert!(result.is_err());
        assert_eq!(session.undo_depth(), 0);
    }

    #[test]
    fn test_refused_move_keeps_tree() {
        let mut session = loaded();
        let before = session.tree().clone();
        assert_eq!(
            session.move_node(&NodeId::from(1), &NodeId::from(5)),
            Err(InvalidMove::IntoOwnSubtree)
        );
        assert_eq!(
            session.drop_onto(&NodeId::root(), &NodeId::from(4)),
            Err(InvalidMove::Root)
        );
        assert_eq!(session.tree(), &before);
        assert_eq!(session.undo_depth(), 0);
    }

    #[test]
    fn test_drop_and_undo() {
        let mut session = loaded();
        session.drop_onto(&NodeId::from(5), &NodeId::from(3)).unwrap();
        let works = session.tree().find_node(&NodeId::from(1)).unwrap();
        assert_eq!(works.children().last().unwrap().name(), "Lintel");
        assert!(session.undo());
        let sub = session.tree().find_node(&NodeId::from(4)).unwrap();
        assert_eq!(sub.children().len(), 1);
    }

    #[test]
    fn test_history_limit() {
        let mut session = Session::create("B", date()).with_history_limit(2);
        for name in ["a", "b", "c", "d"] {
            session.update_field(&NodeId::root(), Field::Name, name);
        }
        assert_eq!(session.undo_depth(), 2);
        assert!(session.undo());
        assert_eq!(session.tree().root().name(), "c");
    }

    #[test]
    fn test_noop_edit_is_not_recorded() {
        let mut session = loaded();
        session.update_field(&NodeId::from(777), Field::Name, "ghost");
        assert_eq!(session.undo_depth(), 0);
    }

    #[test]
    fn test_session_json_round_trip() {
        let mut session = loaded();
        session.remove(&NodeId::from(3)).unwrap();
        let json = serde_json::to_string(&session).unwrap();
        let back: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(back, session);
    }
}

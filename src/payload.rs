//! The nested structure sent to the persistence backend when a budget is saved.
//!
//! Create requests carry `{ effectiveDate, data }`, update requests additionally carry the ids of
//! every persisted item that was removed during the editing session.

use crate::model::{Amount, Node, NodeKind};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One serialized node. `children` is always present, even when empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayloadNode {
    pub name: String,
    pub is_leaf: bool,
    /// Present only for leaves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<PayloadItem>,
    #[serde(default)]
    pub children: Vec<PayloadNode>,
}

/// The cost data of a leaf, with numbers rounded to two decimal places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayloadItem {
    pub name: String,
    pub unit: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub quantity: Decimal,
}

/// Body of the request that creates a new budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePayload {
    #[schemars(with = "String")]
    pub effective_date: NaiveDate,
    pub data: PayloadNode,
}

/// Body of the request that updates an existing budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePayload {
    #[schemars(with = "String")]
    pub effective_date: NaiveDate,
    pub data: PayloadNode,
    pub deleted_item_ids: Vec<i64>,
}

/// Either kind of save request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum SavePayload {
    Update(UpdatePayload),
    Create(CreatePayload),
}

impl SavePayload {
    pub fn data(&self) -> &PayloadNode {
        match self {
            SavePayload::Update(update) => &update.data,
            SavePayload::Create(create) => &create.data,
        }
    }

    pub fn is_update(&self) -> bool {
        matches!(self, SavePayload::Update(_))
    }
}

/// Serializes `node` and its whole subtree.
pub fn serialize(node: &Node) -> PayloadNode {
    if !node.id().is_root() && node.name().trim().is_empty() {
        warn!("Saving node {} with an empty name", node.id());
    }
    let item = match node.kind() {
        NodeKind::Item(line) => Some(PayloadItem {
            name: node.name().to_string(),
            unit: line.unit().to_string(),
            rate: Amount::coerce(line.rate()).rounded().value(),
            quantity: Amount::coerce(line.quantity()).rounded().value(),
        }),
        NodeKind::Category => None,
    };
    PayloadNode {
        name: node.name().to_string(),
        is_leaf: item.is_some(),
        item,
        children: node.children().iter().map(serialize).collect(),
    }
}

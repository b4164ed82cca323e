//! Builds a `BudgetTree` from the nested rows the backend returns for an existing budget.
//!
//! The backend is a SQL database behind a REST endpoint, so numeric columns can arrive as JSON
//! numbers, as numeric strings, or as `null`, and the leaf flag as `0`/`1` or a boolean. All of
//! those are accepted here.

use crate::model::{Amount, LineItem, Node, NodeId};
use crate::tree::BudgetTree;
use crate::Result;
use anyhow::Context;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::str::FromStr;
use tracing::{debug, warn};

/// One row of the backend's budget hierarchy, with its children nested inside it.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServerRow {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_flag",
        serialize_with = "flag_as_int"
    )]
    #[schemars(with = "u8")]
    pub is_leaf: bool,
    #[serde(default)]
    pub item_unit: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_decimal",
        serialize_with = "rust_decimal::serde::float_option::serialize"
    )]
    #[schemars(with = "Option<f64>")]
    pub quantity: Option<Decimal>,
    #[serde(
        default,
        deserialize_with = "lenient_decimal",
        serialize_with = "rust_decimal::serde::float_option::serialize"
    )]
    #[schemars(with = "Option<f64>")]
    pub item_rate: Option<Decimal>,
    #[serde(default)]
    pub item_id: Option<i64>,
    #[serde(default)]
    pub children: Vec<ServerRow>,
}

/// The GET response: normally a list of top-level rows, occasionally a single row.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum ServerRows {
    Many(Vec<ServerRow>),
    One(Box<ServerRow>),
}

/// Builds a tree from top-level rows.
///
/// A single top-level category becomes the root itself. Any other shape is collected under a
/// synthetic root with an empty name, so no category name is invented.
pub fn hydrate(rows: &[ServerRow]) -> BudgetTree {
    match rows {
        [only] if !only.is_leaf => {
            debug!("Hydrating a single top-level category '{}'", row_name(only));
            BudgetTree::with_children(row_name(only), only.children.iter().map(to_node).collect())
        }
        _ => {
            debug!("Hydrating {} top-level rows under an unnamed root", rows.len());
            BudgetTree::with_children("", rows.iter().map(to_node).collect())
        }
    }
}

/// Parses a GET response body and hydrates it, checking that row ids are unique.
pub fn hydrate_json(json: &str) -> Result<BudgetTree> {
    let rows = match serde_json::from_str::<ServerRows>(json)
        .context("Unable to parse the budget rows")?
    {
        ServerRows::Many(rows) => rows,
        ServerRows::One(row) => vec![*row],
    };
    let tree = hydrate(&rows);
    tree.check_invariants()
        .context("The budget rows do not form a tree")?;
    Ok(tree)
}

fn row_name(row: &ServerRow) -> String {
    row.name.clone().unwrap_or_default()
}

fn to_node(row: &ServerRow) -> Node {
    let id = NodeId::from(row.id);
    let node = if row.is_leaf {
        let line = LineItem::new(
            row.item_unit.clone().unwrap_or_default(),
            decimal_text(row.quantity),
            decimal_text(row.item_rate),
        )
        .with_server_item_id(Some(row.item_id.unwrap_or(row.id)));
        Node::item(id, row_name(row), line)
    } else {
        Node::category(id, row_name(row))
    };
    node.with_children(row.children.iter().map(to_node).collect())
}

/// Missing numbers become an empty field, as if nothing had been typed.
fn decimal_text(value: Option<Decimal>) -> String {
    value.map(|d| d.normalize().to_string()).unwrap_or_default()
}

fn lenient_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(b),
        Some(Value::Number(n)) => Ok(n.as_f64().map(|f| f != 0.0).unwrap_or(false)),
        Some(Value::String(s)) => Ok(matches!(s.trim(), "1" | "true")),
        Some(other) => Err(D::Error::custom(format!(
            "expected 0, 1 or a boolean for isLeaf, got {other}"
        ))),
    }
}

fn flag_as_int<S>(flag: &bool, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u8(u8::from(*flag))
}

fn lenient_decimal<'de, D>(deserializer: D) -> std::result::Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| n.as_f64().and_then(Decimal::from_f64))
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("the number {n} is out of range"))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => match Amount::from_str(&s) {
            Ok(amount) => Ok(Some(amount.value())),
            Err(e) => {
                warn!("Loading '{s}' as zero: {e}");
                Ok(Some(Decimal::ZERO))
            }
        },
        Some(other) => Err(D::Error::custom(format!(
            "expected a number or a numeric string, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Field, NodeKind};
    use crate::payload::{serialize, PayloadNode};
    use crate::session::Session;
    use chrono::NaiveDate;

    fn line(tree: &BudgetTree, id: &str) -> LineItem {
        tree.find_node(&NodeId::from(id))
            .unwrap()
            .line_item()
            .unwrap()
            .clone()
    }

    const ROWS: &str = r#"[
        {
            "id": 1, "name": "Structure", "isLeaf": 0, "itemUnit": null,
            "quantity": null, "itemRate": null, "itemId": null,
            "children": [
                {"id": 2, "name": "Rebar", "isLeaf": 1, "itemUnit": "t",
                 "quantity": "12.500", "itemRate": 950, "itemId": 42, "children": []},
                {"id": 3, "name": "Formwork", "isLeaf": true, "itemUnit": "m2",
                 "itemId": 7}
            ]
        },
        {"id": 4, "name": "Finishes", "isLeaf": 0, "children": []}
    ]"#;

    #[test]
    fn test_multiple_top_level_rows_get_unnamed_root() {
        let tree = hydrate_json(ROWS).unwrap();
        assert_eq!(tree.root().name(), "");
        assert!(tree.root().id().is_root());
        let top: Vec<&str> = tree.root().children().iter().map(|n| n.name()).collect();
        assert_eq!(top, vec!["Structure", "Finishes"]);
    }

    #[test]
    fn test_leaf_fields_are_coerced() {
        let tree = hydrate_json(ROWS).unwrap();
        let rebar = line(&tree, "2");
        assert_eq!(rebar.unit(), "t");
        assert_eq!(rebar.quantity(), "12.5");
        assert_eq!(rebar.rate(), "950");
        assert_eq!(rebar.server_item_id(), Some(42));

        let formwork = line(&tree, "3");
        assert_eq!(formwork.quantity(), "");
        assert_eq!(formwork.rate(), "");
        assert!(formwork.total().is_zero());
        assert_eq!(formwork.server_item_id(), Some(7));
    }

    #[test]
    fn test_categories_have_no_server_item_id() {
        let tree = hydrate_json(ROWS).unwrap();
        let structure = tree.find_node(&NodeId::from(1)).unwrap();
        assert_eq!(structure.kind(), &NodeKind::Category);
        assert_eq!(structure.server_item_ids(), vec![42, 7]);
    }

    #[test]
    fn test_single_top_level_category_becomes_root() {
        let json = r#"{"id": 9, "name": "Tower A", "isLeaf": 0, "children": [
            {"id": 10, "name": "Piling", "isLeaf": 1, "quantity": 3, "itemRate": "1,200.00"}
        ]}"#;
        let tree = hydrate_json(json).unwrap();
        assert_eq!(tree.root().name(), "Tower A");
        assert!(tree.root().id().is_root());
        let piling = line(&tree, "10");
        assert_eq!(piling.rate(), "1200");
        assert_eq!(piling.server_item_id(), Some(10));
    }

    #[test]
    fn test_empty_response() {
        let tree = hydrate_json("[]").unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let json = r#"[{"id": 1, "name": "A", "isLeaf": 0}, {"id": 1, "name": "B", "isLeaf": 0}]"#;
        assert!(hydrate_json(json).is_err());
    }

    #[test]
    fn test_out_of_range_number_is_rejected() {
        let json = r#"[{"id": 1, "name": "Piles", "isLeaf": 1, "quantity": 1e40, "itemRate": 5}]"#;
        assert!(hydrate_json(json).is_err());
        let row = r#"{"id": 1, "isLeaf": 1, "itemRate": -1e40}"#;
        let err = serde_json::from_str::<ServerRow>(row).unwrap_err();
        assert!(err.to_string().contains("out of range"), "{err}");
    }

    #[test]
    fn test_unparseable_string_loads_as_zero() {
        let json = r#"[{"id": 1, "name": "Piles", "isLeaf": 1, "quantity": "1e40", "itemRate": "n/a"}]"#;
        let tree = hydrate_json(json).unwrap();
        let piles = line(&tree, "1");
        assert_eq!(piles.quantity(), "0");
        assert_eq!(piles.rate(), "0");
    }

    #[test]
    fn test_bad_leaf_flag_is_rejected() {
        let json = r#"[{"id": 1, "name": "A", "isLeaf": [1]}]"#;
        assert!(hydrate_json(json).is_err());
    }

    /// Plays the backend: stores a payload and hands it back as rows.
    fn echo(node: &PayloadNode, next_id: &mut i64) -> ServerRow {
        *next_id += 1;
        let id = *next_id;
        ServerRow {
            id,
            name: Some(node.name.clone()),
            is_leaf: node.is_leaf,
            item_unit: node.item.as_ref().map(|i| i.unit.clone()),
            quantity: node.item.as_ref().map(|i| i.quantity),
            item_rate: node.item.as_ref().map(|i| i.rate),
            item_id: node.item.as_ref().map(|_| id + 1000),
            children: node.children.iter().map(|c| echo(c, next_id)).collect(),
        }
    }

    #[test]
    fn test_round_trip_through_backend() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let mut session = Session::create("Warehouse", date);
        let site = session.add_category(&NodeId::root(), "Site").unwrap();
        session
            .add_item(&site, "Grading", LineItem::new("m2", "120.456", "3.5"))
            .unwrap();
        let shell = session.add_category(&NodeId::root(), "Shell").unwrap();
        let roof = session
            .add_item(&shell, "Roofing", LineItem::new("m2", "", "bogus"))
            .unwrap();
        session.update_field(&roof, Field::Unit, "sq");

        let sent = serialize(session.tree().root());
        let json = serde_json::to_string(&vec![echo(&sent, &mut 0)]).unwrap();
        let reloaded = hydrate_json(&json).unwrap();

        assert_eq!(serialize(reloaded.root()), sent);
        let grading = &reloaded.root().children()[0].children()[0];
        assert_eq!(grading.line_item().unwrap().quantity(), "120.46");
    }
}

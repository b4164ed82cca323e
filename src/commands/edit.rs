//! Commands that edit the budget in the current session.
//!
//! Each command loads the session, applies one edit and writes the session back. Ids that do not
//! exist are reported as errors here even though the tree itself ignores them, since a user who
//! typed an id wants to know it matched nothing.

use crate::args::{AddArgs, DropArgs, IdArgs, MoveArgs, SetArgs};
use crate::commands::Out;
use crate::model::{Field, LineItem, NodeId};
use crate::{Config, InvalidMove, Result, Session};
use anyhow::{anyhow, bail};

/// Adds a category, or a line item, and returns the new node's id.
pub async fn add(config: Config, args: AddArgs) -> Result<Out<NodeId>> {
    let mut session = config.load_session().await?;
    let parent = args.parent().map(NodeId::from).unwrap_or_else(NodeId::root);
    if session.tree().find_node(&parent).is_none() {
        bail!("There is no node with id '{parent}' to add to");
    }
    let id = if args.is_item() {
        let line = LineItem::new(args.unit(), args.quantity(), args.rate());
        session.add_item(&parent, args.name(), line)?
    } else {
        session.add_category(&parent, args.name())?
    };
    config.save_session(&session).await?;
    Ok(Out::new(format!("Added '{}' as {id}", args.name()), id))
}

/// Changes one field of a node.
pub async fn set(config: Config, args: SetArgs) -> Result<Out<()>> {
    let mut session = config.load_session().await?;
    let id = NodeId::from(args.id());
    let node = existing(&session, &id)?;
    if args.field() != Field::Name && !node.is_item() {
        bail!(
            "'{}' is a category, only items have a {}",
            node.name(),
            args.field()
        );
    }
    session.update_field(&id, args.field(), args.value());
    config.save_session(&session).await?;
    Ok(format!("Set the {} of {id} to '{}'", args.field(), args.value()).into())
}

/// Removes a node with its subtree.
pub async fn remove(config: Config, args: IdArgs) -> Result<Out<()>> {
    let mut session = config.load_session().await?;
    let id = NodeId::from(args.id());
    if id.is_root() {
        bail!("The top level of the budget cannot be removed");
    }
    let removed = session
        .remove(&id)
        .ok_or_else(|| anyhow!("There is no node with id '{id}'"))?;
    config.save_session(&session).await?;
    let count = removed.walk().len();
    Ok(format!("Removed '{}' and {} node(s) below it", removed.name(), count - 1).into())
}

/// Moves a node under a new parent. An unknown parent id moves it to the top level.
pub async fn move_node(config: Config, args: MoveArgs) -> Result<Out<()>> {
    let mut session = config.load_session().await?;
    let id = NodeId::from(args.id());
    let parent = NodeId::from(args.parent());
    existing(&session, &id)?;
    if let Some(node) = session.tree().find_node(&parent) {
        if node.is_item() {
            bail!(
                "'{}' is an item, items cannot contain other nodes",
                node.name()
            );
        }
    }
    session.move_node(&id, &parent).map_err(refused)?;
    config.save_session(&session).await?;
    Ok(format!("Moved {id}").into())
}

/// Drops a node onto another node as the editor's drag-and-drop would.
pub async fn drop_node(config: Config, args: DropArgs) -> Result<Out<()>> {
    let mut session = config.load_session().await?;
    let dragged = NodeId::from(args.dragged());
    let target = NodeId::from(args.target());
    existing(&session, &dragged)?;
    session.drop_onto(&dragged, &target).map_err(refused)?;
    config.save_session(&session).await?;
    Ok(format!("Dropped {dragged} onto {target}").into())
}

/// Reverts the last edit.
pub async fn undo(config: Config) -> Result<Out<()>> {
    let mut session = config.load_session().await?;
    if !session.undo() {
        return Ok("There is nothing to undo".into());
    }
    config.save_session(&session).await?;
    Ok(format!("Undone, {} more edit(s) can be undone", session.undo_depth()).into())
}

fn existing<'a>(session: &'a Session, id: &NodeId) -> Result<&'a crate::model::Node> {
    session
        .tree()
        .find_node(id)
        .ok_or_else(|| anyhow!("There is no node with id '{id}'"))
}

fn refused(e: InvalidMove) -> anyhow::Error {
    anyhow!("Unable to move: {e}")
}

use crate::commands::Out;
use crate::model::{Amount, Node, NodeKind};
use crate::{BudgetTree, Config, Result};
use anyhow::Context;
use std::fmt::Write;

const INDENT: &str = "  ";

/// Renders the budget of the current session as indented text with totals.
pub async fn show(config: Config) -> Result<Out<String>> {
    let session = config.load_session().await?;
    let text = render(session.tree())?;
    Ok(Out::new(
        format!(
            "{} budget effective {}, {} pending deletion(s), {} edit(s) to undo",
            session.mode(),
            session.effective_date(),
            session.deleted_item_ids().len(),
            session.undo_depth()
        ),
        text,
    ))
}

/// One line per node in pre-order. Categories show their subtotal, items show quantity, unit,
/// rate and total. Node ids are shown in brackets so they can be passed to other commands.
pub fn render(tree: &BudgetTree) -> Result<String> {
    let mut out = String::new();
    render_node(&mut out, tree.root(), 0).context("Unable to render the budget")?;
    Ok(out)
}

fn render_node(out: &mut String, node: &Node, depth: usize) -> std::fmt::Result {
    let name = if node.name().trim().is_empty() {
        "(unnamed)"
    } else {
        node.name()
    };
    let indent = INDENT.repeat(depth);
    match node.kind() {
        NodeKind::Category => writeln!(
            out,
            "{indent}{name}  {}  [{}]",
            node.subtotal(),
            node.id()
        )?,
        NodeKind::Item(line) => writeln!(
            out,
            "{indent}{name}  {} {} @ {}  {}  [{}]",
            number(line.quantity()),
            line.unit(),
            number(line.rate()),
            line.total(),
            node.id()
        )?,
    }
    for child in node.children() {
        render_node(out, child, depth + 1)?;
    }
    Ok(())
}

/// Typed text shown as `1,250.00` whatever format it was typed in.
fn number(text: &str) -> Amount {
    Amount::new(Amount::coerce(text).value())
}

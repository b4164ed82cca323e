//! Producing the save request body and confirming that the backend stored it.

use crate::args::PayloadArgs;
use crate::backup::PAYLOAD;
use crate::commands::Out;
use crate::payload::SavePayload;
use crate::{utils, Config, Mode, Result};
use anyhow::Context;
use tracing::{info, warn};

/// Builds the save payload for the current session.
///
/// A copy is always kept in the backups directory. With `--out` the payload is also written to
/// that file, otherwise it is returned for printing. The session is not changed: run `saved`
/// once the backend accepts the payload.
pub async fn payload(config: Config, args: PayloadArgs) -> Result<Out<SavePayload>> {
    let session = config.load_session().await?;
    let unnamed = session.tree().unnamed_nodes();
    if !unnamed.is_empty() {
        warn!(
            "{} node(s) have no name and will be saved with an empty name",
            unnamed.len()
        );
    }

    let payload = session.payload();
    let backup = config.backup().save_json(PAYLOAD, &payload).await?;
    info!("Saved a copy of the payload to {}", backup.display());

    let verb = match session.mode() {
        Mode::Create => "create",
        Mode::Update => "update",
    };
    match args.out() {
        Some(out) => {
            let json =
                serde_json::to_string_pretty(&payload).context("Unable to serialize payload")?;
            utils::write(out, json).await?;
            Ok(Out::new_message(format!(
                "Wrote the {verb} payload to {}",
                out.display()
            )))
        }
        None => Ok(Out::new(format!("The {verb} payload"), payload)),
    }
}

/// Records that the backend saved the last payload: pending deletions and undo history are
/// cleared.
pub async fn saved(config: Config) -> Result<Out<()>> {
    let mut session = config.load_session().await?;
    let cleared = session.deleted_item_ids().len();
    session.mark_saved();
    config.save_session(&session).await?;
    Ok(format!("Marked the budget as saved, {cleared} pending deletion(s) cleared").into())
}

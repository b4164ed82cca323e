use crate::commands::Out;
use crate::hydrate::ServerRow;
use crate::payload::SavePayload;
use crate::Result;
use schemars::{schema_for, Schema};
use serde::Serialize;

/// JSON Schemas of the two wire formats: the save request body and the rows `load` accepts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Schemas {
    save_payload: Schema,
    server_rows: Schema,
}

impl Schemas {
    pub fn save_payload(&self) -> &Schema {
        &self.save_payload
    }

    pub fn server_rows(&self) -> &Schema {
        &self.server_rows
    }
}

pub fn schema() -> Result<Out<Schemas>> {
    Ok(Out::new(
        "JSON Schemas of the save payload and of the budget rows",
        Schemas {
            save_payload: schema_for!(SavePayload),
            server_rows: schema_for!(Vec<ServerRow>),
        },
    ))
}

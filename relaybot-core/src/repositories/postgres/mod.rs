// src/repositories/postgres/mod.rs

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::Error;

pub mod command_logs;
pub mod commands;
pub mod servers;

pub use command_logs::PostgresCommandLogRepository;
pub use commands::PostgresCommandRepository;
pub use servers::PostgresServerRepository;

/// Stores a unit-like enum as its serde string form.
pub(crate) fn enum_to_text<T: Serialize>(value: &T) -> Result<String, Error> {
    match serde_json::to_value(value)? {
        Value::String(s) => Ok(s),
        other => Err(Error::Parse(format!("expected a string enum, got {other}"))),
    }
}

pub(crate) fn text_to_enum<T: DeserializeOwned>(text: &str) -> Result<T, Error> {
    Ok(serde_json::from_value(Value::String(text.to_string()))?)
}

//! Shared models, error type and repository traits for relaybot.

pub mod error;
pub mod models;
pub mod traits;

pub use error::Error;

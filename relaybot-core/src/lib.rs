// src/lib.rs

pub mod cache;
pub mod context;
pub mod db;
pub mod http;
pub mod models;
pub mod platforms;
pub mod repositories;
pub mod services;
pub mod test_utils;

pub use context::{BotSession, BotSessionParts, EngineSettings};
pub use db::{Database, PoolSettings};
pub use http::{DefaultHttpClient, HttpClient};
pub use relaybot_common::error::Error;

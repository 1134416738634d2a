// src/repositories/mod.rs

pub mod memory;
pub mod postgres;

pub use relaybot_common::traits::repository_traits::{
    CommandLogRepository, CommandRepository, ServerRepository,
};

pub use memory::{InMemoryCommandLogRepository, InMemoryCommandRepository, InMemoryServerRepository};
pub use postgres::{
    PostgresCommandLogRepository, PostgresCommandRepository, PostgresServerRepository,
};

// File: src/services/mod.rs

pub mod audit_log;
pub mod command_service;
pub mod discord;
pub mod webhook;

pub use audit_log::AuditLogger;
pub use command_service::CommandService;
pub use webhook::WebhookNotifier;

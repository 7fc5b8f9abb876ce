//! Shared identifiers, configuration, and notification plumbing for Tally.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Configuration management
//! - The `Notifier` collaborator interface and its SMTP implementation

pub mod config;
pub mod email;
pub mod notify;
pub mod types;

pub use config::{AppConfig, DatabaseConfig, EmailConfig, NotificationConfig};
pub use email::EmailService;
pub use notify::{LogNotifier, Notifier, NotifyError};

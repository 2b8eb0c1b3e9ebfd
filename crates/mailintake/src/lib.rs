//! Mailbox intake for job-application emails.
//!
//! A sync run opens the configured IMAP folder read-only, skips messages that
//! are already recorded, stores each new message's raw bytes and attachments
//! (following cloud download links when nothing is attached inline) and
//! writes one record per message to SQLite.

pub mod cloud;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod sanitize;
pub mod secrets;
pub mod storage;

pub use cloud::{CloudLinkResolver, Resolution};
pub use config::{load_config, IntakeConfig};
pub use db::{Database, Record, RecordStatus, RecordStore};
pub use email::{ImapSession, InboundMessage, Mailbox};
pub use error::{ConfigError, IntakeError, Result, StorageError};
pub use pipeline::{MailboxSync, SyncLock, SyncSummary};
pub use secrets::SecretError;

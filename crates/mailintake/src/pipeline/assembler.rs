//! Builds the stored record for one message.

use std::path::{Path, PathBuf};

use crate::db::models::ATTACHMENT_PATH_SEPARATOR;
use crate::db::{CreateOutcome, DatabaseError, RecordStatus, RecordStore, ResolvedRecord};
use crate::email::InboundMessage;
use crate::error::StorageError;
use crate::sanitize::sanitize_filename;
use crate::storage::FileStore;

/// Persists raw messages and turns messages into [`ResolvedRecord`]s.
#[derive(Debug, Clone)]
pub struct RecordAssembler {
    raw_store: FileStore,
}

impl RecordAssembler {
    /// `raw_store` receives one `<uid>.eml` file per message.
    pub fn new(raw_store: FileStore) -> Self {
        Self { raw_store }
    }

    /// Writes the message exactly as received.
    pub async fn store_raw(&self, message: &InboundMessage) -> Result<PathBuf, StorageError> {
        let stem = sanitize_filename(&message.uid).unwrap_or_else(|| "message".to_string());
        self.raw_store
            .write(&format!("{}.eml", stem), &message.raw)
            .await
    }

    /// Combines message metadata with where its bytes ended up.
    pub fn assemble(
        message: &InboundMessage,
        raw_path: &Path,
        attachments: &[PathBuf],
    ) -> ResolvedRecord {
        let attachment_path = if attachments.is_empty() {
            None
        } else {
            Some(
                attachments
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(&ATTACHMENT_PATH_SEPARATOR.to_string()),
            )
        };

        ResolvedRecord {
            uid: message.uid.clone(),
            subject: message.subject.clone(),
            sender: message.sender.clone().unwrap_or_default(),
            send_time: message.sent_at.map(|t| t.to_rfc3339()),
            email_body: message.body_text.clone(),
            raw_email_path: raw_path.display().to_string(),
            attachment_path,
            status: RecordStatus::New,
        }
    }

    /// Hands the record to the store. An existing identifier is reported as
    /// [`CreateOutcome::Duplicate`], not an error.
    pub fn submit<S: RecordStore + ?Sized>(
        &self,
        store: &S,
        record: &ResolvedRecord,
    ) -> Result<CreateOutcome, DatabaseError> {
        store.create_record(record)
    }
}

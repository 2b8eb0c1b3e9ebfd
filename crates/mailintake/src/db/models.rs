//! Record types exchanged with the persistence boundary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::DatabaseError;

/// Separator used when a record references several attachment files.
pub const ATTACHMENT_PATH_SEPARATOR: char = ';';

/// Review state of an ingested application.
///
/// Records are created as [`RecordStatus::New`]; later transitions happen
/// through [`crate::db::RecordStore::update_status`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    #[default]
    New,
    Pending,
    Interview,
    Offer,
    Rejected,
    Finished,
}

impl RecordStatus {
    pub const ALL: [RecordStatus; 6] = [
        RecordStatus::New,
        RecordStatus::Pending,
        RecordStatus::Interview,
        RecordStatus::Offer,
        RecordStatus::Rejected,
        RecordStatus::Finished,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::New => "new",
            RecordStatus::Pending => "pending",
            RecordStatus::Interview => "interview",
            RecordStatus::Offer => "offer",
            RecordStatus::Rejected => "rejected",
            RecordStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordStatus {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| DatabaseError::InvalidStatus(s.to_string()))
    }
}

/// A normalized record for one ingested message, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRecord {
    /// Mailbox-assigned identifier (IMAP UID).
    pub uid: String,
    pub subject: Option<String>,
    /// Sender address, empty if the message had no parseable `From`.
    pub sender: String,
    /// Sent timestamp in RFC 3339, if the message carried a `Date`.
    pub send_time: Option<String>,
    /// First plain-text body part, or empty.
    pub email_body: String,
    pub raw_email_path: String,
    /// `;`-joined attachment paths, `None` when nothing was saved.
    pub attachment_path: Option<String>,
    pub status: RecordStatus,
}

/// A record as persisted, including its storage id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub id: i64,
    pub uid: String,
    pub subject: Option<String>,
    pub sender: String,
    pub send_time: Option<String>,
    pub email_body: String,
    pub raw_email_path: String,
    pub attachment_path: Option<String>,
    pub status: RecordStatus,
    pub created_at: String,
}

impl Record {
    /// Splits `attachment_path` into individual paths.
    pub fn attachment_paths(&self) -> Vec<&str> {
        self.attachment_path
            .as_deref()
            .map(|joined| {
                joined
                    .split(ATTACHMENT_PATH_SEPARATOR)
                    .filter(|p| !p.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Result of submitting a record to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(Record),
    /// A record with the same identifier already exists; nothing was written.
    Duplicate,
}

//! The record store seam the sync pipeline writes through.

use std::collections::HashSet;

use chrono::Utc;

use super::models::{CreateOutcome, Record, RecordStatus, ResolvedRecord};
use super::{record_repo, Database, DatabaseError};

/// Keyed store of ingested records.
///
/// `create_record` must treat an existing identifier as a no-op and report
/// [`CreateOutcome::Duplicate`] rather than failing.
pub trait RecordStore {
    /// All identifiers already stored, fetched in a single round trip.
    fn list_known_identifiers(&self) -> Result<HashSet<String>, DatabaseError>;

    fn create_record(&self, record: &ResolvedRecord) -> Result<CreateOutcome, DatabaseError>;

    /// All records, newest first.
    fn fetch_all(&self) -> Result<Vec<Record>, DatabaseError>;

    /// Returns `false` if no record has this id.
    fn update_status(&self, id: i64, status: RecordStatus) -> Result<bool, DatabaseError>;
}

impl RecordStore for Database {
    fn list_known_identifiers(&self) -> Result<HashSet<String>, DatabaseError> {
        record_repo::list_uids(self)
    }

    fn create_record(&self, record: &ResolvedRecord) -> Result<CreateOutcome, DatabaseError> {
        let created_at = Utc::now().to_rfc3339();
        let Some(id) = record_repo::insert(self, record, &created_at)? else {
            log::debug!("Record for UID {} already exists, skipping", record.uid);
            return Ok(CreateOutcome::Duplicate);
        };

        let stored = record_repo::find_by_id(self, id)?.ok_or_else(|| {
            DatabaseError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })?;
        log::debug!("Stored record id={} for UID {}", stored.id, stored.uid);
        Ok(CreateOutcome::Created(stored))
    }

    fn fetch_all(&self) -> Result<Vec<Record>, DatabaseError> {
        record_repo::query(self, None)
    }

    fn update_status(&self, id: i64, status: RecordStatus) -> Result<bool, DatabaseError> {
        record_repo::update_status(self, id, status)
    }
}

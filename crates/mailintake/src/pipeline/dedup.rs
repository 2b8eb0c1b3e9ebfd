use std::collections::HashSet;

use crate::db::{DatabaseError, RecordStore};

/// Skips messages whose identifier is already stored.
///
/// The known set is loaded once per run with a single store query.
#[derive(Debug, Default, Clone)]
pub struct DedupFilter {
    known: HashSet<String>,
}

impl DedupFilter {
    pub fn load<S: RecordStore + ?Sized>(store: &S) -> Result<Self, DatabaseError> {
        let known = store.list_known_identifiers()?;
        tracing::debug!(known = known.len(), "loaded known identifiers");
        Ok(Self { known })
    }

    pub fn is_known(&self, uid: &str) -> bool {
        self.known.contains(uid)
    }

    /// Marks `uid` as stored, so a repeat later in the same run is skipped.
    pub fn remember(&mut self, uid: impl Into<String>) {
        self.known.insert(uid.into());
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

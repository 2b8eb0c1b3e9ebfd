//! Record repository: CRUD operations for the `records` table.

use std::collections::HashSet;

use rusqlite::{params, OptionalExtension, Row};

use super::models::{Record, RecordStatus, ResolvedRecord};
use super::{Database, DatabaseError};

/// A raw record row; `status` is still unparsed text.
struct RecordRow {
    id: i64,
    uid: String,
    subject: Option<String>,
    sender: String,
    send_time: Option<String>,
    email_body: String,
    raw_email_path: String,
    attachment_path: Option<String>,
    status: String,
    created_at: String,
}

impl RecordRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            uid: row.get("uid")?,
            subject: row.get("subject")?,
            sender: row.get("sender")?,
            send_time: row.get("send_time")?,
            email_body: row.get("email_body")?,
            raw_email_path: row.get("raw_email_path")?,
            attachment_path: row.get("attachment_path")?,
            status: row.get("status")?,
            created_at: row.get("created_at")?,
        })
    }
}

impl TryFrom<RecordRow> for Record {
    type Error = DatabaseError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        Ok(Record {
            status: row.status.parse::<RecordStatus>()?,
            id: row.id,
            uid: row.uid,
            subject: row.subject,
            sender: row.sender,
            send_time: row.send_time,
            email_body: row.email_body,
            raw_email_path: row.raw_email_path,
            attachment_path: row.attachment_path,
            created_at: row.created_at,
        })
    }
}

/// Inserts a record unless one with the same `uid` already exists.
///
/// Returns the new row id, or `None` if the insert was ignored.
pub fn insert(
    db: &Database,
    record: &ResolvedRecord,
    created_at: &str,
) -> Result<Option<i64>, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "INSERT OR IGNORE INTO records (uid, subject, sender, send_time, email_body,
             raw_email_path, attachment_path, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                record.uid,
                record.subject,
                record.sender,
                record.send_time,
                record.email_body,
                record.raw_email_path,
                record.attachment_path,
                record.status.as_str(),
                created_at,
            ],
        )?;

        if changed == 0 {
            Ok(None)
        } else {
            Ok(Some(conn.last_insert_rowid()))
        }
    })
}

/// Returns every stored `uid` in one query.
pub fn list_uids(db: &Database) -> Result<HashSet<String>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT uid FROM records")?;
        let uids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(uids)
    })
}

/// Finds a record by its row id.
pub fn find_by_id(db: &Database, id: i64) -> Result<Option<Record>, DatabaseError> {
    let row = db.with_conn(|conn| {
        Ok(conn
            .query_row(
                "SELECT * FROM records WHERE id = ?1",
                params![id],
                RecordRow::from_row,
            )
            .optional()?)
    })?;
    row.map(Record::try_from).transpose()
}

/// Finds a record by its mailbox identifier.
pub fn find_by_uid(db: &Database, uid: &str) -> Result<Option<Record>, DatabaseError> {
    let row = db.with_conn(|conn| {
        Ok(conn
            .query_row(
                "SELECT * FROM records WHERE uid = ?1",
                params![uid],
                RecordRow::from_row,
            )
            .optional()?)
    })?;
    row.map(Record::try_from).transpose()
}

/// Returns records newest first, optionally restricted to one status.
pub fn query(db: &Database, status: Option<RecordStatus>) -> Result<Vec<Record>, DatabaseError> {
    let rows = db.with_conn(|conn| {
        let rows = match status {
            Some(status) => {
                let mut stmt =
                    conn.prepare("SELECT * FROM records WHERE status = ?1 ORDER BY id DESC")?;
                let rows = stmt
                    .query_map(params![status.as_str()], RecordRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare("SELECT * FROM records ORDER BY id DESC")?;
                let rows = stmt
                    .query_map([], RecordRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };
        Ok(rows)
    })?;

    rows.into_iter().map(Record::try_from).collect()
}

/// Sets the status of a record. Returns `false` if no record has this id.
pub fn update_status(
    db: &Database,
    id: i64,
    status: RecordStatus,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE records SET status = ?2 WHERE id = ?1",
            params![id, status.as_str()],
        )?;
        Ok(changed > 0)
    })
}

/// Counts records per status, in status order.
pub fn count_by_status(db: &Database) -> Result<Vec<(RecordStatus, u64)>, DatabaseError> {
    let counts = db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM records GROUP BY status")?;
        let counts = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(counts)
    })?;

    let mut parsed = counts
        .into_iter()
        .map(|(status, count)| Ok((status.parse::<RecordStatus>()?, count)))
        .collect::<Result<Vec<_>, DatabaseError>>()?;
    parsed.sort_by_key(|(status, _)| RecordStatus::ALL.iter().position(|s| s == status));
    Ok(parsed)
}

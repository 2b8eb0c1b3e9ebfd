//! In-memory stand-ins for the mailbox and the record store.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures_util::{stream, StreamExt};

use mailintake::db::{
    CreateOutcome, Database, DatabaseError, Record, RecordStatus, RecordStore, ResolvedRecord,
};
use mailintake::email::{EmailError, InboundMessage, Mailbox, MessageStream};

use super::builders::MessageBuilder;

/// How a [`FakeMailbox`] fails, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    None,
    /// `connect` is refused.
    Connect,
    /// The fetch stream yields a protocol error after this many messages.
    MidStream(usize),
}

/// A mailbox serving pre-built raw messages.
pub struct FakeMailbox {
    messages: Vec<(String, Vec<u8>)>,
    failure: Failure,
    connected: bool,
    pub connects: usize,
    pub disconnects: usize,
    pub enumerations: usize,
    /// Every UID requested through `fetch`, in order.
    pub fetched: Vec<String>,
}

impl FakeMailbox {
    pub fn new(messages: &[MessageBuilder]) -> Self {
        Self {
            messages: messages
                .iter()
                .map(|m| (m.uid().to_string(), m.build_raw()))
                .collect(),
            failure: Failure::None,
            connected: false,
            connects: 0,
            disconnects: 0,
            enumerations: 0,
            fetched: Vec::new(),
        }
    }

    pub fn failing(mut self, failure: Failure) -> Self {
        self.failure = failure;
        self
    }
}

#[async_trait]
impl Mailbox for FakeMailbox {
    async fn connect(&mut self) -> Result<(), EmailError> {
        if self.connected {
            return Ok(());
        }
        self.connects += 1;
        if self.failure == Failure::Connect {
            return Err(EmailError::ConnectionFailed("connection refused".to_string()));
        }
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), EmailError> {
        self.disconnects += 1;
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn uids(&mut self) -> Result<Vec<String>, EmailError> {
        if !self.connected {
            return Err(EmailError::NotConnected);
        }
        Ok(self.messages.iter().map(|(uid, _)| uid.clone()).collect())
    }

    async fn fetch(&mut self, uids: Vec<String>) -> Result<MessageStream<'_>, EmailError> {
        if !self.connected {
            return Err(EmailError::NotConnected);
        }
        self.enumerations += 1;
        self.fetched.extend(uids.iter().cloned());

        let mut items: Vec<Result<(String, InboundMessage), EmailError>> = self
            .messages
            .iter()
            .filter(|(uid, _)| uids.contains(uid))
            .map(|(uid, raw)| {
                InboundMessage::parse(uid.clone(), raw.clone()).map(|m| (uid.clone(), m))
            })
            .collect();
        if let Failure::MidStream(after) = self.failure {
            items.truncate(after);
            items.push(Err(EmailError::ProtocolError("connection reset".to_string())));
        }
        Ok(stream::iter(items).boxed())
    }

    fn describe(&self) -> String {
        "fake/INBOX".to_string()
    }
}

/// A [`Database`]-backed store that counts calls.
///
/// With `hide_known` set, `list_known_identifiers` reports nothing, which
/// forces duplicates through to `create_record`.
pub struct CountingStore {
    pub db: Database,
    hide_known: bool,
    known_calls: AtomicUsize,
    create_calls: AtomicUsize,
}

impl CountingStore {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            hide_known: false,
            known_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
        }
    }

    pub fn hiding_known(mut self) -> Self {
        self.hide_known = true;
        self
    }

    pub fn known_calls(&self) -> usize {
        self.known_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

impl RecordStore for CountingStore {
    fn list_known_identifiers(&self) -> Result<HashSet<String>, DatabaseError> {
        self.known_calls.fetch_add(1, Ordering::SeqCst);
        if self.hide_known {
            return Ok(HashSet::new());
        }
        self.db.list_known_identifiers()
    }

    fn create_record(&self, record: &ResolvedRecord) -> Result<CreateOutcome, DatabaseError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.db.create_record(record)
    }

    fn fetch_all(&self) -> Result<Vec<Record>, DatabaseError> {
        self.db.fetch_all()
    }

    fn update_status(&self, id: i64, status: RecordStatus) -> Result<bool, DatabaseError> {
        self.db.update_status(id, status)
    }
}

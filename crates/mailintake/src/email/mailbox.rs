//! The mailbox seam the sync pipeline drives.

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use super::error::Result;
use super::message::InboundMessage;

/// Lazy, finite sequence of `(uid, message)` pairs. Borrowing the mailbox
/// keeps it non-restartable: the session is busy until the stream is dropped.
pub type MessageStream<'a> = BoxStream<'a, Result<(String, InboundMessage)>>;

/// A read-only mailbox.
///
/// `connect` is a no-op when already connected and `disconnect` is a no-op
/// when already disconnected. Listing and fetching require a connected
/// mailbox.
#[async_trait]
pub trait Mailbox: Send {
    async fn connect(&mut self) -> Result<()>;

    async fn disconnect(&mut self) -> Result<()>;

    fn is_connected(&self) -> bool;

    /// Identifiers of every message currently visible in the selected folder.
    async fn uids(&mut self) -> Result<Vec<String>>;

    /// Downloads the given messages. Ordering is whatever the server assigns.
    async fn fetch(&mut self, uids: Vec<String>) -> Result<MessageStream<'_>>;

    /// Lists every message currently visible in the selected folder.
    async fn messages(&mut self) -> Result<MessageStream<'_>> {
        let uids = self.uids().await?;
        self.fetch(uids).await
    }

    /// Human-readable name used in log spans, e.g. `imap.example.com/INBOX`.
    fn describe(&self) -> String;
}

//! Read-only mailbox access.
//!
//! [`ImapSession`] owns the IMAP connection and implements [`Mailbox`], the
//! seam the sync pipeline drives. Messages are enumerated lazily and parsed
//! into [`InboundMessage`]s; [`AttachmentExtractor`] stores their inline
//! attachments.

pub mod enumerator;
pub mod error;
pub mod extractor;
pub mod mailbox;
pub mod message;
pub mod session;

pub use enumerator::compress_uid_set;
pub use error::EmailError;
pub use extractor::{AttachmentCandidate, AttachmentExtractor, Extraction, SkipReason};
pub use mailbox::{Mailbox, MessageStream};
pub use message::{InboundMessage, InlineAttachment};
pub use session::{ImapSession, SessionState};

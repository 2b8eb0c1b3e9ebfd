//! Parsed, read-only view of one mailbox message.

use chrono::{DateTime, Utc};
use mail_parser::{MessageParser, MimeHeaders};

use super::error::{EmailError, Result};

/// A file embedded in the message's MIME structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineAttachment {
    /// Filename as declared by the sender, if any. Not sanitized.
    pub filename: Option<String>,
    /// Declared MIME type, e.g. `application/pdf`.
    pub content_type: Option<String>,
    pub content: Vec<u8>,
}

/// A message as enumerated from the mailbox. Never mutated after parsing.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Mailbox-assigned identifier (IMAP UID), unique within the mailbox.
    pub uid: String,
    pub subject: Option<String>,
    /// Address of the first `From` entry.
    pub sender: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    /// First plain-text body, or empty.
    pub body_text: String,
    /// First HTML body, if the message has one.
    pub body_html: Option<String>,
    /// The complete message as received.
    pub raw: Vec<u8>,
    /// Inline attachments in MIME order.
    pub attachments: Vec<InlineAttachment>,
}

impl InboundMessage {
    /// Parses raw RFC 5322 bytes fetched for `uid`.
    pub fn parse(uid: impl Into<String>, raw: Vec<u8>) -> Result<Self> {
        let uid = uid.into();
        let message = MessageParser::default().parse(&raw).ok_or_else(|| {
            EmailError::ParseError(format!("UID {} is not a parseable message", uid))
        })?;

        let subject = message.subject().map(|s| s.to_string());
        let sender = message
            .from()
            .and_then(|addrs| addrs.first())
            .and_then(|addr| addr.address())
            .map(|a| a.to_string());
        let sent_at = message
            .date()
            .and_then(|d| DateTime::<Utc>::from_timestamp(d.to_timestamp(), 0));
        let body_text = message
            .body_text(0)
            .map(|t| t.into_owned())
            .unwrap_or_default();
        let body_html = message.body_html(0).map(|h| h.into_owned());

        let attachments = message
            .attachments()
            .map(|part| InlineAttachment {
                filename: part.attachment_name().map(|n| n.to_string()),
                content_type: part.content_type().map(|ct| match ct.subtype() {
                    Some(subtype) => format!("{}/{}", ct.ctype(), subtype),
                    None => ct.ctype().to_string(),
                }),
                content: part.contents().to_vec(),
            })
            .collect();

        Ok(Self {
            uid,
            subject,
            sender,
            sent_at,
            body_text,
            body_html,
            raw,
            attachments,
        })
    }

    pub fn has_inline_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }
}

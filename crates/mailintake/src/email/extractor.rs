//! Inline attachment extraction under an extension whitelist.

use std::collections::HashSet;
use std::path::PathBuf;

use log::{debug, info};

use crate::error::StorageError;
use crate::sanitize::{file_extension, sanitize_filename};
use crate::storage::FileStore;

use super::message::{InboundMessage, InlineAttachment};

/// An inline attachment with its name made safe for the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentCandidate<'a> {
    /// Sanitized filename; never contains `/` or `\`.
    pub filename: String,
    /// Lower-case extension with leading dot, if the name has one.
    pub extension: Option<String>,
    pub content: &'a [u8],
}

impl<'a> AttachmentCandidate<'a> {
    /// Derives the stored name for `attachment`, falling back to
    /// `{uid}_attachment.bin` when the sender gave none.
    pub fn from_inline(uid: &str, attachment: &'a InlineAttachment) -> Self {
        let filename = attachment
            .filename
            .as_deref()
            .and_then(sanitize_filename)
            .unwrap_or_else(|| fallback_name(uid));
        let extension = file_extension(&filename);

        Self {
            filename,
            extension,
            content: &attachment.content,
        }
    }
}

fn fallback_name(uid: &str) -> String {
    sanitize_filename(&format!("{}_attachment.bin", uid))
        .unwrap_or_else(|| "attachment.bin".to_string())
}

/// Why an inline attachment was not written. Not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    ExtensionNotAllowed { filename: String, extension: String },
    Empty { filename: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::ExtensionNotAllowed {
                filename,
                extension,
            } => write!(f, "{}: extension {} not allowed", filename, extension),
            SkipReason::Empty { filename } => write!(f, "{}: empty content", filename),
        }
    }
}

/// What happened to the inline attachments of one message.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub saved: Vec<PathBuf>,
    pub skipped: Vec<SkipReason>,
}

/// Writes whitelisted inline attachments to the attachment store.
///
/// The check is on the filename extension only. A name without any
/// extension is accepted.
#[derive(Debug, Clone)]
pub struct AttachmentExtractor {
    allowed: HashSet<String>,
    store: FileStore,
}

impl AttachmentExtractor {
    /// `allowed` entries are lower-case extensions with a leading dot.
    pub fn new<I, S>(allowed: I, store: FileStore) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
            store,
        }
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    /// Decides whether `candidate` may be written.
    pub fn check(&self, candidate: &AttachmentCandidate<'_>) -> Result<(), SkipReason> {
        if let Some(extension) = &candidate.extension {
            if !self.allowed.contains(extension) {
                return Err(SkipReason::ExtensionNotAllowed {
                    filename: candidate.filename.clone(),
                    extension: extension.clone(),
                });
            }
        }

        if candidate.content.is_empty() {
            return Err(SkipReason::Empty {
                filename: candidate.filename.clone(),
            });
        }

        Ok(())
    }

    /// Writes every accepted inline attachment of `message`, in MIME order.
    ///
    /// Only storage failures are errors; rejected attachments are reported
    /// in [`Extraction::skipped`].
    pub async fn extract(&self, message: &InboundMessage) -> Result<Extraction, StorageError> {
        let mut extraction = Extraction::default();

        for attachment in &message.attachments {
            let candidate = AttachmentCandidate::from_inline(&message.uid, attachment);

            if let Err(reason) = self.check(&candidate) {
                info!("UID {}: skipped attachment {}", message.uid, reason);
                extraction.skipped.push(reason);
                continue;
            }

            let path = self.store.write(&candidate.filename, candidate.content).await?;
            debug!(
                "UID {}: saved {} ({} bytes)",
                message.uid,
                candidate.filename,
                candidate.content.len()
            );
            extraction.saved.push(path);
        }

        Ok(extraction)
    }
}

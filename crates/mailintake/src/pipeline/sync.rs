//! One synchronisation run over a mailbox.

use std::fmt;

use futures_util::StreamExt;
use serde::Serialize;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::cloud::{CloudLinkResolver, Resolution};
use crate::config::IntakeConfig;
use crate::db::{CreateOutcome, RecordStore};
use crate::email::{AttachmentExtractor, EmailError, InboundMessage, Mailbox};
use crate::error::Result;
use crate::storage::FileStore;

use super::assembler::RecordAssembler;
use super::dedup::DedupFilter;

/// Counters for one run. `created` is the number of newly ingested messages.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub seen: usize,
    pub created: usize,
    pub skipped_known: usize,
    pub skipped_duplicate: usize,
    pub failed: usize,
    pub attachments_saved: usize,
    pub attachments_skipped: usize,
    pub cloud_resolved: usize,
    pub cloud_misses: usize,
}

impl fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} new, {} already known, {} duplicate, {} failed of {} messages; \
             {} attachments saved, {} skipped; {} cloud files resolved, {} misses",
            self.created,
            self.skipped_known,
            self.skipped_duplicate,
            self.failed,
            self.seen,
            self.attachments_saved,
            self.attachments_skipped,
            self.cloud_resolved,
            self.cloud_misses,
        )
    }
}

/// Drives a mailbox through connect, enumerate, ingest and disconnect.
///
/// Messages are processed one at a time. Connection and protocol failures
/// abort the run; anything that goes wrong with a single message is logged
/// and counted in [`SyncSummary::failed`]. The mailbox is disconnected on
/// every exit path.
pub struct MailboxSync<M, S> {
    mailbox: M,
    ingest: Ingest<S>,
}

/// Everything applied to a message after it passed the dedup check.
struct Ingest<S> {
    store: S,
    extractor: AttachmentExtractor,
    resolver: Option<CloudLinkResolver>,
    assembler: RecordAssembler,
}

impl<M: Mailbox, S: RecordStore> MailboxSync<M, S> {
    pub fn new(
        mailbox: M,
        store: S,
        extractor: AttachmentExtractor,
        resolver: Option<CloudLinkResolver>,
        assembler: RecordAssembler,
    ) -> Self {
        Self {
            mailbox,
            ingest: Ingest {
                store,
                extractor,
                resolver,
                assembler,
            },
        }
    }

    /// Wires stores, whitelist and resolver from configuration.
    pub fn from_config(config: &IntakeConfig, mailbox: M, store: S) -> Result<Self> {
        let paths = config.storage.resolve();
        let extractor = AttachmentExtractor::new(
            config.attachment_extensions.iter().cloned(),
            FileStore::new(&paths.attachments),
        );
        let resolver = if config.cloud.enabled {
            Some(CloudLinkResolver::new(
                &config.cloud,
                FileStore::new(&paths.attachments),
            )?)
        } else {
            None
        };
        let assembler = RecordAssembler::new(FileStore::new(&paths.emails));

        Ok(Self::new(mailbox, store, extractor, resolver, assembler))
    }

    pub fn mailbox(&self) -> &M {
        &self.mailbox
    }

    pub fn store(&self) -> &S {
        &self.ingest.store
    }

    /// Runs one synchronisation.
    pub async fn run(&mut self) -> Result<SyncSummary> {
        let span = info_span!("sync", mailbox = %self.mailbox.describe());
        self.run_inner().instrument(span).await
    }

    async fn run_inner(&mut self) -> Result<SyncSummary> {
        let dedup = DedupFilter::load(&self.ingest.store)?;

        let outcome = match self.mailbox.connect().await {
            Ok(()) => self.sync_messages(dedup).await,
            Err(e) => Err(e.into()),
        };

        if let Err(e) = self.mailbox.disconnect().await {
            warn!("Logout failed: {}", e);
        }

        let summary = outcome?;
        info!(
            seen = summary.seen,
            created = summary.created,
            failed = summary.failed,
            "sync finished: {}",
            summary
        );
        Ok(summary)
    }

    async fn sync_messages(&mut self, mut dedup: DedupFilter) -> Result<SyncSummary> {
        let mut summary = SyncSummary::default();

        let listed = self.mailbox.uids().await?;
        let fresh: Vec<String> = listed
            .into_iter()
            .filter(|uid| {
                if dedup.is_known(uid) {
                    summary.seen += 1;
                    summary.skipped_known += 1;
                    false
                } else {
                    true
                }
            })
            .collect();
        debug!(
            known = summary.skipped_known,
            fresh = fresh.len(),
            "known messages will not be fetched"
        );

        let mut messages = self.mailbox.fetch(fresh).await?;

        while let Some(item) = messages.next().await {
            let message = match item {
                Ok((_, message)) => message,
                Err(EmailError::ParseError(e)) => {
                    summary.seen += 1;
                    summary.failed += 1;
                    warn!("Skipping unparseable message: {}", e);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            summary.seen += 1;

            if dedup.is_known(&message.uid) {
                debug!(uid = %message.uid, "already ingested, skipping");
                summary.skipped_known += 1;
                continue;
            }

            let span = info_span!("message", uid = %message.uid);
            match self
                .ingest
                .process(&message, &mut summary)
                .instrument(span)
                .await
            {
                Ok(()) => dedup.remember(message.uid.clone()),
                Err(e) => {
                    summary.failed += 1;
                    warn!(uid = %message.uid, "message not ingested: {}", e);
                }
            }
        }

        Ok(summary)
    }
}

impl<S: RecordStore> Ingest<S> {
    async fn process(&self, message: &InboundMessage, summary: &mut SyncSummary) -> Result<()> {
        let raw_path = self.assembler.store_raw(message).await?;

        let attachments = if message.has_inline_attachments() {
            let extraction = self.extractor.extract(message).await?;
            summary.attachments_saved += extraction.saved.len();
            summary.attachments_skipped += extraction.skipped.len();
            extraction.saved
        } else if let Some(resolver) = &self.resolver {
            match resolver
                .resolve(&message.uid, message.body_html.as_deref())
                .await
            {
                Resolution::Saved(path) => {
                    summary.cloud_resolved += 1;
                    vec![path]
                }
                Resolution::Miss(_) => {
                    summary.cloud_misses += 1;
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let record = RecordAssembler::assemble(message, &raw_path, &attachments);
        match self.assembler.submit(&self.store, &record)? {
            CreateOutcome::Created(stored) => {
                summary.created += 1;
                info!(id = stored.id, attachments = attachments.len(), "record created");
            }
            CreateOutcome::Duplicate => {
                summary.skipped_duplicate += 1;
                debug!("record already exists");
            }
        }
        Ok(())
    }
}

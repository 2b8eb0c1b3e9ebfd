//! Isolated storage and configuration for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use mailintake::cloud::CloudLinkResolver;
use mailintake::config::{load_config_from_str, IntakeConfig};
use mailintake::db::Database;
use mailintake::pipeline::MailboxSync;
use mailintake::storage::FileStore;

use super::fakes::{CountingStore, FakeMailbox};

/// A temporary storage root plus a config pointing at it.
///
/// Cloud requests time out after one second and ignore proxy variables, so
/// tests only ever talk to the local fixture server.
pub struct TestHarness {
    temp_dir: TempDir,
    pub config: IntakeConfig,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let yaml = format!(
            r#"
imap_server: imap.example.com
username: hr@example.com
imap_password: not-used
storage:
  root: {root}
cloud:
  timeout_secs: 1
  connect_timeout_secs: 1
  use_system_proxy: false
"#,
            root = temp_dir.path().join("storage").display()
        );
        let config = load_config_from_str(&yaml).expect("test config should load");
        Self { temp_dir, config }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn attachments_dir(&self) -> PathBuf {
        self.config.storage.resolve().attachments
    }

    pub fn emails_dir(&self) -> PathBuf {
        self.config.storage.resolve().emails
    }

    /// Files currently in the attachment store, sorted by name.
    pub fn attachment_files(&self) -> Vec<String> {
        list_dir(&self.attachments_dir())
    }

    pub fn email_files(&self) -> Vec<String> {
        list_dir(&self.emails_dir())
    }

    pub fn resolver(&self) -> CloudLinkResolver {
        CloudLinkResolver::new(&self.config.cloud, FileStore::new(self.attachments_dir()))
            .expect("resolver should build")
    }

    pub fn store(&self) -> CountingStore {
        CountingStore::new(Database::open_in_memory().expect("in-memory database"))
    }

    pub fn sync(
        &self,
        mailbox: FakeMailbox,
        store: CountingStore,
    ) -> MailboxSync<FakeMailbox, CountingStore> {
        MailboxSync::from_config(&self.config, mailbox, store).expect("sync should build")
    }
}

fn list_dir(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}

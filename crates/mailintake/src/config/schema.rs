use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::secrets::SecretSources;

/// Top-level configuration for one mailbox intake.
#[derive(Clone, Serialize, Deserialize)]
pub struct IntakeConfig {
    /// IMAP server hostname (e.g. "imap.qq.com").
    pub imap_server: String,

    /// IMAP server port (default: 993 for IMAPS).
    #[serde(default = "default_imap_port")]
    pub imap_port: u16,

    /// Login name, typically the full email address.
    pub username: String,

    /// Password given inline. Prefer `imap_password_file` or `imap_password_env`.
    #[serde(default, skip_serializing)]
    pub imap_password: Option<String>,

    /// Path to a file containing the password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imap_password_file: Option<String>,

    /// Name of an environment variable holding the password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imap_password_env: Option<String>,

    /// Folder to open read-only (default: "INBOX").
    #[serde(default = "default_inbox")]
    pub folder: String,

    /// Upper bound for TCP connect, TLS and login, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Client identification sent with the IMAP `ID` command.
    /// `null` disables the command.
    #[serde(default = "default_client_id")]
    pub client_id: Option<ClientId>,

    /// Extensions accepted for inline attachments, lower-case with leading dot.
    #[serde(default = "default_attachment_extensions")]
    pub attachment_extensions: Vec<String>,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub cloud: CloudConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl IntakeConfig {
    /// The configured password sources, in resolution order.
    pub fn password_sources(&self) -> SecretSources<'_> {
        SecretSources {
            direct: self.imap_password.as_deref(),
            file: self.imap_password_file.as_deref(),
            env_var: self.imap_password_env.as_deref(),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl std::fmt::Debug for IntakeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntakeConfig")
            .field("imap_server", &self.imap_server)
            .field("imap_port", &self.imap_port)
            .field("username", &self.username)
            .field(
                "imap_password",
                &self.imap_password.as_ref().map(|_| "<redacted>"),
            )
            .field("imap_password_file", &self.imap_password_file)
            .field("imap_password_env", &self.imap_password_env)
            .field("folder", &self.folder)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("client_id", &self.client_id)
            .field("attachment_extensions", &self.attachment_extensions)
            .field("storage", &self.storage)
            .field("cloud", &self.cloud)
            .field("logging", &self.logging)
            .finish()
    }
}

/// Name/version pair announced to servers that require an `ID` before
/// accepting further commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientId {
    pub name: String,
    pub version: String,
}

fn default_imap_port() -> u16 {
    993
}

fn default_inbox() -> String {
    "INBOX".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_client_id() -> Option<ClientId> {
    Some(ClientId {
        name: "Mozilla Thunderbird".to_string(),
        version: "102.0".to_string(),
    })
}

fn default_attachment_extensions() -> Vec<String> {
    [".pdf", ".docx", ".doc", ".jpg", ".png"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Where raw messages, attachments and the record database live.
///
/// Subdirectories default to `emails/`, `attachments/` and
/// `database/intake.db` under `root`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emails_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
}

/// Fully resolved storage locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    pub root: PathBuf,
    pub emails: PathBuf,
    pub attachments: PathBuf,
    pub database: PathBuf,
}

impl StorageConfig {
    pub fn resolve(&self) -> StoragePaths {
        let root = self
            .root
            .as_ref()
            .map(|p| PathBuf::from(crate::secrets::expand_home(&p.to_string_lossy())))
            .or_else(|| dirs::home_dir().map(|h| h.join(".mailintake").join("storage")))
            .unwrap_or_else(|| PathBuf::from("storage"));

        StoragePaths {
            emails: self
                .emails_dir
                .clone()
                .unwrap_or_else(|| root.join("emails")),
            attachments: self
                .attachments_dir
                .clone()
                .unwrap_or_else(|| root.join("attachments")),
            database: self
                .database_path
                .clone()
                .unwrap_or_else(|| root.join("database").join("intake.db")),
            root,
        }
    }
}

/// Settings for resolving cloud-hosted attachments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// Whether to follow cloud download links at all.
    pub enabled: bool,
    /// Case-insensitive URL tokens marking a candidate download link.
    pub tokens: Vec<String>,
    /// Extensions accepted for downloaded files.
    pub allowed_extensions: Vec<String>,
    /// Content-Type prefixes accepted for downloaded files.
    pub allowed_content_types: Vec<String>,
    /// Read timeout in seconds. A download is abandoned once no data has
    /// arrived for this long; slow but steady transfers are not cut off.
    pub timeout_secs: u64,
    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// User-Agent header; some providers refuse non-browser agents.
    pub user_agent: String,
    /// Optional Cookie header for providers that gate downloads on a session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookie: Option<String>,
    /// Honour HTTP(S)_PROXY environment variables.
    pub use_system_proxy: bool,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tokens: ["download", "ftn", "qqmail"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            allowed_extensions: [".pdf", ".doc", ".docx", ".zip", ".rar", ".7z"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            allowed_content_types: [
                "application/pdf",
                "application/msword",
                "application/vnd.openxmlformats-officedocument",
                "application/octet-stream",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            timeout_secs: 20,
            connect_timeout_secs: 10,
            user_agent: "Mozilla/5.0".to_string(),
            cookie: None,
            use_system_proxy: true,
        }
    }
}

impl CloudConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}' (expected pretty or json)", other)),
        }
    }
}

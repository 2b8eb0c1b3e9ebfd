use std::path::{Path, PathBuf};

use crate::config::schema::IntakeConfig;
use crate::error::ConfigError;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<IntakeConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<IntakeConfig, ConfigError> {
    let mut config: IntakeConfig = serde_yaml::from_str(content)?;

    normalize_config(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Advisories about a loaded config that do not make it invalid.
///
/// Loading happens before logging is set up, so callers emit these once
/// the subscriber is installed.
pub fn config_warnings(config: &IntakeConfig) -> Vec<&'static str> {
    let mut warnings = Vec::new();
    if config.imap_password.as_deref().is_some_and(|p| !p.is_empty()) {
        warnings.push(
            "Using an inline imap_password is not recommended. \
             Consider imap_password_file or imap_password_env instead.",
        );
    }
    warnings
}

/// Returns the default config location: `~/.mailintake/config.yaml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".mailintake").join("config.yaml"))
}

fn normalize_config(config: &mut IntakeConfig) {
    for ext in config
        .attachment_extensions
        .iter_mut()
        .chain(config.cloud.allowed_extensions.iter_mut())
    {
        *ext = ext.trim().to_lowercase();
    }
    for content_type in config.cloud.allowed_content_types.iter_mut() {
        *content_type = content_type.trim().to_lowercase();
    }
}

fn validate_config(config: &IntakeConfig) -> Result<(), ConfigError> {
    if config.imap_server.trim().is_empty() {
        return Err(invalid("imap_server must not be empty"));
    }

    if config.username.trim().is_empty() {
        return Err(invalid("username must not be empty"));
    }

    if config.imap_port == 0 {
        return Err(invalid("imap_port must be non-zero"));
    }

    if config.folder.trim().is_empty() {
        return Err(invalid("folder must not be empty"));
    }

    if config.connect_timeout_secs == 0 {
        return Err(invalid("connect_timeout_secs must be non-zero"));
    }

    if !config.password_sources().is_configured() {
        return Err(invalid(
            "no password source configured (need imap_password, imap_password_file or imap_password_env)",
        ));
    }

    validate_extensions("attachment_extensions", &config.attachment_extensions)?;

    let cloud = &config.cloud;
    validate_extensions("cloud.allowed_extensions", &cloud.allowed_extensions)?;

    if cloud.enabled && cloud.tokens.is_empty() {
        return Err(invalid("cloud.tokens must list at least one token"));
    }

    if let Some(token) = cloud.tokens.iter().find(|t| t.trim().is_empty()) {
        return Err(invalid(&format!("cloud.tokens contains an empty token: {:?}", token)));
    }

    if cloud.allowed_content_types.iter().any(|t| t.is_empty()) {
        return Err(invalid(
            "cloud.allowed_content_types contains an empty entry, which would match any type",
        ));
    }

    if cloud.timeout_secs == 0 || cloud.connect_timeout_secs == 0 {
        return Err(invalid("cloud timeouts must be non-zero"));
    }

    Ok(())
}

fn validate_extensions(field: &str, extensions: &[String]) -> Result<(), ConfigError> {
    for ext in extensions {
        if !ext.starts_with('.') || ext.len() < 2 {
            return Err(invalid(&format!(
                "{} entry '{}' must look like '.pdf'",
                field, ext
            )));
        }
    }
    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Validation {
        message: message.to_string(),
    }
}

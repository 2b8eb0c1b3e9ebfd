//! Resolution of the IMAP password from its configured sources.
//!
//! The password may be given in one of three places, checked in order:
//!
//! 1. **Direct value** (`imap_password`) - convenient for local testing
//! 2. **File** (`imap_password_file`) - Docker/Kubernetes secret mounts
//! 3. **Environment variable** (`imap_password_env`) - CI and service managers
//!
//! Empty strings count as "not configured" so that a blank YAML key does not
//! shadow a later source.

use secrecy::SecretString;

/// Error type for secret resolution failures.
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No secret source provided (need one of: direct value, file path, or env var name)")]
    NoSourceProvided,

    #[error("Failed to read secret from file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Environment variable '{name}' not set")]
    EnvVarNotSet { name: String },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },
}

pub type Result<T> = std::result::Result<T, SecretError>;

/// The places a secret may be read from.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecretSources<'a> {
    pub direct: Option<&'a str>,
    pub file: Option<&'a str>,
    pub env_var: Option<&'a str>,
}

impl<'a> SecretSources<'a> {
    /// Returns true if at least one source is set to a non-empty value.
    pub fn is_configured(&self) -> bool {
        [self.direct, self.file, self.env_var]
            .into_iter()
            .any(|source| non_empty(source).is_some())
    }

    /// Resolves the secret from the first configured source.
    ///
    /// File contents and environment values are trimmed, since both commonly
    /// carry a trailing newline.
    pub fn resolve(&self) -> Result<SecretString> {
        if let Some(value) = non_empty(self.direct) {
            return Ok(SecretString::from(value.to_string()));
        }

        if let Some(path) = non_empty(self.file) {
            let expanded = expand_home(path);
            return std::fs::read_to_string(&expanded)
                .map(|content| SecretString::from(content.trim().to_string()))
                .map_err(|source| SecretError::FileReadError {
                    path: expanded,
                    source,
                });
        }

        if let Some(name) = non_empty(self.env_var) {
            return match std::env::var(name) {
                Ok(value) => Ok(SecretString::from(value.trim().to_string())),
                Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
                    name: name.to_string(),
                }),
                Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                    name: name.to_string(),
                }),
            };
        }

        Err(SecretError::NoSourceProvided)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Expands a leading `~` to the user's home directory.
///
/// Only `~` and `~/path` are supported, not `~user/path`.
pub fn expand_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            let home = home.to_string_lossy();
            return path.replacen('~', &home, 1);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn sources<'a>(
        direct: Option<&'a str>,
        file: Option<&'a str>,
        env_var: Option<&'a str>,
    ) -> SecretSources<'a> {
        SecretSources {
            direct,
            file,
            env_var,
        }
    }

    // Tests touching the process environment run serially.
    #[test]
    #[serial]
    fn test_direct_value_takes_priority() {
        std::env::set_var("MAILINTAKE_TEST_SECRET_1", "env_value");
        let secret = sources(Some("direct_value"), None, Some("MAILINTAKE_TEST_SECRET_1"))
            .resolve()
            .unwrap();
        assert_eq!(secret.expose_secret(), "direct_value");
        std::env::remove_var("MAILINTAKE_TEST_SECRET_1");
    }

    #[test]
    #[serial]
    fn test_file_takes_priority_over_env() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "file_value").unwrap();

        std::env::set_var("MAILINTAKE_TEST_SECRET_2", "env_value");
        let path = temp_file.path().to_str().unwrap();
        let secret = sources(None, Some(path), Some("MAILINTAKE_TEST_SECRET_2"))
            .resolve()
            .unwrap();
        assert_eq!(secret.expose_secret(), "file_value");
        std::env::remove_var("MAILINTAKE_TEST_SECRET_2");
    }

    #[test]
    #[serial]
    fn test_env_var_fallback_is_trimmed() {
        std::env::set_var("MAILINTAKE_TEST_SECRET_3", "env_value\n");
        let secret = sources(None, None, Some("MAILINTAKE_TEST_SECRET_3"))
            .resolve()
            .unwrap();
        assert_eq!(secret.expose_secret(), "env_value");
        std::env::remove_var("MAILINTAKE_TEST_SECRET_3");
    }

    #[test]
    #[serial]
    fn test_empty_strings_ignored() {
        std::env::set_var("MAILINTAKE_TEST_SECRET_4", "env_value");
        let secret = sources(Some(""), Some(""), Some("MAILINTAKE_TEST_SECRET_4"))
            .resolve()
            .unwrap();
        assert_eq!(secret.expose_secret(), "env_value");
        std::env::remove_var("MAILINTAKE_TEST_SECRET_4");
    }

    #[test]
    fn test_no_source_error() {
        let result = SecretSources::default().resolve();
        assert!(matches!(result, Err(SecretError::NoSourceProvided)));
    }

    #[test]
    fn test_file_not_found_error() {
        let result = sources(None, Some("/nonexistent/path/to/secret"), None).resolve();
        assert!(matches!(result, Err(SecretError::FileReadError { .. })));
    }

    #[test]
    fn test_env_var_not_set_error() {
        let result = sources(None, None, Some("MAILINTAKE_DEFINITELY_NOT_SET_12345")).resolve();
        assert!(matches!(result, Err(SecretError::EnvVarNotSet { .. })));
    }

    #[test]
    fn test_is_configured() {
        assert!(sources(Some("value"), None, None).is_configured());
        assert!(sources(None, Some("/path"), None).is_configured());
        assert!(sources(None, None, Some("ENV_VAR")).is_configured());
        assert!(!SecretSources::default().is_configured());
        assert!(!sources(Some(""), Some(""), Some("")).is_configured());
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/absolute/path"), "/absolute/path");
        assert_eq!(expand_home("relative/path"), "relative/path");

        if let Some(home) = dirs::home_dir() {
            let home = home.to_string_lossy().into_owned();
            assert_eq!(expand_home("~/test"), format!("{}/test", home));
            assert_eq!(expand_home("~"), home);
        }
    }
}

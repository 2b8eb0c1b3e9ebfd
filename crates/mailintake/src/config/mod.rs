pub mod loader;
pub mod schema;

pub use loader::{config_warnings, default_config_path, load_config, load_config_from_str};
pub use schema::{
    ClientId, CloudConfig, IntakeConfig, LogFormat, LoggingConfig, StorageConfig, StoragePaths,
};

pub mod filesystem;

pub use filesystem::{FileStore, StoredFile};

//! The sync pipeline: dedup, extraction or cloud resolution, assembly.

pub mod assembler;
pub mod dedup;
pub mod lock;
pub mod sync;

pub use assembler::RecordAssembler;
pub use dedup::DedupFilter;
pub use lock::SyncLock;
pub use sync::{MailboxSync, SyncSummary};

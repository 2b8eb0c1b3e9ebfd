//! Resolution of attachments hosted behind cloud download links.
//!
//! Webmail providers replace large attachments with a link in the HTML body.
//! [`CloudLinkResolver`] finds those links with a pluggable [`LinkStrategy`],
//! follows them and stores the first whitelisted file they lead to.

pub mod error;
pub mod filename;
pub mod links;
pub mod resolver;

pub use error::{CloudError, LinkFailure};
pub use links::{LinkStrategy, TokenLinkStrategy};
pub use resolver::{CloudLinkResolver, CloudMiss, Resolution};

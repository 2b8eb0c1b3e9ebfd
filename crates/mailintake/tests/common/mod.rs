//! Shared test utilities for mailintake integration tests.
//!
//! - `builders`: raw message construction
//! - `fakes`: in-memory mailbox and a call-counting record store
//! - `http`: local fixture server for cloud links
//! - `harness`: temp storage root and matching config

pub mod builders;
pub mod fakes;
pub mod harness;
pub mod http;

pub use builders::*;
pub use fakes::*;
pub use harness::TestHarness;
pub use http::*;

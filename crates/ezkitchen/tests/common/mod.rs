//! Shared utilities for ezkitchen integration tests.
//!
//! - `TestHarness`: an `Application` over an in-memory database with
//!   recording collaborators and a fixed clock
//! - builders for estimates, products and signature uploads

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;

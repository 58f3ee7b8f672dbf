//! Auth types shared across YaMDb crates.
//!
//! Provides JWT issuing and validation and the `Caller` extractor.

pub mod identity;
pub mod token;

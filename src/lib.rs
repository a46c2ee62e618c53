//! # changelog-gen
//!
//! Generates a formatted changelog from commit messages over a date or
//! revision range.
//!
//! ## Features
//!
//! - Date-based or revision-based commit ranges
//! - Configurable section patterns and templates
//! - Prepend/append merging with header deduplication
//!
//! ## Quick Start
//!
//! ```rust
//! use changelog_gen::changelog::{classify, MatchStrategy, SectionSpec};
//!
//! let specs = vec![SectionSpec::new("fixes", r"^fix: (.*)$").unwrap()];
//! let changes = classify("fix: save crash\n", &specs, MatchStrategy::Independent);
//! assert_eq!(changes.get("fixes"), Some(&["save crash".to_string()][..]));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod changelog;
pub mod cli;
pub mod config;

pub use crate::cli::Cli;

/// The current version of changelog-gen.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

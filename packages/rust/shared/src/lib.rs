//! Shared types, error model, and configuration for termgroup.
//!
//! This crate is the foundation depended on by all other termgroup crates.
//! It provides:
//! - [`TermGroupError`] — the unified error type
//! - Domain types ([`TermId`], [`Section`], [`SectionList`])
//! - Configuration ([`AppConfig`], [`GroupingConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, GroupingConfig, GroupingDefaults, MemberOrder, OutputDefaults, OutputFormat,
    config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{EmptyOrigin, Result, TermGroupError};
pub use types::{CATCH_ALL_SECTION, IN_MEMORY_SOURCE, Section, SectionList, TermId};

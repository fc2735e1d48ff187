//! Header selection, grouping, and section assembly for termgroup.
//!
//! This crate ties the term graph and the section encodings together into
//! the `group` workflow ([`pipeline::run_grouping`]).

pub mod assembler;
pub mod grouping;
pub mod headers;
pub mod pipeline;

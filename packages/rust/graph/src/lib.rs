//! Read-only term DAG views consumed by the grouping engine.
//!
//! The engine never parses ontologies itself. It reads depth and ancestry
//! through [`GraphQuery`] and default headers through [`DefaultHeaderSource`].
//! [`TermGraph`] is the in-memory implementation, built once from prepared
//! term records and shared by reference afterwards.

mod slim;
mod term_graph;

use std::collections::{BTreeMap, BTreeSet};

use termgroup_shared::{Result, TermId};

pub use slim::{DefaultHeaderSource, SlimHeaders, parse_id_list};
pub use term_graph::{GraphFile, TermGraph, TermRecord};

/// Read-only queries over a loaded term DAG.
///
/// Every method taking a term id fails with `UnknownTerm` (or returns `None`)
/// when the id is not in the graph.
pub trait GraphQuery {
    /// Whether the id is present in the loaded graph.
    fn contains(&self, term: &str) -> bool;

    /// Length of the longest `is_a` path from the term to a root.
    fn depth(&self, term: &str) -> Result<u32>;

    /// Every term reachable upwards from `term`, excluding `term` itself.
    fn ancestors(&self, term: &str) -> Result<&BTreeSet<TermId>>;

    /// Relationship-typed edges leaving `term` (type → targets).
    fn relationships(&self, term: &str) -> Result<&BTreeMap<String, BTreeSet<TermId>>>;

    /// Human-readable term name, if the graph carries one.
    fn name(&self, term: &str) -> Option<&str>;

    /// Namespace tag (e.g. `biological_process`).
    fn namespace(&self, term: &str) -> Option<&str>;
}

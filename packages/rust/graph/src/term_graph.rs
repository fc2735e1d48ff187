//! In-memory term DAG with precomputed depth and ancestry.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use termgroup_shared::{Result, TermGroupError, TermId};

use crate::GraphQuery;

// ---------------------------------------------------------------------------
// Input records
// ---------------------------------------------------------------------------

/// One term as it appears in a prepared graph file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermRecord {
    pub id: TermId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// `is_a` parents.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<TermId>,
    /// Typed edges such as `part_of` or `regulates`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub relationships: BTreeMap<String, Vec<TermId>>,
}

impl TermRecord {
    pub fn new(id: impl Into<TermId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            namespace: None,
            parents: Vec::new(),
            relationships: BTreeMap::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_parents(mut self, parents: &[&str]) -> Self {
        self.parents = parents.iter().map(|p| TermId::from(*p)).collect();
        self
    }

    pub fn with_relationship(mut self, kind: &str, targets: &[&str]) -> Self {
        self.relationships.insert(
            kind.to_string(),
            targets.iter().map(|t| TermId::from(*t)).collect(),
        );
        self
    }
}

/// Root structure of a graph JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphFile {
    pub terms: Vec<TermRecord>,
}

// ---------------------------------------------------------------------------
// TermGraph
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct TermNode {
    name: Option<String>,
    namespace: Option<String>,
    parents: BTreeSet<TermId>,
    relationships: BTreeMap<String, BTreeSet<TermId>>,
    depth: u32,
    ancestors: BTreeSet<TermId>,
}

/// An immutable term DAG.
///
/// Depth follows `is_a` edges only. Ancestry follows `is_a` edges plus the
/// relationship types named at build time.
#[derive(Debug, Clone)]
pub struct TermGraph {
    nodes: BTreeMap<TermId, TermNode>,
    followed: Vec<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

impl TermGraph {
    /// Build a graph, rejecting duplicate ids, dangling edges, and cycles.
    #[instrument(skip_all, fields(terms = records.len(), follow = ?follow_relationships))]
    pub fn build(records: Vec<TermRecord>, follow_relationships: &[String]) -> Result<Self> {
        let mut nodes: BTreeMap<TermId, TermNode> = BTreeMap::new();

        for record in records {
            let node = TermNode {
                name: record.name,
                namespace: record.namespace,
                parents: record.parents.into_iter().collect(),
                relationships: record
                    .relationships
                    .into_iter()
                    .map(|(kind, targets)| (kind, targets.into_iter().collect()))
                    .collect(),
                depth: 0,
                ancestors: BTreeSet::new(),
            };
            if nodes.insert(record.id.clone(), node).is_some() {
                return Err(TermGroupError::configuration(format!(
                    "term {} is defined more than once",
                    record.id
                )));
            }
        }

        for (id, node) in &nodes {
            let targets = node
                .parents
                .iter()
                .chain(node.relationships.values().flatten());
            for target in targets {
                if !nodes.contains_key(target) {
                    return Err(TermGroupError::configuration(format!(
                        "term {id} references {target}, which is not in the graph"
                    )));
                }
            }
        }

        let followed = follow_relationships.to_vec();
        let depths = compute_depths(&nodes)?;
        let ancestors = compute_ancestors(&nodes, &followed)?;

        for (id, node) in nodes.iter_mut() {
            node.depth = depths.get(id).copied().unwrap_or_default();
            node.ancestors = ancestors.get(id).cloned().unwrap_or_default();
        }

        debug!(nodes = nodes.len(), "term graph built");
        Ok(Self { nodes, followed })
    }

    /// Parse a graph from JSON (`{"terms": [...]}`).
    pub fn from_json_str(content: &str, follow_relationships: &[String]) -> Result<Self> {
        let file: GraphFile = serde_json::from_str(content)
            .map_err(|e| TermGroupError::configuration(format!("invalid graph JSON: {e}")))?;
        Self::build(file.terms, follow_relationships)
    }

    /// Load a graph JSON file from disk.
    pub fn load(path: &Path, follow_relationships: &[String]) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| TermGroupError::storage(path, e))?;
        Self::from_json_str(&content, follow_relationships).map_err(|e| match e {
            TermGroupError::Configuration { message } => {
                TermGroupError::configuration(format!("{}: {message}", path.display()))
            }
            other => other,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Relationship types traversed as ancestry.
    pub fn followed_relationships(&self) -> &[String] {
        &self.followed
    }

    /// Direct `is_a` parents.
    pub fn parents(&self, term: &str) -> Result<&BTreeSet<TermId>> {
        Ok(&self.node(term)?.parents)
    }

    pub fn term_ids(&self) -> impl Iterator<Item = &TermId> {
        self.nodes.keys()
    }

    fn node(&self, term: &str) -> Result<&TermNode> {
        self.nodes
            .get(term)
            .ok_or_else(|| TermGroupError::unknown_term(term))
    }
}

impl GraphQuery for TermGraph {
    fn contains(&self, term: &str) -> bool {
        self.nodes.contains_key(term)
    }

    fn depth(&self, term: &str) -> Result<u32> {
        Ok(self.node(term)?.depth)
    }

    fn ancestors(&self, term: &str) -> Result<&BTreeSet<TermId>> {
        Ok(&self.node(term)?.ancestors)
    }

    fn relationships(&self, term: &str) -> Result<&BTreeMap<String, BTreeSet<TermId>>> {
        Ok(&self.node(term)?.relationships)
    }

    fn name(&self, term: &str) -> Option<&str> {
        self.nodes.get(term).and_then(|n| n.name.as_deref())
    }

    fn namespace(&self, term: &str) -> Option<&str> {
        self.nodes.get(term).and_then(|n| n.namespace.as_deref())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn cycle_error(term: &TermId) -> TermGroupError {
    TermGroupError::configuration(format!("cycle detected through term {term}"))
}

/// Longest `is_a` path to a root, for every node.
fn compute_depths(nodes: &BTreeMap<TermId, TermNode>) -> Result<HashMap<TermId, u32>> {
    fn visit(
        id: &TermId,
        nodes: &BTreeMap<TermId, TermNode>,
        state: &mut HashMap<TermId, Visit>,
        depths: &mut HashMap<TermId, u32>,
    ) -> Result<u32> {
        match state.get(id) {
            Some(Visit::Done) => return Ok(depths.get(id).copied().unwrap_or_default()),
            Some(Visit::InProgress) => return Err(cycle_error(id)),
            None => {}
        }
        state.insert(id.clone(), Visit::InProgress);

        let mut depth = 0;
        if let Some(node) = nodes.get(id) {
            for parent in &node.parents {
                depth = depth.max(visit(parent, nodes, state, depths)? + 1);
            }
        }

        state.insert(id.clone(), Visit::Done);
        depths.insert(id.clone(), depth);
        Ok(depth)
    }

    let mut state = HashMap::with_capacity(nodes.len());
    let mut depths = HashMap::with_capacity(nodes.len());
    for id in nodes.keys() {
        visit(id, nodes, &mut state, &mut depths)?;
    }
    Ok(depths)
}

/// Transitive closure over `is_a` plus followed relationship edges.
fn compute_ancestors(
    nodes: &BTreeMap<TermId, TermNode>,
    followed: &[String],
) -> Result<HashMap<TermId, BTreeSet<TermId>>> {
    fn visit(
        id: &TermId,
        nodes: &BTreeMap<TermId, TermNode>,
        followed: &[String],
        state: &mut HashMap<TermId, Visit>,
        closure: &mut HashMap<TermId, BTreeSet<TermId>>,
    ) -> Result<()> {
        match state.get(id) {
            Some(Visit::Done) => return Ok(()),
            Some(Visit::InProgress) => return Err(cycle_error(id)),
            None => {}
        }
        state.insert(id.clone(), Visit::InProgress);

        let mut ancestors = BTreeSet::new();
        if let Some(node) = nodes.get(id) {
            let upward = node.parents.iter().chain(
                followed
                    .iter()
                    .filter_map(|kind| node.relationships.get(kind))
                    .flatten(),
            );
            for next in upward {
                visit(next, nodes, followed, state, closure)?;
                ancestors.insert(next.clone());
                if let Some(above) = closure.get(next) {
                    ancestors.extend(above.iter().cloned());
                }
            }
        }

        state.insert(id.clone(), Visit::Done);
        closure.insert(id.clone(), ancestors);
        Ok(())
    }

    let mut state = HashMap::with_capacity(nodes.len());
    let mut closure = HashMap::with_capacity(nodes.len());
    for id in nodes.keys() {
        visit(id, nodes, followed, &mut state, &mut closure)?;
    }
    Ok(closure)
}

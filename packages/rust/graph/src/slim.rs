//! Default header terms derived from a slim (reduced) term set.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::{debug, warn};

use termgroup_shared::{Result, TermGroupError, TermId};

use crate::GraphQuery;

/// Parse an id list: one id per line, `#` starts a comment.
pub fn parse_id_list(content: &str) -> Vec<TermId> {
    content
        .lines()
        .filter_map(|line| line.split('#').next())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(TermId::from)
        .collect()
}

/// Supplies the header terms used when the caller gives no explicit sections.
pub trait DefaultHeaderSource {
    fn default_header_terms(&self) -> BTreeSet<TermId>;
}

/// A slim id set restricted to terms the graph knows.
///
/// Namespace roots (depth 0) are dropped: every term descends from one, so
/// a root header would swallow the whole input.
#[derive(Debug, Clone, Default)]
pub struct SlimHeaders {
    terms: BTreeSet<TermId>,
}

impl SlimHeaders {
    pub fn new<G: GraphQuery + ?Sized>(
        graph: &G,
        slim: impl IntoIterator<Item = TermId>,
    ) -> Result<Self> {
        let mut terms = BTreeSet::new();
        for id in slim {
            if !graph.contains(id.as_str()) {
                warn!(term = %id, "slim term not in graph, skipping");
                continue;
            }
            if graph.depth(id.as_str())? == 0 {
                debug!(term = %id, "skipping namespace root in slim");
                continue;
            }
            terms.insert(id);
        }
        Ok(Self { terms })
    }

    /// Load a slim id file and restrict it to `graph`.
    pub fn load<G: GraphQuery + ?Sized>(graph: &G, path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| TermGroupError::storage(path, e))?;
        let slim = Self::new(graph, parse_id_list(&content))?;
        debug!(path = %path.display(), headers = slim.terms.len(), "loaded slim headers");
        Ok(slim)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl DefaultHeaderSource for SlimHeaders {
    fn default_header_terms(&self) -> BTreeSet<TermId> {
        self.terms.clone()
    }
}

impl DefaultHeaderSource for BTreeSet<TermId> {
    fn default_header_terms(&self) -> BTreeSet<TermId> {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TermGraph, TermRecord};

    fn graph() -> TermGraph {
        TermGraph::build(
            vec![
                TermRecord::new("root"),
                TermRecord::new("a").with_parents(&["root"]),
                TermRecord::new("b").with_parents(&["a"]),
            ],
            &[],
        )
        .unwrap()
    }

    #[test]
    fn drops_roots_and_unknown_terms() {
        let ids = ["root", "a", "b", "ghost"].map(TermId::from);
        let slim = SlimHeaders::new(&graph(), ids).unwrap();
        let got: Vec<&str> = slim.terms.iter().map(TermId::as_str).collect();
        assert_eq!(got, ["a", "b"]);
        assert_eq!(slim.default_header_terms().len(), 2);
    }

    #[test]
    fn parse_id_list_skips_comments_and_blanks() {
        let ids = parse_id_list("# slim\n\na  # first\n   b\n#c\n");
        assert_eq!(ids, [TermId::from("a"), TermId::from("b")]);
    }

    #[test]
    fn loads_fixture_slim() {
        let graph = TermGraph::load(Path::new("../../../fixtures/graph/bp_small.json"), &[])
            .expect("load fixture graph");
        let slim = SlimHeaders::load(&graph, Path::new("../../../fixtures/graph/slim_bp.txt"))
            .expect("load fixture slim");
        assert!(!slim.is_empty());
        assert!(!slim.default_header_terms().contains("GO:0008150"));
    }
}

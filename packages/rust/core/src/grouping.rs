//! Assigns each input term to its most specific header(s).

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::{debug, instrument, warn};

use termgroup_graph::GraphQuery;
use termgroup_shared::{Result, TermGroupError, TermId};

use crate::headers::HeaderPlan;

/// Input term → set of header declaration indices.
///
/// A term under several equally deep headers keeps all of them. A term with
/// an empty set belongs to the catch-all section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grouping {
    terms: Vec<TermId>,
    assignments: HashMap<TermId, BTreeSet<usize>>,
}

impl Grouping {
    /// Input terms, de-duplicated, in input order.
    pub fn terms(&self) -> &[TermId] {
        &self.terms
    }

    /// Header declaration indices for `term` (empty when unassigned).
    pub fn header_indices(&self, term: &str) -> Option<&BTreeSet<usize>> {
        self.assignments.get(term)
    }

    /// Header ids for `term`, in declaration order.
    pub fn headers_of<'p>(&self, term: &str, plan: &'p HeaderPlan) -> Vec<&'p TermId> {
        self.header_indices(term)
            .into_iter()
            .flatten()
            .map(|&i| &plan.headers()[i].id)
            .collect()
    }

    pub fn is_unassigned(&self, term: &str) -> bool {
        self.assignments.get(term).is_none_or(BTreeSet::is_empty)
    }

    /// Terms matched to no header, in input order.
    pub fn unassigned(&self) -> impl Iterator<Item = &TermId> {
        self.terms.iter().filter(|t| self.is_unassigned(t.as_str()))
    }

    /// Declaration indices of headers that matched at least one term.
    pub fn used_headers(&self) -> BTreeSet<usize> {
        self.assignments.values().flatten().copied().collect()
    }

    /// Number of (term, header) assignments plus unassigned terms.
    pub fn membership_count(&self) -> usize {
        self.terms
            .iter()
            .map(|t| self.assignments.get(t).map_or(0, BTreeSet::len).max(1))
            .sum()
    }
}

/// Group `terms` under the headers of `plan`.
///
/// Per term: a header term goes to itself only. Otherwise its ancestors are
/// intersected with the headers and the deepest matches are all kept. No
/// match means catch-all. Repeated input terms are kept once.
#[instrument(skip_all, fields(terms = terms.len(), headers = plan.headers().len()))]
pub fn group_terms<G: GraphQuery + ?Sized>(
    graph: &G,
    plan: &HeaderPlan,
    terms: &[TermId],
) -> Result<Grouping> {
    let mut seen: HashSet<&TermId> = HashSet::with_capacity(terms.len());
    let mut ordered: Vec<TermId> = Vec::with_capacity(terms.len());
    for term in terms {
        if !graph.contains(term.as_str()) {
            return Err(TermGroupError::unknown_term(term.as_str()));
        }
        if seen.insert(term) {
            ordered.push(term.clone());
        } else {
            warn!(term = %term, "duplicate input term ignored");
        }
    }

    let mut assignments = HashMap::with_capacity(ordered.len());
    for term in &ordered {
        let chosen = most_specific_headers(graph, plan, term)?;
        assignments.insert(term.clone(), chosen);
    }

    let grouping = Grouping {
        terms: ordered,
        assignments,
    };
    debug!(
        unassigned = grouping.unassigned().count(),
        memberships = grouping.membership_count(),
        "terms grouped"
    );
    Ok(grouping)
}

fn most_specific_headers<G: GraphQuery + ?Sized>(
    graph: &G,
    plan: &HeaderPlan,
    term: &TermId,
) -> Result<BTreeSet<usize>> {
    if let Some(idx) = plan.header_index(term.as_str()) {
        return Ok(BTreeSet::from([idx]));
    }

    let ancestors = graph.ancestors(term.as_str())?;
    let candidates: Vec<(usize, u32)> = plan
        .headers()
        .iter()
        .enumerate()
        .filter(|(_, h)| ancestors.contains(&h.id))
        .map(|(i, h)| (i, h.depth))
        .collect();

    let Some(max_depth) = candidates.iter().map(|&(_, d)| d).max() else {
        return Ok(BTreeSet::new());
    };

    Ok(candidates
        .into_iter()
        .filter(|&(_, d)| d == max_depth)
        .map(|(i, _)| i)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::select_headers;
    use termgroup_graph::{TermGraph, TermRecord};
    use termgroup_shared::{Section, SectionList};

    /// root → Immune, Metabolism (depth 1); X under Immune; Y under both;
    /// Z under Other; D under Y (depth 3); Immune/sub (depth 2) under Immune.
    fn graph() -> TermGraph {
        TermGraph::build(
            vec![
                TermRecord::new("root"),
                TermRecord::new("Immune").with_parents(&["root"]),
                TermRecord::new("Metabolism").with_parents(&["root"]),
                TermRecord::new("Other").with_parents(&["root"]),
                TermRecord::new("sub").with_parents(&["Immune"]),
                TermRecord::new("X").with_parents(&["Immune"]),
                TermRecord::new("Y").with_parents(&["Immune", "Metabolism"]),
                TermRecord::new("Z").with_parents(&["Other"]),
                TermRecord::new("D").with_parents(&["Y"]),
                TermRecord::new("S").with_parents(&["sub", "Metabolism"]),
                TermRecord::new("orphan"),
            ],
            &[],
        )
        .unwrap()
    }

    fn ids(raw: &[&str]) -> Vec<TermId> {
        raw.iter().map(|s| TermId::from(*s)).collect()
    }

    fn plan(graph: &TermGraph, headers: &[&str]) -> HeaderPlan {
        let defaults: BTreeSet<TermId> = ids(headers).into_iter().collect();
        select_headers(graph, &defaults, None).unwrap()
    }

    fn header_names(grouping: &Grouping, plan: &HeaderPlan, term: &str) -> Vec<String> {
        grouping
            .headers_of(term, plan)
            .into_iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn scenario_single_multi_and_unmatched() {
        let g = graph();
        let p = plan(&g, &["Immune", "Metabolism"]);
        let grouping = group_terms(&g, &p, &ids(&["X", "Y", "Z"])).unwrap();

        assert_eq!(header_names(&grouping, &p, "X"), ["Immune"]);
        assert_eq!(header_names(&grouping, &p, "Y"), ["Immune", "Metabolism"]);
        assert!(grouping.is_unassigned("Z"));
        assert_eq!(grouping.unassigned().collect::<Vec<_>>(), [&TermId::from("Z")]);
        assert_eq!(grouping.membership_count(), 4);
    }

    #[test]
    fn deepest_header_wins_over_shallower() {
        let g = graph();
        let p = plan(&g, &["Immune", "sub", "Metabolism"]);
        let grouping = group_terms(&g, &p, &ids(&["S"])).unwrap();
        // sub is depth 2, Metabolism depth 1.
        assert_eq!(header_names(&grouping, &p, "S"), ["sub"]);
    }

    #[test]
    fn ties_reach_through_deeper_descendants() {
        let g = graph();
        let p = plan(&g, &["Immune", "Metabolism"]);
        let grouping = group_terms(&g, &p, &ids(&["D"])).unwrap();
        assert_eq!(header_names(&grouping, &p, "D"), ["Immune", "Metabolism"]);
    }

    #[test]
    fn header_term_maps_to_itself_only() {
        let g = graph();
        let p = plan(&g, &["Immune", "sub"]);
        let grouping = group_terms(&g, &p, &ids(&["sub", "Immune"])).unwrap();
        assert_eq!(header_names(&grouping, &p, "sub"), ["sub"]);
        assert_eq!(header_names(&grouping, &p, "Immune"), ["Immune"]);
    }

    #[test]
    fn ancestorless_term_is_unassigned() {
        let g = graph();
        let p = plan(&g, &["Immune"]);
        let grouping = group_terms(&g, &p, &ids(&["orphan"])).unwrap();
        assert!(grouping.is_unassigned("orphan"));
        assert_eq!(grouping.used_headers().len(), 0);
    }

    #[test]
    fn tie_order_follows_declaration_order() {
        let g = graph();
        let list = SectionList::new(vec![
            Section::new("m", ids(&["Metabolism"])),
            Section::new("i", ids(&["Immune"])),
        ])
        .unwrap();
        let p = select_headers(&g, &BTreeSet::<TermId>::new(), Some(&list)).unwrap();
        let grouping = group_terms(&g, &p, &ids(&["Y"])).unwrap();
        assert_eq!(header_names(&grouping, &p, "Y"), ["Metabolism", "Immune"]);
    }

    #[test]
    fn duplicates_are_collapsed_in_input_order() {
        let g = graph();
        let p = plan(&g, &["Immune"]);
        let grouping = group_terms(&g, &p, &ids(&["Z", "X", "Z", "X"])).unwrap();
        assert_eq!(grouping.terms(), ids(&["Z", "X"]).as_slice());
    }

    #[test]
    fn unknown_input_term_fails() {
        let g = graph();
        let p = plan(&g, &["Immune"]);
        let err = group_terms(&g, &p, &ids(&["X", "ghost"])).unwrap_err();
        assert!(matches!(err, TermGroupError::UnknownTerm { ref term } if term == "ghost"));
    }

    #[test]
    fn used_headers_cover_matches() {
        let g = graph();
        let p = plan(&g, &["Immune", "Metabolism", "Other"]);
        let grouping = group_terms(&g, &p, &ids(&["X", "Z"])).unwrap();
        let used: Vec<&str> = grouping
            .used_headers()
            .into_iter()
            .map(|i| p.headers()[i].id.as_str())
            .collect();
        assert_eq!(used, ["Immune", "Other"]);
    }
}

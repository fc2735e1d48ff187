//! Header selection.
//!
//! Decides which terms anchor sections: either every default (slim) header
//! as its own section, or the caller's named sections of header terms.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, instrument};

use termgroup_graph::{DefaultHeaderSource, GraphQuery};
use termgroup_shared::{CATCH_ALL_SECTION, Result, SectionList, TermGroupError, TermId};

/// How the plan's headers were chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMode {
    /// One section per default header term.
    Default,
    /// Caller-named sections of header terms.
    Explicit,
}

/// A section to be assembled and the header terms feeding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedSection {
    pub name: String,
    pub headers: Vec<TermId>,
}

/// A header term with its position in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub id: TermId,
    /// Index into [`HeaderPlan::planned`]; the catch-all is last.
    pub section: usize,
    pub depth: u32,
}

/// The authoritative, ordered header list used by grouping and assembly.
#[derive(Debug, Clone)]
pub struct HeaderPlan {
    mode: HeaderMode,
    planned: Vec<PlannedSection>,
    headers: Vec<Header>,
    index: HashMap<TermId, usize>,
}

impl HeaderPlan {
    pub fn mode(&self) -> HeaderMode {
        self.mode
    }

    /// Every planned section, catch-all last.
    pub fn planned(&self) -> &[PlannedSection] {
        &self.planned
    }

    /// Planned sections other than the catch-all.
    pub fn named_sections(&self) -> &[PlannedSection] {
        &self.planned[..self.catch_all_index()]
    }

    pub fn catch_all(&self) -> &PlannedSection {
        &self.planned[self.catch_all_index()]
    }

    pub fn catch_all_index(&self) -> usize {
        self.planned.len() - 1
    }

    /// Headers in declaration order.
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    pub fn header(&self, id: &str) -> Option<&Header> {
        self.index.get(id).map(|&i| &self.headers[i])
    }

    /// Declaration index of a header term.
    pub fn header_index(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn is_header(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    fn build<G: GraphQuery + ?Sized>(
        graph: &G,
        mode: HeaderMode,
        planned: Vec<PlannedSection>,
    ) -> Result<Self> {
        let mut headers: Vec<Header> = Vec::new();
        let mut index: HashMap<TermId, usize> = HashMap::new();

        for (section_idx, section) in planned.iter().enumerate() {
            for id in &section.headers {
                if !graph.contains(id.as_str()) {
                    return Err(TermGroupError::configuration(format!(
                        "header term {id} in section {:?} is not in the graph",
                        section.name
                    )));
                }
                if let Some(&prev) = index.get(id) {
                    let prev_header = &headers[prev];
                    return Err(TermGroupError::configuration(format!(
                        "header term {id} is declared in both {:?} and {:?}",
                        planned[prev_header.section].name, section.name
                    )));
                }
                index.insert(id.clone(), headers.len());
                headers.push(Header {
                    id: id.clone(),
                    section: section_idx,
                    depth: graph.depth(id.as_str())?,
                });
            }
        }

        Ok(Self {
            mode,
            planned,
            headers,
            index,
        })
    }
}

/// Choose the header plan.
///
/// Without `explicit`, every default header becomes a one-header section
/// named by its id, ordered by (namespace, depth, id), followed by an empty
/// catch-all. With `explicit`, the caller's names and order are used as-is;
/// a trailing catch-all section is kept with its headers, otherwise an empty
/// one is appended.
#[instrument(skip_all, fields(explicit = explicit.is_some()))]
pub fn select_headers<G, D>(
    graph: &G,
    defaults: &D,
    explicit: Option<&SectionList>,
) -> Result<HeaderPlan>
where
    G: GraphQuery + ?Sized,
    D: DefaultHeaderSource + ?Sized,
{
    let plan = match explicit {
        Some(list) => select_explicit(graph, list)?,
        None => select_default(graph, defaults)?,
    };

    debug!(
        sections = plan.planned.len(),
        headers = plan.headers.len(),
        mode = ?plan.mode,
        "header plan selected"
    );
    Ok(plan)
}

fn select_default<G, D>(graph: &G, defaults: &D) -> Result<HeaderPlan>
where
    G: GraphQuery + ?Sized,
    D: DefaultHeaderSource + ?Sized,
{
    let terms: BTreeSet<TermId> = defaults.default_header_terms();
    if terms.is_empty() {
        return Err(TermGroupError::empty_configuration());
    }

    let mut keyed = Vec::with_capacity(terms.len());
    for id in terms {
        if id.as_str() == CATCH_ALL_SECTION {
            return Err(TermGroupError::configuration(format!(
                "default header term {id} collides with the catch-all section name"
            )));
        }
        if !graph.contains(id.as_str()) {
            return Err(TermGroupError::configuration(format!(
                "default header term {id} is not in the graph"
            )));
        }
        let namespace = graph.namespace(id.as_str()).unwrap_or_default().to_string();
        let depth = graph.depth(id.as_str())?;
        keyed.push((namespace, depth, id));
    }
    keyed.sort();

    let mut planned: Vec<PlannedSection> = keyed
        .into_iter()
        .map(|(_, _, id)| PlannedSection {
            name: id.to_string(),
            headers: vec![id],
        })
        .collect();
    planned.push(PlannedSection {
        name: CATCH_ALL_SECTION.to_string(),
        headers: Vec::new(),
    });

    HeaderPlan::build(graph, HeaderMode::Default, planned)
}

fn select_explicit<G: GraphQuery + ?Sized>(graph: &G, list: &SectionList) -> Result<HeaderPlan> {
    let body = list.without_catch_all();
    if body.is_empty() {
        return Err(TermGroupError::empty_configuration());
    }

    let mut planned: Vec<PlannedSection> = body
        .iter()
        .map(|s| PlannedSection {
            name: s.name.clone(),
            headers: s.members.clone(),
        })
        .collect();

    // Caller catch-all content is authoritative.
    let catch_all_headers = list
        .catch_all()
        .map(|s| s.members.clone())
        .unwrap_or_default();
    planned.push(PlannedSection {
        name: CATCH_ALL_SECTION.to_string(),
        headers: catch_all_headers,
    });

    HeaderPlan::build(graph, HeaderMode::Explicit, planned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use termgroup_graph::{TermGraph, TermRecord};
    use termgroup_shared::{EmptyOrigin, Section};

    fn graph() -> TermGraph {
        TermGraph::build(
            vec![
                TermRecord::new("root").in_namespace("bp"),
                TermRecord::new("Immune").in_namespace("bp").with_parents(&["root"]),
                TermRecord::new("Metabolism").in_namespace("bp").with_parents(&["root"]),
                TermRecord::new("deep").in_namespace("bp").with_parents(&["Immune"]),
                TermRecord::new("cc_root").in_namespace("cc"),
                TermRecord::new("membrane").in_namespace("cc").with_parents(&["cc_root"]),
            ],
            &[],
        )
        .unwrap()
    }

    fn set(raw: &[&str]) -> BTreeSet<TermId> {
        raw.iter().map(|s| TermId::from(*s)).collect()
    }

    #[test]
    fn default_mode_orders_by_namespace_depth_id() {
        let plan = select_headers(&graph(), &set(&["membrane", "deep", "Metabolism", "Immune"]), None)
            .unwrap();
        assert_eq!(plan.mode(), HeaderMode::Default);

        let names: Vec<&str> = plan.planned().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Immune", "Metabolism", "deep", "membrane", CATCH_ALL_SECTION]);
        assert!(plan.catch_all().headers.is_empty());
        assert_eq!(plan.header("deep").unwrap().depth, 2);
        assert_eq!(plan.header_index("membrane"), Some(3));
    }

    #[test]
    fn default_mode_empty_is_empty_sections() {
        let err = select_headers(&graph(), &BTreeSet::<TermId>::new(), None).unwrap_err();
        assert!(matches!(
            err,
            TermGroupError::EmptySections { origin: EmptyOrigin::Configuration }
        ));
    }

    #[test]
    fn default_mode_unknown_term_is_configuration_error() {
        let err = select_headers(&graph(), &set(&["ghost"]), None).unwrap_err();
        assert!(matches!(err, TermGroupError::Configuration { .. }));
    }

    #[test]
    fn default_header_named_like_catch_all_is_configuration_error() {
        let graph = TermGraph::build(
            vec![
                TermRecord::new("root"),
                TermRecord::new(CATCH_ALL_SECTION).with_parents(&["root"]),
            ],
            &[],
        )
        .unwrap();
        let err = select_headers(&graph, &set(&[CATCH_ALL_SECTION]), None).unwrap_err();
        assert!(matches!(err, TermGroupError::Configuration { .. }));
        assert!(err.to_string().contains("catch-all"));
    }

    #[test]
    fn explicit_mode_keeps_caller_names_and_order() {
        let list = SectionList::new(vec![
            Section::new("metabolic things", vec!["Metabolism".into()]),
            Section::new("immune things", vec!["deep".into(), "Immune".into()]),
        ])
        .unwrap();
        let plan = select_headers(&graph(), &set(&["membrane"]), Some(&list)).unwrap();

        assert_eq!(plan.mode(), HeaderMode::Explicit);
        assert_eq!(plan.named_sections().len(), 2);
        assert_eq!(plan.planned()[1].headers, [TermId::from("deep"), TermId::from("Immune")]);
        assert_eq!(plan.catch_all().name, CATCH_ALL_SECTION);
        assert!(plan.catch_all().headers.is_empty());
        assert!(!plan.is_header("membrane"));
        // Declaration order follows the caller's sections.
        let order: Vec<&str> = plan.headers().iter().map(|h| h.id.as_str()).collect();
        assert_eq!(order, ["Metabolism", "deep", "Immune"]);
        assert_eq!(plan.header("Immune").unwrap().section, 1);
    }

    #[test]
    fn explicit_catch_all_content_is_kept() {
        let list = SectionList::new(vec![
            Section::new("immune", vec!["Immune".into()]),
            Section::new(CATCH_ALL_SECTION, vec!["Metabolism".into()]),
        ])
        .unwrap();
        let plan = select_headers(&graph(), &BTreeSet::<TermId>::new(), Some(&list)).unwrap();

        assert_eq!(plan.planned().len(), 2);
        assert_eq!(plan.catch_all().headers, [TermId::from("Metabolism")]);
        assert_eq!(plan.header("Metabolism").unwrap().section, plan.catch_all_index());
    }

    #[test]
    fn explicit_empty_is_empty_sections() {
        let only_catch_all = SectionList::new(vec![Section::empty(CATCH_ALL_SECTION)]).unwrap();
        let err = select_headers(&graph(), &BTreeSet::<TermId>::new(), Some(&only_catch_all)).unwrap_err();
        assert!(matches!(err, TermGroupError::EmptySections { .. }));

        let nothing = SectionList::new(Vec::new()).unwrap();
        let err = select_headers(&graph(), &BTreeSet::<TermId>::new(), Some(&nothing)).unwrap_err();
        assert!(matches!(err, TermGroupError::EmptySections { .. }));
    }

    #[test]
    fn explicit_unknown_header_is_configuration_error() {
        let list = SectionList::new(vec![Section::new("s", vec!["ghost".into()])]).unwrap();
        let err = select_headers(&graph(), &BTreeSet::<TermId>::new(), Some(&list)).unwrap_err();
        assert!(matches!(err, TermGroupError::Configuration { .. }));
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn header_declared_twice_is_configuration_error() {
        let list = SectionList::new(vec![
            Section::new("a", vec!["Immune".into()]),
            Section::new("b", vec!["Immune".into()]),
        ])
        .unwrap();
        let err = select_headers(&graph(), &BTreeSet::<TermId>::new(), Some(&list)).unwrap_err();
        assert!(err.to_string().contains("declared in both"));
    }

    #[test]
    fn label_section_without_headers_is_allowed() {
        let list = SectionList::new(vec![
            Section::new("immune", vec!["Immune".into()]),
            Section::empty("placeholder"),
        ])
        .unwrap();
        let plan = select_headers(&graph(), &BTreeSet::<TermId>::new(), Some(&list)).unwrap();
        assert_eq!(plan.planned().len(), 3);
        assert!(plan.planned()[1].headers.is_empty());
    }
}

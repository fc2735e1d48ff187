//! Section assembly.
//!
//! Turns a [`HeaderPlan`] and a [`Grouping`] into a [`SectionList`] with the
//! catch-all section last.

use std::collections::HashSet;

use tracing::{debug, instrument, warn};

use termgroup_shared::{MemberOrder, Result, Section, SectionList, TermGroupError, TermId};

use crate::grouping::Grouping;
use crate::headers::HeaderPlan;

/// Build the term sections.
///
/// Each planned section lists every input term assigned to one of its
/// headers, once. A term assigned to headers in several sections appears in
/// each. Unassigned terms and terms under catch-all headers go to the
/// catch-all.
#[instrument(skip_all, fields(sections = plan.planned().len(), order = ?order))]
pub fn assemble(plan: &HeaderPlan, grouping: &Grouping, order: MemberOrder) -> Result<SectionList> {
    let catch_all = plan.catch_all_index();
    let mut members: Vec<Vec<TermId>> = vec![Vec::new(); plan.planned().len()];

    for term in grouping.terms() {
        let targets: Vec<usize> = match grouping.header_indices(term.as_str()) {
            Some(indices) if !indices.is_empty() => {
                let mut seen = HashSet::new();
                indices
                    .iter()
                    .map(|&i| plan.headers()[i].section)
                    .filter(|s| seen.insert(*s))
                    .collect()
            }
            _ => vec![catch_all],
        };
        for section in targets {
            members[section].push(term.clone());
        }
    }

    let sections = plan
        .planned()
        .iter()
        .zip(members)
        .map(|(planned, mut terms)| {
            order_members(&mut terms, order);
            Section::new(planned.name.clone(), terms)
        })
        .collect();

    finish(sections, grouping)
}

/// Build the header sections: each section lists its headers that matched
/// at least one input term, in declaration order.
///
/// The result is a valid explicit section list for a later run.
#[instrument(skip_all, fields(sections = plan.planned().len()))]
pub fn assemble_headers(plan: &HeaderPlan, grouping: &Grouping) -> Result<SectionList> {
    let used = grouping.used_headers();
    let mut members: Vec<Vec<TermId>> = vec![Vec::new(); plan.planned().len()];
    for idx in used {
        let header = &plan.headers()[idx];
        members[header.section].push(header.id.clone());
    }

    let sections = plan
        .planned()
        .iter()
        .zip(members)
        .map(|(planned, headers)| Section::new(planned.name.clone(), headers))
        .collect();

    finish(sections, grouping)
}

fn order_members(terms: &mut [TermId], order: MemberOrder) {
    match order {
        MemberOrder::Input => {}
        MemberOrder::Identifier => terms.sort(),
    }
}

fn finish(sections: Vec<Section>, grouping: &Grouping) -> Result<SectionList> {
    if sections.is_empty() {
        return Err(TermGroupError::empty_configuration());
    }

    let list = SectionList::new(sections)?;
    if !list.has_catch_all() {
        return Err(TermGroupError::configuration(
            "assembled sections are missing the catch-all section",
        ));
    }

    let empty = list
        .without_catch_all()
        .iter()
        .filter(|s| s.members.is_empty())
        .count();
    if empty > 0 {
        warn!(empty, "some sections have no members");
    }
    debug!(
        sections = list.len(),
        memberships = list.membership_count(),
        terms = grouping.terms().len(),
        "sections assembled"
    );
    Ok(list)
}

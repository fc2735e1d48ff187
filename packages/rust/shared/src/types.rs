//! Core domain types: term identifiers, sections, and section lists.

use std::borrow::Borrow;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TermGroupError};

/// Reserved name of the catch-all section holding terms matched to no header.
pub const CATCH_ALL_SECTION: &str = "Misc.";

/// Source label used when validating a section list built in memory.
pub const IN_MEMORY_SOURCE: &str = "<in-memory>";

// ---------------------------------------------------------------------------
// TermId
// ---------------------------------------------------------------------------

/// An opaque DAG node identifier (e.g. `GO:0008150`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermId(String);

impl TermId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TermId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TermId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TermId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for TermId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TermId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Section
// ---------------------------------------------------------------------------

/// A named, ordered collection of term identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub members: Vec<TermId>,
}

impl Section {
    pub fn new(name: impl Into<String>, members: Vec<TermId>) -> Self {
        Self {
            name: name.into(),
            members,
        }
    }

    /// An empty section with no members.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    pub fn is_catch_all(&self) -> bool {
        self.name == CATCH_ALL_SECTION
    }
}

// ---------------------------------------------------------------------------
// SectionList
// ---------------------------------------------------------------------------

/// An ordered, validated sequence of sections.
///
/// Guarantees:
/// - section names are non-empty, trimmed, and single-line
/// - member identifiers are non-empty with no whitespace and no `#`
/// - names are unique
/// - the catch-all section ([`CATCH_ALL_SECTION`]), if present, is last
///
/// Caller-written header lists may omit the catch-all; lists produced by the
/// assembler always end with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionList {
    sections: Vec<Section>,
}

impl SectionList {
    /// Validate sections built in memory.
    pub fn new(sections: Vec<Section>) -> Result<Self> {
        Self::from_source(sections, IN_MEMORY_SOURCE)
    }

    /// Validate sections decoded from `source`, naming it in any error.
    pub fn from_source(sections: Vec<Section>, source: &str) -> Result<Self> {
        validate_sections(&sections, source)?;
        Ok(Self { sections })
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Section> {
        self.sections.iter()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn has_catch_all(&self) -> bool {
        self.sections.last().is_some_and(Section::is_catch_all)
    }

    pub fn catch_all(&self) -> Option<&Section> {
        self.sections.last().filter(|s| s.is_catch_all())
    }

    /// The list with its trailing catch-all section (if any) removed.
    pub fn without_catch_all(&self) -> SectionList {
        let mut sections = self.sections.clone();
        if self.has_catch_all() {
            sections.pop();
        }
        SectionList { sections }
    }

    /// Append an empty catch-all unless one is already last.
    pub fn with_catch_all(mut self) -> SectionList {
        if !self.has_catch_all() {
            self.sections.push(Section::empty(CATCH_ALL_SECTION));
        }
        self
    }

    /// Total number of (term, section) memberships.
    pub fn membership_count(&self) -> usize {
        self.sections.iter().map(|s| s.members.len()).sum()
    }
}

impl<'a> IntoIterator for &'a SectionList {
    type Item = &'a Section;
    type IntoIter = std::slice::Iter<'a, Section>;

    fn into_iter(self) -> Self::IntoIter {
        self.sections.iter()
    }
}

/// Check every [`SectionList`] invariant, reporting the first violation.
fn validate_sections(sections: &[Section], source: &str) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(sections.len());
    let last = sections.len().saturating_sub(1);

    for (idx, section) in sections.iter().enumerate() {
        let name = section.name.as_str();
        if name.is_empty() {
            return Err(TermGroupError::malformed(
                source,
                None,
                format!("section {} has an empty name", idx + 1),
            ));
        }
        if name != name.trim() || name.contains(['\n', '\r']) {
            return Err(TermGroupError::malformed(
                source,
                None,
                format!("section name {name:?} must be trimmed and single-line"),
            ));
        }
        if section.is_catch_all() && idx != last {
            return Err(TermGroupError::malformed(
                source,
                None,
                format!(
                    "catch-all section {CATCH_ALL_SECTION:?} found at position {} of {}; it must be last",
                    idx + 1,
                    sections.len()
                ),
            ));
        }
        if !seen.insert(name) {
            return Err(TermGroupError::malformed(
                source,
                None,
                format!("duplicate section name {name:?}"),
            ));
        }
        for member in &section.members {
            validate_member(member.as_str(), name, source)?;
        }
    }

    Ok(())
}

fn validate_member(member: &str, section: &str, source: &str) -> Result<()> {
    if member.is_empty() || member.chars().any(|c| c.is_whitespace() || c == '#') {
        return Err(TermGroupError::malformed(
            source,
            None,
            format!("invalid member identifier {member:?} in section {section:?}"),
        ));
    }
    Ok(())
}

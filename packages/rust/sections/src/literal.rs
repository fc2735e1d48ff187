//! Data-literal section format: ordered `(name, members)` pairs as JSON.
//!
//! ```json
//! {
//!   "doc": "go-basic 2024-06-17",
//!   "generated": "2024-06-20T09:30:00Z",
//!   "sections": [
//!     ["immune", ["GO:0006955", "GO:0002250"]],
//!     ["Misc.", []]
//!   ]
//! }
//! ```
//!
//! `doc` and `generated` are descriptive only and never compared.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use termgroup_shared::{Result, Section, SectionList, TermGroupError, TermId};

/// On-disk shape of a literal sections file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiteralDocument {
    /// Free-form documentation or version string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    /// When the file was written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated: Option<DateTime<Utc>>,
    pub sections: Vec<(String, Vec<TermId>)>,
}

impl LiteralDocument {
    /// Build a document from a validated list.
    pub fn from_list(list: &SectionList, meta: &LiteralMeta) -> Self {
        Self {
            doc: meta.doc.clone(),
            generated: meta.timestamp.then(Utc::now),
            sections: list
                .iter()
                .map(|s| (s.name.clone(), s.members.clone()))
                .collect(),
        }
    }

    /// Validate into a [`SectionList`], naming `source` in any error.
    pub fn into_section_list(self, source: &str) -> Result<SectionList> {
        if self.sections.is_empty() {
            return Err(TermGroupError::empty_source(source));
        }
        let sections = self
            .sections
            .into_iter()
            .map(|(name, members)| Section::new(name, members))
            .collect();
        SectionList::from_source(sections, source)
    }
}

/// Descriptive metadata attached at write time.
#[derive(Debug, Clone, Default)]
pub struct LiteralMeta {
    /// Documentation or version string (e.g. the ontology release).
    pub doc: Option<String>,
    /// Record the write time in `generated`.
    pub timestamp: bool,
}

/// Encode a section list as a pretty-printed JSON literal.
#[instrument(skip_all, fields(sections = list.len()))]
pub fn encode_literal(list: &SectionList, meta: &LiteralMeta) -> Result<String> {
    let list = SectionList::new(list.sections().to_vec())?;
    if list.is_empty() {
        return Err(TermGroupError::empty_configuration());
    }
    let document = LiteralDocument::from_list(&list, meta);
    let mut json = serde_json::to_string_pretty(&document).map_err(|e| {
        TermGroupError::malformed(termgroup_shared::IN_MEMORY_SOURCE, None, e.to_string())
    })?;
    json.push('\n');
    debug!(bytes = json.len(), "encoded literal sections");
    Ok(json)
}

/// Parse a literal document without validating its sections.
pub fn parse_literal(content: &str, source: &str) -> Result<LiteralDocument> {
    if content.trim().is_empty() {
        return Err(TermGroupError::empty_source(source));
    }
    serde_json::from_str(content).map_err(|e| {
        let line = (e.line() > 0).then(|| e.line());
        TermGroupError::malformed(source, line, format!("invalid sections literal: {e}"))
    })
}

/// Decode a literal read from `source`.
#[instrument(skip(content), fields(bytes = content.len()))]
pub fn decode_literal(content: &str, source: &str) -> Result<SectionList> {
    let list = parse_literal(content, source)?.into_section_list(source)?;
    debug!(sections = list.len(), "decoded literal sections");
    Ok(list)
}

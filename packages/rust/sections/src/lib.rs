//! Section list encodings.
//!
//! Two independent encodings of one [`SectionList`] model:
//! - structured text ([`encode_text`] / [`decode_text`])
//! - JSON data literal ([`encode_literal`] / [`decode_literal`])
//!
//! For every valid list `S`, decoding either encoding of `S` yields `S`.
//! File writes go through [`publish`], which never leaves a partial file.

mod builtin;
mod literal;
mod store;
mod text;

use std::fmt;

use tracing::{debug, instrument};

use termgroup_shared::{IN_MEMORY_SOURCE, Result, SectionList, TermGroupError};

pub use builtin::{builtin_names, builtin_sections};
pub use literal::{LiteralDocument, LiteralMeta, decode_literal, encode_literal, parse_literal};
pub use store::{SectionsSource, detect_format, publish, read_sections, write_literal, write_text};
pub use text::{TextOptions, decode_text, encode_text, encode_text_with};

/// First point at which two section lists differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionDiff {
    Length { left: usize, right: usize },
    Name { index: usize, left: String, right: String },
    Members { name: String },
}

impl fmt::Display for SectionDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Length { left, right } => write!(f, "length mismatch: {left} != {right}"),
            Self::Name { index, left, right } => {
                write!(f, "name mismatch at section {}: {left} != {right}", index + 1)
            }
            Self::Members { name } => write!(f, "{name} member mismatch"),
        }
    }
}

/// Order-sensitive comparison of section names and members.
pub fn compare_sections(left: &SectionList, right: &SectionList) -> Option<SectionDiff> {
    if left.len() != right.len() {
        return Some(SectionDiff::Length {
            left: left.len(),
            right: right.len(),
        });
    }
    for (index, (a, b)) in left.iter().zip(right.iter()).enumerate() {
        if a.name != b.name {
            return Some(SectionDiff::Name {
                index,
                left: a.name.clone(),
                right: b.name.clone(),
            });
        }
        if a.members != b.members {
            return Some(SectionDiff::Members {
                name: a.name.clone(),
            });
        }
    }
    None
}

/// Encode `list` both ways, decode both, and require both to equal `list`.
#[instrument(skip_all, fields(sections = list.len()))]
pub fn check_round_trip(list: &SectionList) -> Result<()> {
    let text = encode_text(list, &TextOptions::default())?;
    let literal = encode_literal(list, &LiteralMeta::default())?;

    for (format, decoded) in [
        ("text", decode_text(&text, IN_MEMORY_SOURCE)?),
        ("literal", decode_literal(&literal, IN_MEMORY_SOURCE)?),
    ] {
        if let Some(diff) = compare_sections(list, &decoded) {
            return Err(TermGroupError::malformed(
                IN_MEMORY_SOURCE,
                None,
                format!("{format} round trip changed the sections: {diff}"),
            ));
        }
    }

    debug!("round trip verified");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use termgroup_shared::{CATCH_ALL_SECTION, Section, TermId};

    fn ids(raw: &[&str]) -> Vec<TermId> {
        raw.iter().map(|s| TermId::from(*s)).collect()
    }

    fn scenario() -> SectionList {
        SectionList::new(vec![
            Section::new("Immune", ids(&["X", "Y"])),
            Section::new("Metabolism", ids(&["Y"])),
            Section::new(CATCH_ALL_SECTION, ids(&["Z"])),
        ])
        .unwrap()
    }

    #[test]
    fn both_encodings_decode_to_the_same_list() {
        let list = scenario();
        let a = decode_text(&encode_text(&list, &TextOptions::default()).unwrap(), "t").unwrap();
        let b = decode_literal(&encode_literal(&list, &LiteralMeta::default()).unwrap(), "l")
            .unwrap();
        assert_eq!(a, list);
        assert_eq!(b, list);
        assert!(check_round_trip(&list).is_ok());
    }

    #[test]
    fn text_with_catch_all_matches_literal_without() {
        let list = scenario();
        let text =
            decode_text(&encode_text(&list, &TextOptions::default()).unwrap(), "t").unwrap();
        let bare = list.without_catch_all();
        let literal =
            decode_literal(&encode_literal(&bare, &LiteralMeta::default()).unwrap(), "l").unwrap();

        assert_eq!(text.sections().last().unwrap().name, CATCH_ALL_SECTION);
        assert_eq!(text.without_catch_all(), literal);
        assert!(compare_sections(&text, &literal).is_some());
    }

    #[test]
    fn round_trip_keeps_empty_sections_and_odd_names() {
        let list = SectionList::new(vec![
            Section::empty("[3] bracketed"),
            Section::new("has # hash: and colon", ids(&["GO:1"])),
            Section::empty("SECTION: nested"),
            Section::empty(CATCH_ALL_SECTION),
        ])
        .unwrap();
        check_round_trip(&list).unwrap();
    }

    #[test]
    fn compare_reports_first_difference() {
        let list = scenario();

        let shorter = list.without_catch_all();
        assert_eq!(
            compare_sections(&list, &shorter),
            Some(SectionDiff::Length { left: 3, right: 2 })
        );

        let renamed = SectionList::new(vec![
            Section::new("Immune", ids(&["X", "Y"])),
            Section::new("Metab", ids(&["Y"])),
            Section::new(CATCH_ALL_SECTION, ids(&["Z"])),
        ])
        .unwrap();
        assert!(matches!(
            compare_sections(&list, &renamed),
            Some(SectionDiff::Name { index: 1, .. })
        ));

        let reordered = SectionList::new(vec![
            Section::new("Immune", ids(&["Y", "X"])),
            Section::new("Metabolism", ids(&["Y"])),
            Section::new(CATCH_ALL_SECTION, ids(&["Z"])),
        ])
        .unwrap();
        let diff = compare_sections(&list, &reordered).unwrap();
        assert_eq!(diff.to_string(), "Immune member mismatch");

        assert_eq!(compare_sections(&list, &list), None);
    }
}

//! Structured-text section format.
//!
//! ```text
//! # SECTION[2]: immune
//! GO:0006955   # immune response
//! GO:0002250
//!
//! # SECTION[0]: metabolism
//!
//! # SECTION[1]: Misc.
//! GO:0007155
//! ```
//!
//! - Header: `# SECTION[N]: <name>`; the `[N]` member count is optional
//! - Member: one identifier per line; text after `#` is a comment
//! - Any other `#` line is a comment; blank lines separate sections

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};

use termgroup_shared::{Result, Section, SectionList, TermGroupError, TermId};

/// Matches `# SECTION: name` and `# SECTION[3]: name`.
static SECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#\s*SECTION(?:\[(\d+)\])?:\s*(.*)$").expect("section header regex")
});

/// Options for the text encoder.
#[derive(Debug, Clone, Copy)]
pub struct TextOptions {
    /// Write `[N]` member counts on header lines.
    pub member_counts: bool,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            member_counts: true,
        }
    }
}

/// Encode a section list as structured text.
pub fn encode_text(list: &SectionList, opts: &TextOptions) -> Result<String> {
    encode_text_with(list, opts, |_| None)
}

/// Encode as structured text, appending `# <label>` to members that `label`
/// knows (typically the term name from the graph).
#[instrument(skip_all, fields(sections = list.len()))]
pub fn encode_text_with<F>(list: &SectionList, opts: &TextOptions, label: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    // Re-validate so the writer never emits something the reader rejects.
    let list = SectionList::new(list.sections().to_vec())?;
    if list.is_empty() {
        return Err(TermGroupError::empty_configuration());
    }

    let width = list
        .iter()
        .flat_map(|s| s.members.iter())
        .map(|m| m.as_str().len())
        .max()
        .unwrap_or(0);

    let mut blocks: Vec<String> = Vec::with_capacity(list.len());
    for section in &list {
        let mut block = if opts.member_counts {
            format!("# SECTION[{}]: {}\n", section.members.len(), section.name)
        } else {
            format!("# SECTION: {}\n", section.name)
        };
        for member in &section.members {
            match label(member.as_str()) {
                Some(text) => {
                    let text = text.replace(['\n', '\r'], " ");
                    block.push_str(&format!("{:<width$}   # {}\n", member.as_str(), text.trim()));
                }
                None => {
                    block.push_str(member.as_str());
                    block.push('\n');
                }
            }
        }
        blocks.push(block);
    }

    debug!(bytes = blocks.iter().map(String::len).sum::<usize>(), "encoded text sections");
    Ok(blocks.join("\n"))
}

/// Section under construction, with the line it started on.
struct OpenSection {
    section: Section,
    line: usize,
    declared: Option<usize>,
}

impl OpenSection {
    fn close(self, source: &str) -> Result<Section> {
        if let Some(declared) = self.declared {
            if declared != self.section.members.len() {
                return Err(TermGroupError::malformed(
                    source,
                    Some(self.line),
                    format!(
                        "section {:?} declares {declared} members but lists {}",
                        self.section.name,
                        self.section.members.len()
                    ),
                ));
            }
        }
        Ok(self.section)
    }
}

/// Decode structured text read from `source` (a path or other label).
#[instrument(skip(content), fields(bytes = content.len()))]
pub fn decode_text(content: &str, source: &str) -> Result<SectionList> {
    let mut sections: Vec<Section> = Vec::new();
    let mut current: Option<OpenSection> = None;

    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        // New section header?
        if let Some(caps) = SECTION_RE.captures(trimmed) {
            if let Some(open) = current.take() {
                sections.push(open.close(source)?);
            }
            let name = caps[2].trim();
            if name.is_empty() {
                return Err(TermGroupError::malformed(
                    source,
                    Some(line_no),
                    "section header without a name",
                ));
            }
            let declared = match caps.get(1) {
                Some(m) => Some(m.as_str().parse::<usize>().map_err(|e| {
                    TermGroupError::malformed(source, Some(line_no), format!("bad count: {e}"))
                })?),
                None => None,
            };
            current = Some(OpenSection {
                section: Section::empty(name),
                line: line_no,
                declared,
            });
            continue;
        }

        // Plain comment
        if trimmed.starts_with('#') {
            continue;
        }

        // Member line
        let body = trimmed.split('#').next().unwrap_or_default();
        let mut tokens = body.split_whitespace();
        let (Some(id), None) = (tokens.next(), tokens.next()) else {
            return Err(TermGroupError::malformed(
                source,
                Some(line_no),
                format!("expected one identifier per line, found {body:?}"),
            ));
        };
        match current.as_mut() {
            Some(open) => open.section.members.push(TermId::from(id)),
            None => {
                return Err(TermGroupError::malformed(
                    source,
                    Some(line_no),
                    format!("identifier {id} appears before any SECTION header"),
                ));
            }
        }
    }

    if let Some(open) = current.take() {
        sections.push(open.close(source)?);
    }

    if sections.is_empty() {
        return Err(TermGroupError::empty_source(source));
    }

    debug!(sections = sections.len(), "decoded text sections");
    SectionList::from_source(sections, source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use termgroup_shared::{CATCH_ALL_SECTION, EmptyOrigin};

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
    fn encodes_headers_with_counts() {
        let text = encode_text(&scenario(), &TextOptions::default()).unwrap();
        assert_eq!(
            text,
            "# SECTION[2]: Immune\nX\nY\n\n# SECTION[1]: Metabolism\nY\n\n# SECTION[1]: Misc.\nZ\n"
        );
    }

    #[test]
    fn encodes_without_counts() {
        let opts = TextOptions {
            member_counts: false,
        };
        let text = encode_text(&scenario(), &opts).unwrap();
        assert!(text.starts_with("# SECTION: Immune\n"));
    }

    #[test]
    fn annotated_encoding_decodes_to_same_list() {
        let list = scenario();
        let text = encode_text_with(&list, &TextOptions::default(), |id| {
            (id == "X").then(|| "x # with hash\nand newline".to_string())
        })
        .unwrap();
        assert!(text.contains("X   # x # with hash and newline\n"));
        assert_eq!(decode_text(&text, "mem").unwrap(), list);
    }

    #[test]
    fn scenario_survives_text() {
        let list = scenario();
        let text = encode_text(&list, &TextOptions::default()).unwrap();
        let back = decode_text(&text, "mem").unwrap();
        assert_eq!(back, list);
        assert_eq!(back.names().collect::<Vec<_>>(), ["Immune", "Metabolism", "Misc."]);
    }

    #[test]
    fn keeps_zero_member_sections() {
        let content = "# SECTION: a\n# SECTION[0]: b\n\n# SECTION: c\nGO:1\n";
        let list = decode_text(content, "mem").unwrap();
        assert_eq!(list.len(), 3);
        assert!(list.get("a").unwrap().members.is_empty());
        assert!(list.get("b").unwrap().members.is_empty());
        assert!(!list.has_catch_all());
    }

    #[test]
    fn comments_and_trailing_notes_ignored() {
        let content = "# header comment\n# SECTION: s\n  GO:1   # note\n# another\nGO:2#tight\n";
        let list = decode_text(content, "mem").unwrap();
        assert_eq!(list.sections()[0].members, ids(&["GO:1", "GO:2"]));
    }

    #[test]
    fn count_mismatch_is_malformed() {
        let err = decode_text("# SECTION[2]: s\nGO:1\n", "f.txt").unwrap_err();
        match err {
            TermGroupError::MalformedSections { line, .. } => assert_eq!(line, Some(1)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn member_before_header_is_malformed() {
        let err = decode_text("GO:1\n# SECTION: s\n", "f.txt").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn two_tokens_on_a_line_is_malformed() {
        assert!(decode_text("# SECTION: s\nGO:1 GO:2\n", "f.txt").is_err());
    }

    #[test]
    fn nameless_header_is_malformed() {
        assert!(decode_text("# SECTION:   \n", "f.txt").is_err());
    }

    #[test]
    fn catch_all_not_last_is_malformed() {
        let err = decode_text("# SECTION: Misc.\n# SECTION: a\n", "f.txt").unwrap_err();
        assert!(matches!(err, TermGroupError::MalformedSections { .. }));
    }

    #[test]
    fn duplicate_names_are_malformed() {
        let err = decode_text("# SECTION: a\n# SECTION: a\n", "f.txt").unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn empty_input_carries_source() {
        let err = decode_text("# only comments\n\n", "empty.txt").unwrap_err();
        match err {
            TermGroupError::EmptySections { origin } => {
                assert_eq!(origin, EmptyOrigin::Source("empty.txt".into()));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn leading_byte_order_mark_is_ignored() {
        let list = decode_text("\u{feff}# SECTION[1]: a\nGO:1\n", "bom.txt").unwrap();
        assert_eq!(list.names().collect::<Vec<_>>(), ["a"]);
        assert_eq!(list.sections()[0].members, ids(&["GO:1"]));
    }

    #[test]
    fn empty_list_is_not_encoded() {
        let empty = SectionList::new(Vec::new()).unwrap();
        let err = encode_text(&empty, &TextOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            TermGroupError::EmptySections {
                origin: EmptyOrigin::Configuration
            }
        ));
    }

    #[test]
    fn prose_mentioning_sections_is_a_comment() {
        let content = "# Sections for testing.\n# Each SECTION lists headers.\n# SECTION: a\n";
        let list = decode_text(content, "mem").unwrap();
        assert_eq!(list.len(), 1);
    }
}

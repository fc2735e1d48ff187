//! End-to-end `group` run: terms → header plan → grouping → sections → file.

use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{info, instrument};

use termgroup_graph::{DefaultHeaderSource, GraphQuery, parse_id_list};
use termgroup_sections::{LiteralMeta, TextOptions, detect_format, write_literal, write_text};
use termgroup_shared::{GroupingConfig, OutputFormat, Result, SectionList, TermGroupError, TermId};

use crate::assembler::{assemble, assemble_headers};
use crate::grouping::{Grouping, group_terms};
use crate::headers::{HeaderPlan, select_headers};

/// Which section list a run produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SectionKind {
    /// Input terms grouped under their headers.
    #[default]
    Terms,
    /// The headers that matched at least one input term.
    Headers,
}

/// Result of [`run_grouping`].
#[derive(Debug)]
pub struct GroupRun {
    pub plan: HeaderPlan,
    pub grouping: Grouping,
    pub sections: SectionList,
    pub elapsed: Duration,
}

/// Select headers, group `terms`, and assemble the requested section list.
#[instrument(skip_all, fields(terms = terms.len(), explicit = explicit.is_some(), kind = ?kind))]
pub fn run_grouping<G, D>(
    graph: &G,
    defaults: &D,
    explicit: Option<&SectionList>,
    terms: &[TermId],
    config: &GroupingConfig,
    kind: SectionKind,
) -> Result<GroupRun>
where
    G: GraphQuery + ?Sized,
    D: DefaultHeaderSource + ?Sized,
{
    let start = Instant::now();

    // --- Phase 1: Headers ---
    let plan = select_headers(graph, defaults, explicit)?;

    // --- Phase 2: Grouping ---
    let grouping = group_terms(graph, &plan, terms)?;

    // --- Phase 3: Assembly ---
    let sections = match kind {
        SectionKind::Terms => assemble(&plan, &grouping, config.member_order)?,
        SectionKind::Headers => assemble_headers(&plan, &grouping)?,
    };

    let elapsed = start.elapsed();
    info!(
        sections = sections.len(),
        unassigned = grouping.unassigned().count(),
        elapsed_ms = elapsed.as_millis() as u64,
        "grouping complete"
    );

    Ok(GroupRun {
        plan,
        grouping,
        sections,
        elapsed,
    })
}

/// Read an input term file: one id per line, `#` comments.
pub fn read_terms(path: &Path) -> Result<Vec<TermId>> {
    let content = std::fs::read_to_string(path).map_err(|e| TermGroupError::storage(path, e))?;
    let terms = parse_id_list(&content);
    if terms.is_empty() {
        return Err(TermGroupError::configuration(format!(
            "no term ids found in {}",
            path.display()
        )));
    }
    Ok(terms)
}

/// Output encoding for `path`: an explicit request wins, then the file
/// extension, then the configured default.
pub fn resolve_format(
    path: &Path,
    requested: Option<OutputFormat>,
    config: &GroupingConfig,
) -> OutputFormat {
    if let Some(format) = requested {
        return format;
    }
    match path.extension() {
        Some(_) => detect_format(path),
        None => config.format,
    }
}

/// Write `list` to `path` in `format`.
///
/// Text output carries member counts and term-name comments per `config`;
/// literal output carries `doc` and a generation timestamp.
pub fn write_sections<G: GraphQuery + ?Sized>(
    path: &Path,
    list: &SectionList,
    format: OutputFormat,
    graph: Option<&G>,
    config: &GroupingConfig,
    doc: Option<String>,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            let opts = TextOptions {
                member_counts: config.member_counts,
            };
            let annotate = config.annotate;
            write_text(path, list, &opts, |id| {
                graph
                    .filter(|_| annotate)
                    .and_then(|g| g.name(id))
                    .map(str::to_string)
            })
        }
        OutputFormat::Literal => {
            let meta = LiteralMeta {
                doc,
                timestamp: true,
            };
            write_literal(path, list, &meta)
        }
    }
}

//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use termgroup_core::pipeline::{
    GroupRun, SectionKind, read_terms, resolve_format, run_grouping, write_sections,
};
use termgroup_graph::{SlimHeaders, TermGraph};
use termgroup_sections::{
    SectionsSource, builtin_names, check_round_trip, compare_sections, read_sections,
};
use termgroup_shared::{
    AppConfig, GroupingConfig, MemberOrder, OutputFormat, SectionList, TermId, init_config,
    load_config,
};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// termgroup — group ontology terms under header terms.
#[derive(Parser)]
#[command(
    name = "termgroup",
    version,
    about = "Group ontology term ids under header terms and write section files.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Section member ordering.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum OrderArg {
    Input,
    Identifier,
}

impl From<OrderArg> for MemberOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::Input => MemberOrder::Input,
            OrderArg::Identifier => MemberOrder::Identifier,
        }
    }
}

/// Section file encoding.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum FormatArg {
    Text,
    Literal,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Literal => OutputFormat::Literal,
        }
    }
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Group a term list and write the sections.
    Group {
        /// Term graph file (JSON).
        #[arg(long)]
        graph: PathBuf,

        /// Input term ids, one per line.
        #[arg(long)]
        terms: PathBuf,

        /// Explicit section file (text or .json literal).
        #[arg(long, conflicts_with = "builtin")]
        sections: Option<PathBuf>,

        /// Bundled section set to use as explicit sections.
        #[arg(long)]
        builtin: Option<String>,

        /// Slim id file supplying default headers.
        #[arg(long)]
        slim: Option<PathBuf>,

        /// Member order within sections.
        #[arg(long)]
        order: Option<OrderArg>,

        /// Output encoding (defaults to the output extension, then config).
        #[arg(long)]
        format: Option<FormatArg>,

        /// Relationship types followed as ancestry (repeatable).
        #[arg(long = "follow")]
        follow: Vec<String>,

        /// Write the matched headers instead of the grouped terms.
        #[arg(long)]
        headers_only: bool,

        /// Output file.
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Convert a section file between encodings.
    Convert {
        /// Input section file.
        #[arg(long)]
        input: PathBuf,

        /// Output section file.
        #[arg(short, long)]
        out: PathBuf,

        /// Output encoding (defaults to the output extension, then config).
        #[arg(long)]
        format: Option<FormatArg>,

        /// Term graph used for name comments in text output.
        #[arg(long)]
        graph: Option<PathBuf>,
    },

    /// Compare two section files for identical names and member order.
    Check {
        #[arg(long)]
        a: PathBuf,

        #[arg(long)]
        b: PathBuf,

        /// Drop the catch-all section from both sides before comparing.
        #[arg(long)]
        ignore_catch_all: bool,
    },

    /// List bundled section sets.
    Builtins,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "termgroup=info",
        1 => "termgroup=debug",
        _ => "termgroup=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Group {
            graph,
            terms,
            sections,
            builtin,
            slim,
            order,
            format,
            follow,
            headers_only,
            out,
        } => {
            let source = match (sections, builtin) {
                (Some(path), _) => Some(SectionsSource::Path(path)),
                (None, Some(name)) => Some(SectionsSource::Builtin(name)),
                (None, None) => None,
            };
            let args = GroupArgs {
                graph,
                terms,
                source,
                slim,
                order: order.map(MemberOrder::from),
                format: format.map(OutputFormat::from),
                follow,
                headers_only,
                out,
            };
            cmd_group(&args)
        }
        Command::Convert {
            input,
            out,
            format,
            graph,
        } => cmd_convert(&input, &out, format.map(OutputFormat::from), graph.as_deref()),
        Command::Check {
            a,
            b,
            ignore_catch_all,
        } => cmd_check(&a, &b, ignore_catch_all),
        Command::Builtins => cmd_builtins(),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

struct GroupArgs {
    graph: PathBuf,
    terms: PathBuf,
    source: Option<SectionsSource>,
    slim: Option<PathBuf>,
    order: Option<MemberOrder>,
    format: Option<OutputFormat>,
    follow: Vec<String>,
    headers_only: bool,
    out: PathBuf,
}

/// Resolved configuration with CLI overrides applied.
fn grouping_config(
    order: Option<MemberOrder>,
    follow: &[String],
) -> Result<GroupingConfig> {
    let app = load_config()?;
    let mut config = GroupingConfig::from(&app);
    if let Some(order) = order {
        config.member_order = order;
    }
    if !follow.is_empty() {
        config.follow_relationships = follow.to_vec();
    }
    Ok(config)
}

fn cmd_group(args: &GroupArgs) -> Result<()> {
    let config = grouping_config(args.order, &args.follow)?;

    let graph = TermGraph::load(&args.graph, &config.follow_relationships)?;
    let terms: Vec<TermId> = read_terms(&args.terms)?;
    let explicit: Option<SectionList> = args.source.as_ref().map(read_sections).transpose()?;

    let defaults = match (&args.slim, &explicit) {
        (Some(path), _) => SlimHeaders::load(&graph, path)?,
        (None, Some(_)) => SlimHeaders::default(),
        (None, None) => {
            return Err(eyre!(
                "no headers: pass --slim for default headers, or --sections / --builtin"
            ));
        }
    };
    if explicit.is_some() && args.slim.is_some() {
        warn!("explicit sections given, slim headers are ignored");
    }

    info!(
        graph = %args.graph.display(),
        terms = terms.len(),
        follow = ?config.follow_relationships,
        "grouping terms"
    );

    let kind = if args.headers_only {
        SectionKind::Headers
    } else {
        SectionKind::Terms
    };
    let run: GroupRun = run_grouping(&graph, &defaults, explicit.as_ref(), &terms, &config, kind)?;

    let format = resolve_format(&args.out, args.format, &config);
    let doc = format!(
        "{} input terms grouped under {} headers",
        run.grouping.terms().len(),
        run.plan.headers().len()
    );
    write_sections(&args.out, &run.sections, format, Some(&graph), &config, Some(doc))?;

    println!();
    println!("  Sections written.");
    println!("  Sections:   {}", run.sections.len());
    println!("  Terms:      {}", run.grouping.terms().len());
    println!("  Unassigned: {}", run.grouping.unassigned().count());
    println!("  Path:       {}", args.out.display());
    println!("  Elapsed:    {:.2?}", run.elapsed);
    Ok(())
}

fn cmd_convert(
    input: &Path,
    out: &Path,
    format: Option<OutputFormat>,
    graph: Option<&Path>,
) -> Result<()> {
    let config = grouping_config(None, &[])?;
    let list = read_sections(&SectionsSource::Path(input.to_path_buf()))?;
    check_round_trip(&list)?;

    let graph = graph
        .map(|path| TermGraph::load(path, &config.follow_relationships))
        .transpose()?;
    let format = resolve_format(out, format, &config);
    write_sections(out, &list, format, graph.as_ref(), &config, None)?;

    info!(input = %input.display(), out = %out.display(), ?format, "converted sections");
    println!("Converted {} sections to {}", list.len(), out.display());
    Ok(())
}

fn cmd_check(a: &Path, b: &Path, ignore_catch_all: bool) -> Result<()> {
    let mut left = read_sections(&SectionsSource::Path(a.to_path_buf()))?;
    let mut right = read_sections(&SectionsSource::Path(b.to_path_buf()))?;
    if ignore_catch_all {
        left = left.without_catch_all();
        right = right.without_catch_all();
    }

    match compare_sections(&left, &right) {
        None => {
            println!("Sections match ({} sections)", left.len());
            Ok(())
        }
        Some(diff) => Err(eyre!(
            "{} and {} differ: {diff}",
            a.display(),
            b.display()
        )),
    }
}

fn cmd_builtins() -> Result<()> {
    for name in builtin_names() {
        println!("{name}");
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

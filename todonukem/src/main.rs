//! TODO NUKEM command line.
//!
//! # Commands
//!
//! - `todonukem list`: scan the workspace and list markers by priority
//! - `todonukem decorate <FILE>`: print glyph decorations for a file as JSON
//! - `todonukem links <FILE>`: print ticket links found in a file
//! - `todonukem new`: format a new marker line
//! - `todonukem config`: print the effective configuration
//!
//! # Environment Variables
//!
//! See the [`config`](todonukem::config) module for available options.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use todonukem::aggregator::{list_workspace, MarkerFilter, ScanOptions};
use todonukem::config::{Config, ConfigStore};
use todonukem::decorations::{Decorator, TextIndex};
use todonukem::insertion::{
    comment_prefix, git_user_name, language_for_extension, MarkerLineBuilder,
};
use todonukem::links::ticket_links;
use todonukem::types::MarkerRecord;
use todonukem::vocabulary::{
    Context, DisplayMode, Meta, Priority, TaskType, VocabKey, Vocabulary,
};

/// Filter value that disables a dimension.
const FILTER_ALL: &str = "all";

/// Name recorded when `git config user.name` is unavailable.
const UNKNOWN_USER: &str = "unknown";

/// TODO NUKEM - structured TODO markers.
///
/// Finds, decorates and formats `TODO:` markers carrying priority, type,
/// context and meta blocks.
#[derive(Parser, Debug)]
#[command(name = "todonukem")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
ENVIRONMENT VARIABLES:
    TODONUKEM_CONFIG           Config file (default: <root>/todonukem.json)
    TODONUKEM_DISPLAY_MODE     emoji, text or emoji-text
    TODONUKEM_TICKET_BASE_URL  Base URL for [ticket: ID] links
    RUST_LOG                   Log filter (default: warn)

EXAMPLES:
    # List high priority fixes
    todonukem list --priority high --type fix

    # Format a new marker for a Python file
    todonukem new --lang python --priority low --type feature --context doc \\
        --message 'document the API' --meta ticket=DOC-12
")]
struct Cli {
    /// Workspace root.
    #[arg(short, long, global = true, default_value = ".")]
    root: PathBuf,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Scan the workspace and list markers ordered by priority.
    List {
        /// Priority key, or `all`.
        #[arg(long, default_value = FILTER_ALL)]
        priority: String,

        /// Type key, or `all`.
        #[arg(long = "type", default_value = FILTER_ALL)]
        task_type: String,

        /// Context key, or `all`.
        #[arg(long, default_value = FILTER_ALL)]
        context: String,

        /// Case-insensitive assignee substring.
        #[arg(long)]
        assignee: Option<String>,

        /// Case-insensitive author substring.
        #[arg(long)]
        author: Option<String>,

        /// Additional directory names to skip.
        #[arg(long = "ignore", value_name = "DIR")]
        ignore: Vec<String>,

        /// Replace the scanned file extensions.
        #[arg(long = "ext", value_name = "EXT", value_delimiter = ',')]
        extensions: Vec<String>,

        /// Print records as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the glyph decorations of a file as JSON.
    Decorate {
        file: PathBuf,

        /// Override the configured display mode.
        #[arg(long)]
        mode: Option<DisplayMode>,
    },

    /// Print the ticket links of a file as JSON.
    Links { file: PathBuf },

    /// Format a new marker line.
    New {
        /// Host language id (`rust`, `python`, `html`, ...).
        #[arg(long, conflicts_with = "file")]
        lang: Option<String>,

        /// Derive the language from this file's extension.
        #[arg(long)]
        file: Option<PathBuf>,

        #[arg(long)]
        priority: Priority,

        #[arg(long = "type")]
        task_type: TaskType,

        #[arg(long)]
        context: Context,

        #[arg(long)]
        message: String,

        /// Meta block as `key=value`; repeatable.
        #[arg(long = "meta", value_name = "KEY=VALUE")]
        metas: Vec<String>,

        /// Add `[assignee: <git user.name>]`.
        #[arg(long)]
        self_assignee: bool,

        /// Add `[author: <git user.name>]`.
        #[arg(long)]
        self_author: bool,
    },

    /// Print the effective configuration as JSON.
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::List {
            priority,
            task_type,
            context,
            assignee,
            author,
            ignore,
            extensions,
            json,
        } => {
            let filter = MarkerFilter::all()
                .priority(parse_filter(&priority)?)
                .task_type(parse_filter(&task_type)?)
                .context(parse_filter(&context)?)
                .assignee(assignee.as_deref())
                .author(author.as_deref());

            let mut options = ScanOptions::new(vec![cli.root.clone()]).ignore_dirs(ignore);
            if !extensions.is_empty() {
                options = options.with_extensions(extensions);
            }

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("Failed to create tokio runtime")?;

            runtime.block_on(run_list(&cli.root, options, filter, json))
        }
        Command::Decorate { file, mode } => run_decorate(&cli.root, &file, mode),
        Command::Links { file } => run_links(&cli.root, &file),
        Command::New {
            lang,
            file,
            priority,
            task_type,
            context,
            message,
            metas,
            self_assignee,
            self_author,
        } => {
            let language = match (&lang, &file) {
                (Some(lang), _) => lang.clone(),
                (None, Some(file)) => language_for_extension(
                    &file
                        .extension()
                        .map(|ext| ext.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                )
                .to_string(),
                (None, None) => "plaintext".to_string(),
            };

            let mut builder = MarkerLineBuilder::new(
                comment_prefix(&language),
                priority,
                task_type,
                context,
                &message,
            );

            for raw in &metas {
                let (meta, value) = parse_meta(raw)?;
                builder = builder.meta(meta, value);
            }

            if self_assignee || self_author {
                let user = git_user_name(&cli.root).unwrap_or_else(|| UNKNOWN_USER.to_string());
                if self_assignee {
                    builder = builder.meta(Meta::Assignee, &user);
                }
                if self_author {
                    builder = builder.meta(Meta::Author, &user);
                }
            }

            println!("{}", builder.build());
            Ok(())
        }
        Command::Config => {
            let config = load_config(&cli.root)?;
            println!("{}", serde_json::to_string_pretty(config.as_ref())?);
            Ok(())
        }
    }
}

/// Initializes the logging subsystem. Logs go to stderr so stdout stays
/// machine readable.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(root: &Path) -> Result<Arc<Config>> {
    let mut store = ConfigStore::from_env(root);
    debug!(path = %store.path().display(), "Loading configuration");
    store.get().context("Failed to load configuration")
}

/// Parses a filter value, mapping `all` to `None`.
fn parse_filter<T>(value: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    if value.trim().eq_ignore_ascii_case(FILTER_ALL) {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .with_context(|| format!("Invalid filter value '{value}'"))
}

fn parse_meta(raw: &str) -> Result<(Meta, &str)> {
    let (key, value) = raw.split_once('=').unwrap_or((raw, ""));
    let meta: Meta = key
        .parse()
        .with_context(|| format!("Invalid meta block '{raw}'"))?;
    if meta.takes_value() && value.trim().is_empty() {
        anyhow::bail!("Meta block '{}' needs a value (KEY=VALUE)", meta.slug());
    }
    Ok((meta, value))
}

async fn run_list(
    root: &Path,
    options: ScanOptions,
    filter: MarkerFilter,
    json: bool,
) -> Result<()> {
    let config = load_config(root)?;
    let records = list_workspace(&config, options, &filter)
        .await
        .context("Failed to list workspace markers")?;
    let vocabulary = config.vocabulary();

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No TODOs found.");
        return Ok(());
    }

    for record in &records {
        println!("{}", list_line(record, &vocabulary, config.display_mode));
    }
    Ok(())
}

/// `<glyphs> <message>  (<file>:<line>)` for one record.
fn list_line(record: &MarkerRecord, vocabulary: &Vocabulary, mode: DisplayMode) -> String {
    let keys = [
        record.priority.map(VocabKey::Priority),
        record.task_type.map(VocabKey::Type),
        record.context.map(VocabKey::Context),
    ];

    let mut line = keys
        .into_iter()
        .flatten()
        .map(|key| vocabulary.format_display(key, mode))
        .collect::<Vec<_>>()
        .join(" ");

    if !line.is_empty() {
        line.push(' ');
    }
    if record.raw_text.is_empty() {
        line.push_str(&record.text);
    } else {
        line.push_str(&record.raw_text);
    }
    line.push_str(&format!("  ({})", record.location()));
    line
}

fn read_document(path: &Path) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn run_decorate(root: &Path, file: &Path, mode: Option<DisplayMode>) -> Result<()> {
    let mut config = (*load_config(root)?).clone();
    if let Some(mode) = mode {
        config.display_mode = mode;
    }

    let text = read_document(file)?;
    let positions = TextIndex::new(&text);
    let decorations = Decorator::new(&config).update(&text);

    let output: Vec<_> = decorations
        .iter()
        .filter(|group| !group.instructions.is_empty())
        .map(|group| {
            let ranges: Vec<_> = group
                .instructions
                .iter()
                .map(|instruction| {
                    json!({
                        "rangeStart": instruction.start,
                        "rangeEnd": instruction.end,
                        "start": positions.position(instruction.start),
                        "end": positions.position(instruction.end),
                        "startUtf16": positions.utf16_position(instruction.start),
                        "endUtf16": positions.utf16_position(instruction.end),
                        "glyph": instruction.glyph,
                    })
                })
                .collect();
            json!({
                "vocabularyKey": group.key,
                "display": group.display,
                "ranges": ranges,
            })
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run_links(root: &Path, file: &Path) -> Result<()> {
    let config = load_config(root)?;
    let text = read_document(file)?;
    let positions = TextIndex::new(&text);

    let output: Vec<_> = ticket_links(&text, config.ticket_base_url.as_deref())
        .into_iter()
        .map(|link| {
            json!({
                "ticketId": link.ticket_id,
                "url": link.url,
                "tooltip": link.tooltip(),
                "start": positions.position(link.start),
                "end": positions.position(link.end),
                "startUtf16": positions.utf16_position(link.start),
                "endUtf16": positions.utf16_position(link.end),
            })
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

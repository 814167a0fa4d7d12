//! Arborist CLI
//!
//! Loads a content tree (and optionally an option catalog and flat
//! configuration) from YAML/JSON files and runs one resolution against it.
//!
//! ```text
//! arborist --tree site.yaml --lang es-MX localized 12 heading --recursive
//! arborist --tree site.yaml --repeat 3 --stats setting 12 PageSize
//! ```
//!
//! Results go to stdout, logs to stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use arborist::adapters::{
    InMemoryContentTree, InMemoryOptionCatalog, StaticConfigSource, StaticLocaleSource,
};
use arborist::{ContentResolver, NodeId, ResolverConfig};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Arborist - resolve settings and localized content over a content tree
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Content tree document (.yaml, .yml or .json)
    #[arg(long, env = "ARBORIST_TREE")]
    tree: PathBuf,

    /// Option catalog document
    #[arg(long, env = "ARBORIST_OPTIONS")]
    options: Option<PathBuf>,

    /// Flat key/value configuration (YAML)
    #[arg(long, env = "ARBORIST_CONFIG")]
    config: Option<PathBuf>,

    /// Resolver constants (TTLs, reserved tags, property aliases)
    #[arg(long, env = "ARBORIST_RESOLVER_CONFIG")]
    resolver_config: Option<PathBuf>,

    /// Request language hint (e.g. "es-MX")
    #[arg(long, env = "ARBORIST_LANG")]
    lang: Option<String>,

    /// Languages the site is published in
    #[arg(long, env = "ARBORIST_LANGUAGES", value_delimiter = ',', default_value = "en-US")]
    languages: Vec<String>,

    /// Run the command this many times
    #[arg(long, default_value = "1")]
    repeat: u32,

    /// Print cache statistics as JSON after the command
    #[arg(long)]
    stats: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a setting for a node
    Setting { node: i64, key: String },

    /// Resolve a localized property
    Localized {
        node: i64,
        alias: String,
        #[arg(long)]
        recursive: bool,
    },

    /// Resolve a single option code
    #[command(name = "option")]
    OptionCode { code: String },

    /// Resolve a comma separated option value
    OptionList { raw: String },

    /// Print a node's title
    Title {
        node: i64,
        /// Print the browser title instead
        #[arg(long)]
        browser: bool,
    },

    /// Print the node ids selected by a picker property
    Picked {
        node: i64,
        alias: String,
        #[arg(long)]
        recursive: bool,
    },

    /// Print the display values of a drop-down property
    DropDown {
        node: i64,
        alias: String,
        #[arg(long)]
        recursive: bool,
    },
}

// =============================================================================
// Main
// =============================================================================

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    let resolver = build_resolver(&args)?;
    info!(tree = %args.tree.display(), locale = %resolver.active_locale(), "Content loaded");

    for run in 1..=args.repeat.max(1) {
        let lines = run_command(&resolver, &args.command);
        debug!(run, lines = lines.len(), "Command complete");
        if run == 1 {
            for line in lines {
                println!("{}", line);
            }
        }
    }

    if args.stats {
        let stats = serde_json::to_string_pretty(&resolver.stats())
            .context("Failed to serialize cache statistics")?;
        println!("{}", stats);
    }

    Ok(())
}

fn build_resolver(args: &Args) -> Result<ContentResolver> {
    let tree = InMemoryContentTree::load(&args.tree)
        .with_context(|| format!("Failed to load content tree {}", args.tree.display()))?;

    let mut locale_source = StaticLocaleSource::new(args.languages.iter().map(String::as_str));
    if let Some(lang) = &args.lang {
        locale_source = locale_source.with_hint(lang.clone());
    }

    let mut builder = ContentResolver::builder(Arc::new(tree))
        .with_locale_source(Arc::new(locale_source));

    if let Some(path) = &args.options {
        let catalog = InMemoryOptionCatalog::load(path)
            .with_context(|| format!("Failed to load option catalog {}", path.display()))?;
        builder = builder.with_option_lookup(Arc::new(catalog));
    }

    if let Some(path) = &args.config {
        let source = StaticConfigSource::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?;
        builder = builder.with_config_source(Arc::new(source));
    }

    if let Some(path) = &args.resolver_config {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read resolver config {}", path.display()))?;
        let config = ResolverConfig::from_yaml_str(&text)
            .with_context(|| format!("Invalid resolver config {}", path.display()))?;
        builder = builder.with_config(config);
    }

    Ok(builder.build())
}

fn run_command(resolver: &ContentResolver, command: &Command) -> Vec<String> {
    match command {
        Command::Setting { node, key } => {
            vec![resolver.setting::<String>(NodeId(*node), key)]
        }
        Command::Localized {
            node,
            alias,
            recursive,
        } => vec![resolver.localized::<String>(NodeId(*node), alias, *recursive)],
        Command::OptionCode { code } => vec![resolver.resolve_option(code)],
        Command::OptionList { raw } => resolver.resolve_option_list(raw),
        Command::Title { node, browser } => {
            let node = NodeId(*node);
            if *browser {
                vec![resolver.browser_title(node)]
            } else {
                vec![resolver.title(node)]
            }
        }
        Command::Picked {
            node,
            alias,
            recursive,
        } => resolver
            .picked_node_ids(NodeId(*node), alias, *recursive)
            .into_iter()
            .map(|id| id.to_string())
            .collect(),
        Command::DropDown {
            node,
            alias,
            recursive,
        } => resolver.drop_down_values(NodeId(*node), alias, *recursive),
    }
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

// =============================================================================
// Tests
// =============================================================================

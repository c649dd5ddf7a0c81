mod report;

use clap::Parser;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use veiltext::{Document, Options, RuleSelection, RuleStore, StoreError, clean_verbose_with};

#[derive(Parser)]
#[command(
    name = "veiltext",
    about = "Strip AI-typical surface patterns (smart quotes, dash variants, invisible characters) from text",
    version,
    after_help = "Exit codes:\n  0  Success.\n  1  Catalog or output error.\n  2  Invalid arguments or missing input."
)]
struct Cli {
    /// Text to clean. If omitted, reads --input, --file or stdin.
    text: Vec<String>,

    /// Input text to clean.
    #[arg(short, long, conflicts_with_all = ["text", "file"])]
    input: Option<String>,

    /// Read input from a file.
    #[arg(short, long, conflicts_with = "text")]
    file: Option<PathBuf>,

    /// Treat the input as a JSON document instead of plain text.
    #[arg(long)]
    document: bool,

    /// JSON catalog snapshot to load rules and presets from.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Preset to apply (defaults to the catalog's default preset).
    #[arg(long, conflicts_with = "rules")]
    preset: Option<String>,

    /// Comma-separated rule ids to apply, in order.
    #[arg(long, value_delimiter = ',')]
    rules: Option<Vec<String>>,

    /// Print the rule catalog and presets, then exit.
    #[arg(long)]
    list: bool,

    /// Emit the full result as JSON.
    #[arg(long)]
    json: bool,

    /// Force ANSI color output.
    #[arg(long, conflicts_with = "no_color")]
    color: bool,

    /// Disable ANSI color output.
    #[arg(long)]
    no_color: bool,

    /// Log store and engine activity (info level).
    #[arg(short, long)]
    verbose: bool,

    /// Log every rule application (debug level).
    #[arg(long)]
    debug: bool,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to read {what}: {source}")]
    Read { what: String, source: io::Error },

    #[error("input is not a valid document: {0}")]
    Document(serde_json::Error),

    #[error("failed to render output: {0}")]
    Output(serde_json::Error),

    #[error("no input provided (pass text, --input, --file or pipe stdin)")]
    NoInput,
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            CliError::NoInput | CliError::Document(_) => 2,
            CliError::Store(StoreError::PresetNotFound(_)) => 2,
            _ => 1,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.debug);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let store = match &cli.catalog {
        Some(path) => RuleStore::load(path)?,
        None => RuleStore::new(),
    };

    if cli.list {
        return print_catalog(&store, cli.json);
    }

    let input = read_input(&cli)?;
    let doc = if cli.document {
        serde_json::from_str::<Document>(&input).map_err(CliError::Document)?
    } else {
        Document::from_plain_text(&input)
    };

    let selection = match (cli.rules, cli.preset) {
        (Some(ids), _) => RuleSelection::Rules(ids.into_iter().map(|id| id.trim().to_string()).collect()),
        (None, Some(id)) => RuleSelection::Preset(id),
        (None, None) => RuleSelection::DefaultPreset,
    };
    debug!(?selection, "cleaning input");

    let run = clean_verbose_with(&doc, &store, &Options { selection })?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&run).map_err(CliError::Output)?);
    } else {
        let color = if cli.color {
            true
        } else if cli.no_color {
            false
        } else {
            io::stdout().is_terminal()
        };
        report::print_run(&run, color);
    }
    Ok(())
}

fn read_input(cli: &Cli) -> Result<String, CliError> {
    let input = if let Some(text) = &cli.input {
        text.clone()
    } else if let Some(path) = &cli.file {
        std::fs::read_to_string(path).map_err(|source| CliError::Read { what: path.display().to_string(), source })?
    } else if !cli.text.is_empty() {
        cli.text.join(" ")
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer).map_err(|source| CliError::Read { what: "stdin".into(), source })?;
        buffer
    };

    if input.trim().is_empty() {
        return Err(CliError::NoInput);
    }
    Ok(input)
}

fn print_catalog(store: &RuleStore, json: bool) -> Result<(), CliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(&store.catalog()).map_err(CliError::Output)?);
        return Ok(());
    }

    println!("Rules:");
    for rule in store.list_rules() {
        let state = if rule.enabled { "" } else { "  (disabled)" };
        println!("  {:<10} {:<22} {}{}", rule.id, rule.name, rule.pattern, state);
    }
    println!("\nPresets:");
    for preset in store.list_presets() {
        let marker = if preset.is_default { "*" } else { " " };
        println!("{marker} {:<18} {:<22} {}", preset.id, preset.name, preset.rule_ids.join(", "));
    }
    Ok(())
}

fn init_logging(verbose: bool, debug: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_env("VEILTEXT_LOG").unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).try_init();

    debug!("logging initialized at level: {level}");
}

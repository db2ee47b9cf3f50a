//! CLI command definitions, routing, and tracing setup.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use licensee_core::batch::{BatchProgress, BatchReport, BatchRow, PacingPolicy, run_batch};
use licensee_core::input::{parse_rows_str, read_rows};
use licensee_core::taxonomy::resolve_taxonomy;
use licensee_core::{EnrichmentOutcome, EnrichmentPipeline, PipelineOptions};
use licensee_llm::{OpenAiClient, OpenAiSettings};
use licensee_shared::{
    AppConfig, InputRow, StoreBackend, init_config, init_config_at, load_config, load_config_from,
    resolve_secret,
};
use licensee_storage::{LocalStore, PostgrestStore, RecordStore};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Licensee: enrich brand records and upsert them into the licensing database.
#[derive(Parser)]
#[command(
    name = "licensee",
    version,
    about = "Enrich brand/licensee records with a language model and store them.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.licensee/licensee.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Record store backend: postgrest or local. Overrides the config file.
    #[arg(long, global = true)]
    pub store: Option<StoreBackend>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Enrich a single licensee and upsert it.
    Enrich(EnrichArgs),

    /// Enrich every row of a CSV file, stdin (`-`), or pasted text.
    Batch {
        /// CSV file to read, or `-` for stdin.
        file: Option<String>,

        /// CSV text given inline instead of a file.
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,

        /// Pause after each row sent to the model, in milliseconds. Overrides the config file.
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Write the per-row results to this CSV file.
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags for a single enrichment.
#[derive(Args)]
pub(crate) struct EnrichArgs {
    /// Unique licensee identifier (upsert key).
    #[arg(long)]
    pub uid: String,

    /// Brand website; `https://` is assumed when no scheme is given.
    #[arg(long)]
    pub website: String,

    /// Brand name.
    #[arg(long, default_value = "")]
    pub brand_name: String,

    /// Contact name.
    #[arg(long)]
    pub contact: Option<String>,

    /// Contact email.
    #[arg(long)]
    pub email: Option<String>,

    /// Headquarters location, if known.
    #[arg(long)]
    pub headquarters: Option<String>,

    /// Also write the stored record to this CSV file.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Print the outcome as JSON.
    #[arg(long)]
    pub json: bool,
}

impl EnrichArgs {
    fn input_row(&self) -> InputRow {
        InputRow {
            uid: self.uid.clone(),
            brand_name: self.brand_name.clone(),
            contact: self.contact.clone().unwrap_or_default(),
            email: self.email.clone().unwrap_or_default(),
            website: self.website.clone(),
            headquarters: self.headquarters.clone().unwrap_or_default(),
        }
    }
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
        0 => "licensee=info",
        1 => "licensee=debug",
        _ => "licensee=trace",
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
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(config_path).await,
            ConfigAction::Show => cmd_config_show(config_path).await,
        },
        Command::Enrich(args) => {
            let config = resolve_config(config_path, cli.store)?;
            cmd_enrich(&config, &args).await
        }
        Command::Batch {
            file,
            text,
            delay_ms,
            report,
        } => {
            let mut config = resolve_config(config_path, cli.store)?;
            if let Some(ms) = delay_ms {
                config.batch.delay_ms = ms;
            }
            cmd_batch(&config, file.as_deref(), text.as_deref(), report.as_deref()).await
        }
    }
}

/// Load the config file (or defaults) and apply CLI overrides.
fn resolve_config(path: Option<&Path>, store: Option<StoreBackend>) -> Result<AppConfig> {
    let mut config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    if let Some(backend) = store {
        config.store.backend = backend;
    }
    Ok(config)
}

/// Wire the model client and record store from config.
async fn build_pipeline(config: &AppConfig) -> Result<EnrichmentPipeline> {
    let api_key = resolve_secret(&config.openai.api_key_env)?;
    let model = OpenAiClient::new(OpenAiSettings::from_config(&config.openai, api_key))?;

    let store: Arc<dyn RecordStore> = match config.store.backend {
        StoreBackend::Postgrest => {
            let url = resolve_secret(&config.store.url_env)?;
            let key = resolve_secret(&config.store.api_key_env)?;
            Arc::new(PostgrestStore::new(&url, &key)?)
        }
        StoreBackend::Local => {
            Arc::new(LocalStore::open(Path::new(&config.store.local_path)).await?)
        }
    };

    info!(
        model = %config.openai.model,
        backend = ?config.store.backend,
        table = %config.store.table,
        "pipeline ready"
    );

    Ok(EnrichmentPipeline::new(
        Arc::new(model),
        store,
        PipelineOptions::from(config),
    ))
}

// ---------------------------------------------------------------------------
// enrich
// ---------------------------------------------------------------------------

async fn cmd_enrich(config: &AppConfig, args: &EnrichArgs) -> Result<()> {
    let input = args.input_row().into_input()?;
    let pipeline = build_pipeline(config).await?;
    let taxonomy = resolve_taxonomy(&config.taxonomy.categories);

    let spinner = spinner(format!("Enriching {}", input.website));
    let outcome = pipeline.enrich(input, &taxonomy).await;
    spinner.finish_and_clear();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }

    if !outcome.success {
        return Err(eyre!("enrichment failed: {}", outcome.message));
    }

    if let (Some(path), Some(record)) = (&args.export, &outcome.record) {
        let file = File::create(path).map_err(|e| eyre!("cannot create {}: {e}", path.display()))?;
        record.write_csv(BufWriter::new(file))?;
        println!("  Exported: {}", path.display());
    }

    Ok(())
}

fn print_outcome(outcome: &EnrichmentOutcome) {
    println!();
    if !outcome.success {
        println!("  Error: {}", outcome.message);
        println!();
        return;
    }

    println!("  {}", outcome.message);

    if let Some(record) = &outcome.record {
        println!();
        println!("  Brand:        {}", record.brand_name);
        println!("  Website:      {}", record.website);
        println!("  Headquarters: {}", record.headquarters);
        println!("  Primary:      {}", record.primary_licensing_category);
        println!("  Secondary:    {}", record.secondary_licensing_category);
        println!(
            "  Embeddings:   {}/6",
            record.embeddings.present()
        );
    }

    if let Some(fields) = &outcome.fields {
        println!();
        for (key, value) in fields.iter() {
            println!("  {}: {value}", title_case(key));
        }
    }

    if let Some(summaries) = &outcome.summaries {
        for (name, text) in summaries.iter() {
            println!();
            println!("  {}:", title_case(name));
            println!("    {text}");
        }
    }
    println!();
}

/// `market_fit_summary` → `Market Fit Summary`.
fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// batch
// ---------------------------------------------------------------------------

async fn cmd_batch(
    config: &AppConfig,
    file: Option<&str>,
    text: Option<&str>,
    report_path: Option<&Path>,
) -> Result<()> {
    let rows = match (text, file) {
        (Some(text), _) => parse_rows_str(text)?,
        (None, Some("-")) => read_rows(std::io::stdin().lock())?,
        (None, Some(path)) => {
            let file = File::open(path).map_err(|e| eyre!("cannot open {path}: {e}"))?;
            read_rows(file)?
        }
        (None, None) => return Err(eyre!("no input: pass a CSV file, `-` for stdin, or --text")),
    };

    if rows.is_empty() {
        println!("No rows to process.");
        return Ok(());
    }

    let pipeline = build_pipeline(config).await?;
    let taxonomy = resolve_taxonomy(&config.taxonomy.categories);
    let pacing = PacingPolicy::from(&config.batch);

    info!(rows = rows.len(), delay_ms = config.batch.delay_ms, "starting batch");

    let progress = CliBatchProgress::new();
    let report = run_batch(&pipeline, rows, &taxonomy, pacing, &progress).await;

    print_report(&report);

    if let Some(path) = report_path {
        let file = File::create(path).map_err(|e| eyre!("cannot create {}: {e}", path.display()))?;
        report.write_csv(BufWriter::new(file))?;
        println!("  Report:    {}", path.display());
    }

    Ok(())
}

fn print_report(report: &BatchReport) {
    let uid_width = report
        .rows
        .iter()
        .map(|r| r.uid.len())
        .max()
        .unwrap_or(0)
        .max(3);
    let brand_width = report
        .rows
        .iter()
        .map(|r| r.brand_name.len())
        .max()
        .unwrap_or(0)
        .max(10);

    println!();
    println!("  {:<uid_width$}  {:<brand_width$}  Status", "UID", "Brand Name");
    for row in &report.rows {
        println!(
            "  {:<uid_width$}  {:<brand_width$}  {}",
            row.uid, row.brand_name, row.status
        );
    }
    println!();
    println!("  Succeeded: {}", report.succeeded);
    println!("  Failed:    {}", report.failed);
}

// ---------------------------------------------------------------------------
// CLI progress reporters
// ---------------------------------------------------------------------------

fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Batch progress bar using indicatif.
struct CliBatchProgress {
    bar: ProgressBar,
}

impl CliBatchProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar }
    }
}

impl BatchProgress for CliBatchProgress {
    fn row_started(&self, index: usize, total: usize, brand_name: &str) {
        self.bar.set_length(total as u64);
        self.bar.set_position(index as u64);
        self.bar.set_message(format!(
            "Processing {}/{total}: {brand_name}",
            index + 1
        ));
    }

    fn row_finished(&self, row: &BatchRow) {
        self.bar.inc(1);
        if !row.status.is_success() {
            self.bar
                .println(format!("  {} ({}): {}", row.brand_name, row.uid, row.status));
        }
    }

    fn finished(&self, _report: &BatchReport) {
        self.bar.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

async fn cmd_config_init(path: Option<&Path>) -> Result<()> {
    let path = match path {
        Some(p) => init_config_at(p)?,
        None => init_config()?,
    };
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path, None)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

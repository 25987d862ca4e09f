use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use colored::{ColoredString, Colorize};
use scriptgen_core::{
    generate, parse_report, rank,
    report::{
        render_batch, render_candidates, render_configs, render_presets, render_scripts,
        render_sites, render_stats,
    },
    AppSettings, BatchRun, BatchStatus, Candidate, ConfidenceBand, FileSource, FileStore,
    GenerationSession, Library, OutputFormat, Platform, SavedConfig, ScriptCategory, StdinSource,
    TextSource, Theme,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "scriptgen",
    author,
    version,
    about = "Turn checkout diagnostic reports into ready-to-run DOM scripts"
)]
struct Cli {
    /// Directory holding sites, stats, configs and preferences
    #[arg(long = "store-dir", value_name = "DIR", global = true)]
    store_dir: Option<PathBuf>,

    /// Settings file (TOML, JSON or YAML by extension)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log at debug level regardless of the stored preference
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a diagnostic report and list ranked candidates
    Analyze {
        #[command(flatten)]
        report: ReportArgs,
        /// Emit JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },
    /// Generate the three script variants for a candidate
    Generate {
        #[command(flatten)]
        report: ReportArgs,
        /// Candidate index to use instead of the automatic pick
        #[arg(long, value_name = "N", allow_negative_numbers = true)]
        select: Option<i64>,
        /// Save the result to the library, optionally under NAME
        #[arg(long, value_name = "NAME", num_args = 0..=1, default_missing_value = "")]
        save: Option<String>,
        /// Append the markdown documentation
        #[arg(long)]
        docs: bool,
        #[arg(long)]
        json: bool,
    },
    /// Manage saved target sites
    #[command(subcommand)]
    Sites(SiteCommand),
    /// Show per-category usage statistics
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Inspect saved script configurations
    #[command(subcommand)]
    Configs(ConfigCommand),
    /// Show or change preferences
    Prefs {
        #[arg(long, value_parser = parse_theme, conflicts_with = "toggle_theme")]
        theme: Option<Theme>,
        #[arg(long)]
        toggle_theme: bool,
        #[arg(long, value_name = "BOOL", action = clap::ArgAction::Set)]
        debug_enabled: Option<bool>,
    },
    /// Write a backup of every record as JSON
    Export {
        /// Output file; stdout when omitted
        #[arg(long, short, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Restore records from a backup produced by `export`
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// List recommended selectors for known shop platforms
    Presets {
        platform: Option<Platform>,
        #[arg(long)]
        json: bool,
    },
    /// Generate scripts for every category from one report
    Batch {
        /// Report file; stdin when omitted
        #[arg(long, short, value_name = "FILE")]
        input: Option<PathBuf>,
        /// Delay before each category starts (e.g. 1500ms, 2s)
        #[arg(long, value_parser = humantime::parse_duration)]
        interval: Option<Duration>,
        /// Delay between a category starting and finishing
        #[arg(long, value_parser = humantime::parse_duration)]
        step: Option<Duration>,
        /// Save each category's scripts to the library
        #[arg(long)]
        save: bool,
    },
}

#[derive(Args, Debug)]
struct ReportArgs {
    /// Script category (cart, payment, disable, autofill, total)
    #[arg(long, short)]
    category: ScriptCategory,
    /// Report file; stdin when omitted
    #[arg(long, short, value_name = "FILE")]
    input: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum SiteCommand {
    /// List sites, optionally filtered by name or URL
    List {
        #[arg(long, value_name = "QUERY")]
        search: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Add a site; the first one added becomes active
    Add { name: String, url: String },
    /// Change a site's name or URL
    Edit {
        #[arg(allow_negative_numbers = true)]
        index: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        url: Option<String>,
    },
    Delete {
        #[arg(allow_negative_numbers = true)]
        index: i64,
    },
    /// Make one site the active one
    Activate {
        #[arg(allow_negative_numbers = true)]
        index: i64,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    List {
        #[arg(long)]
        json: bool,
    },
    Show {
        name: String,
        #[arg(long)]
        json: bool,
    },
}

type Store = Library<FileStore>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(&cli)?;
    let library = Library::new(FileStore::new(&settings.store_dir));
    let preferences = library.preferences();
    let debug_enabled = preferences
        .as_ref()
        .map(|prefs| prefs.debug_enabled)
        .unwrap_or(false);
    init_tracing(cli.debug || debug_enabled);
    if let Err(err) = &preferences {
        warn!(error = %err, "could not read preferences; debug logging follows --debug only");
    }
    debug!(store = %settings.store_dir.display(), "settings loaded");

    match cli.command {
        Commands::Analyze { report, json } => analyze(&library, &settings, report, json).await?,
        Commands::Generate {
            report,
            select,
            save,
            docs,
            json,
        } => generate_scripts(&library, &settings, report, select, save, docs, json).await?,
        Commands::Sites(command) => sites(&library, command)?,
        Commands::Stats { json } => print!(
            "{}",
            render_stats(&library.stats()?, output_format(json))?
        ),
        Commands::Configs(command) => configs(&library, command)?,
        Commands::Prefs {
            theme,
            toggle_theme,
            debug_enabled,
        } => prefs(&library, theme, toggle_theme, debug_enabled)?,
        Commands::Export { output } => export(&library, output.as_deref()).await?,
        Commands::Import { file } => import(&library, &file).await?,
        Commands::Presets { platform, json } => {
            let platforms = match platform {
                Some(platform) => vec![platform],
                None => Platform::ALL.to_vec(),
            };
            print!("{}", render_presets(&platforms, output_format(json))?);
        }
        Commands::Batch {
            input,
            interval,
            step,
            save,
        } => {
            let interval = interval.unwrap_or_else(|| settings.batch_interval());
            let step = step.unwrap_or_else(|| settings.batch_step());
            batch(&library, input, interval, step, save).await?
        }
    }
    Ok(())
}

fn load_settings(cli: &Cli) -> Result<AppSettings> {
    let mut builder = config::Config::builder();
    if let Some(path) = &cli.config {
        builder = builder.add_source(config::File::from(path.as_path()));
    }
    let mut settings: AppSettings = builder
        .add_source(config::Environment::with_prefix("SCRIPTGEN").try_parsing(true))
        .build()
        .context("failed to load configuration")?
        .try_deserialize()
        .context("configuration has invalid values")?;
    if let Some(dir) = &cli.store_dir {
        settings.store_dir = dir.clone();
    }
    settings.validate()?;
    Ok(settings)
}

fn output_format(json: bool) -> OutputFormat {
    if json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    }
}

fn text_source(input: Option<PathBuf>) -> Box<dyn TextSource> {
    match input {
        Some(path) => Box::new(FileSource::new(path)),
        None => Box::new(StdinSource),
    }
}

async fn read_report(input: Option<PathBuf>) -> Result<String> {
    let source = text_source(input);
    source
        .read_text()
        .await
        .with_context(|| format!("failed to read report from {}", source.describe()))
}

async fn open_session(
    library: &Store,
    settings: &AppSettings,
    report: ReportArgs,
) -> Result<GenerationSession> {
    let mut session = GenerationSession::open(report.category, library)
        .context("failed to record category usage")?;
    let raw = read_report(report.input).await?;
    session.analyze(&raw, settings.threshold())?;
    Ok(session)
}

async fn analyze(
    library: &Store,
    settings: &AppSettings,
    report: ReportArgs,
    json: bool,
) -> Result<()> {
    let session = open_session(library, settings, report).await?;
    let format = output_format(json);
    print!(
        "{}",
        render_candidates(
            session.category(),
            session.candidates(),
            session.selection(),
            format
        )?
    );
    if format == OutputFormat::Human {
        if let Some(best) = session.selected() {
            println!("\nRecommended: {} {}", best.selector.bold(), badge(best));
        }
    }
    Ok(())
}

async fn generate_scripts(
    library: &Store,
    settings: &AppSettings,
    report: ReportArgs,
    select: Option<i64>,
    save: Option<String>,
    docs: bool,
    json: bool,
) -> Result<()> {
    let mut session = open_session(library, settings, report).await?;
    if let Some(index) = select {
        session.select(index)?;
    }
    let output = session
        .generate()
        .context("pass --select N to choose a candidate")?;
    print!("{}", render_scripts(output, docs, output_format(json))?);

    if let Some(name) = save {
        let name = Some(name.as_str()).filter(|n| !n.is_empty());
        let saved = session
            .save_to_library(library, name, Utc::now())
            .context("failed to save config")?;
        eprintln!("{} {}", "Saved config".green(), saved.name);
    }
    Ok(())
}

fn badge(candidate: &Candidate) -> ColoredString {
    let confidence = candidate.confidence();
    let band = ConfidenceBand::from_confidence(confidence);
    let label = format!("[{confidence}% {}]", band.as_str());
    match band {
        ConfidenceBand::High => label.green().bold(),
        ConfidenceBand::Medium => label.yellow(),
        ConfidenceBand::Low => label.red(),
    }
}

fn sites(library: &Store, command: SiteCommand) -> Result<()> {
    match command {
        SiteCommand::List { search, json } => {
            let sites = library.search_sites(search.as_deref().unwrap_or_default())?;
            print!("{}", render_sites(&sites, output_format(json))?);
        }
        SiteCommand::Add { name, url } => {
            let site = library.add_site(&name, &url, Utc::now())?;
            println!("{} {} ({})", "Added".green(), site.name, site.url);
        }
        SiteCommand::Edit { index, name, url } => {
            let site = library.edit_site(index, name.as_deref(), url.as_deref(), Utc::now())?;
            println!("{} {} ({})", "Updated".green(), site.name, site.url);
        }
        SiteCommand::Delete { index } => {
            let site = library.delete_site(index)?;
            println!("{} {}", "Deleted".yellow(), site.name);
        }
        SiteCommand::Activate { index } => {
            let site = library.set_active_site(index)?;
            println!("{} {}", "Active site:".green(), site.name);
        }
    }
    Ok(())
}

fn configs(library: &Store, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::List { json } => {
            print!("{}", render_configs(&library.configs()?, output_format(json))?)
        }
        ConfigCommand::Show { name, json } => {
            let config = library
                .config(&name)?
                .with_context(|| format!("no saved config named `{name}`"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print!("{}", config.documentation);
            }
        }
    }
    Ok(())
}

fn prefs(
    library: &Store,
    theme: Option<Theme>,
    toggle_theme: bool,
    debug_enabled: Option<bool>,
) -> Result<()> {
    let mut current = library.preferences()?;
    if let Some(theme) = theme {
        current = library.set_theme(theme)?;
    }
    if toggle_theme {
        current = library.toggle_theme()?;
    }
    if let Some(enabled) = debug_enabled {
        current = library.set_debug(enabled)?;
    }
    println!("{}", serde_json::to_string_pretty(&current)?);
    Ok(())
}

fn parse_theme(raw: &str) -> Result<Theme, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "light" => Ok(Theme::Light),
        "dark" => Ok(Theme::Dark),
        other => Err(format!("unknown theme `{other}` (expected light or dark)")),
    }
}

async fn export(library: &Store, output: Option<&Path>) -> Result<()> {
    let snapshot = library.export_snapshot(Utc::now())?;
    let json = serde_json::to_string_pretty(&snapshot)?;
    match output {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "backup written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

async fn import(library: &Store, file: &Path) -> Result<()> {
    let raw = FileSource::new(file).read_text().await?;
    let import = library
        .import_snapshot(&raw)
        .with_context(|| format!("failed to import {}", file.display()))?;
    let restored: Vec<&str> = [
        ("sites", import.sites.is_some()),
        ("stats", import.stats.is_some()),
        ("configs", import.configs.is_some()),
        ("theme", import.theme.is_some()),
    ]
    .into_iter()
    .filter_map(|(name, present)| present.then_some(name))
    .collect();
    println!("{} {}", "Imported".green(), restored.join(", "));
    Ok(())
}

async fn batch(
    library: &Store,
    input: Option<PathBuf>,
    interval: Duration,
    step: Duration,
    save: bool,
) -> Result<()> {
    let raw = read_report(input).await?;
    let ranked = rank(parse_report(&raw));
    let Some(top) = ranked.first() else {
        anyhow::bail!("report contains no candidates");
    };

    let mut run = BatchRun::start();
    let token = run.token();
    let interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    for category in ScriptCategory::ALL {
        if !pause(&token, interval).await {
            break;
        }
        run.advance(category);
        println!("{category:>9}: {}", BatchStatus::Processing);
        if !pause(&token, step).await {
            break;
        }
        if run.advance(category) == BatchStatus::Done {
            let scripts = generate(category, &top.selector, i64::from(top.confidence()));
            if save {
                let now = Utc::now();
                let config = SavedConfig {
                    name: format!("{category}-{}", now.timestamp_millis()),
                    category,
                    selector: top.selector.clone(),
                    score: top.score,
                    documentation: scriptgen_core::documentation(
                        category,
                        &top.selector,
                        top.score,
                        &scripts,
                    ),
                    scripts,
                    created: now,
                };
                library.save_config(config)?;
            }
            println!("{category:>9}: {} ({})", BatchStatus::Done, top.selector);
        }
    }

    if run.is_cancelled() {
        warn!("batch interrupted");
    }
    print!("\n{}", render_batch(&run, OutputFormat::Human)?);
    Ok(())
}

/// Sleep for `delay` unless the run is cancelled first.
async fn pause(token: &CancellationToken, delay: Duration) -> bool {
    tokio::select! {
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

fn init_tracing(debug: bool) {
    let fallback = if debug { "debug,tokio=warn" } else { "info,tokio=warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

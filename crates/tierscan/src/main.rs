use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tierscan_core::config::{Config, CONFIG_FILE};
use tierscan_core::{MetricsCollector, ScanPipeline};
use tierscan_python::PythonCollector;
use tierscan_report::{json, markdown, text, RenderOptions};

#[derive(Parser)]
#[command(name = "tierscan")]
#[command(about = "Rate source files by complexity and recommend which AI model can safely edit them")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    /// Project root to scan
    #[arg(default_value = ".")]
    path: PathBuf,
    /// Report file (defaults to `scan.output` from the config, relative to the project root)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Config file path (defaults to .tierscan.toml in the project root or an ancestor)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Report format
    #[arg(long, value_enum, default_value_t = Format::Markdown)]
    format: Format,
    /// Do not print the terminal summary
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a default .tierscan.toml configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Markdown,
    Json,
}

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Some(Commands::Init { force }) => cmd_init(*force),
        None => cmd_scan(&cli),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(2);
    }
}

fn cmd_scan(cli: &Cli) -> Result<()> {
    if !cli.path.is_dir() {
        anyhow::bail!("'{}' is not a directory", cli.path.display());
    }

    let config = load_config(&cli.path, cli.config.as_deref())?;
    let output = resolve_output(cli, &config);

    let collectors: Vec<Box<dyn MetricsCollector>> = vec![Box::new(PythonCollector::new())];
    let pipeline = ScanPipeline::new(collectors, config).skip_path(output.clone());
    let summary = pipeline.run(&cli.path);

    let body = match cli.format {
        Format::Markdown => markdown::render_with(
            &summary,
            &RenderOptions {
                generated_at: Some(Utc::now()),
            },
        ),
        Format::Json => json::format_report(&summary, false),
    }
    .context("refusing to write an inconsistent report")?;

    write_report(&output, &body)?;
    tracing::info!(path = %output.display(), "report written");

    if !cli.quiet {
        print!("{}", text::format_summary(&summary));
        println!("\nReport generated: {}", output.display());
    }
    Ok(())
}

fn cmd_init(force: bool) -> Result<()> {
    let target = PathBuf::from(CONFIG_FILE);
    if target.exists() && !force {
        anyhow::bail!("{CONFIG_FILE} already exists. Use --force to overwrite.");
    }
    std::fs::write(&target, Config::default_toml())
        .with_context(|| format!("failed to write {CONFIG_FILE}"))?;
    println!("Created {CONFIG_FILE} with default configuration.");
    Ok(())
}

fn load_config(project_path: &Path, config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(p) => Config::load(p),
        None => Config::load_or_default(project_path),
    }
}

fn resolve_output(cli: &Cli, config: &Config) -> PathBuf {
    if let Some(ref output) = cli.output {
        return output.clone();
    }
    let output = cli.path.join(&config.scan.output);
    match cli.format {
        Format::Markdown => output,
        Format::Json => output.with_extension("json"),
    }
}

fn write_report(path: &Path, body: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create report directory '{}'", parent.display()))?;
    }
    std::fs::write(path, body)
        .with_context(|| format!("failed to write report to '{}'", path.display()))
}

//! relnotes - CLI entry point.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use git2::Repository;
use tracing_subscriber::EnvFilter;

use relnotes::claude::{check_api_key, check_claude_installed};
use relnotes::config::get_timeout;
use relnotes::git::{origin_url, resolve_range};
use relnotes::{
    CliExecutor, EscapingMode, GitCommitSource, NotesConfig, NotesPipeline, ReleaseInfo,
    TracingLogger,
};

/// Generate release notes for a commit range using Claude.
#[derive(Parser, Debug)]
#[command(name = "relnotes")]
#[command(about = "Generate shell-safe release notes from git commits using Claude")]
#[command(version)]
struct Cli {
    /// Version of the release being described
    #[arg(long = "set-version")]
    version: String,

    /// Start of commit range (tag, commit hash, or branch)
    #[arg(long)]
    from: Option<String>,

    /// End of commit range (defaults to HEAD)
    #[arg(long, default_value = "HEAD")]
    to: String,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Claude Code CLI executable
    #[arg(long)]
    claude_path: Option<String>,

    /// File containing a custom prompt template
    #[arg(long)]
    template: Option<PathBuf>,

    /// JSON file with additional context for the prompt
    #[arg(long)]
    context: Option<PathBuf>,

    /// Maximum number of commits sent to Claude
    #[arg(long)]
    max_commits: Option<usize>,

    /// Keep any text Claude writes before the release-notes header
    #[arg(long)]
    no_clean: bool,

    /// How to escape the output (shell or none)
    #[arg(long, value_parser = parse_escaping)]
    escaping: Option<EscapingMode>,

    /// Repository URL (defaults to the origin remote)
    #[arg(long)]
    repo_url: Option<String>,
}

fn parse_escaping(value: &str) -> Result<EscapingMode, String> {
    match value {
        "shell" => Ok(EscapingMode::Shell),
        "none" => Ok(EscapingMode::None),
        other => Err(format!("unknown escaping mode '{}' (expected shell or none)", other)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = build_config(&cli)?;

    // Step 1: Check prerequisites
    check_claude_installed(&config.executable_path)
        .await
        .context("Claude Code CLI is required")?;
    check_api_key();

    // Step 2: Open git repository
    let repo = Repository::open(".")
        .context("Not a git repository. Run relnotes from within a git repository.")?;

    // Step 3: Resolve commit range and load commits
    let range = resolve_range(&repo, cli.from.as_deref(), Some(&cli.to))
        .context("Failed to resolve commit range")?;

    eprintln!("Analyzing commits in {}...", range);

    let source = GitCommitSource::load(&repo, &range)
        .context("Failed to fetch commits")?;

    // Step 4: Generate
    let mut release = ReleaseInfo::new(cli.version.as_str());
    release.repository_url = cli.repo_url.clone().or_else(|| origin_url(&repo));

    let executor = CliExecutor::new(config.executable_path.as_str());
    let logger = TracingLogger;
    let pipeline = NotesPipeline::new(&config, &executor, &logger);

    let notes = pipeline
        .generate_with_timeout(&source, &release, get_timeout())
        .await
        .context("Failed to generate release notes")?;

    println!("{}", notes);

    Ok(())
}

/// Log to stderr so stdout carries only the notes. `RUST_LOG` overrides the level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("relnotes=info"));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}

/// Load the config file, if any, and apply CLI overrides.
fn build_config(cli: &Cli) -> Result<NotesConfig> {
    let mut config = match &cli.config {
        Some(path) => NotesConfig::load(path)?,
        None => NotesConfig::default(),
    };

    if let Some(path) = &cli.claude_path {
        config.executable_path = path.clone();
    }
    if let Some(path) = &cli.template {
        config.prompt_template = Some(read_file(path, "prompt template")?);
    }
    if let Some(path) = &cli.context {
        let raw = read_file(path, "additional context")?;
        let value: serde_json::Value = serde_json::from_str(&raw)
            .with_context(|| format!("Additional context in {} is not valid JSON", path.display()))?;
        config.additional_context = Some(value);
    }
    if let Some(max) = cli.max_commits {
        config.max_commits = max;
    }
    if cli.no_clean {
        config.clean_output = false;
    }
    if let Some(mode) = cli.escaping {
        config.escaping = mode;
    }

    Ok(config)
}

fn read_file(path: &Path, what: &str) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} from {}", what, path.display()))
}

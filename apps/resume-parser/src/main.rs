mod batch;
mod config;
mod coordinator;
mod documents;
mod errors;
mod extractors;
mod ledger;
mod llm_client;
mod models;
mod ner;
mod pipeline;

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::batch::{run_batch, BatchReport};
use crate::config::Config;
use crate::ledger::{summarize_output_dir, LogSummary};
use crate::llm_client::LlmClient;
use crate::pipeline::ResumeParser;

#[derive(Parser)]
#[command(name = "resume-parser")]
#[command(about = "Extract name, email and skills from PDF/DOCX resumes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a resume file, or every resume under a folder, and log the results
    Parse {
        /// Resume file or folder (searched recursively)
        input: PathBuf,
        /// Directory for csv/ and json/ logs (defaults to OUTPUT_DIR)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Print status counts from the result ledger
    Summary {
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Verify the model endpoint and API key
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_tracing(&config)?;

    info!("Starting resume-parser v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Parse { input, output_dir } => {
            let output_dir = output_dir.unwrap_or_else(|| config.output_dir.clone());
            let parser = ResumeParser::from_config(&config)
                .context("Failed to initialize resume parser")?;
            let report = run_batch(&parser, &input, &output_dir).await?;
            print_report(&report);
        }
        Commands::Summary { output_dir } => {
            let output_dir = output_dir.unwrap_or_else(|| config.output_dir.clone());
            let summary = summarize_output_dir(&output_dir)?;
            print_summary(&summary);
        }
        Commands::Check => check_backend(&config).await?,
    }

    Ok(())
}

/// stderr layer filtered by `RUST_LOG` or `LOG_LEVEL`, plus an optional
/// plain-text file layer when `LOG_FILE` is set.
fn init_tracing(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "resume_parser={}",
            config.log_level.to_lowercase()
        ))
    });

    let file_layer = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

async fn check_backend(config: &Config) -> Result<()> {
    let client = LlmClient::new(config).context("Failed to initialize model client")?;
    let models = client
        .list_models()
        .await
        .with_context(|| format!("Model endpoint {} is not reachable", config.openai_base_url))?;

    println!("[OK] Connected to {}", config.openai_base_url);
    println!("[OK] {} models available", models.len());
    if models.iter().any(|m| m == &config.openai_model) {
        println!("[OK] Configured model {} is available", config.openai_model);
    } else {
        warn!("Configured model {} not listed by the endpoint", config.openai_model);
        println!("[WARNING] Configured model {} was not listed", config.openai_model);
    }
    Ok(())
}

fn print_report(report: &BatchReport) {
    println!("{}", "=".repeat(70));
    println!("PROCESSED {} RESUME(S)", report.attempts.len());
    println!("{}", "=".repeat(70));
    for attempt in &report.attempts {
        println!("{:<16} {}", attempt.status.as_str(), attempt.filename);
        println!("{:<16} name: {}", "", or_missing(attempt.name_extracted()));
        println!("{:<16} email: {}", "", or_missing(attempt.email_extracted()));
        println!("{:<16} skills: {}", "", attempt.skills_count());
        println!("{:<16} {}", "", attempt.explanation);
        if let Some(errors) = report.field_errors.get(&attempt.filename) {
            for (field, message) in errors {
                println!("{:<16} {} error: {}", "", field, message);
            }
        }
    }
    println!();
    println!("Session log: {}", report.session_file.display());
    print_summary(&report.summary);
}

fn print_summary(summary: &LogSummary) {
    println!("{}", "=".repeat(70));
    println!("SUMMARY");
    println!("{}", "=".repeat(70));
    println!("Total processed:  {}", summary.total);
    println!("Successful:       {}", summary.successful);
    println!("Partial success:  {}", summary.partial_success);
    println!("Failed:           {}", summary.failed);
    println!("CSV ledger:       {}", summary.csv_file.display());
    match &summary.json_file {
        Some(path) => println!("Latest JSON log:  {}", path.display()),
        None => println!("Latest JSON log:  (none)"),
    }
}

fn or_missing(value: &str) -> &str {
    if value.is_empty() {
        "[Not extracted]"
    } else {
        value
    }
}

//! Jobscan command line
//!
//! Runs extraction and autofill against HTML files on disk.

mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use jobscan::collect::collect;
use jobscan::{
    DetectResponse, Dom, DomShadowAccessor, Engine, FillInstruction, HealthSummary, JobField, Pipeline, ScanReport,
    Scanner, SelectorHealth,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "jobscan", about = "Job posting extraction and form autofill", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract job fields; each file is one context, the first is context 0
    Scan {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Page URL used for board detection
        #[arg(long)]
        url: Option<String>,
        /// Board override
        #[arg(long)]
        board: Option<String>,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
        /// Also print how each tried registry entry fared
        #[arg(long)]
        health: bool,
    },
    /// Detect and classify form fields
    Detect {
        file: PathBuf,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        board: Option<String>,
        /// Descend into closed shadow roots
        #[arg(long)]
        open_closed_roots: bool,
        #[arg(long)]
        json: bool,
    },
    /// Apply fill instructions and print the result with its undo entries
    Fill {
        file: PathBuf,
        instructions: PathBuf,
        /// Write the filled document here
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print or validate the active selector registry
    Registry {
        #[arg(long)]
        validate: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,jobscan=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let registry = Arc::new(config.load_registry()?);

    match cli.command {
        Command::Scan {
            files,
            url,
            board,
            json,
            health,
        } => {
            let mut collections = Vec::with_capacity(files.len());
            for (index, file) in files.iter().enumerate() {
                let markup = read(file)?;
                let page_url = url.clone().unwrap_or_else(|| file_url(file));
                collections.push(Some(collect(&markup, &page_url, index as u32)));
            }
            let tracker = Arc::new(SelectorHealth::new());
            let pipeline = Pipeline::new(registry)
                .with_config(config.pipeline_config())
                .with_health(tracker.clone());
            let report = Scanner::new(pipeline)
                .scan(&collections, board.as_deref())
                .await
                .context("scan failed")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            if health {
                let summary = tracker.summary(None);
                if json {
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                } else {
                    print_health(&summary);
                }
            }
        }
        Command::Detect {
            file,
            url,
            board,
            open_closed_roots,
            json,
        } => {
            let mut dom = Dom::parse(&read(&file)?, url.unwrap_or_else(|| file_url(&file)));
            let mut engine = Engine::new(registry).with_detector_config(config.detector_config());
            if open_closed_roots {
                engine = engine.with_accessor(Arc::new(DomShadowAccessor));
            }
            let response = engine.detect(&mut dom, board.as_deref()).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print_fields(&response);
            }
        }
        Command::Fill {
            file,
            instructions,
            out,
        } => {
            let mut dom = Dom::parse(&read(&file)?, file_url(&file));
            let batch: Vec<FillInstruction> = serde_json::from_str(&read(&instructions)?)
                .with_context(|| format!("invalid instructions in {}", instructions.display()))?;
            let engine = Engine::new(registry).with_detector_config(config.detector_config());
            // stable ids only exist once detection has marked the document
            engine.detect(&mut dom, None).await;
            let response = engine.fill(&mut dom, &batch).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
            if let Some(out) = out {
                std::fs::write(&out, dom.to_html()).with_context(|| format!("failed to write {}", out.display()))?;
                eprintln!("{} {}", "wrote".green(), out.display());
            }
        }
        Command::Registry { validate } => {
            if validate {
                registry.validate().context("registry is invalid")?;
                println!("{} {} entries", "valid".green().bold(), registry.len());
            } else {
                println!("{}", registry.to_json()?);
            }
        }
    }

    Ok(())
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

fn print_report(report: &ScanReport) {
    println!("{} {}", "url".bright_cyan(), report.url);
    println!(
        "{} {}",
        "board".bright_cyan(),
        report.board.as_deref().unwrap_or("-")
    );
    println!();
    for field in JobField::ALL {
        let confidence = report.confidence.get(&field).copied().unwrap_or(0.0);
        match (report.field(field), report.sources.get(&field)) {
            (Some(value), Some(source)) => println!(
                "{:<16} {} {}",
                field.as_str().bold(),
                format!("[{} {:.2}]", source.as_str(), confidence).dimmed(),
                truncate(value, 100)
            ),
            _ => println!("{:<16} {}", field.as_str().bold(), "missing".red()),
        }
    }
    println!();
    let status = if report.is_valid { "valid".green() } else { "invalid".red() };
    println!(
        "{} completeness {:.2}, context {} of {}",
        status, report.completeness, report.selected_context_id, report.context_count
    );
    for issue in &report.issues {
        println!("  {} {}", "!".yellow(), issue);
    }
    if report.has_truncated_content {
        println!("  {} page hides part of its content", "!".yellow());
    }
}

fn print_health(summary: &HealthSummary) {
    println!();
    println!(
        "{} {}: {} healthy, {} degraded, {} failed, success rate {:.2}",
        "selectors".bright_cyan(),
        summary.board,
        summary.healthy_count,
        summary.degraded_count,
        summary.failed_count,
        summary.overall_success_rate
    );
    for record in &summary.last_failed {
        println!(
            "  {} {:<28} {} {}/{}",
            "-".red(),
            record.entry_id,
            record.field.as_str().dimmed(),
            record.success_count,
            record.total_attempts
        );
    }
}

fn print_fields(response: &DetectResponse) {
    if let Some(error) = &response.error {
        println!("{} {}", "error".red().bold(), error);
        return;
    }
    for field in &response.fields {
        let flags = [
            (field.is_required, "required"),
            (!field.is_visible, "hidden"),
            (field.is_disabled, "disabled"),
        ]
        .iter()
        .filter(|(on, _)| *on)
        .map(|(_, name)| *name)
        .collect::<Vec<_>>()
        .join(",");
        println!(
            "{:<14} {:<20} {:>5.2} {:<10} {} {}",
            field.stable_id.bright_cyan(),
            field.field_type.as_str(),
            field.confidence,
            field.input_kind.as_str(),
            truncate(&field.label, 50),
            flags.dimmed()
        );
    }
    println!("{} fields", response.fields.len());
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        value.to_string()
    } else {
        let cut: String = value.chars().take(max).collect();
        format!("{cut}...")
    }
}

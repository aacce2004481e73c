mod cli;
mod terminal;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use pdfchat_core::config::{load_dotenv, load_env_file};
use pdfchat_core::Config;
use pdfchat_ingest::Document;
use pdfchat_pipeline::Pipeline;

use crate::cli::{CliArgs, Command};
use crate::terminal::Terminal;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let terminal = Terminal::new();

    match &args.env_file {
        Some(path) => load_env_file(path).context("failed to load environment file")?,
        None => load_dotenv(),
    }

    let mut config = Config::from_env();
    if let Some(dir) = &args.index_dir {
        config.retrieval.index_dir = dir.clone();
    }
    if let Some(top_k) = args.top_k {
        config.retrieval.top_k = top_k;
    }
    config.validate().context("invalid configuration")?;
    config.log_summary();

    let mut pipeline = Pipeline::from_config(&config).context("failed to set up providers")?;

    match args.command {
        Command::Ingest { pdfs } => ingest(&mut pipeline, &terminal, &pdfs).await,
        Command::Ask {
            question,
            show_passages,
        } => ask(&mut pipeline, &terminal, &question, show_passages).await,
        Command::Chat { show_passages } => {
            let top_k = config.retrieval.top_k;
            chat(&mut pipeline, &terminal, top_k, show_passages).await
        }
    }
}

async fn ingest(
    pipeline: &mut Pipeline,
    terminal: &Terminal,
    paths: &[std::path::PathBuf],
) -> Result<()> {
    let docs = paths
        .iter()
        .map(|p| Document::from_path(p))
        .collect::<Result<Vec<_>, _>>()
        .context("failed to read PDF")?;

    let spinner = terminal.start_spinner("Processing PDFs...")?;
    let result = pipeline.ingest(&docs).await;
    spinner.stop();

    let report = result?;
    terminal.print_success(&format!(
        "Done! Indexed {} chunks from {} document(s) into {}",
        report.chunks,
        report.documents,
        report.index_dir.display()
    ))?;
    Ok(())
}

async fn ask(
    pipeline: &mut Pipeline,
    terminal: &Terminal,
    question: &str,
    show_passages: bool,
) -> Result<()> {
    let spinner = terminal.start_spinner("Thinking...")?;
    let result = pipeline.ask(question).await;
    spinner.stop();

    let outcome = result?;
    terminal.print_answer(&outcome.answer)?;
    if show_passages {
        terminal.print_passages(&outcome.passages)?;
    }
    Ok(())
}

async fn chat(
    pipeline: &mut Pipeline,
    terminal: &Terminal,
    top_k: usize,
    show_passages: bool,
) -> Result<()> {
    terminal.print_banner(&pipeline.index_dir().display().to_string(), top_k)?;

    let mut asked = 0usize;
    loop {
        let question = match terminal.read_question()? {
            Some(text) => text,
            None => {
                terminal.print_success("Goodbye.")?;
                break;
            }
        };
        if question.is_empty() {
            continue;
        }

        if let Err(e) = ask(pipeline, terminal, &question, show_passages).await {
            debug!("Question failed: {e:#}");
            terminal.print_error(&format!("{e:#}"))?;
        }
        asked += 1;
    }

    info!("Chat ended after {asked} question(s)");
    Ok(())
}

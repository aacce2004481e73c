use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Chat with your PDFs.
///
/// Ingest documents into a local vector index, then ask questions that are
/// answered from the retrieved passages.
#[derive(Parser, Debug)]
#[command(name = "pdfchat", about = "Chat with your PDFs", version)]
pub struct CliArgs {
    /// Directory holding the vector index (overrides INDEX_DIR)
    #[arg(long, global = true)]
    pub index_dir: Option<PathBuf>,

    /// Number of passages retrieved per question (overrides RETRIEVAL_TOP_K)
    #[arg(long, global = true)]
    pub top_k: Option<usize>,

    /// Environment file to load instead of ./.env
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract, chunk and embed PDFs, replacing the current index
    Ingest {
        /// PDF files to process
        #[arg(required = true)]
        pdfs: Vec<PathBuf>,
    },
    /// Ask a single question
    Ask {
        question: String,

        /// Print the retrieved passages under the answer
        #[arg(long)]
        show_passages: bool,
    },
    /// Ask questions interactively until EOF or 'exit'
    Chat {
        /// Print the retrieved passages under each answer
        #[arg(long)]
        show_passages: bool,
    },
}

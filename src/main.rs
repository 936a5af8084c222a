//! pdfchat CLI entry point

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use pdfchat::{
    commands::{
        cmd_ingest, cmd_status, print_context, print_ingest_stats, print_status, run_chat,
        IngestOptions, Searcher,
    },
    config::Config,
    embed::create_embedder,
    error::Result,
    parse::PdfLoader,
    progress::LogWriterFactory,
    store::QdrantStore,
};
use std::path::PathBuf;
use tokio::io::BufReader;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pdfchat")]
#[command(version, about = "Ask questions about a PDF from the terminal", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive chat (default)
    Chat,

    /// Load, split, embed and store the PDF
    Ingest {
        /// PDF to ingest (defaults to PDF_PATH)
        #[arg(long)]
        pdf: Option<PathBuf>,

        /// Delete the collection before storing
        #[arg(long)]
        reset: bool,
    },

    /// Answer a single question
    Ask {
        /// The question
        question: String,

        /// Print the retrieved chunks before the answer
        #[arg(long)]
        show_context: bool,
    },

    /// Show configuration and collection status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }

    // The stdin reader may still be parked on a blocking read
    std::process::exit(0);
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(LogWriterFactory::default()))
        .with(filter)
        .init();

    let command = cli.command.unwrap_or(Commands::Chat);

    if let Commands::Completions { shell } = command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "pdfchat", &mut std::io::stdout());
        return Ok(());
    }

    let config = Config::resolve(cli.config.as_deref())?;

    match command {
        Commands::Completions { .. } => unreachable!(),

        Commands::Chat => {
            let searcher = Searcher::from_config(&config);
            let input = BufReader::new(tokio::io::stdin());
            let mut out = std::io::stdout();
            run_chat(&searcher, input, &mut out, interrupted()).await?;
        }

        Commands::Ingest { pdf, reset } => {
            handle_ingest(&config, IngestOptions { pdf_path: pdf, reset }).await;
        }

        Commands::Ask {
            question,
            show_context,
        } => {
            let searcher = Searcher::from_config(&config);

            if show_context && !question.is_empty() {
                let results = searcher.retrieve(&question).await?;
                print_context(&results);
            }

            println!("{}", searcher.search_prompt(&question).await);
        }

        Commands::Status { json } => {
            let store = QdrantStore::connect(&config)?;
            let status = cmd_status(&config, &store).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status);
            }
        }
    }

    Ok(())
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Run ingestion; any failure is reported and exits with status 1
async fn handle_ingest(config: &Config, options: IngestOptions) {
    let result = async {
        let loader = PdfLoader::new();
        let embedder = create_embedder(&config.google)?;
        let store = QdrantStore::connect(config)?;
        cmd_ingest(config, &loader, embedder.as_ref(), &store, options).await
    }
    .await;

    match result {
        Ok(stats) => print_ingest_stats(&stats),
        Err(e) => {
            error!("Ingestion failed: {}", e);
            eprintln!("Ocorreu um erro durante a ingestão: {}", e);
            std::process::exit(1);
        }
    }
}

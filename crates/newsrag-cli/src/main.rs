mod commands;

use std::time::Duration;

use clap::{Parser, Subcommand};
use newsrag_core::{AppConfig, Environment};
use newsrag_llm::ChatClient;
use newsrag_rag::{Assembler, DumpDirectory, IndexBuilder, TeiEmbedder};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "newsrag-cli")]
#[command(about = "Grounded company news answers over local article dumps")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build (or reuse) the vector index for a company's freshest dump
    Index {
        #[arg(long)]
        company: String,
    },
    /// Print the chunks nearest to a query
    Search {
        #[arg(long)]
        company: String,

        #[arg(long)]
        query: String,

        /// Number of hits; defaults to NEWSRAG_TOP_K
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Ask for the latest news and outlook, with a sentiment score
    Outlook {
        #[arg(long)]
        company: String,
    },
    /// Ask an arbitrary question about a company
    Ask {
        #[arg(long)]
        company: String,

        #[arg(long)]
        question: String,

        /// Send the question to the model without retrieved context
        #[arg(long, conflicts_with = "grounded")]
        freeform: bool,

        /// Ground the answer in retrieved news even for non-outlook questions
        #[arg(long)]
        grounded: bool,
    },
}

/// Log line format on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// JSON in production, human-readable otherwise.
    fn for_environment(env: &Environment) -> Self {
        match env {
            Environment::Production => Self::Json,
            Environment::Development | Environment::Test => Self::Pretty,
        }
    }
}

fn init_tracing(config: &AppConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match LogFormat::for_environment(&config.env) {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
    Ok(())
}

pub(crate) type Pipeline = Assembler<TeiEmbedder, ChatClient, DumpDirectory>;

fn build_pipeline(config: &AppConfig) -> anyhow::Result<Pipeline> {
    let embedder = TeiEmbedder::new(
        &config.tei_url,
        config.embed_batch_size,
        config.request_timeout_secs,
    )?;
    let builder =
        IndexBuilder::new(embedder, &config.index_dir).with_max_chunk_words(config.max_chunk_words);
    let llm = ChatClient::with_base_url(
        &config.llm_api_key,
        &config.llm_model,
        config.request_timeout_secs,
        &config.llm_base_url,
    )?;
    let dumps = DumpDirectory::new(
        &config.dump_dir,
        Duration::from_secs(config.dump_max_age_hours.saturating_mul(3600)),
    );

    Ok(Assembler::new(builder, llm, dumps).with_top_k(config.top_k))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = newsrag_core::load_app_config()?;

    init_tracing(&config)?;

    tracing::debug!(env = %config.env, ?config, "configuration loaded");
    let pipeline = build_pipeline(&config)?;

    match cli.command {
        Commands::Index { company } => commands::run_index(&pipeline, &company).await,
        Commands::Search {
            company,
            query,
            top_k,
        } => {
            let k = top_k.unwrap_or(config.top_k);
            commands::run_search(&pipeline, &company, &query, k).await
        }
        Commands::Outlook { company } => commands::run_outlook(&pipeline, &company).await,
        Commands::Ask {
            company,
            question,
            freeform,
            grounded,
        } => {
            let intent = commands::choose_intent(&question, freeform, grounded);
            commands::run_ask(&pipeline, &company, &question, intent).await
        }
    }
}

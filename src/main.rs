//! ReplyBuddy - CLI entry point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{IsTerminal, Read};
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;
use tracing::debug;

use replybuddy::{
    bootstrap,
    cli::{output, Args, Commands, SuggestArgs},
    config::{Backend, Config},
    email::{ErrorResponse, SuggestedReplyResponse},
    logging,
    providers::OllamaClient,
    rag::ContextRetriever,
    RagError,
};

/// Exit code when the knowledge base has not been seeded
const EXIT_EMPTY_KNOWLEDGE_BASE: u8 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init_logging(&config.logging, args.verbose, args.json_logs) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run(&args, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            match e.downcast_ref::<RagError>() {
                Some(RagError::EmptyKnowledgeBase) => ExitCode::from(EXIT_EMPTY_KNOWLEDGE_BASE),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

async fn run(args: &Args, config: &Config) -> Result<()> {
    match &args.command {
        Commands::Suggest(suggest) => run_suggest(suggest, config).await,
        Commands::Retrieve { query, top_k } => run_retrieve(query, *top_k, config).await,
        Commands::Check => run_check(config).await,
        Commands::Config => {
            let rendered = toml::to_string_pretty(&config.redacted())
                .context("Failed to serialize config")?;
            println!("{}", rendered);
            Ok(())
        }
    }
}

/// Email text from --file, header flags, or stdin
fn read_email_text(suggest: &SuggestArgs) -> Result<String> {
    if let Some(email) = suggest.email_from_flags() {
        return Ok(email.to_rag_text());
    }

    match suggest.file.as_deref() {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read email from {}", path.display())),
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read email from stdin")?;
            Ok(text)
        }
    }
}

fn spinner(message: &str) -> Option<ProgressBar> {
    if !std::io::stderr().is_terminal() {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

async fn run_suggest(suggest: &SuggestArgs, config: &Config) -> Result<()> {
    let email_text = read_email_text(suggest)?;
    if email_text.trim().is_empty() {
        anyhow::bail!("email text is empty");
    }

    let pipeline = bootstrap::build_pipeline(config)?;

    let pb = spinner("Generating suggested reply...");
    let outcome = pipeline.generate_suggested_reply(&email_text).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    match outcome {
        Ok(result) => {
            if suggest.json {
                let response = SuggestedReplyResponse::from_result(&suggest.email_id, &result);
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                println!("{}", output::render_result(&result));
            }
            Ok(())
        }
        Err(e) => {
            if suggest.json {
                println!("{}", serde_json::to_string_pretty(&ErrorResponse::from(&e))?);
            }
            debug!(status = e.http_status(), "suggest failed");
            Err(e.into())
        }
    }
}

async fn run_retrieve(query: &str, top_k: usize, config: &Config) -> Result<()> {
    let embedder = bootstrap::build_embedder(config)?;
    let index = bootstrap::build_index(config)?;

    let retriever = ContextRetriever::new(embedder, index)
        .with_collection(config.qdrant.collection.clone())
        .with_timeouts(config.rag_config().timeouts);

    let context = retriever.retrieve_context(query, top_k).await?;
    println!("{}", output::render_context(&context));
    Ok(())
}

async fn run_check(config: &Config) -> Result<()> {
    println!("{}", "ReplyBuddy configuration check".bold());
    println!(
        "  Embeddings: {} ({}, {} dims)",
        config.embedding.backend,
        config.embedding_model(),
        config.embedding.dimension
    );
    println!(
        "  Generation: {} ({})",
        config.generation.backend,
        config.generation_model()
    );

    let uses_ollama = config.embedding.backend == Backend::Ollama
        || config.generation.backend == Backend::Ollama;
    if uses_ollama {
        let client = OllamaClient::with_config(
            &config.ollama_url(),
            config.generation_model(),
            config.embedding_model(),
            config.embedding.dimension,
        )?;
        let status = if client.health_check().await {
            "reachable".green()
        } else {
            "unreachable".red()
        };
        println!("  Ollama {}: {}", config.ollama_url(), status);
    }

    let index = bootstrap::build_index(config)?;
    match index.collection_points(&config.qdrant.collection).await {
        Ok(Some(points)) if points > 0 => println!(
            "  Qdrant {}: collection '{}' has {} points",
            index.url(),
            config.qdrant.collection,
            points.to_string().green()
        ),
        Ok(Some(_)) => println!(
            "  Qdrant {}: collection '{}' is {}",
            index.url(),
            config.qdrant.collection,
            "empty".yellow()
        ),
        Ok(None) => println!(
            "  Qdrant {}: collection '{}' {} - run the knowledge base setup first",
            index.url(),
            config.qdrant.collection,
            "not found".red()
        ),
        Err(e) => println!("  Qdrant {}: {} ({})", index.url(), "unreachable".red(), e),
    }

    Ok(())
}

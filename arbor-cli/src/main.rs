//! Arbor CLI - thin adapter around the tree-of-thoughts search core

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use arbor_core::config::{
    ArborConfig, EvaluationMode, GenerationMode, SearchConfig, SelectionMode,
};
use arbor_core::llm::{LLMProvider, ProviderFactory};
use arbor_core::llm::providers::OpenAIProvider;
use arbor_core::search::BfsSearch;

#[derive(Parser)]
#[command(name = "arbor")]
#[command(about = "Tree-of-thoughts search over a language-model backend", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a search over a problem and print the result as JSON
    Solve {
        /// The problem to reason about
        problem: String,

        /// Configuration file (defaults to arbor.toml / environment)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Reasoning depth (number of search rounds)
        #[arg(long)]
        steps: Option<usize>,

        /// Candidates generated per frontier state per round
        #[arg(long)]
        branching_factor: Option<usize>,

        /// Repeated scoring/voting calls per evaluation
        #[arg(long)]
        n_evaluate_sample: Option<usize>,

        /// Frontier size retained each round
        #[arg(long)]
        n_select_sample: Option<usize>,

        /// Generation mode: independent | batch
        #[arg(long)]
        generation_mode: Option<String>,

        /// Evaluation mode: direct | voting
        #[arg(long)]
        evaluation_mode: Option<String>,

        /// Selection mode: greedy | weighted
        #[arg(long)]
        selection_mode: Option<String>,

        /// Sampling temperature
        #[arg(long)]
        temperature: Option<f32>,

        /// Stop sequence for completions (repeatable)
        #[arg(long = "stop")]
        stop_sequences: Vec<String>,

        /// Seed for weighted selection
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Version => {
            println!("arbor {}", env!("CARGO_PKG_VERSION"));
            println!("arbor-core {}", arbor_core::VERSION);
        }
        Commands::Solve {
            problem,
            config,
            steps,
            branching_factor,
            n_evaluate_sample,
            n_select_sample,
            generation_mode,
            evaluation_mode,
            selection_mode,
            temperature,
            stop_sequences,
            seed,
        } => {
            let base = match config {
                Some(path) => ArborConfig::from_file(path)?,
                None => ArborConfig::load()?,
            };

            let search_config = apply_overrides(
                base.search.clone(),
                steps,
                branching_factor,
                n_evaluate_sample,
                n_select_sample,
                generation_mode,
                evaluation_mode,
                selection_mode,
                temperature,
                stop_sequences,
                seed,
            )?;

            let provider: Arc<dyn LLMProvider> = match &base.llm {
                Some(llm) => ProviderFactory::create(llm)?,
                None => Arc::new(
                    OpenAIProvider::from_env(None::<String>)
                        .context("no [llm] config; falling back to OPENAI_API_KEY failed")?,
                ),
            };

            // Ctrl-C stops issuing model calls and returns the best
            // frontier found so far.
            let cancel = CancellationToken::new();
            let handle = cancel.clone();
            tokio::spawn(async move {
                let _ = tokio::signal::ctrl_c().await;
                tracing::warn!("interrupt received, finishing with current frontier");
                handle.cancel();
            });

            let search = BfsSearch::builder()
                .provider(provider)
                .config(search_config)
                .build()?;

            let outcome = search.run_with_cancellation(&problem, cancel).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn apply_overrides(
    mut config: SearchConfig,
    steps: Option<usize>,
    branching_factor: Option<usize>,
    n_evaluate_sample: Option<usize>,
    n_select_sample: Option<usize>,
    generation_mode: Option<String>,
    evaluation_mode: Option<String>,
    selection_mode: Option<String>,
    temperature: Option<f32>,
    stop_sequences: Vec<String>,
    seed: Option<u64>,
) -> Result<SearchConfig> {
    if let Some(steps) = steps {
        config.steps = steps;
    }
    if let Some(branching_factor) = branching_factor {
        config.branching_factor = branching_factor;
    }
    if let Some(n) = n_evaluate_sample {
        config.n_evaluate_sample = n;
    }
    if let Some(n) = n_select_sample {
        config.n_select_sample = n;
    }
    if let Some(mode) = generation_mode {
        config.generation_mode = match mode.as_str() {
            "independent" => GenerationMode::Independent,
            "batch" => GenerationMode::Batch,
            other => bail!("unknown generation mode: {other}"),
        };
    }
    if let Some(mode) = evaluation_mode {
        config.evaluation_mode = match mode.as_str() {
            "direct" => EvaluationMode::Direct,
            "voting" => EvaluationMode::Voting,
            other => bail!("unknown evaluation mode: {other}"),
        };
    }
    if let Some(mode) = selection_mode {
        config.selection_mode = match mode.as_str() {
            "greedy" => SelectionMode::Greedy,
            "weighted" => SelectionMode::Weighted,
            other => bail!("unknown selection mode: {other}"),
        };
    }
    if let Some(temperature) = temperature {
        config.temperature = temperature;
    }
    if !stop_sequences.is_empty() {
        config.stop_sequences = stop_sequences;
    }
    if let Some(seed) = seed {
        config.seed = Some(seed);
    }

    Ok(config)
}

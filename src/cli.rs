//! Command-line interface.
//!
//! `guata ask`, `guata chat`, `guata search`, `guata sources`,
//! `guata config` and `guata serve`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::chat::GuataService;
use crate::config::loader::load_config;
use crate::config::schema::GuataConfig;
use crate::error::GuataError;
use crate::mcp;
use crate::search::registry::TrustedSourceRegistry;
use crate::search::DynamicWebSearch;
use crate::types::{AskRequest, ChatMode, SearchAnalysis};

pub type CliResult = std::result::Result<(), Box<dyn std::error::Error>>;

const EXIT_WORDS: &[&str] = &["sair", "exit", "quit", "tchau"];
const REDACTED: &str = "***";

#[derive(Parser, Debug)]
#[command(
    name = "guata",
    version,
    about = "Guatá, tourism guide for Mato Grosso do Sul"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(
        long,
        global = true,
        help = "Config file (defaults to .guata.yaml, then the user config dir)"
    )]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask a single question.
    Ask {
        prompt: String,
        #[arg(long, value_enum, default_value_t = ModeArg::Tourist)]
        mode: ModeArg,
        /// Earlier turns, oldest first. Repeatable.
        #[arg(long = "history")]
        history: Vec<String>,
    },
    /// Interactive conversation that keeps its history.
    Chat {
        #[arg(long, value_enum, default_value_t = ModeArg::Tourist)]
        mode: ModeArg,
    },
    /// Run the multi-source search and show the analysis.
    Search {
        query: String,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// List the trusted source table.
    Sources,
    /// Print the effective configuration with secrets masked.
    Config,
    /// Serve MCP over stdio, or HTTP (MCP + REST) with `--http`.
    Serve {
        #[arg(long, value_name = "ADDR")]
        http: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Tourist,
    Cat,
}

impl From<ModeArg> for ChatMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Tourist => ChatMode::Tourist,
            ModeArg::Cat => ChatMode::Cat,
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub async fn run(cli: Cli) -> CliResult {
    let project_root = std::env::current_dir().ok();
    let config = load_config(cli.config.as_deref(), project_root.as_deref())?;

    match cli.command {
        Commands::Ask {
            prompt,
            mode,
            history,
        } => {
            let service = GuataService::from_config(&config)?;
            let request = AskRequest::new(prompt)
                .with_history(history)
                .with_mode(mode.into());
            let answer = with_spinner("Pensando...", service.ask(&request)).await;
            if cli.json {
                println!("{}", serde_json::json!({ "answer": answer }));
            } else {
                println!("{answer}");
            }
        }
        Commands::Chat { mode } => chat(&config, mode.into()).await?,
        Commands::Search { query, limit } => {
            let engine = DynamicWebSearch::from_config(&config)?;
            let analysis = with_spinner("Buscando...", engine.search(&query)).await;
            if cli.json {
                let mut trimmed = analysis.as_ref().clone();
                trimmed.results.truncate(limit);
                println!("{}", serde_json::to_string_pretty(&trimmed)?);
            } else {
                print_analysis(&analysis, limit);
            }
        }
        Commands::Sources => {
            let registry = TrustedSourceRegistry::load(config.trusted_sources_path.as_deref())?;
            let sorted = registry.sorted();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&sorted)?);
            } else {
                for s in sorted {
                    println!(
                        "{:>2}  {:<9} {:<32} {}",
                        s.priority,
                        s.category.as_str(),
                        style(&s.domain).cyan(),
                        s.name
                    );
                }
            }
        }
        Commands::Config => {
            let masked = redacted_config(&config);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&masked)?);
            } else {
                print!("{}", serde_yaml::to_string(&masked)?);
            }
        }
        Commands::Serve { http } => match http {
            Some(addr) => mcp::http::run_http_server(config, &addr).await?,
            None => mcp::server::run_server(config).await?,
        },
    }
    Ok(())
}

async fn with_spinner<F: std::future::Future>(message: &'static str, fut: F) -> F::Output {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(80));
    let out = fut.await;
    spinner.finish_and_clear();
    out
}

// ---------------------------------------------------------------------------
// Chat loop
// ---------------------------------------------------------------------------

async fn chat(config: &GuataConfig, mode: ChatMode) -> CliResult {
    let service = Arc::new(GuataService::from_config(config)?);
    let mut history: Vec<String> = Vec::new();

    println!(
        "{} Pergunte sobre Mato Grosso do Sul. Digite {} para encerrar.",
        style("Guatá").green().bold(),
        style("sair").yellow()
    );

    loop {
        let line = tokio::task::spawn_blocking(|| {
            dialoguer::Input::<String>::new()
                .with_prompt("Você")
                .allow_empty(true)
                .interact_text()
        })
        .await
        .map_err(|e| GuataError::Other(e.to_string()))?
        .map_err(|e| GuataError::Other(e.to_string()))?;

        let prompt = line.trim();
        if prompt.is_empty() {
            continue;
        }
        if is_exit(prompt) {
            break;
        }

        let request = AskRequest::new(prompt)
            .with_history(history.clone())
            .with_mode(mode);
        let answer = with_spinner("Pensando...", service.ask(&request)).await;
        println!("{} {}\n", style("Guatá:").green().bold(), answer);
        history.push(prompt.to_string());
    }
    Ok(())
}

fn is_exit(line: &str) -> bool {
    let lower = line.trim().to_lowercase();
    EXIT_WORDS.contains(&lower.as_str())
}

// ---------------------------------------------------------------------------
// Output helpers
// ---------------------------------------------------------------------------

fn print_analysis(analysis: &SearchAnalysis, limit: usize) {
    println!("{}", style(&analysis.best_answer).bold());
    println!(
        "\n{} {:.0}%   {} {}",
        style("confiança:").dim(),
        analysis.confidence,
        style("fontes:").dim(),
        analysis.sources.join(", ")
    );
    if !analysis.unavailable_sources.is_empty() {
        println!(
            "{} {}",
            style("indisponíveis:").yellow(),
            analysis.unavailable_sources.join(", ")
        );
    }
    println!();
    for r in analysis.results.iter().take(limit) {
        println!(
            "  {:>5.1}  {:<28} {}",
            r.confidence,
            style(&r.source).cyan(),
            r.title
        );
    }
    println!("\n{}", analysis.analysis);
}

/// Copy of `config` with every credential replaced by a mask.
pub fn redacted_config(config: &GuataConfig) -> GuataConfig {
    let mask = |v: &Option<String>| v.as_ref().map(|_| REDACTED.to_string());
    let mut masked = config.clone();
    masked.edge.anon_key = mask(&config.edge.anon_key);
    masked.google.api_key = mask(&config.google.api_key);
    masked.google.engine_id = mask(&config.google.engine_id);
    masked
}

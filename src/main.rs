//! Deskwise CLI — serve the gateway or ask one-shot questions.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use deskwise_core::DeskwiseConfig;
use deskwise_core::types::Role;
use deskwise_engine::{AnswerEngine, AskRequest};

#[derive(Parser)]
#[command(name = "deskwise", version, about = "Internal assistant engine")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP gateway (default).
    Serve,
    /// Answer one question on stdout and exit.
    Ask {
        /// The question, in natural language.
        question: String,
        /// Caller role: admin or enterprise.
        #[arg(long, default_value = "enterprise")]
        role: String,
    },
    /// Load the knowledge source and print entry counts.
    Knowledge,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = DeskwiseConfig::load()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            deskwise_gateway::start(&config).await?;
        }
        Command::Ask { question, role } => {
            let role: Role = role.parse()?;
            let engine = AnswerEngine::from_config(&config);
            let answer = engine
                .answer(AskRequest {
                    question,
                    role,
                    scope_id: None,
                    session_id: None,
                })
                .await?;
            println!("{}", answer.answer);
            tracing::info!(
                "approach={} confidence={:.2} time={}ms",
                answer.approach,
                answer.confidence,
                answer.response_time_ms
            );
        }
        Command::Knowledge => {
            let engine = AnswerEngine::from_config(&config);
            let store = engine.knowledge();
            println!("entries: {}", store.len());
            for (category, count) in store.category_counts() {
                println!("  {category}: {count}");
            }
            println!("service mode: {}", engine.service_mode());
        }
    }

    Ok(())
}

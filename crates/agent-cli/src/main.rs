//! llm-orchestrator CLI
//!
//! Runs a single ReAct agent loop (or a plain chat completion) against a
//! chosen provider and prints the answer on stdout. Logs go to stderr.

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{AgentBuilder, CancellationToken, Message, ModelResponse, ProviderKind, RunAborted};
use agent_runtime::{create_provider, Settings};

#[derive(Parser)]
#[command(name = "llm-orchestrator")]
#[command(about = "Run tool-using LLM agents against OpenAI, Cohere or a local Ollama model", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ProviderArgs {
    /// Provider: openai, cohere, ollama (alias: local)
    #[arg(short, long, default_value = "openai")]
    provider: ProviderKind,
    
    /// Model identifier; defaults to the provider's default model
    #[arg(short, long)]
    model: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a query with the reasoning loop and the search / Python tools
    Run {
        #[command(flatten)]
        provider: ProviderArgs,
        
        /// Print the full transcript after the answer
        #[arg(long)]
        show_transcript: bool,
        
        query: String,
    },
    /// Single model call without tools
    Chat {
        #[command(flatten)]
        provider: ProviderArgs,
        
        input: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    
    let cli = Cli::parse();
    
    match execute(cli.command).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn execute(command: Commands) -> anyhow::Result<ExitCode> {
    let settings = Settings::from_env().context("Invalid configuration")?;
    
    match command {
        Commands::Run { provider, show_transcript, query } => {
            let settings = settings.with_provider(provider.provider, provider.model);
            settings.validate()?;
            run(&settings, &query, show_transcript).await
        }
        Commands::Chat { provider, input } => {
            let settings = settings.with_provider(provider.provider, provider.model);
            chat(&settings, &input).await
        }
    }
}

async fn run(settings: &Settings, query: &str, show_transcript: bool) -> anyhow::Result<ExitCode> {
    let provider = create_provider(settings.provider, &settings.model, settings)?;
    let tools = agent_tools::standard_registry(settings.search_api_key()?)?;
    
    let agent = AgentBuilder::new()
        .provider(provider)
        .tools(Arc::new(tools))
        .config(settings.agent.clone())
        .build()?;
    
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling run");
            ctrl_c.cancel();
        }
    });
    
    match agent.run_with_cancel(query, &cancel).await {
        Ok(report) => {
            if show_transcript {
                print_transcript(report.transcript.messages())?;
            }
            println!("{}", report.answer);
            Ok(ExitCode::SUCCESS)
        }
        Err(aborted) => {
            report_abort(&aborted)?;
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn chat(settings: &Settings, input: &str) -> anyhow::Result<ExitCode> {
    let provider = create_provider(settings.provider, &settings.model, settings)?;
    
    match provider.complete(&[Message::user(input)], &[]).await? {
        ModelResponse::FinalAnswer(text) => println!("{text}"),
        ModelResponse::ToolCalls(calls) => {
            anyhow::bail!("Model requested {} tool call(s) in plain chat mode", calls.len());
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn report_abort(aborted: &RunAborted) -> anyhow::Result<()> {
    eprintln!("Run aborted after {} step(s): {}", aborted.steps, aborted.reason.user_message());
    eprintln!("Partial transcript:");
    let stderr = std::io::stderr();
    write_transcript(&mut stderr.lock(), aborted.transcript.messages())
}

fn print_transcript(messages: &[Message]) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    write_transcript(&mut stdout.lock(), messages)
}

fn write_transcript(out: &mut impl Write, messages: &[Message]) -> anyhow::Result<()> {
    for message in messages {
        let label = message.role;
        match (&message.tool_call, &message.tool_result) {
            (Some(call), _) => writeln!(out, "[{label}] call {} {}", call.name, call.arguments)?,
            (_, Some(result)) if result.is_error => writeln!(out, "[{label}:{} failed] {}", result.name, message.text())?,
            (_, Some(result)) => writeln!(out, "[{label}:{}] {}", result.name, message.text())?,
            _ => writeln!(out, "[{label}] {}", message.text())?,
        }
    }
    Ok(())
}

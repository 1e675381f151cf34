//! `paathshala` -- CLI wrapper around the classroom orchestrator engine.
//!
//! Provides the following subcommands:
//!
//! - `paathshala run` -- Run one utterance through the request graph engine.
//! - `paathshala feedback` -- Analyze a teaching-session transcript.
//! - `paathshala sweep-retention` -- Delete sessions older than the
//!   configured retention window.
//! - `paathshala search` -- Answer a question from the textbook corpus
//!   (retrieval-augmented, in-memory corpus seeded from `--ingest`).

use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;

mod cli_error;
mod commands;

use cli_error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();
    tracing::debug!(args = ?std::env::args().collect::<Vec<_>>(), "paathshala.cli.start");

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("paathshala: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

async fn run() -> Result<(), CliError> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() || args[0] == "--help" || args[0] == "-h" {
        print_usage();
        return Ok(());
    }

    let command = args.remove(0);
    match command.as_str() {
        "run" => commands::run::run(args).await,
        "feedback" => commands::feedback::run(args).await,
        "sweep-retention" => commands::sweep::run(args).await,
        "search" => commands::search::run(args).await,
        other => Err(CliError::Usage(format!("unknown subcommand: {other}"))),
    }
}

fn print_usage() {
    println!(
        "paathshala -- classroom orchestrator CLI\n\n\
         USAGE:\n    \
         paathshala run [--session ID] [--prompt TEXT] [--grade N] [--subject NAME] [--language CODE]\n    \
         paathshala feedback --topic NAME --grade LEVEL [--transcript TEXT]\n    \
         paathshala sweep-retention\n    \
         paathshala search [--ingest FILE] QUERY\n\n\
         If --prompt/--transcript is omitted, the text is read from stdin."
    );
}

/// Read `--prompt`/`--transcript`-style text from stdin when no flag
/// value was given on the command line.
pub(crate) fn read_stdin_or(value: Option<String>, what: &str) -> Result<String, CliError> {
    match value {
        Some(text) => Ok(text),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| CliError::Io(e.to_string()))?;
            let trimmed = buffer.trim().to_string();
            if trimmed.is_empty() {
                return Err(CliError::Usage(format!("missing {what}: pass the flag or pipe stdin")));
            }
            Ok(trimmed)
        }
    }
}

pub(crate) fn take_arg(flag: &str, remaining: &mut Vec<String>) -> Result<String, CliError> {
    if remaining.is_empty() {
        return Err(CliError::Usage(format!("missing value for {flag}")));
    }
    Ok(remaining.remove(0))
}

pub(crate) fn api_key() -> Result<String, CliError> {
    std::env::var("GEMINI_API_KEY")
        .map_err(|_| CliError::Config("GEMINI_API_KEY is not set".to_string()))
}

pub(crate) fn build_provider(
    config: &paathshala_engine::Config,
) -> Result<Arc<paathshala_provider::GeminiProvider>, CliError> {
    let provider = paathshala_provider::GeminiProvider::new(api_key()?)
        .with_model(config.model_name.clone())
        .with_temperature(config.temperature)
        .with_max_output_tokens(config.max_output_tokens);
    Ok(Arc::new(provider))
}

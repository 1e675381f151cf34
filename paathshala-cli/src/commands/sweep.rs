//! `paathshala sweep-retention` -- delete sessions whose last activity
//! is older than `RETENTION_DAYS` (spec §6).
//!
//! Against the in-memory store this only matters within a single
//! process lifetime, but the subcommand exists so a durable backend
//! can be dropped in behind [`paathshala_state::ConversationStore`]
//! without a CLI-shape change.

use crate::cli_error::CliError;
use crate::build_provider;
use paathshala_engine::{Config, Engine};

pub async fn run(args: Vec<String>) -> Result<(), CliError> {
    if !args.is_empty() {
        return Err(CliError::Usage(format!("unknown flag: {}", args[0])));
    }

    let config = Config::from_env();
    let provider = build_provider(&config)?;
    let store = std::sync::Arc::new(paathshala_state::InMemoryConversationStore::new());
    let registry = paathshala_tools::build_registry(provider.clone());
    let engine = Engine::new(config, store, provider, registry);

    let deleted = engine.sweep_retention().await?;
    println!("deleted {deleted} session(s)");
    Ok(())
}

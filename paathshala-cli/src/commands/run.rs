//! `paathshala run` -- push one utterance through the request graph engine
//! and print the resulting [`paathshala_engine::Response`] as JSON.

use crate::cli_error::CliError;
use crate::{build_provider, read_stdin_or, take_arg};
use paathshala_engine::{Config, Engine};
use paathshala_types::{SessionId, Utterance};
use std::collections::HashMap;
use std::sync::Arc;

pub async fn run(mut args: Vec<String>) -> Result<(), CliError> {
    let mut session: Option<String> = None;
    let mut prompt: Option<String> = None;
    let mut grade: Option<String> = None;
    let mut subject: Option<String> = None;
    let mut language: Option<String> = None;

    while !args.is_empty() {
        let flag = args.remove(0);
        match flag.as_str() {
            "--session" => session = Some(take_arg("--session", &mut args)?),
            "--prompt" => prompt = Some(take_arg("--prompt", &mut args)?),
            "--grade" => grade = Some(take_arg("--grade", &mut args)?),
            "--subject" => subject = Some(take_arg("--subject", &mut args)?),
            "--language" => language = Some(take_arg("--language", &mut args)?),
            other => return Err(CliError::Usage(format!("unknown flag: {other}"))),
        }
    }

    let text = read_stdin_or(prompt, "prompt")?;
    let config = Config::from_env();
    let provider = build_provider(&config)?;
    let store = Arc::new(paathshala_state::InMemoryConversationStore::new());
    let registry = paathshala_tools::build_registry(provider.clone());
    let engine = Engine::new(config, store, provider, registry);

    let mut structured_context = HashMap::new();
    if let Some(grade) = grade {
        structured_context.insert("grade".to_string(), serde_json::json!(grade));
    }
    if let Some(subject) = subject {
        structured_context.insert("subject".to_string(), serde_json::json!(subject));
    }
    if let Some(language) = language {
        structured_context.insert("language".to_string(), serde_json::json!(language));
    }

    let utterance = Utterance {
        text,
        session_id: session.map(SessionId::new),
        structured_context,
        capture_time: chrono::Utc::now(),
    };

    let response = engine.process(utterance).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

//! `paathshala feedback` -- analyze a teaching-session transcript
//! outside the request graph (spec §4.5: the feedback tool never
//! enters the Route/Execute pipeline).

use crate::cli_error::CliError;
use crate::{build_provider, read_stdin_or, take_arg};
use paathshala_engine::{Config, Engine};

pub async fn run(mut args: Vec<String>) -> Result<(), CliError> {
    let mut topic: Option<String> = None;
    let mut grade_level: Option<String> = None;
    let mut transcript: Option<String> = None;

    while !args.is_empty() {
        let flag = args.remove(0);
        match flag.as_str() {
            "--topic" => topic = Some(take_arg("--topic", &mut args)?),
            "--grade" => grade_level = Some(take_arg("--grade", &mut args)?),
            "--transcript" => transcript = Some(take_arg("--transcript", &mut args)?),
            other => return Err(CliError::Usage(format!("unknown flag: {other}"))),
        }
    }

    let topic = topic.ok_or_else(|| CliError::Usage("missing --topic".to_string()))?;
    let grade_level = grade_level.ok_or_else(|| CliError::Usage("missing --grade".to_string()))?;
    let transcript = read_stdin_or(transcript, "transcript")?;

    let config = Config::from_env();
    let provider = build_provider(&config)?;
    let store = std::sync::Arc::new(paathshala_state::InMemoryConversationStore::new());
    let registry = paathshala_tools::build_registry(provider.clone());
    let engine = Engine::new(config, store, provider, registry);

    let scorecard = engine.analyze_feedback(transcript, topic, grade_level).await?;
    println!("{}", serde_json::to_string_pretty(&scorecard)?);
    Ok(())
}

//! `paathshala search` -- retrieval-augmented question answering over
//! an in-memory textbook corpus (spec §4.7). `--ingest FILE` seeds the
//! corpus before the query is run; the corpus does not persist across
//! invocations since only the in-memory corpus is wired up (see
//! DESIGN.md).
//!
//! Ingest file format: one passage per line, `source<TAB>content`,
//! where `source` is the pipe-delimited `class|subject|book|language|page`
//! string.

use crate::cli_error::CliError;
use crate::{build_provider, take_arg};
use paathshala_engine::Config;
use paathshala_retrieval::{InMemoryCorpus, RagEngine, SearchFilters};
use std::sync::Arc;

const DEFAULT_TOP_K: usize = 3;

pub async fn run(mut args: Vec<String>) -> Result<(), CliError> {
    let mut ingest_path: Option<String> = None;
    let mut top_k = DEFAULT_TOP_K;
    let mut query_parts: Vec<String> = Vec::new();

    while !args.is_empty() {
        let flag = args.remove(0);
        match flag.as_str() {
            "--ingest" => ingest_path = Some(take_arg("--ingest", &mut args)?),
            "--top-k" => {
                let value = take_arg("--top-k", &mut args)?;
                top_k = value
                    .parse()
                    .map_err(|_| CliError::Usage(format!("--top-k must be a number, got {value}")))?;
            }
            other => query_parts.push(other.to_string()),
        }
    }

    if query_parts.is_empty() {
        return Err(CliError::Usage("missing query text".to_string()));
    }
    let query = query_parts.join(" ");

    let config = Config::from_env();
    let provider = build_provider(&config)?;
    let corpus: Arc<InMemoryCorpus> = Arc::new(InMemoryCorpus::default());
    let rag = RagEngine::new(corpus.clone(), provider.clone(), provider);

    if let Some(path) = ingest_path {
        let content = std::fs::read_to_string(&path).map_err(|e| CliError::Io(e.to_string()))?;
        for line in content.lines() {
            let Some((source, passage)) = line.split_once('\t') else {
                continue;
            };
            rag.ingest(passage.to_string(), source.to_string()).await?;
        }
    }

    let result = rag.query(&query, top_k, &SearchFilters::none()).await?;
    println!("{}", result.answer);
    for source in &result.sources {
        println!("  - {}", source.raw_source);
    }
    Ok(())
}

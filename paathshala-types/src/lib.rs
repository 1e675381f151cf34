//! Core domain types and error taxonomy shared by every `paathshala-*`
//! crate: typed ids, the request graph's data model, and the closed
//! error enum stages fall back on.

pub mod domain;
pub mod error;
pub mod id;

pub use domain::{
    CorpusDocument, Message, ParsedSource, PipelineState, Role, Session, Stage, StageEvent,
    ToolDescriptor, Utterance, MAX_UTTERANCE_CHARS, SUMMARY_SENTINEL,
};
pub use error::EngineError;
pub use id::{SessionId, ToolName};

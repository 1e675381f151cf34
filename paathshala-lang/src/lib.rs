#![deny(missing_docs)]
//! Language front-end (spec §4.4): heuristic script-based detection,
//! plus a translation bracket around the engine's otherwise
//! English-only routing and tool execution.

mod script;
mod translate;

pub use script::{detect_language, DEFAULT_LANGUAGE};
pub use translate::{translate_fields, translate_to_english};

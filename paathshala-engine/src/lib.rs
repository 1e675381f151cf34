#![deny(missing_docs)]
//! The request graph engine: the eight-stage pipeline (spec §4.1) that
//! turns one [`paathshala_types::Utterance`] into a [`Response`], plus
//! the runtime configuration (spec §6) it's built from.
//!
//! Everything external — the generative model, the durable store, the
//! registered tools — is handed to [`Engine::new`] as a trait object,
//! so the pipeline itself never depends on a concrete backend.

mod config;
mod engine;
mod response;
mod route;
mod validate;

pub use config::Config;
pub use engine::{Engine, SessionSnapshot};
pub use response::{EngineEvent, Response};

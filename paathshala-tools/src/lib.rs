#![deny(missing_docs)]
//! Concrete tool implementations (spec §4.5 / §5): the activity
//! generator, teacher-motivation support, and teaching-feedback
//! scorecard, each grounded in its corresponding Python prototype under
//! `Server/orchestrator/tools/` and `Server/teaching_feedback/`.

mod activity;
mod common;
mod crisis;
mod feedback;
mod motivation;

pub use activity::ActivityTool;
pub use crisis::CrisisTool;
pub use feedback::FeedbackTool;
pub use motivation::MotivationTool;

use paathshala_provider::GenerativeProvider;
use paathshala_tool::ToolRegistry;
use std::sync::Arc;

/// Build a [`ToolRegistry`] with the activity generator, crisis
/// handler, and motivation tools registered against a shared provider.
/// Teaching feedback is deliberately excluded (spec §4.5: it "does not
/// go through Route" and is reachable through a separate entrypoint).
pub fn build_registry(provider: Arc<dyn GenerativeProvider>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(ActivityTool::new(provider.clone())));
    registry.register(Arc::new(CrisisTool::new(provider.clone())));
    registry.register(Arc::new(MotivationTool::new(provider)));
    registry
}

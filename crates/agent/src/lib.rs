//! Agent runtime: model-backed recommendations with a deterministic safety net.
//!
//! The crate wraps a generative text provider behind [`llm::LlmClient`] and
//! puts a strict parse-and-validate boundary between its output and the typed
//! domain:
//! 1. **Prompting** (`prompt`) - embed the current catalog snapshot
//! 2. **Decoding** (`parse`, `recommender`) - strip fences, decode leniently,
//!    drop any medicine id the catalog does not contain
//! 3. **Fallback** (`orchestrator`) - any failure, including a timeout, hands
//!    the request to the keyword matcher from `pillsprint-core`
//! 4. **Normalization** (`guardrails`) - cap items, fill disclaimer and analysis
//!
//! # Key Types
//!
//! - `AgentRuntime` - facade used by the CLI (see `runtime` module)
//! - `RecommendationOrchestrator` - `get_recommendations`, which never fails
//! - `InsightService` / `MedicalChat` - composition, price comparison and chat
//!
//! # Safety Principle
//!
//! The model only chooses and explains. Names, categories, prices and stock in
//! every returned item come from the catalog record, never from model text.

pub mod conversation;
pub mod guardrails;
pub mod insights;
pub mod llm;
pub mod orchestrator;
pub mod parse;
pub mod prompt;
pub mod providers;
pub mod recommender;
pub mod runtime;

#[cfg(test)]
mod test_support;

pub use conversation::{CatalogSummary, MedicalChat, CHAT_UNAVAILABLE};
pub use guardrails::ResponsePolicy;
pub use insights::{CompositionAnalysis, InsightOutcome, InsightService, PriceComparison};
pub use llm::{ChatRole, ChatTurn, LlmClient, LlmError};
pub use orchestrator::RecommendationOrchestrator;
pub use providers::build_llm_client;
pub use recommender::AiRecommender;
pub use runtime::AgentRuntime;

//! Lorekeeper - universe-aware chat for fictional world building
//!
//! Two HTTP endpoints forward questions to hosted LLMs: one injects context
//! loaded from the universe database, the other answers from context the
//! caller already assembled.

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod llm;
pub mod metrics;
pub mod middleware;
pub mod store;
pub mod telemetry;
pub mod universe;

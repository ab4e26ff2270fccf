//! Infrastructure layer - engine, providers, evidence sources and observability

pub mod engine;
pub mod evidence;
pub mod llm;
pub mod logging;
pub mod observability;

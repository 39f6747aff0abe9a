//! # Teppan
//!
//! Batch request orchestration and beam search over stepping LLM engines.
//!
//! ## Overview
//!
//! An LLM engine does not answer requests one call at a time. It accepts
//! requests, then makes progress on all of them in bounded ticks, and any
//! request may finish on any tick. This crate turns that into a plain batch
//! API: hand over a list of prompts, get back one result per prompt, in the
//! order the prompts were given.
//!
//! Key components include:
//!
//! - A request counter handing out unique, increasing request ids
//! - Input normalization for single prompts, batches and per-prompt arguments
//! - A submission pipeline that validates the whole batch before the engine
//!   sees any of it
//! - A drain loop that steps the engine until nothing is left unfinished
//! - Beam search built from single-token generation requests
//!
//! ## Architecture
//!
//! ### Engine Boundary
//!
//! The [`SteppingEngine`] and [`Tokenizer`] traits are everything the crate
//! needs from the outside world. Scheduling, cache management and model
//! execution all live behind them.
//!
//! ### Orchestrator
//!
//! [`Llm`] owns an engine handle and exposes the batch operations:
//! [`Llm::generate`], [`Llm::encode`], [`Llm::embed`], [`Llm::classify`],
//! [`Llm::score`] and, with the `beam-search` feature,
//! [`Llm::beam_search`]. All of them take `&mut self`, so one call has the
//! engine to itself from first submission to last result.
//!
//! ### Request Ids
//!
//! Every request gets its id from a [`RequestCounter`] right before it is
//! submitted. Ids are never reused, and results are sorted by id, which is
//! what puts them back in prompt order.
//!
//! ## Features
//!
//! - **beam-search** - Enables [`Llm::beam_search`] (default)
//!
//! ## Logging
//!
//! The crate logs through `tracing` and never installs a subscriber. Log
//! lines emitted while a batch runs carry the orchestrator's session id.

mod config;
mod counter;
mod engine;
mod error;
mod logger;
mod orchestrator;
mod output;
mod progress;

pub mod request;

#[cfg(feature = "beam-search")]
pub mod beam_search;

pub use config::{GenerationDefaults, ModelConfig, RunnerType, Task};
pub use counter::{RequestCounter, RequestId};
pub use engine::{SteppingEngine, Tokenizer};
pub use error::{Result, TeppanError};
pub use logger::RequestLogger;
pub use orchestrator::{EncodeOptions, GenerateOptions, Llm, ScoreOptions};
pub use output::*;
pub use progress::{LogProgress, NoopProgress, ProgressSink};

//! # Engine Boundary
//!
//! The orchestrator drives an engine it does not own. This module defines the
//! two collaborator interfaces it talks to:
//!
//! - [`SteppingEngine`]: accepts requests and advances them tick by tick
//! - [`Tokenizer`]: converts between text and token ids
//!
//! Scheduling, cache management and model execution all live behind
//! [`SteppingEngine`]; the orchestrator only sees requests go in and finished
//! outputs come out.

mod core_trait;

pub use core_trait::*;

#[cfg(test)]
/// Scripted engine and character-level tokenizer.
pub(crate) mod mock_engine;

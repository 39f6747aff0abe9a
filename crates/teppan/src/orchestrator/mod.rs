//! # Orchestrator
//!
//! The batch front end. Every operation follows the same path:
//!
//! 1. Normalize the caller's prompts and per-prompt arguments
//! 2. Validate the whole batch
//! 3. Assign request ids in input order and submit
//! 4. Step the engine until nothing is unfinished
//! 5. Sort the finished outputs back into submission order

mod drain;
mod llm;
mod score;
mod submit;

pub use llm::{EncodeOptions, GenerateOptions, Llm};
pub use score::ScoreOptions;

#[cfg(feature = "beam-search")]
pub(crate) use drain::into_generation;
#[cfg(feature = "beam-search")]
pub(crate) use llm::progress_or_noop;
#[cfg(feature = "beam-search")]
pub(crate) use submit::BatchSpec;

//! # Beam Search
//!
//! Beam search layered on top of batch generation. The engine is only ever
//! asked for one token at a time, with enough log-probabilities to expand
//! each beam; scoring, pruning and EOS handling all happen here.
//!
//! Enabled by the `beam-search` feature (on by default).

mod search;
mod sequence;

pub use search::BeamSearchOptions;
pub use sequence::{BeamSearchOutput, BeamSearchSequence};

//! # Requests
//!
//! Everything a caller hands to the orchestrator and everything the
//! orchestrator hands to the engine.
//!
//! * Prompt payloads: [`Prompt`] (text, token ids, embeddings)
//! * Parameters: [`SamplingParams`], [`PoolingParams`], [`BeamSearchParams`]
//! * Opaque adapter handles: [`LoRARequest`], [`PromptAdapterRequest`], [`SteerVectorRequest`]
//! * Input normalization: [`PromptInput`], [`Broadcast`]
//! * The request as submitted to the engine: [`EngineRequest`]

mod adapter;
mod input;
mod params;
mod prompt;
mod queue_item;

pub use adapter::*;
pub use input::{Broadcast, PromptInput};
pub(crate) use input::resolve_priorities;
pub use params::*;
pub use prompt::*;
pub use queue_item::EngineRequest;

use async_trait::async_trait;

use crate::config::ModelConfig;
use crate::output::EngineOutput;
use crate::request::{EngineRequest, TokenId};

/// # SteppingEngine
///
/// The engine that actually runs requests. It accepts requests one at a time
/// and makes progress on all of them in bounded ticks; a request can take any
/// number of ticks, and requests submitted together may finish on different
/// ticks.
///
/// ## Contract
///
/// - `add_request` schedules a request and returns without a result. The
///   engine's unfinished set grows by one.
/// - `step` advances every scheduled request by one tick and reports a status
///   update for zero or more of them. Updates marked finished are final.
/// - `has_unfinished_requests` / `num_unfinished_requests` describe the
///   requests submitted through this engine handle that have not finished.
///   An orchestrator drains until this set is empty, so a handle must not
///   report requests submitted by someone else.
/// - Every submitted request eventually finishes. The orchestrator applies no
///   timeout.
///
/// ## Errors
///
/// Failures are reported as [`anyhow::Error`] and passed to the caller as
/// [`TeppanError::Engine`](crate::TeppanError::Engine) without interpretation
/// or retry.
///
/// ## Implementation Notes
///
/// All methods take `&self`; engines keep their mutable state behind their
/// own synchronization, the way a handle to a remote or multi-worker engine
/// naturally would.
#[async_trait]
pub trait SteppingEngine: Send + Sync {
    /// The configuration of the model this engine serves.
    fn model_config(&self) -> &ModelConfig;

    /// Schedules one request.
    ///
    /// # Parameters
    ///
    /// * `request` - The request, with its identifier already assigned
    async fn add_request(&self, request: EngineRequest) -> anyhow::Result<()>;

    /// Advances all scheduled requests by one tick.
    ///
    /// # Returns
    ///
    /// Status updates for the requests that made reportable progress on this
    /// tick, in no particular order.
    async fn step(&self) -> anyhow::Result<Vec<EngineOutput>>;

    async fn has_unfinished_requests(&self) -> bool;

    async fn num_unfinished_requests(&self) -> usize;
}

/// # Tokenizer
///
/// Conversion between text and token ids for the model behind the engine.
pub trait Tokenizer: Send + Sync {
    fn encode(&self, text: &str) -> Vec<TokenId>;

    /// Encodes a text pair for cross-encoder scoring.
    ///
    /// # Returns
    ///
    /// The input ids and, when the model uses them, the segment ids
    fn encode_pair(
        &self,
        text: &str,
        text_pair: &str,
        max_length: Option<usize>,
    ) -> (Vec<TokenId>, Option<Vec<TokenId>>);

    fn decode(&self, token_ids: &[TokenId]) -> String;

    fn eos_token_id(&self) -> Option<TokenId>;
}

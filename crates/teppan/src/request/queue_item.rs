//! # Engine Request
//!
//! This module provides [`EngineRequest`], the unit handed to
//! [`SteppingEngine::add_request`](crate::engine::SteppingEngine::add_request).
//!
//! An engine request bundles everything the engine needs to schedule one
//! prompt:
//!
//! - The identifier drawn from the [`RequestCounter`](crate::RequestCounter)
//! - The prompt payload
//! - Its parameter set (sampling or pooling)
//! - Adapter handles, forwarded untouched
//! - Tokenization options and scheduling priority
//!
//! The identifier is fixed at construction and there is no way to change it
//! afterwards.

use super::adapter::Adapters;
use super::params::{RequestParams, TokenizationOptions};
use super::prompt::Prompt;
use crate::counter::RequestId;

#[derive(Debug, Clone)]
pub struct EngineRequest {
    /// Unique identifier for this request
    request_id: RequestId,

    /// The prompt to run
    prompt: Prompt,

    /// Sampling or pooling parameters
    params: RequestParams,

    /// LoRA, prompt adapter and steering handles
    adapters: Adapters,

    /// Truncation settings for the engine's tokenizer, if any
    tokenization: Option<TokenizationOptions>,

    /// Scheduling priority; only meaningful under priority scheduling
    priority: i32,
}

impl EngineRequest {
    /// Creates a new `EngineRequest`.
    ///
    /// # Parameters
    ///
    /// * `request_id` - Identifier drawn from the request counter
    /// * `prompt` - The prompt payload
    /// * `params` - Sampling or pooling parameters
    /// * `adapters` - Adapter handles for this request
    /// * `tokenization` - Optional truncation settings
    /// * `priority` - Scheduling priority, `0` when the caller gave none
    pub fn new(
        request_id: RequestId,
        prompt: Prompt,
        params: RequestParams,
        adapters: Adapters,
        tokenization: Option<TokenizationOptions>,
        priority: i32,
    ) -> Self {
        Self {
            request_id,
            prompt,
            params,
            adapters,
            tokenization,
            priority,
        }
    }

    pub fn id(&self) -> RequestId {
        self.request_id
    }

    pub fn prompt(&self) -> &Prompt {
        &self.prompt
    }

    pub fn params(&self) -> &RequestParams {
        &self.params
    }

    pub fn adapters(&self) -> &Adapters {
        &self.adapters
    }

    pub fn tokenization(&self) -> Option<&TokenizationOptions> {
        self.tokenization.as_ref()
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Number of prompt positions, when known without tokenizing.
    ///
    /// Text prompts return `None`; the engine tokenizes them.
    pub fn prompt_len(&self) -> Option<usize> {
        match &self.prompt {
            Prompt::Tokens(tokens) => Some(tokens.prompt_token_ids.len()),
            Prompt::Embeds(embeds) => Some(embeds.prompt_embeds.len()),
            Prompt::Text(_) => None,
        }
    }

    /// Finds the longest known prompt across a collection of requests.
    ///
    /// # Returns
    ///
    /// The maximum prompt length found, or 0 if no length is known
    pub fn max_prompt_len(requests: &[EngineRequest]) -> usize {
        requests.iter()
            .filter_map(|request| request.prompt_len())
            .max()
            .unwrap_or(0)
    }
}

impl PartialEq for EngineRequest {
    fn eq(&self, other: &Self) -> bool {
        self.request_id == other.request_id
    }
}

impl Eq for EngineRequest {}

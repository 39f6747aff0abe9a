//! # Outputs
//!
//! What the engine reports for a request, and the task-specific views the
//! orchestrator builds on top of pooled outputs.

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

use crate::counter::RequestId;
use crate::request::TokenId;

/// Log-probability of one candidate token at one position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Logprob {
    pub logprob: f32,
    pub rank: Option<usize>,
    pub decoded_token: Option<String>,
}

impl Logprob {
    pub fn new(logprob: f32) -> Self {
        Self {
            logprob,
            rank: None,
            decoded_token: None,
        }
    }
}

/// Candidate tokens at one position, ordered by token id
pub type PositionLogprobs = BTreeMap<TokenId, Logprob>;

/// One entry per generated position
pub type SampleLogprobs = Vec<PositionLogprobs>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinishReason {
    Stop,
    Length,
    Abort,
}

/// One completion of a generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOutput {
    pub index: usize,
    pub text: String,
    pub token_ids: Vec<TokenId>,
    pub cumulative_logprob: Option<f32>,
    /// `None` when log-probabilities were not requested, or when the
    /// sequence ended without producing a token
    pub logprobs: Option<SampleLogprobs>,
    pub finish_reason: Option<FinishReason>,
}

/// Result of a generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOutput {
    pub request_id: RequestId,
    pub prompt: Option<String>,
    pub prompt_token_ids: Vec<TokenId>,
    pub outputs: Vec<CompletionOutput>,
    pub finished: bool,
}

impl RequestOutput {
    /// Tokens this output accounts for on the input side (prompt once per completion).
    pub fn num_input_tokens(&self) -> usize {
        self.prompt_token_ids.len() * self.outputs.len()
    }

    pub fn num_output_tokens(&self) -> usize {
        self.outputs.iter().map(|output| output.token_ids.len()).sum()
    }
}

/// Result of a pooling request.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolingRequestOutput {
    pub request_id: RequestId,
    pub prompt_token_ids: Vec<TokenId>,
    pub data: Vec<f32>,
    pub finished: bool,
}

/// A status update reported by one engine tick.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineOutput {
    Generation(RequestOutput),
    Pooling(PoolingRequestOutput),
}

impl EngineOutput {
    pub fn request_id(&self) -> RequestId {
        match self {
            EngineOutput::Generation(output) => output.request_id,
            EngineOutput::Pooling(output) => output.request_id,
        }
    }

    pub fn finished(&self) -> bool {
        match self {
            EngineOutput::Generation(output) => output.finished,
            EngineOutput::Pooling(output) => output.finished,
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            EngineOutput::Generation(_) => "RequestOutput",
            EngineOutput::Pooling(_) => "PoolingRequestOutput",
        }
    }
}

/// Pooled output of an embedding model.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingOutput {
    pub request_id: RequestId,
    pub prompt_token_ids: Vec<TokenId>,
    pub embedding: Vec<f32>,
}

impl From<PoolingRequestOutput> for EmbeddingOutput {
    fn from(value: PoolingRequestOutput) -> Self {
        Self {
            request_id: value.request_id,
            prompt_token_ids: value.prompt_token_ids,
            embedding: value.data,
        }
    }
}

/// Pooled output of a classification model.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationOutput {
    pub request_id: RequestId,
    pub prompt_token_ids: Vec<TokenId>,
    pub probs: Vec<f32>,
}

impl ClassificationOutput {
    pub fn num_classes(&self) -> usize {
        self.probs.len()
    }
}

impl From<PoolingRequestOutput> for ClassificationOutput {
    fn from(value: PoolingRequestOutput) -> Self {
        Self {
            request_id: value.request_id,
            prompt_token_ids: value.prompt_token_ids,
            probs: value.data,
        }
    }
}

/// Similarity score of one text pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringOutput {
    /// `"{left}_{right}"` for bi-encoder scores, the request id for cross-encoder scores
    pub request_id: String,
    pub prompt_token_ids: Vec<TokenId>,
    pub score: f32,
}

//! # Request Parameters
//!
//! The parameter shapes a request can carry. Generation requests carry
//! [`SamplingParams`], pooling requests carry [`PoolingParams`]; the two are
//! mutually exclusive per call and travel to the engine as [`RequestParams`].
//! [`BeamSearchParams`] never reach the engine: beam search turns them into
//! one-step sampling requests.
//!
//! Every shape exposes `verify`, which runs once at validation time before
//! anything is submitted.

use serde::{Deserialize, Serialize};

use crate::config::{GenerationDefaults, ModelConfig};
use crate::error::{Result, TeppanError};
use super::prompt::TokenId;

/// How much of a request's output the engine reports on each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RequestOutputKind {
    /// Everything generated so far
    #[default]
    Cumulative,
    /// Only what is new since the last report
    Delta,
    /// Nothing until the request finishes
    FinalOnly,
}

/// Constrained decoding configuration. At most one mode may be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuidedDecodingParams {
    pub json: Option<serde_json::Value>,
    pub regex: Option<String>,
    pub choice: Option<Vec<String>>,
    pub grammar: Option<String>,
    pub json_object: Option<bool>,
    pub structural_tag: Option<String>,
    pub backend: Option<String>,
    pub whitespace_pattern: Option<String>,
}

impl GuidedDecodingParams {
    fn mode_count(&self) -> usize {
        [
            self.json.is_some(),
            self.regex.is_some(),
            self.choice.is_some(),
            self.grammar.is_some(),
            self.json_object == Some(true),
            self.structural_tag.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }
}

/// Request-level guided decoding options.
///
/// Superseded by [`SamplingParams::guided_decoding`]; still accepted, merged
/// into every sampling param of the call, and reported with a deprecation
/// warning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuidedDecodingRequest {
    pub guided_json: Option<serde_json::Value>,
    pub guided_regex: Option<String>,
    pub guided_choice: Option<Vec<String>>,
    pub guided_grammar: Option<String>,
    pub guided_json_object: Option<bool>,
    pub structural_tag: Option<String>,
    pub guided_decoding_backend: Option<String>,
    pub guided_whitespace_pattern: Option<String>,
}

impl GuidedDecodingRequest {
    /// Converts to [`GuidedDecodingParams`], rejecting more than one mode.
    pub fn to_params(&self) -> Result<GuidedDecodingParams> {
        let params = GuidedDecodingParams {
            json: self.guided_json.clone(),
            regex: self.guided_regex.clone(),
            choice: self.guided_choice.clone(),
            grammar: self.guided_grammar.clone(),
            json_object: self.guided_json_object,
            structural_tag: self.structural_tag.clone(),
            backend: self.guided_decoding_backend.clone(),
            whitespace_pattern: self.guided_whitespace_pattern.clone(),
        };
        if params.mode_count() > 1 {
            return Err(TeppanError::ConflictingConfig(format!(
                "You can only use one guided decoding but multiple is specified: {self:?}"
            )));
        }
        Ok(params)
    }
}

/// Parameters for text generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingParams {
    /// Number of completions per prompt
    pub n: usize,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: Option<usize>,
    pub min_p: f32,
    pub repetition_penalty: f32,
    pub max_tokens: Option<usize>,
    /// Number of alternatives to report with their log-probabilities per position
    pub logprobs: Option<usize>,
    pub ignore_eos: bool,
    pub stop_token_ids: Vec<TokenId>,
    pub seed: Option<u64>,
    /// Keep only the last `k` prompt tokens; `-1` means the whole context window
    pub truncate_prompt_tokens: Option<i64>,
    pub guided_decoding: Option<GuidedDecodingParams>,
    pub output_kind: RequestOutputKind,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            n: 1,
            temperature: 1.0,
            top_p: 1.0,
            top_k: None,
            min_p: 0.0,
            repetition_penalty: 1.0,
            max_tokens: Some(16),
            logprobs: None,
            ignore_eos: false,
            stop_token_ids: vec![],
            seed: None,
            truncate_prompt_tokens: None,
            guided_decoding: None,
            output_kind: RequestOutputKind::Cumulative,
        }
    }
}

impl SamplingParams {
    /// Builds params from the model's generation config, leaving unset fields at their defaults.
    pub fn from_defaults(defaults: &GenerationDefaults) -> Self {
        let base = SamplingParams::default();
        Self {
            temperature: defaults.temperature.unwrap_or(base.temperature),
            top_p: defaults.top_p.unwrap_or(base.top_p),
            top_k: defaults.top_k.or(base.top_k),
            min_p: defaults.min_p.unwrap_or(base.min_p),
            repetition_penalty: defaults.repetition_penalty.unwrap_or(base.repetition_penalty),
            max_tokens: defaults.max_tokens.or(base.max_tokens),
            ..base
        }
    }

    pub fn verify(&self) -> Result<()> {
        if self.n < 1 {
            return Err(TeppanError::invalid(format!("n must be at least 1, got {}", self.n)));
        }
        if self.temperature.is_nan() || self.temperature < 0.0 {
            return Err(TeppanError::invalid(format!(
                "temperature must be non-negative, got {}", self.temperature
            )));
        }
        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            return Err(TeppanError::invalid(format!("top_p must be in (0, 1], got {}", self.top_p)));
        }
        if self.top_k == Some(0) {
            return Err(TeppanError::invalid("top_k must be at least 1 when set"));
        }
        if !(0.0..=1.0).contains(&self.min_p) {
            return Err(TeppanError::invalid(format!("min_p must be in [0, 1], got {}", self.min_p)));
        }
        if self.repetition_penalty <= 0.0 {
            return Err(TeppanError::invalid(format!(
                "repetition_penalty must be greater than zero, got {}", self.repetition_penalty
            )));
        }
        if self.max_tokens == Some(0) {
            return Err(TeppanError::invalid("max_tokens must be at least 1 when set"));
        }
        if let Some(guided) = &self.guided_decoding {
            if guided.mode_count() > 1 {
                return Err(TeppanError::ConflictingConfig(
                    "Only one guided decoding mode may be set per request".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Parameters for pooling requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolingParams {
    /// Truncate the pooled output to this many dimensions
    pub dimensions: Option<usize>,
    pub additional_data: Option<serde_json::Value>,
}

impl PoolingParams {
    pub fn verify(&self, model_config: &ModelConfig) -> Result<()> {
        if let Some(dimensions) = self.dimensions {
            if !model_config.is_matryoshka {
                return Err(TeppanError::Unsupported(
                    "Model does not support matryoshka representation, \
                     changing output dimensions will lead to poor results."
                        .to_string(),
                ));
            }
            if dimensions < 1 {
                return Err(TeppanError::invalid("dimensions must be at least 1"));
            }
        }
        Ok(())
    }
}

/// Parameters for [`Llm::beam_search`](crate::Llm::beam_search).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamSearchParams {
    pub beam_width: usize,
    /// Upper bound on search steps
    pub max_tokens: usize,
    pub ignore_eos: bool,
    pub temperature: f32,
    /// Exponent applied to sequence length when ranking beams
    pub length_penalty: f32,
}

impl Default for BeamSearchParams {
    fn default() -> Self {
        Self {
            beam_width: 4,
            max_tokens: 16,
            ignore_eos: false,
            temperature: 0.0,
            length_penalty: 1.0,
        }
    }
}

impl BeamSearchParams {
    pub fn verify(&self) -> Result<()> {
        if self.beam_width < 1 {
            return Err(TeppanError::invalid("beam_width must be at least 1"));
        }
        // Each step asks for twice the width in alternatives
        if self.beam_width.checked_mul(2).is_none() {
            return Err(TeppanError::invalid(format!("beam_width {} is too large", self.beam_width)));
        }
        if self.max_tokens < 1 {
            return Err(TeppanError::invalid("max_tokens must be at least 1"));
        }
        if self.temperature.is_nan() || self.temperature < 0.0 {
            return Err(TeppanError::invalid(format!(
                "temperature must be non-negative, got {}", self.temperature
            )));
        }
        if !self.length_penalty.is_finite() {
            return Err(TeppanError::invalid(format!(
                "length_penalty must be finite, got {}", self.length_penalty
            )));
        }
        Ok(())
    }

    /// The single-step request issued for every active beam.
    ///
    /// Asks for twice the beam width in alternatives so that enough candidates
    /// survive after end-of-sequence candidates are set aside.
    pub(crate) fn step_params(&self) -> SamplingParams {
        SamplingParams {
            logprobs: Some(self.beam_width.saturating_mul(2)),
            max_tokens: Some(1),
            temperature: self.temperature,
            ..Default::default()
        }
    }
}

/// The parameter set a request carries to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestParams {
    Sampling(SamplingParams),
    Pooling(PoolingParams),
}

impl RequestParams {
    pub fn verify(&self, model_config: &ModelConfig) -> Result<()> {
        match self {
            RequestParams::Sampling(params) => params.verify(),
            RequestParams::Pooling(params) => params.verify(model_config),
        }
    }

    pub fn as_sampling(&self) -> Option<&SamplingParams> {
        match self {
            RequestParams::Sampling(params) => Some(params),
            RequestParams::Pooling(_) => None,
        }
    }

    pub fn as_pooling(&self) -> Option<&PoolingParams> {
        match self {
            RequestParams::Pooling(params) => Some(params),
            RequestParams::Sampling(_) => None,
        }
    }
}

impl From<SamplingParams> for RequestParams {
    fn from(value: SamplingParams) -> Self {
        RequestParams::Sampling(value)
    }
}

impl From<PoolingParams> for RequestParams {
    fn from(value: PoolingParams) -> Self {
        RequestParams::Pooling(value)
    }
}

/// Extra options for the engine's tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizationOptions {
    pub truncation: bool,
    pub max_length: usize,
}

impl TokenizationOptions {
    /// Resolves a truncation request against the context window.
    ///
    /// `-1` truncates to `max_model_len`; anything above the window is rejected.
    pub fn from_truncation(max_model_len: usize, truncate_prompt_tokens: Option<i64>) -> Result<Option<Self>> {
        let Some(requested) = truncate_prompt_tokens else {
            return Ok(None);
        };
        let max_length = if requested <= -1 {
            max_model_len
        } else {
            usize::try_from(requested)
                .map_err(|_| TeppanError::invalid(format!("invalid truncate_prompt_tokens {requested}")))?
        };
        if max_length > max_model_len {
            return Err(TeppanError::invalid(format!(
                "truncate_prompt_tokens value ({requested}) is greater than \
                 max_model_len ({max_model_len}). Please, select a smaller truncation size."
            )));
        }
        Ok(Some(Self { truncation: true, max_length }))
    }
}

//! # Model Configuration
//!
//! The slice of the engine's model configuration the orchestrator reads:
//! which runner the model was initialized for, which task it serves, its
//! context window and the sampling defaults shipped with the model.
//!
//! The configuration is plain data. Engines hand it out through
//! [`SteppingEngine::model_config`](crate::engine::SteppingEngine::model_config),
//! and it can be loaded from JSON with [`ModelConfig::from_json`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of runner a model was initialized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunnerType {
    Generate,
    Transcription,
    Pooling,
}

impl fmt::Display for RunnerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunnerType::Generate => "generate",
            RunnerType::Transcription => "transcription",
            RunnerType::Pooling => "pooling",
        };
        f.write_str(name)
    }
}

/// The task a model serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    Generate,
    Transcription,
    Embed,
    Classify,
    Score,
    Reward,
}

/// Sampling overrides taken from the model's generation config.
///
/// Unset fields fall back to [`SamplingParams::default`](crate::request::SamplingParams).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationDefaults {
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub top_k: Option<usize>,
    pub min_p: Option<f32>,
    pub repetition_penalty: Option<f32>,
    pub max_tokens: Option<usize>,
}

impl GenerationDefaults {
    pub fn is_empty(&self) -> bool {
        self == &GenerationDefaults::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Runner the model is currently initialized for
    pub runner_type: RunnerType,

    /// Every runner the architecture could be initialized for
    pub supported_runner_types: Vec<RunnerType>,

    pub task: Task,

    /// Context window in tokens
    pub max_model_len: usize,

    /// Whether pooling requests may ask for truncated (matryoshka) embeddings
    pub is_matryoshka: bool,

    /// Scores text pairs in a single pass instead of comparing embeddings
    pub is_cross_encoder: bool,

    /// Number of classifier labels, for classification models
    pub num_labels: Option<usize>,

    pub generation_defaults: GenerationDefaults,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            runner_type: RunnerType::Generate,
            supported_runner_types: vec![RunnerType::Generate],
            task: Task::Generate,
            max_model_len: 4096,
            is_matryoshka: false,
            is_cross_encoder: false,
            num_labels: None,
            generation_defaults: GenerationDefaults::default(),
        }
    }
}

impl ModelConfig {
    /// Configuration for a pooling model serving `task`.
    pub fn pooling(task: Task) -> Self {
        Self {
            runner_type: RunnerType::Pooling,
            supported_runner_types: vec![RunnerType::Pooling],
            task,
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn supports_runner(&self, runner: RunnerType) -> bool {
        self.supported_runner_types.contains(&runner)
    }
}

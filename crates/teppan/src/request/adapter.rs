//! Adapter handles.
//!
//! These are references to per-request modifiers of model behavior. The
//! orchestrator forwards them to the engine and never interprets them; the
//! engine (or the steering collaborator behind it) owns their lifecycle.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoRARequest {
    pub lora_name: String,
    pub lora_int_id: u32,
    pub lora_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PromptAdapterRequest {
    pub prompt_adapter_name: String,
    pub prompt_adapter_id: u32,
    pub prompt_adapter_local_path: String,
    pub prompt_adapter_num_virtual_tokens: usize,
}

/// Handle to an activation-steering vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SteerVectorRequest {
    pub steer_vector_name: String,
    pub steer_vector_id: u32,
    pub steer_vector_local_path: String,
    pub scale: f32,
    pub target_layers: Option<Vec<usize>>,
    /// Name of the transform the collaborator applies, e.g. `"direct"`
    pub algorithm: String,
}

/// The adapter handles travelling with one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Adapters {
    pub lora: Option<LoRARequest>,
    pub prompt_adapter: Option<PromptAdapterRequest>,
    pub steer_vector: Option<SteerVectorRequest>,
}

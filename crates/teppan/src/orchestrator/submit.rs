//! # Batch Submission
//!
//! Turns one call's prompts and arguments into engine requests.
//!
//! Submission happens in two phases:
//!
//! 1. [`BatchSpec::prepare`] checks every shape and every parameter set and
//!    materializes the full batch. Nothing is drawn from the counter and
//!    nothing reaches the engine until this succeeds for the whole batch.
//! 2. [`submit_batch`] draws one identifier per request, in input order, and
//!    hands each request to the engine.

use tracing::{debug, warn};

use crate::config::ModelConfig;
use crate::counter::{RequestCounter, RequestId};
use crate::engine::SteppingEngine;
use crate::error::{Result, TeppanError};
use crate::logger::RequestLogger;
use crate::progress::ProgressSink;
use crate::request::{
    resolve_priorities,
    Adapters,
    Broadcast,
    EngineRequest,
    GuidedDecodingParams,
    LoRARequest,
    Prompt,
    PromptAdapterRequest,
    RequestOutputKind,
    RequestParams,
    SteerVectorRequest,
    TokenizationOptions,
};

/// Everything one call wants submitted, before validation.
#[derive(Debug, Clone)]
pub(crate) struct BatchSpec {
    pub prompts: Vec<Prompt>,
    pub params: Broadcast<RequestParams>,
    pub lora_request: Broadcast<Option<LoRARequest>>,
    pub prompt_adapter_request: Option<PromptAdapterRequest>,
    pub steer_vector_request: Option<SteerVectorRequest>,
    /// Merged into every sampling param; conflicts with params that already set one
    pub guided_decoding: Option<GuidedDecodingParams>,
    pub tokenization: Option<TokenizationOptions>,
    pub priority: Option<Vec<i32>>,
}

impl BatchSpec {
    pub fn new(prompts: Vec<Prompt>, params: Broadcast<RequestParams>) -> Self {
        Self {
            prompts,
            params,
            lora_request: Broadcast::default(),
            prompt_adapter_request: None,
            steer_vector_request: None,
            guided_decoding: None,
            tokenization: None,
            priority: None,
        }
    }

    /// Validates the whole batch and pairs every prompt with its arguments.
    ///
    /// # Errors
    ///
    /// * [`TeppanError::ShapeMismatch`] if params, LoRA requests or priorities
    ///   do not match the number of prompts
    /// * [`TeppanError::ConflictingConfig`] if guided decoding is set twice
    /// * Any error raised by a parameter set's `verify`
    pub fn prepare(self, model_config: &ModelConfig) -> Result<Vec<PendingRequest>> {
        let n = self.prompts.len();
        self.params.check_len("params", n)?;
        self.lora_request.check_len("lora_request", n)?;
        let priorities = resolve_priorities(self.priority, n)?;

        let guided = self.guided_decoding;
        let params = self.params
            .try_map(|params| finalize_params(params, guided.as_ref(), model_config))?
            .resolve("params", n)?;
        let loras = self.lora_request.resolve("lora_request", n)?;

        let pending = self.prompts.into_iter()
            .zip(params)
            .zip(loras)
            .zip(priorities)
            .map(|(((prompt, params), lora), priority)| PendingRequest {
                prompt,
                params,
                adapters: Adapters {
                    lora,
                    prompt_adapter: self.prompt_adapter_request.clone(),
                    steer_vector: self.steer_vector_request.clone(),
                },
                tokenization: self.tokenization,
                priority,
            })
            .collect();
        Ok(pending)
    }
}

fn finalize_params(
    params: RequestParams,
    guided: Option<&GuidedDecodingParams>,
    model_config: &ModelConfig,
) -> Result<RequestParams> {
    let params = match params {
        RequestParams::Sampling(mut sampling) => {
            if let Some(guided) = guided {
                if sampling.guided_decoding.is_some() {
                    return Err(TeppanError::ConflictingConfig(
                        "Cannot set both guided_options_request and params.guided_decoding."
                            .to_string(),
                    ));
                }
                sampling.guided_decoding = Some(guided.clone());
            }
            // Only finished results are ever collected
            sampling.output_kind = RequestOutputKind::FinalOnly;
            RequestParams::Sampling(sampling)
        }
        pooling @ RequestParams::Pooling(_) => pooling,
    };
    params.verify(model_config)?;
    Ok(params)
}

/// A validated request still waiting for its identifier.
#[derive(Debug, Clone)]
pub(crate) struct PendingRequest {
    pub prompt: Prompt,
    pub params: RequestParams,
    pub adapters: Adapters,
    pub tokenization: Option<TokenizationOptions>,
    pub priority: i32,
}

impl PendingRequest {
    fn into_request(self, request_id: RequestId) -> EngineRequest {
        EngineRequest::new(
            request_id,
            self.prompt,
            self.params,
            self.adapters,
            self.tokenization,
            self.priority,
        )
    }
}

/// Assigns identifiers in input order and hands every request to the engine.
///
/// # Parameters
///
/// * `engine` - Engine receiving the requests
/// * `counter` - Source of identifiers
/// * `logger` - Optional request logger
/// * `pending` - The validated batch
/// * `progress` - Advanced once per submitted request
///
/// # Returns
///
/// The identifiers assigned, in input order
///
/// # Errors
///
/// An engine rejection is returned as is. Requests submitted before the
/// rejected one stay with the engine.
pub(crate) async fn submit_batch<E>(
    engine: &E,
    counter: &RequestCounter,
    logger: Option<&RequestLogger>,
    pending: Vec<PendingRequest>,
    progress: &mut dyn ProgressSink,
) -> Result<Vec<RequestId>>
where E: SteppingEngine + ?Sized
{
    progress.start("Adding requests", pending.len());
    let mut ids = Vec::with_capacity(pending.len());
    let mut longest_prompt = 0;
    for pending in pending {
        // One id per request actually handed to the engine
        let request = pending.into_request(counter.next_id());
        let request_id = request.id();
        longest_prompt = longest_prompt.max(request.prompt_len().unwrap_or(0));
        if let Some(logger) = logger {
            logger.log_inputs(&request);
        }
        if let Err(err) = engine.add_request(request).await {
            warn!("Engine rejected request {}: {}", request_id, err);
            progress.close();
            return Err(err.into());
        }
        ids.push(request_id);
        progress.advance(1);
    }
    debug!("Submitted {} requests, longest known prompt {} tokens", ids.len(), longest_prompt);
    progress.close();
    Ok(ids)
}

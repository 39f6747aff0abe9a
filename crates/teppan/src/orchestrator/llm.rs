use std::sync::{Arc, OnceLock};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::{ModelConfig, RunnerType, Task};
use crate::counter::RequestCounter;
use crate::engine::{SteppingEngine, Tokenizer};
use crate::error::{Result, TeppanError};
use crate::logger::RequestLogger;
use crate::output::{
    ClassificationOutput,
    EmbeddingOutput,
    EngineOutput,
    PoolingRequestOutput,
    RequestOutput,
};
use crate::progress::{NoopProgress, ProgressSink};
use crate::request::{
    Broadcast,
    GuidedDecodingRequest,
    LoRARequest,
    PoolingParams,
    PromptAdapterRequest,
    PromptInput,
    SamplingParams,
    SteerVectorRequest,
    TokenizationOptions,
};
use super::drain::{into_generation, into_pooling, run_engine};
use super::submit::{submit_batch, BatchSpec};

/// Per-call options for [`Llm::generate`].
#[derive(Default)]
pub struct GenerateOptions {
    /// Falls back to the model's default sampling params when unset
    pub sampling_params: Option<Broadcast<SamplingParams>>,
    pub lora_request: Broadcast<Option<LoRARequest>>,
    pub prompt_adapter_request: Option<PromptAdapterRequest>,
    pub steer_vector_request: Option<SteerVectorRequest>,
    /// Deprecated; set `guided_decoding` on the sampling params instead
    pub guided_options_request: Option<GuidedDecodingRequest>,
    pub priority: Option<Vec<i32>>,
    pub progress: Option<Box<dyn ProgressSink>>,
}

/// Per-call options for [`Llm::encode`], [`Llm::embed`], [`Llm::classify`]
/// and [`Llm::score`](crate::Llm::score).
#[derive(Default)]
pub struct EncodeOptions {
    /// Falls back to [`PoolingParams::default`] when unset
    pub pooling_params: Option<Broadcast<PoolingParams>>,
    /// Keep only the last `k` prompt tokens; `-1` means the whole context window
    pub truncate_prompt_tokens: Option<i64>,
    pub lora_request: Broadcast<Option<LoRARequest>>,
    pub prompt_adapter_request: Option<PromptAdapterRequest>,
    pub steer_vector_request: Option<SteerVectorRequest>,
    pub priority: Option<Vec<i32>>,
    pub progress: Option<Box<dyn ProgressSink>>,
}

pub(crate) fn progress_or_noop(progress: Option<Box<dyn ProgressSink>>) -> Box<dyn ProgressSink> {
    match progress {
        Some(progress) => progress,
        None => Box::new(NoopProgress),
    }
}

/// Batch front end over a stepping engine.
///
/// An `Llm` submits whole batches of requests, steps the engine until every
/// one of them has finished, and hands the results back in submission order.
/// Every public operation takes `&mut self`: one call owns the engine from
/// its first submission to its last collected output, so outputs of
/// concurrent calls can never mix.
///
/// # Type Parameters
///
/// * `E` - The engine requests are submitted to
///
/// # Examples
///
/// ```no_run
/// # use std::sync::Arc;
/// # use teppan::{Llm, GenerateOptions, SteppingEngine, Tokenizer};
/// # async fn run<E: SteppingEngine>(engine: E, tokenizer: Arc<dyn Tokenizer>) -> teppan::Result<()> {
/// let mut llm = Llm::new(engine, tokenizer);
/// let outputs = llm.generate(vec!["Hello", "The capital of France is"], GenerateOptions::default()).await?;
/// for output in outputs {
///     println!("{}: {}", output.request_id, output.outputs[0].text);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Llm<E> {
    engine: E,
    tokenizer: Arc<dyn Tokenizer>,
    counter: Arc<RequestCounter>,
    default_sampling_params: OnceLock<SamplingParams>,
    request_logger: Option<RequestLogger>,
    session_id: Uuid,
}

impl<E: SteppingEngine> Llm<E> {
    /// Creates an orchestrator with its own request counter starting at zero.
    pub fn new(engine: E, tokenizer: Arc<dyn Tokenizer>) -> Self {
        let session_id = Uuid::new_v4();
        debug!("Creating orchestrator session {}", session_id);
        Self {
            engine,
            tokenizer,
            counter: Arc::new(RequestCounter::new()),
            default_sampling_params: OnceLock::new(),
            request_logger: None,
            session_id,
        }
    }

    /// Draws request ids from `counter` instead, so several orchestrators
    /// can share one id space.
    pub fn with_counter(mut self, counter: Arc<RequestCounter>) -> Self {
        self.counter = counter;
        self
    }

    /// Logs every request before it is handed to the engine.
    pub fn with_request_logger(mut self, request_logger: RequestLogger) -> Self {
        self.request_logger = Some(request_logger);
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn tokenizer(&self) -> &dyn Tokenizer {
        self.tokenizer.as_ref()
    }

    #[cfg(feature = "beam-search")]
    pub(crate) fn shared_tokenizer(&self) -> Arc<dyn Tokenizer> {
        self.tokenizer.clone()
    }

    pub fn model_config(&self) -> &ModelConfig {
        self.engine.model_config()
    }

    pub fn counter(&self) -> &RequestCounter {
        &self.counter
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Sampling params used when a call supplies none.
    ///
    /// Built once from the model's generation config and cached.
    pub fn default_sampling_params(&self) -> &SamplingParams {
        self.default_sampling_params.get_or_init(|| {
            let defaults = &self.engine.model_config().generation_defaults;
            if defaults.is_empty() {
                SamplingParams::default()
            } else {
                info!(
                    "Default sampling parameters have been overridden by the model's \
                     generation config: {:?}",
                    defaults
                );
                SamplingParams::from_defaults(defaults)
            }
        })
    }

    /// Generates completions for every prompt.
    ///
    /// # Parameters
    ///
    /// * `prompts` - One prompt, a batch, or the deprecated split form
    /// * `options` - Sampling params, adapters, priorities and progress sink
    ///
    /// # Returns
    ///
    /// One [`RequestOutput`] per prompt, in prompt order
    ///
    /// # Errors
    ///
    /// * [`TeppanError::Unsupported`] if the model is not a generation model
    /// * [`TeppanError::ShapeMismatch`] if a per-prompt argument has the wrong length
    /// * [`TeppanError::ConflictingConfig`] if guided decoding is requested twice
    /// * [`TeppanError::Engine`] if the engine fails
    pub async fn generate(
        &mut self,
        prompts: impl Into<PromptInput>,
        options: GenerateOptions,
    ) -> Result<Vec<RequestOutput>> {
        self.require_generation()?;
        let prompts = prompts.into().normalize()?;
        let GenerateOptions {
            sampling_params,
            lora_request,
            prompt_adapter_request,
            steer_vector_request,
            guided_options_request,
            priority,
            progress,
        } = options;

        let guided_decoding = match guided_options_request {
            Some(request) => {
                warn!(
                    "guided_options_request is deprecated; set guided_decoding on the \
                     sampling params instead"
                );
                Some(request.to_params()?)
            }
            None => None,
        };
        let sampling_params = match sampling_params {
            Some(params) => params,
            None => Broadcast::One(self.default_sampling_params().clone()),
        };
        // Truncation only applies when every prompt shares one param set
        let tokenization = match &sampling_params {
            Broadcast::One(params) => TokenizationOptions::from_truncation(
                self.model_config().max_model_len,
                params.truncate_prompt_tokens,
            )?,
            Broadcast::Each(_) => None,
        };

        let spec = BatchSpec {
            prompts,
            params: sampling_params.try_map(|params| Ok(params.into()))?,
            lora_request,
            prompt_adapter_request,
            steer_vector_request,
            guided_decoding,
            tokenization,
            priority,
        };
        let mut progress = progress_or_noop(progress);
        let outputs = self.run_batch(spec, progress.as_mut()).await?;
        into_generation(outputs)
    }

    /// Runs the pooling model over every prompt.
    ///
    /// # Errors
    ///
    /// * [`TeppanError::Unsupported`] if the model is not a pooling model, or a
    ///   pooling param asks for something the model cannot do
    /// * [`TeppanError::InvalidInput`] if the truncation size exceeds the context window
    /// * [`TeppanError::ShapeMismatch`] if a per-prompt argument has the wrong length
    pub async fn encode(
        &mut self,
        prompts: impl Into<PromptInput>,
        options: EncodeOptions,
    ) -> Result<Vec<PoolingRequestOutput>> {
        self.require_pooling("encode")?;
        let prompts = prompts.into().normalize()?;
        let EncodeOptions {
            pooling_params,
            truncate_prompt_tokens,
            lora_request,
            prompt_adapter_request,
            steer_vector_request,
            priority,
            progress,
        } = options;

        let pooling_params = pooling_params.unwrap_or_else(|| Broadcast::One(PoolingParams::default()));
        let tokenization = TokenizationOptions::from_truncation(
            self.model_config().max_model_len,
            truncate_prompt_tokens,
        )?;

        let spec = BatchSpec {
            prompts,
            params: pooling_params.try_map(|params| Ok(params.into()))?,
            lora_request,
            prompt_adapter_request,
            steer_vector_request,
            guided_decoding: None,
            tokenization,
            priority,
        };
        let mut progress = progress_or_noop(progress);
        let outputs = self.run_batch(spec, progress.as_mut()).await?;
        into_pooling(outputs)
    }

    /// Embeds every prompt. Requires a model serving the `embed` task.
    pub async fn embed(
        &mut self,
        prompts: impl Into<PromptInput>,
        options: EncodeOptions,
    ) -> Result<Vec<EmbeddingOutput>> {
        if self.model_config().task != Task::Embed {
            return Err(TeppanError::Unsupported(
                "Embedding API is only enabled for models serving the embed task".to_string(),
            ));
        }
        let outputs = self.encode(prompts, options).await?;
        Ok(outputs.into_iter().map(EmbeddingOutput::from).collect())
    }

    /// Classifies every prompt. Requires a model serving the `classify` task.
    pub async fn classify(
        &mut self,
        prompts: impl Into<PromptInput>,
        options: EncodeOptions,
    ) -> Result<Vec<ClassificationOutput>> {
        if self.model_config().task != Task::Classify {
            return Err(TeppanError::Unsupported(
                "Classification API is only enabled for models serving the classify task".to_string(),
            ));
        }
        let outputs = self.encode(prompts, options).await?;
        Ok(outputs.into_iter().map(ClassificationOutput::from).collect())
    }

    /// Validates, submits and drains one batch.
    ///
    /// Every log line emitted on the way carries this orchestrator's session id.
    pub(crate) async fn run_batch(
        &mut self,
        spec: BatchSpec,
        progress: &mut dyn ProgressSink,
    ) -> Result<Vec<EngineOutput>> {
        let span = info_span!("batch", session = %self.session_id, requests = spec.prompts.len());
        let batch = async {
            let pending = spec.prepare(self.engine.model_config())?;
            submit_batch(
                &self.engine,
                &self.counter,
                self.request_logger.as_ref(),
                pending,
                &mut *progress,
            ).await?;
            run_engine(&self.engine, progress).await
        };
        batch.instrument(span).await
    }

    pub(crate) fn require_generation(&self) -> Result<()> {
        let config = self.model_config();
        if config.runner_type == RunnerType::Generate {
            return Ok(());
        }
        let mut message = String::from(
            "generate is only supported for (conditional) generation models \
             (XForCausalLM, XForConditionalGeneration).",
        );
        if config.supports_runner(RunnerType::Generate) {
            message.push_str(&format!(
                " Your model supports the '{}' runner, but is currently initialized for the \
                 '{}' runner. Please initialize the engine with the generate task.",
                RunnerType::Generate,
                config.runner_type,
            ));
        }
        Err(TeppanError::Unsupported(message))
    }

    pub(crate) fn require_pooling(&self, operation: &str) -> Result<()> {
        let config = self.model_config();
        if config.runner_type == RunnerType::Pooling {
            return Ok(());
        }
        let mut message = format!("{operation} is only supported for pooling models.");
        if config.supports_runner(RunnerType::Pooling) {
            message.push_str(&format!(
                " Your model supports the '{}' runner, but is currently initialized for the \
                 '{}' runner. Please initialize the engine with the embed, classify or score task.",
                RunnerType::Pooling,
                config.runner_type,
            ));
        }
        Err(TeppanError::Unsupported(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationDefaults;
    use crate::counter::RequestId;
    use crate::engine::mock_engine::{MockEngine, MockTokenizer};
    use crate::progress::LogProgress;
    use crate::request::{EngineRequest, GuidedDecodingParams, Prompt, RequestOutputKind};

    fn llm(engine: MockEngine) -> Llm<MockEngine> {
        Llm::new(engine, Arc::new(MockTokenizer))
    }

    fn lora(id: u32) -> Option<LoRARequest> {
        Some(LoRARequest {
            lora_name: format!("adapter-{id}"),
            lora_int_id: id,
            lora_path: format!("/adapters/{id}"),
        })
    }

    fn request_ids(outputs: &[RequestOutput]) -> Vec<RequestId> {
        outputs.iter().map(|output| output.request_id).collect()
    }

    #[tokio::test]
    async fn test_generate_defaults_and_order() {
        // Three prompts finishing in reverse order come back in submission order
        let engine = MockEngine::new(ModelConfig::default())
            .with_ticks(|request| 3 - request.id().value() as usize);
        let mut llm = llm(engine);

        let outputs = llm.generate(vec!["a", "b", "c"], GenerateOptions::default()).await.unwrap();

        assert_eq!(request_ids(&outputs), vec![RequestId::new(0), RequestId::new(1), RequestId::new(2)]);
        let prompts: Vec<_> = outputs.iter().map(|output| output.prompt.as_deref()).collect();
        assert_eq!(prompts, vec![Some("a"), Some("b"), Some("c")]);
        for request in llm.engine().submitted().await {
            let params = request.params().as_sampling().unwrap();
            assert_eq!(params.max_tokens, Some(16));
            assert_eq!(params.output_kind, RequestOutputKind::FinalOnly);
        }
        assert_eq!(outputs[0].outputs[0].token_ids.len(), 16);
    }

    #[tokio::test]
    async fn test_ids_keep_increasing_across_calls() {
        let mut llm = llm(MockEngine::new(ModelConfig::default()));
        llm.generate(vec!["a", "b"], GenerateOptions::default()).await.unwrap();
        let outputs = llm.generate("c", GenerateOptions::default()).await.unwrap();
        assert_eq!(request_ids(&outputs), vec![RequestId::new(2)]);
    }

    #[tokio::test]
    async fn test_shared_counter() {
        let counter = Arc::new(RequestCounter::starting_at(100));
        let mut first = llm(MockEngine::new(ModelConfig::default())).with_counter(counter.clone());
        let mut second = llm(MockEngine::new(ModelConfig::default())).with_counter(counter.clone());

        let a = first.generate("a", GenerateOptions::default()).await.unwrap();
        let b = second.generate("b", GenerateOptions::default()).await.unwrap();
        assert_eq!(a[0].request_id, RequestId::new(100));
        assert_eq!(b[0].request_id, RequestId::new(101));
        assert_ne!(first.session_id(), second.session_id());
    }

    #[tokio::test]
    async fn test_lora_shape_mismatch_submits_nothing() {
        let mut llm = llm(MockEngine::new(ModelConfig::default()));
        let options = GenerateOptions {
            lora_request: Broadcast::Each(vec![lora(1), lora(2)]),
            ..Default::default()
        };

        let err = llm.generate(vec!["a", "b", "c"], options).await.unwrap_err();
        assert!(matches!(err, TeppanError::ShapeMismatch { argument: "lora_request", expected: 3, actual: 2 }));
        assert!(llm.engine().submitted().await.is_empty());
        assert_eq!(llm.counter().peek(), RequestId::new(0));
    }

    #[tokio::test]
    async fn test_params_shape_mismatch_leaves_counter() {
        let mut llm = llm(MockEngine::new(ModelConfig::default()));
        llm.generate("warmup", GenerateOptions::default()).await.unwrap();
        let options = GenerateOptions {
            sampling_params: Some(Broadcast::Each(vec![SamplingParams::default(); 2])),
            ..Default::default()
        };

        let err = llm.generate(vec!["a", "b", "c"], options).await.unwrap_err();
        assert!(matches!(err, TeppanError::ShapeMismatch { argument: "params", .. }));
        assert_eq!(llm.counter().peek(), RequestId::new(1));
        assert_eq!(llm.engine().submitted().await.len(), 1);
    }

    #[tokio::test]
    async fn test_broadcast_adapter_reaches_every_request() {
        let mut llm = llm(MockEngine::new(ModelConfig::default()));
        let options = GenerateOptions {
            lora_request: Broadcast::One(lora(7)),
            priority: Some(vec![3, 2, 1]),
            ..Default::default()
        };
        llm.generate(vec!["a", "b", "c"], options).await.unwrap();

        let submitted = llm.engine().submitted().await;
        assert_eq!(submitted.len(), 3);
        assert!(submitted.iter().all(|request| request.adapters().lora == lora(7)));
        let priorities: Vec<_> = submitted.iter().map(EngineRequest::priority).collect();
        assert_eq!(priorities, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_per_prompt_params() {
        let mut llm = llm(MockEngine::new(ModelConfig::default()));
        let params = vec![
            SamplingParams { max_tokens: Some(1), ..Default::default() },
            SamplingParams { max_tokens: Some(3), ..Default::default() },
        ];
        let options = GenerateOptions {
            sampling_params: Some(Broadcast::Each(params)),
            ..Default::default()
        };
        let outputs = llm.generate(vec!["a", "b"], options).await.unwrap();
        assert_eq!(outputs[0].outputs[0].token_ids.len(), 1);
        assert_eq!(outputs[1].outputs[0].token_ids.len(), 3);
    }

    #[tokio::test]
    async fn test_generation_config_defaults() {
        let config = ModelConfig {
            generation_defaults: GenerationDefaults {
                temperature: Some(0.3),
                max_tokens: Some(2),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut llm = llm(MockEngine::new(config));
        assert_eq!(llm.default_sampling_params().temperature, 0.3);

        let outputs = llm.generate("a", GenerateOptions::default()).await.unwrap();
        assert_eq!(outputs[0].outputs[0].token_ids.len(), 2);
        let submitted = llm.engine().submitted().await;
        assert_eq!(submitted[0].params().as_sampling().unwrap().temperature, 0.3);
    }

    #[tokio::test]
    async fn test_legacy_token_ids() {
        let mut llm = llm(MockEngine::new(ModelConfig::default()));
        let input = PromptInput::Legacy {
            prompts: None,
            prompt_token_ids: Some(vec![vec![100, 101], vec![200]]),
        };
        let outputs = llm.generate(input, GenerateOptions::default()).await.unwrap();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[1].prompt_token_ids, vec![200]);
        assert_eq!(outputs[1].outputs[0].token_ids[0], 201);
    }

    #[tokio::test]
    async fn test_truncation() {
        let mut llm = llm(MockEngine::new(ModelConfig::default()));
        let options = GenerateOptions {
            sampling_params: Some(Broadcast::One(SamplingParams {
                truncate_prompt_tokens: Some(-1),
                ..Default::default()
            })),
            ..Default::default()
        };
        llm.generate("a", options).await.unwrap();
        let submitted = llm.engine().submitted().await;
        assert_eq!(
            submitted[0].tokenization(),
            Some(&TokenizationOptions { truncation: true, max_length: 4096 })
        );

        let options = GenerateOptions {
            sampling_params: Some(Broadcast::One(SamplingParams {
                truncate_prompt_tokens: Some(5000),
                ..Default::default()
            })),
            ..Default::default()
        };
        let err = llm.generate("a", options).await.unwrap_err();
        assert!(matches!(err, TeppanError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_guided_options_request() {
        let mut llm = llm(MockEngine::new(ModelConfig::default()));
        let options = GenerateOptions {
            guided_options_request: Some(GuidedDecodingRequest {
                guided_choice: Some(vec!["yes".to_string(), "no".to_string()]),
                ..Default::default()
            }),
            ..Default::default()
        };
        llm.generate("a", options).await.unwrap();
        let submitted = llm.engine().submitted().await;
        let guided = submitted[0].params().as_sampling().unwrap().guided_decoding.clone();
        assert_eq!(
            guided,
            Some(GuidedDecodingParams {
                choice: Some(vec!["yes".to_string(), "no".to_string()]),
                ..Default::default()
            })
        );

        let options = GenerateOptions {
            guided_options_request: Some(GuidedDecodingRequest {
                guided_regex: Some("a+".to_string()),
                guided_choice: Some(vec!["yes".to_string()]),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = llm.generate("a", options).await.unwrap_err();
        assert!(matches!(err, TeppanError::ConflictingConfig(_)));
    }

    #[tokio::test]
    async fn test_engine_failure_propagates() {
        let engine = MockEngine::new(ModelConfig::default()).failing_on_step(1);
        let mut llm = llm(engine);
        let err = llm.generate("a", GenerateOptions::default()).await.unwrap_err();
        assert!(matches!(err, TeppanError::Engine(_)));
    }

    #[tokio::test]
    async fn test_generate_rejects_pooling_model() {
        let config = ModelConfig {
            supported_runner_types: vec![RunnerType::Generate, RunnerType::Pooling],
            ..ModelConfig::pooling(Task::Embed)
        };
        let mut llm = llm(MockEngine::new(config));
        let err = llm.generate("a", GenerateOptions::default()).await.unwrap_err();
        match err {
            TeppanError::Unsupported(message) => {
                assert!(message.contains("only supported for (conditional) generation models"));
                assert!(message.contains("'pooling' runner"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_progress_sink() {
        let mut llm = llm(MockEngine::new(ModelConfig::default()));
        let options = GenerateOptions {
            progress: Some(Box::new(LogProgress::new(2))),
            ..Default::default()
        };
        let outputs = llm.generate(vec!["a", "b", "c"], options).await.unwrap();
        assert_eq!(outputs.len(), 3);
    }

    #[tokio::test]
    async fn test_encode_defaults() {
        let mut llm = llm(MockEngine::new(ModelConfig::pooling(Task::Embed)));
        let outputs = llm.encode(vec!["ab", "abc"], EncodeOptions::default()).await.unwrap();
        assert_eq!(outputs[0].data, vec![2.0, 1.0]);
        assert_eq!(outputs[1].data, vec![3.0, 1.0]);
        let submitted = llm.engine().submitted().await;
        assert_eq!(submitted[0].params().as_pooling(), Some(&PoolingParams::default()));
    }

    #[tokio::test]
    async fn test_encode_rejects_generation_model() {
        let mut llm = llm(MockEngine::new(ModelConfig::default()));
        let err = llm.encode("a", EncodeOptions::default()).await.unwrap_err();
        assert!(matches!(err, TeppanError::Unsupported(_)));
    }

    #[tokio::test]
    async fn test_encode_verifies_pooling_params() {
        let mut llm = llm(MockEngine::new(ModelConfig::pooling(Task::Embed)));
        let options = EncodeOptions {
            pooling_params: Some(Broadcast::One(PoolingParams { dimensions: Some(4), ..Default::default() })),
            ..Default::default()
        };
        let err = llm.encode("a", options).await.unwrap_err();
        assert!(matches!(err, TeppanError::Unsupported(_)));
        assert!(llm.engine().submitted().await.is_empty());
    }

    #[tokio::test]
    async fn test_embed_and_classify_task_gates() {
        let mut embedder = llm(MockEngine::new(ModelConfig::pooling(Task::Embed)));
        let embeddings = embedder.embed(Prompt::tokens(vec![5, 6, 7]), EncodeOptions::default()).await.unwrap();
        assert_eq!(embeddings[0].embedding, vec![3.0, 1.0]);
        let err = embedder.classify("a", EncodeOptions::default()).await.unwrap_err();
        assert!(matches!(err, TeppanError::Unsupported(_)));

        let mut classifier = llm(
            MockEngine::new(ModelConfig::pooling(Task::Classify))
                .with_pooler(|_| vec![0.2, 0.8]),
        );
        let classes = classifier.classify("a", EncodeOptions::default()).await.unwrap();
        assert_eq!(classes[0].num_classes(), 2);
        let err = classifier.embed("a", EncodeOptions::default()).await.unwrap_err();
        assert!(matches!(err, TeppanError::Unsupported(_)));
    }
}

//! # Pair Scoring
//!
//! Scores text pairs with a pooling model. Bi-encoders embed both sides and
//! compare the embeddings by cosine similarity; cross-encoders read each pair
//! as one input and pool it straight to a score.
//!
//! Inputs pair up `1 -> 1`, `1 -> N` (the single query is scored against
//! every document) or `N -> N`.

use tracing::debug;

use crate::config::Task;
use crate::engine::{SteppingEngine, Tokenizer};
use crate::error::{Result, TeppanError};
use crate::output::{PoolingRequestOutput, ScoringOutput};
use crate::progress::ProgressSink;
use crate::request::{
    Broadcast,
    LoRARequest,
    PoolingParams,
    Prompt,
    PromptAdapterRequest,
    PromptInput,
    SteerVectorRequest,
    TokenizationOptions,
    TokensPrompt,
};
use super::drain::into_pooling;
use super::llm::{progress_or_noop, EncodeOptions, Llm};
use super::submit::BatchSpec;

/// Per-call options for [`Llm::score`].
#[derive(Default)]
pub struct ScoreOptions {
    /// Keep only the last `k` prompt tokens; `-1` means the whole context window
    pub truncate_prompt_tokens: Option<i64>,
    /// Applied to every request of the call
    pub lora_request: Option<LoRARequest>,
    pub prompt_adapter_request: Option<PromptAdapterRequest>,
    pub steer_vector_request: Option<SteerVectorRequest>,
    pub progress: Option<Box<dyn ProgressSink>>,
}

/// Checks that the two sides pair up as `1 -> 1`, `1 -> N` or `N -> N`.
pub(crate) fn validate_score_input_lens(left: usize, right: usize) -> Result<()> {
    if left > 1 && left != right {
        return Err(TeppanError::invalid("Input lengths must be either 1:1, 1:N or N:N"));
    }
    if left == 0 {
        return Err(TeppanError::invalid("At least one text element must be given"));
    }
    if right == 0 {
        return Err(TeppanError::invalid("At least one text_pair element must be given"));
    }
    Ok(())
}

/// Cosine similarity of two vectors of equal length.
pub(crate) fn cosine_similarity(left: &[f32], right: &[f32]) -> Result<f32> {
    if left.len() != right.len() {
        return Err(TeppanError::invalid(format!(
            "Cannot compare embeddings of different sizes: {} and {}",
            left.len(),
            right.len()
        )));
    }
    let dot: f32 = left.iter().zip(right).map(|(a, b)| a * b).sum();
    let left_norm = left.iter().map(|a| a * a).sum::<f32>().sqrt();
    let right_norm = right.iter().map(|b| b * b).sum::<f32>().sqrt();
    Ok(dot / (left_norm * right_norm).max(1e-8))
}

fn score_text(prompt: Prompt, tokenizer: &dyn Tokenizer) -> Result<String> {
    if prompt.multi_modal_data().is_some() {
        return Err(TeppanError::invalid("Multi-modal prompt is not supported for scoring"));
    }
    match prompt {
        Prompt::Text(text) => Ok(text.prompt),
        Prompt::Tokens(tokens) => Ok(tokenizer.decode(&tokens.prompt_token_ids)),
        Prompt::Embeds(_) => Err(TeppanError::invalid("Embeds prompts cannot be scored")),
    }
}

impl<E: SteppingEngine> Llm<E> {
    /// Scores every `(text_1, text_2)` pair.
    ///
    /// # Parameters
    ///
    /// * `text_1` - One query, or one query per document
    /// * `text_2` - The documents
    /// * `options` - Truncation, adapters and progress sink
    ///
    /// # Returns
    ///
    /// One [`ScoringOutput`] per document, in document order
    ///
    /// # Errors
    ///
    /// * [`TeppanError::Unsupported`] unless the model is a pooling model
    ///   serving `embed`, or `classify` with a single label
    /// * [`TeppanError::InvalidInput`] if the inputs do not pair up or are empty
    pub async fn score(
        &mut self,
        text_1: impl Into<PromptInput>,
        text_2: impl Into<PromptInput>,
        options: ScoreOptions,
    ) -> Result<Vec<ScoringOutput>> {
        self.require_pooling("score")?;
        let config = self.model_config();
        match config.task {
            Task::Embed => {}
            Task::Classify if config.num_labels == Some(1) => {}
            Task::Classify => {
                return Err(TeppanError::Unsupported(
                    "Score API is only enabled for num_labels == 1.".to_string(),
                ));
            }
            _ => {
                return Err(TeppanError::Unsupported(
                    "Score API is only enabled for models serving the embed or classify task."
                        .to_string(),
                ));
            }
        }

        let tokenizer = self.tokenizer();
        let left = text_1.into().normalize()?
            .into_iter()
            .map(|prompt| score_text(prompt, tokenizer))
            .collect::<Result<Vec<_>>>()?;
        let right = text_2.into().normalize()?
            .into_iter()
            .map(|prompt| score_text(prompt, tokenizer))
            .collect::<Result<Vec<_>>>()?;
        validate_score_input_lens(left.len(), right.len())?;

        if self.model_config().is_cross_encoder {
            self.cross_encoding_score(left, right, options).await
        } else {
            self.embedding_score(left, right, options).await
        }
    }

    async fn embedding_score(
        &mut self,
        left: Vec<String>,
        right: Vec<String>,
        options: ScoreOptions,
    ) -> Result<Vec<ScoringOutput>> {
        let num_left = left.len();
        let prompts: Vec<Prompt> = left.into_iter().chain(right).map(Prompt::text).collect();
        let encode_options = EncodeOptions {
            pooling_params: None,
            truncate_prompt_tokens: options.truncate_prompt_tokens,
            lora_request: Broadcast::One(options.lora_request),
            prompt_adapter_request: options.prompt_adapter_request,
            steer_vector_request: options.steer_vector_request,
            priority: None,
            progress: options.progress,
        };

        let mut embeddings = self.encode(prompts, encode_options).await?;
        let right = embeddings.split_off(num_left);
        let left = embeddings;
        debug!("Comparing {} queries against {} documents", left.len(), right.len());

        // A single query cycles over every document; N queries zip one to one
        left.iter()
            .cycle()
            .zip(&right)
            .map(|(query, document)| pair_score(query, document))
            .collect()
    }

    async fn cross_encoding_score(
        &mut self,
        left: Vec<String>,
        right: Vec<String>,
        options: ScoreOptions,
    ) -> Result<Vec<ScoringOutput>> {
        let tokenization = TokenizationOptions::from_truncation(
            self.model_config().max_model_len,
            options.truncate_prompt_tokens,
        )?;
        let max_length = tokenization.map(|options| options.max_length);

        let tokenizer = self.tokenizer();
        let prompts: Vec<Prompt> = left.iter()
            .cycle()
            .zip(&right)
            .map(|(query, document)| {
                let (prompt_token_ids, token_type_ids) = tokenizer.encode_pair(query, document, max_length);
                Prompt::Tokens(TokensPrompt {
                    prompt_token_ids,
                    token_type_ids,
                    ..Default::default()
                })
            })
            .collect();

        let mut spec = BatchSpec::new(prompts, Broadcast::One(PoolingParams::default().into()));
        spec.lora_request = Broadcast::One(options.lora_request);
        spec.prompt_adapter_request = options.prompt_adapter_request;
        spec.steer_vector_request = options.steer_vector_request;

        let mut progress = progress_or_noop(options.progress);
        let outputs = into_pooling(self.run_batch(spec, progress.as_mut()).await?)?;
        outputs.into_iter()
            .map(|output| {
                let score = output.data.first().copied().ok_or_else(|| TeppanError::UnexpectedOutput {
                    request_id: output.request_id.to_string(),
                    expected: "a score",
                    actual: "empty pooled output",
                })?;
                Ok(ScoringOutput {
                    request_id: output.request_id.to_string(),
                    prompt_token_ids: output.prompt_token_ids,
                    score,
                })
            })
            .collect()
    }
}

fn pair_score(query: &PoolingRequestOutput, document: &PoolingRequestOutput) -> Result<ScoringOutput> {
    let mut prompt_token_ids = query.prompt_token_ids.clone();
    prompt_token_ids.extend_from_slice(&document.prompt_token_ids);
    Ok(ScoringOutput {
        request_id: format!("{}_{}", query.request_id, document.request_id),
        prompt_token_ids,
        score: cosine_similarity(&query.data, &document.data)?,
    })
}

use std::cmp::Ordering;

use crate::engine::Tokenizer;
use crate::error::{Result, TeppanError};
use crate::output::{PositionLogprobs, RequestOutput, SampleLogprobs};
use crate::request::{LoRARequest, MultiModalData, ProcessorKwargs, Prompt, TokenId, TokensPrompt};

/// One candidate sequence of a beam search.
#[derive(Debug, Clone)]
pub struct BeamSearchSequence {
    /// Prompt tokens followed by every generated token
    pub tokens: Vec<TokenId>,
    /// The candidate distribution seen at each generated position
    pub logprobs: SampleLogprobs,
    pub lora_request: Option<LoRARequest>,
    pub cum_logprob: f32,
    /// Filled in once the search finishes
    pub text: Option<String>,
    pub multi_modal_data: Option<MultiModalData>,
    pub mm_processor_kwargs: Option<ProcessorKwargs>,
}

impl BeamSearchSequence {
    /// The continuation request prompt: the full sequence so far.
    pub(crate) fn to_prompt(&self) -> Prompt {
        Prompt::Tokens(TokensPrompt {
            prompt_token_ids: self.tokens.clone(),
            token_type_ids: None,
            multi_modal_data: self.multi_modal_data.clone(),
            mm_processor_kwargs: self.mm_processor_kwargs.clone(),
        })
    }

    fn extend(&self, token: TokenId, logprob: f32, position: &PositionLogprobs) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.push(token);
        let mut logprobs = self.logprobs.clone();
        logprobs.push(position.clone());
        Self {
            tokens,
            logprobs,
            lora_request: self.lora_request.clone(),
            cum_logprob: self.cum_logprob + logprob,
            text: None,
            multi_modal_data: self.multi_modal_data.clone(),
            mm_processor_kwargs: self.mm_processor_kwargs.clone(),
        }
    }
}

/// The result of a beam search for one prompt, best sequence first.
#[derive(Debug, Clone, Default)]
pub struct BeamSearchOutput {
    pub sequences: Vec<BeamSearchSequence>,
}

/// Ranks sequences by length-normalized cumulative log-probability.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BeamScorer {
    eos_token_id: Option<TokenId>,
    length_penalty: f32,
}

impl BeamScorer {
    pub fn new(eos_token_id: Option<TokenId>, length_penalty: f32) -> Self {
        Self { eos_token_id, length_penalty }
    }

    /// `cum_logprob / len^length_penalty`, where a trailing EOS does not count
    /// towards the length.
    pub fn score(&self, sequence: &BeamSearchSequence) -> f32 {
        let mut len = sequence.tokens.len();
        if self.eos_token_id.is_some() && sequence.tokens.last().copied() == self.eos_token_id {
            len -= 1;
        }
        sequence.cum_logprob / (len.max(1) as f32).powf(self.length_penalty)
    }

    /// Sorts best first and keeps at most `beam_width` sequences.
    pub fn keep_best(&self, sequences: &mut Vec<BeamSearchSequence>, beam_width: usize) {
        sequences.sort_by(|a, b| self.compare(b, a));
        sequences.truncate(beam_width);
    }

    fn compare(&self, a: &BeamSearchSequence, b: &BeamSearchSequence) -> Ordering {
        self.score(a).total_cmp(&self.score(b))
    }
}

/// Search state for one prompt.
#[derive(Debug, Clone)]
pub(crate) struct BeamSearchInstance {
    /// Beams still being extended, best first, never more than the beam width
    pub beams: Vec<BeamSearchSequence>,
    /// Beams that emitted EOS
    pub completed: Vec<BeamSearchSequence>,
}

impl BeamSearchInstance {
    /// Starts a search from `prompt`, tokenizing text prompts.
    ///
    /// # Errors
    ///
    /// [`TeppanError::InvalidInput`] for embeds prompts, which have no token ids to extend
    pub fn new(prompt: Prompt, lora_request: Option<LoRARequest>, tokenizer: &dyn Tokenizer) -> Result<Self> {
        let (tokens, multi_modal_data, mm_processor_kwargs) = match prompt {
            Prompt::Text(text) => (
                tokenizer.encode(&text.prompt),
                text.multi_modal_data,
                text.mm_processor_kwargs,
            ),
            Prompt::Tokens(tokens) => (
                tokens.prompt_token_ids,
                tokens.multi_modal_data,
                tokens.mm_processor_kwargs,
            ),
            Prompt::Embeds(_) => {
                return Err(TeppanError::invalid("Beam search needs text or token prompts, got embeds"));
            }
        };
        let root = BeamSearchSequence {
            tokens,
            logprobs: vec![],
            lora_request,
            cum_logprob: 0.0,
            text: None,
            multi_modal_data,
            mm_processor_kwargs,
        };
        Ok(Self { beams: vec![root], completed: vec![] })
    }

    /// Expands every active beam with the candidates the engine reported for
    /// it and prunes back to `beam_width`.
    ///
    /// # Parameters
    ///
    /// * `results` - One output per active beam, in beam order
    /// * `scorer` - Ranking used for pruning
    /// * `beam_width` - Maximum number of active beams kept
    /// * `stop_token` - Candidates ending in this token move to `completed`;
    ///   `None` when EOS is ignored
    pub fn advance(
        &mut self,
        results: &[RequestOutput],
        scorer: &BeamScorer,
        beam_width: usize,
        stop_token: Option<TokenId>,
    ) {
        let beams = std::mem::take(&mut self.beams);
        let mut candidates = vec![];

        for (beam, result) in beams.iter().zip(results) {
            // No distribution means the request ended without a token
            let Some(position) = result.outputs.first()
                .and_then(|completion| completion.logprobs.as_ref())
                .and_then(|logprobs| logprobs.first())
            else {
                continue;
            };

            for (&token, logprob) in position {
                let candidate = beam.extend(token, logprob.logprob, position);
                if stop_token == Some(token) {
                    self.completed.push(candidate);
                } else {
                    candidates.push(candidate);
                }
            }
        }

        scorer.keep_best(&mut candidates, beam_width);
        self.beams = candidates;
    }

    pub fn is_exhausted(&self) -> bool {
        self.beams.is_empty()
    }

    /// Merges active and completed beams, keeps the best `beam_width` and
    /// decodes their text.
    pub fn finish(self, scorer: &BeamScorer, beam_width: usize, tokenizer: &dyn Tokenizer) -> BeamSearchOutput {
        let mut sequences = self.completed;
        sequences.extend(self.beams);
        scorer.keep_best(&mut sequences, beam_width);
        for sequence in sequences.iter_mut() {
            sequence.text = Some(tokenizer.decode(&sequence.tokens));
        }
        BeamSearchOutput { sequences }
    }
}

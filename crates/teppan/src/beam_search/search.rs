use anyhow::anyhow;
use tracing::{debug, warn};

use crate::engine::SteppingEngine;
use crate::error::{Result, TeppanError};
use crate::orchestrator::{into_generation, progress_or_noop, BatchSpec, Llm};
use crate::progress::{NoopProgress, ProgressSink};
use crate::request::{BeamSearchParams, Broadcast, LoRARequest, Prompt};
use super::sequence::{BeamScorer, BeamSearchInstance, BeamSearchOutput};

/// Per-call options for [`Llm::beam_search`].
#[derive(Default)]
pub struct BeamSearchOptions {
    /// One adapter for every prompt, or one per prompt. Fixed for the whole search.
    pub lora_request: Broadcast<Option<LoRARequest>>,
    /// Tracks search steps, not finished prompts
    pub progress: Option<Box<dyn ProgressSink>>,
}

impl<E: SteppingEngine> Llm<E> {
    /// Runs a beam search for every prompt.
    ///
    /// All prompts advance in lock step. Each step submits one single-token
    /// request per active beam as one batch, then expands every beam into the
    /// candidates the engine reported and keeps the best `beam_width` per
    /// prompt. Beams ending in EOS are set aside as completed unless
    /// `ignore_eos` is set. The search stops after `max_tokens` steps or as
    /// soon as no prompt has an active beam left.
    ///
    /// # Parameters
    ///
    /// * `prompts` - Text prompts are tokenized first; embeds prompts are rejected
    /// * `params` - Beam width, step limit, temperature and length penalty
    /// * `options` - Adapters and progress sink
    ///
    /// # Returns
    ///
    /// One [`BeamSearchOutput`] per prompt, in prompt order, holding at most
    /// `beam_width` sequences best first
    ///
    /// # Errors
    ///
    /// * [`TeppanError::InvalidInput`] for invalid params or embeds prompts
    /// * [`TeppanError::ShapeMismatch`] if the adapter list does not match the prompts
    /// * [`TeppanError::Engine`] if the engine fails during any step
    pub async fn beam_search(
        &mut self,
        prompts: Vec<Prompt>,
        params: BeamSearchParams,
        options: BeamSearchOptions,
    ) -> Result<Vec<BeamSearchOutput>> {
        self.require_generation()?;
        params.verify()?;
        let lora_requests = options.lora_request.resolve("lora_request", prompts.len())?;

        let tokenizer = self.shared_tokenizer();
        let eos_token_id = tokenizer.eos_token_id();
        let stop_token = if params.ignore_eos { None } else { eos_token_id };
        let scorer = BeamScorer::new(eos_token_id, params.length_penalty);
        let step_params = params.step_params();

        let mut instances = prompts.into_iter()
            .zip(lora_requests)
            .map(|(prompt, lora_request)| BeamSearchInstance::new(prompt, lora_request, tokenizer.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        if options.progress.is_some() {
            warn!(
                "The progress bar shows the upper bound on token steps and may finish early \
                 due to stopping conditions. It does not reflect instance-level progress."
            );
        }
        let mut progress = progress_or_noop(options.progress);
        progress.start("Beam search", params.max_tokens);

        for step in 0..params.max_tokens {
            let mut prompts = vec![];
            let mut lora_requests = vec![];
            let mut ranges = Vec::with_capacity(instances.len());
            for instance in instances.iter() {
                let start = prompts.len();
                for beam in instance.beams.iter() {
                    prompts.push(beam.to_prompt());
                    lora_requests.push(beam.lora_request.clone());
                }
                ranges.push(start..prompts.len());
            }
            if prompts.is_empty() {
                debug!("Every beam finished after {} steps", step);
                break;
            }

            let num_beams = prompts.len();
            let mut spec = BatchSpec::new(prompts, Broadcast::One(step_params.clone().into()));
            spec.lora_request = Broadcast::Each(lora_requests);
            let outputs = into_generation(self.run_batch(spec, &mut NoopProgress).await?)?;
            if outputs.len() != num_beams {
                return Err(TeppanError::Engine(anyhow!(
                    "engine finished {} of {} beam requests", outputs.len(), num_beams
                )));
            }

            for (instance, range) in instances.iter_mut().zip(ranges) {
                if !range.is_empty() {
                    instance.advance(&outputs[range], &scorer, params.beam_width, stop_token);
                }
            }
            debug!(
                "Beam search step {}: {} active beams, {} prompts exhausted",
                step,
                instances.iter().map(|instance| instance.beams.len()).sum::<usize>(),
                instances.iter().filter(|instance| instance.is_exhausted()).count(),
            );
            progress.advance(1);
        }
        progress.close();

        Ok(instances.into_iter()
            .map(|instance| instance.finish(&scorer, params.beam_width, tokenizer.as_ref()))
            .collect())
    }
}

use tracing::info;

use crate::request::{EngineRequest, Prompt};

/// Logs every request handed to the engine.
///
/// Prompt text and prompt token ids are cut to `max_log_len` characters /
/// tokens when a limit is set.
#[derive(Debug, Clone, Default)]
pub struct RequestLogger {
    max_log_len: Option<usize>,
}

impl RequestLogger {
    pub fn new(max_log_len: Option<usize>) -> Self {
        Self { max_log_len }
    }

    pub fn log_inputs(&self, request: &EngineRequest) {
        let prompt = request.prompt();
        let text = prompt.as_text().map(|text| self.clip_text(text));
        let token_ids = prompt.token_ids().map(|ids| self.clip_ids(ids));
        let embeds_len = match prompt {
            Prompt::Embeds(embeds) => Some(embeds.prompt_embeds.len()),
            _ => None,
        };
        let adapters = request.adapters();

        info!(
            "Received request {}: prompt: {:?}, params: {:?}, prompt_token_ids: {:?}, \
             prompt_embeds len: {:?}, lora_request: {:?}, prompt_adapter_request: {:?}, \
             steer_vector_request: {:?}.",
            request.id(),
            text,
            request.params(),
            token_ids,
            embeds_len,
            adapters.lora,
            adapters.prompt_adapter,
            adapters.steer_vector,
        );
    }

    fn clip_text<'a>(&self, text: &'a str) -> &'a str {
        match self.max_log_len {
            Some(limit) => match text.char_indices().nth(limit) {
                Some((byte_index, _)) => &text[..byte_index],
                None => text,
            },
            None => text,
        }
    }

    fn clip_ids<'a>(&self, ids: &'a [u32]) -> &'a [u32] {
        match self.max_log_len {
            Some(limit) => &ids[..ids.len().min(limit)],
            None => ids,
        }
    }
}

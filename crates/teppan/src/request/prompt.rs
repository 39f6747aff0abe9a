use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A vocabulary index
pub type TokenId = u32;

/// Opaque multimodal payload attached to a prompt.
///
/// The orchestrator never looks inside; it only carries the payload from a
/// prompt to every continuation built from it.
#[derive(Clone)]
pub struct MultiModalData(Arc<dyn Any + Send + Sync>);

impl MultiModalData {
    pub fn new<T>(payload: T) -> Self
    where T: Any + Send + Sync
    {
        Self(Arc::new(payload))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Whether both handles point at the same payload.
    pub fn same_payload(&self, other: &MultiModalData) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for MultiModalData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MultiModalData(..)")
    }
}

/// Keyword overrides for the multimodal processor
pub type ProcessorKwargs = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Default)]
pub struct TextPrompt {
    pub prompt: String,
    pub multi_modal_data: Option<MultiModalData>,
    pub mm_processor_kwargs: Option<ProcessorKwargs>,
}

#[derive(Debug, Clone, Default)]
pub struct TokensPrompt {
    pub prompt_token_ids: Vec<TokenId>,
    /// Segment ids, produced when tokenizing text pairs
    pub token_type_ids: Option<Vec<TokenId>>,
    pub multi_modal_data: Option<MultiModalData>,
    pub mm_processor_kwargs: Option<ProcessorKwargs>,
}

#[derive(Debug, Clone, Default)]
pub struct EmbedsPrompt {
    /// One row per input position
    pub prompt_embeds: Vec<Vec<f32>>,
}

/// # Prompt
///
/// One prompt payload. Exactly one representation is populated: raw text,
/// pre-tokenized ids, or pre-computed input embeddings.
#[derive(Debug, Clone)]
pub enum Prompt {
    Text(TextPrompt),
    Tokens(TokensPrompt),
    Embeds(EmbedsPrompt),
}

impl Prompt {
    pub fn text(prompt: impl Into<String>) -> Self {
        Prompt::Text(TextPrompt {
            prompt: prompt.into(),
            ..Default::default()
        })
    }

    pub fn tokens(prompt_token_ids: Vec<TokenId>) -> Self {
        Prompt::Tokens(TokensPrompt {
            prompt_token_ids,
            ..Default::default()
        })
    }

    pub fn embeds(prompt_embeds: Vec<Vec<f32>>) -> Self {
        Prompt::Embeds(EmbedsPrompt { prompt_embeds })
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Prompt::Text(text) => Some(&text.prompt),
            _ => None,
        }
    }

    pub fn token_ids(&self) -> Option<&[TokenId]> {
        match self {
            Prompt::Tokens(tokens) => Some(&tokens.prompt_token_ids),
            _ => None,
        }
    }

    pub fn multi_modal_data(&self) -> Option<&MultiModalData> {
        match self {
            Prompt::Text(text) => text.multi_modal_data.as_ref(),
            Prompt::Tokens(tokens) => tokens.multi_modal_data.as_ref(),
            Prompt::Embeds(_) => None,
        }
    }

    pub fn mm_processor_kwargs(&self) -> Option<&ProcessorKwargs> {
        match self {
            Prompt::Text(text) => text.mm_processor_kwargs.as_ref(),
            Prompt::Tokens(tokens) => tokens.mm_processor_kwargs.as_ref(),
            Prompt::Embeds(_) => None,
        }
    }
}

impl From<&str> for Prompt {
    fn from(value: &str) -> Self {
        Prompt::text(value)
    }
}

impl From<String> for Prompt {
    fn from(value: String) -> Self {
        Prompt::text(value)
    }
}

impl From<Vec<TokenId>> for Prompt {
    fn from(value: Vec<TokenId>) -> Self {
        Prompt::tokens(value)
    }
}

impl From<TextPrompt> for Prompt {
    fn from(value: TextPrompt) -> Self {
        Prompt::Text(value)
    }
}

impl From<TokensPrompt> for Prompt {
    fn from(value: TokensPrompt) -> Self {
        Prompt::Tokens(value)
    }
}

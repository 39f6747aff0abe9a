//! # Input Normalization
//!
//! Callers hand prompts and per-request arguments over in several shapes: a
//! single prompt or a batch, one parameter set for everyone or one per prompt,
//! and a deprecated split form carrying texts and token ids separately. This
//! module turns all of them into one ordered list of prompts and, for every
//! per-request argument, a list of exactly the same length.

use tracing::warn;

use crate::error::{Result, TeppanError};
use super::prompt::{Prompt, TokenId};

/// The prompts of one call.
#[derive(Debug, Clone)]
pub enum PromptInput {
    Single(Prompt),
    Batch(Vec<Prompt>),
    /// Deprecated split form. When both lists are given the texts win.
    Legacy {
        prompts: Option<Vec<String>>,
        prompt_token_ids: Option<Vec<Vec<TokenId>>>,
    },
}

impl PromptInput {
    /// Flattens the input into an ordered list of prompts.
    pub fn normalize(self) -> Result<Vec<Prompt>> {
        match self {
            PromptInput::Single(prompt) => Ok(vec![prompt]),
            PromptInput::Batch(prompts) => Ok(prompts),
            PromptInput::Legacy { prompts, prompt_token_ids } => {
                warn!(
                    "Passing `prompts` and `prompt_token_ids` separately is deprecated; \
                     pass a list of prompts instead"
                );
                convert_legacy(prompts, prompt_token_ids)
            }
        }
    }
}

fn convert_legacy(
    prompts: Option<Vec<String>>,
    prompt_token_ids: Option<Vec<Vec<TokenId>>>,
) -> Result<Vec<Prompt>> {
    match (prompts, prompt_token_ids) {
        (None, None) => Err(TeppanError::invalid(
            "Either prompts or prompt_token_ids must be provided.",
        )),
        (Some(texts), Some(ids)) if texts.len() != ids.len() => Err(TeppanError::invalid(
            "The lengths of prompts and prompt_token_ids must be the same.",
        )),
        (Some(texts), _) => Ok(texts.into_iter().map(Prompt::text).collect()),
        (None, Some(ids)) => Ok(ids.into_iter().map(Prompt::tokens).collect()),
    }
}

impl From<Prompt> for PromptInput {
    fn from(value: Prompt) -> Self {
        PromptInput::Single(value)
    }
}

impl From<Vec<Prompt>> for PromptInput {
    fn from(value: Vec<Prompt>) -> Self {
        PromptInput::Batch(value)
    }
}

impl From<&str> for PromptInput {
    fn from(value: &str) -> Self {
        PromptInput::Single(Prompt::text(value))
    }
}

impl From<String> for PromptInput {
    fn from(value: String) -> Self {
        PromptInput::Single(Prompt::text(value))
    }
}

impl From<Vec<&str>> for PromptInput {
    fn from(value: Vec<&str>) -> Self {
        PromptInput::Batch(value.into_iter().map(Prompt::text).collect())
    }
}

impl From<Vec<String>> for PromptInput {
    fn from(value: Vec<String>) -> Self {
        PromptInput::Batch(value.into_iter().map(Prompt::text).collect())
    }
}

/// A per-request argument: one value for every prompt, or one value each.
#[derive(Debug, Clone, PartialEq)]
pub enum Broadcast<T> {
    One(T),
    Each(Vec<T>),
}

impl<T: Clone> Broadcast<T> {
    /// Expands to exactly `n` values.
    ///
    /// # Parameters
    ///
    /// * `argument` - Name of the argument, used in the shape error
    /// * `n` - Number of prompts in the call
    pub fn resolve(self, argument: &'static str, n: usize) -> Result<Vec<T>> {
        match self {
            Broadcast::One(value) => Ok(vec![value; n]),
            Broadcast::Each(values) if values.len() == n => Ok(values),
            Broadcast::Each(values) => Err(TeppanError::shape(argument, n, values.len())),
        }
    }

    /// Checks the shape against `n` without expanding.
    pub fn check_len(&self, argument: &'static str, n: usize) -> Result<()> {
        match self {
            Broadcast::Each(values) if values.len() != n => {
                Err(TeppanError::shape(argument, n, values.len()))
            }
            _ => Ok(()),
        }
    }

    /// Applies a fallible conversion to every value, keeping the shape.
    pub fn try_map<U, F>(self, mut f: F) -> Result<Broadcast<U>>
    where F: FnMut(T) -> Result<U>
    {
        match self {
            Broadcast::One(value) => Ok(Broadcast::One(f(value)?)),
            Broadcast::Each(values) => values.into_iter()
                .map(f)
                .collect::<Result<Vec<_>>>()
                .map(Broadcast::Each),
        }
    }
}

impl<T> Default for Broadcast<Option<T>> {
    fn default() -> Self {
        Broadcast::One(None)
    }
}

/// Checks an optional priority list against `n` and expands it, defaulting to `0`.
pub(crate) fn resolve_priorities(priority: Option<Vec<i32>>, n: usize) -> Result<Vec<i32>> {
    match priority {
        None => Ok(vec![0; n]),
        Some(values) if values.len() == n => Ok(values),
        Some(values) => Err(TeppanError::shape("priority", n, values.len())),
    }
}

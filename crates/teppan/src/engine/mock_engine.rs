use std::collections::BTreeMap;
use anyhow::anyhow;
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::config::ModelConfig;
use crate::counter::RequestId;
use crate::engine::{SteppingEngine, Tokenizer};
use crate::output::{CompletionOutput, EngineOutput, FinishReason, Logprob, PoolingRequestOutput, RequestOutput};
use crate::request::{EngineRequest, Prompt, RequestParams, SamplingParams, TokenId};

pub(crate) const EOS: TokenId = 0;
pub(crate) const SEP: TokenId = 1;

type NextTokens = dyn Fn(&[TokenId]) -> Vec<(TokenId, f32)> + Send + Sync;
type Ticks = dyn Fn(&EngineRequest) -> usize + Send + Sync;
type Pooler = dyn Fn(&[TokenId]) -> Vec<f32> + Send + Sync;
type Aborts = dyn Fn(&[TokenId]) -> bool + Send + Sync;

// Character-level tokenizer: one token per char, EOS is the NUL char
pub(crate) struct MockTokenizer;

impl Tokenizer for MockTokenizer {
    fn encode(&self, text: &str) -> Vec<TokenId> {
        text.chars().map(|c| c as TokenId).collect()
    }

    fn encode_pair(&self, text: &str, text_pair: &str, max_length: Option<usize>) -> (Vec<TokenId>, Option<Vec<TokenId>>) {
        let first = self.encode(text);
        let second = self.encode(text_pair);
        let mut ids = first.clone();
        ids.push(SEP);
        ids.extend(second.iter().copied());
        let mut types = vec![0; first.len() + 1];
        types.extend(std::iter::repeat_n(1, second.len()));
        if let Some(max_length) = max_length {
            ids.truncate(max_length);
            types.truncate(max_length);
        }
        (ids, Some(types))
    }

    fn decode(&self, token_ids: &[TokenId]) -> String {
        token_ids.iter()
            .filter(|id| **id != EOS && **id != SEP)
            .filter_map(|id| char::from_u32(*id))
            .collect()
    }

    fn eos_token_id(&self) -> Option<TokenId> {
        Some(EOS)
    }
}

#[derive(Default)]
pub(crate) struct MockState {
    pub(crate) submitted: Vec<EngineRequest>,
    running: Vec<(EngineRequest, usize)>,
    pub(crate) steps: usize,
}

// A scripted engine: each request finishes after a configurable number of
// ticks, generating greedily from a scripted next-token distribution
pub(crate) struct MockEngine {
    config: ModelConfig,
    next_tokens: Box<NextTokens>,
    ticks: Box<Ticks>,
    pooler: Box<Pooler>,
    aborts: Box<Aborts>,
    rejects: Box<Aborts>,
    fail_on_step: Option<usize>,
    pub(crate) state: Mutex<MockState>,
}

impl MockEngine {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            next_tokens: Box::new(|context: &[TokenId]| {
                let last = context.last().copied().unwrap_or(SEP);
                vec![(last + 1, -0.1), (last + 2, -0.7), (last + 3, -1.5), (last + 4, -2.5)]
            }),
            ticks: Box::new(|_| 1),
            pooler: Box::new(|tokens: &[TokenId]| vec![tokens.len() as f32, 1.0]),
            aborts: Box::new(|_| false),
            rejects: Box::new(|_| false),
            fail_on_step: None,
            state: Mutex::new(MockState::default()),
        }
    }

    pub fn with_next_tokens<F>(mut self, f: F) -> Self
    where F: Fn(&[TokenId]) -> Vec<(TokenId, f32)> + Send + Sync + 'static
    {
        self.next_tokens = Box::new(f);
        self
    }

    pub fn with_ticks<F>(mut self, f: F) -> Self
    where F: Fn(&EngineRequest) -> usize + Send + Sync + 'static
    {
        self.ticks = Box::new(f);
        self
    }

    pub fn with_pooler<F>(mut self, f: F) -> Self
    where F: Fn(&[TokenId]) -> Vec<f32> + Send + Sync + 'static
    {
        self.pooler = Box::new(f);
        self
    }

    pub fn with_aborts<F>(mut self, f: F) -> Self
    where F: Fn(&[TokenId]) -> bool + Send + Sync + 'static
    {
        self.aborts = Box::new(f);
        self
    }

    pub fn with_rejects<F>(mut self, f: F) -> Self
    where F: Fn(&[TokenId]) -> bool + Send + Sync + 'static
    {
        self.rejects = Box::new(f);
        self
    }

    pub fn failing_on_step(mut self, step: usize) -> Self {
        self.fail_on_step = Some(step);
        self
    }

    pub async fn submitted(&self) -> Vec<EngineRequest> {
        self.state.lock().await.submitted.clone()
    }

    pub async fn steps(&self) -> usize {
        self.state.lock().await.steps
    }

    pub fn ranked(&self, context: &[TokenId]) -> Vec<(TokenId, f32)> {
        let mut candidates = (self.next_tokens)(context);
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
        candidates
    }

    fn prompt_tokens(prompt: &Prompt) -> Vec<TokenId> {
        match prompt {
            Prompt::Text(text) => MockTokenizer.encode(&text.prompt),
            Prompt::Tokens(tokens) => tokens.prompt_token_ids.clone(),
            Prompt::Embeds(embeds) => vec![SEP; embeds.prompt_embeds.len()],
        }
    }

    fn generate(&self, request: &EngineRequest, params: &SamplingParams) -> RequestOutput {
        let prompt_token_ids = Self::prompt_tokens(request.prompt());
        let mut context = prompt_token_ids.clone();
        let mut completion = CompletionOutput {
            index: 0,
            text: String::new(),
            token_ids: vec![],
            cumulative_logprob: Some(0.0),
            logprobs: params.logprobs.map(|_| vec![]),
            finish_reason: Some(FinishReason::Length),
        };

        if (self.aborts)(&prompt_token_ids) {
            completion.logprobs = None;
            completion.cumulative_logprob = None;
            completion.finish_reason = Some(FinishReason::Abort);
        } else {
            for _ in 0..params.max_tokens.unwrap_or(1) {
                let ranked = self.ranked(&context);
                let Some(&(token, logprob)) = ranked.first() else {
                    break;
                };
                if let (Some(k), Some(positions)) = (params.logprobs, completion.logprobs.as_mut()) {
                    let position: BTreeMap<TokenId, Logprob> = ranked.iter()
                        .take(k)
                        .enumerate()
                        .map(|(rank, (id, lp))| (*id, Logprob { logprob: *lp, rank: Some(rank + 1), decoded_token: None }))
                        .collect();
                    positions.push(position);
                }
                completion.token_ids.push(token);
                completion.cumulative_logprob = completion.cumulative_logprob.map(|c| c + logprob);
                context.push(token);
                if token == EOS && !params.ignore_eos {
                    completion.finish_reason = Some(FinishReason::Stop);
                    break;
                }
            }
        }
        completion.text = MockTokenizer.decode(&completion.token_ids);

        RequestOutput {
            request_id: request.id(),
            prompt: request.prompt().as_text().map(str::to_string),
            prompt_token_ids,
            outputs: vec![completion],
            finished: true,
        }
    }

    fn finish(&self, request: &EngineRequest) -> EngineOutput {
        match request.params() {
            RequestParams::Sampling(params) => EngineOutput::Generation(self.generate(request, params)),
            RequestParams::Pooling(_) => {
                let prompt_token_ids = Self::prompt_tokens(request.prompt());
                EngineOutput::Pooling(PoolingRequestOutput {
                    request_id: request.id(),
                    data: (self.pooler)(&prompt_token_ids),
                    prompt_token_ids,
                    finished: true,
                })
            }
        }
    }

    fn in_progress(request: &EngineRequest) -> EngineOutput {
        EngineOutput::Generation(RequestOutput {
            request_id: request.id(),
            prompt: None,
            prompt_token_ids: vec![],
            outputs: vec![],
            finished: false,
        })
    }
}

#[async_trait]
impl SteppingEngine for MockEngine {
    fn model_config(&self) -> &ModelConfig {
        &self.config
    }

    async fn add_request(&self, request: EngineRequest) -> anyhow::Result<()> {
        if (self.rejects)(&Self::prompt_tokens(request.prompt())) {
            return Err(anyhow!("simulated rejection of request {}", request.id()));
        }
        let ticks = (self.ticks)(&request).max(1);
        let mut state = self.state.lock().await;
        state.submitted.push(request.clone());
        state.running.push((request, ticks));
        Ok(())
    }

    async fn step(&self) -> anyhow::Result<Vec<EngineOutput>> {
        let mut state = self.state.lock().await;
        state.steps += 1;
        if self.fail_on_step == Some(state.steps) {
            return Err(anyhow!("simulated engine failure on step {}", state.steps));
        }

        let mut outputs = vec![];
        for (request, remaining) in state.running.iter_mut() {
            *remaining -= 1;
            if *remaining == 0 {
                outputs.push(self.finish(request));
            } else {
                outputs.push(Self::in_progress(request));
            }
        }
        state.running.retain(|(_, remaining)| *remaining > 0);
        // Report the most recently submitted requests first
        outputs.reverse();
        Ok(outputs)
    }

    async fn has_unfinished_requests(&self) -> bool {
        !self.state.lock().await.running.is_empty()
    }

    async fn num_unfinished_requests(&self) -> usize {
        self.state.lock().await.running.len()
    }
}

pub(crate) fn ids(outputs: &[EngineOutput]) -> Vec<RequestId> {
    outputs.iter().map(EngineOutput::request_id).collect()
}

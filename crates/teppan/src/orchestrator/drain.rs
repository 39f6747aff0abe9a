//! # Engine Drain
//!
//! Steps the engine until it has no unfinished requests and collects every
//! finished output. Outputs are yielded by [`finished_outputs`] in the order
//! the engine reports them; [`run_engine`] sorts them back into submission
//! order.

use std::collections::VecDeque;
use std::time::Instant;
use futures::stream::{self, Stream, TryStreamExt};
use tracing::debug;

use crate::engine::SteppingEngine;
use crate::error::{Result, TeppanError};
use crate::output::{EngineOutput, PoolingRequestOutput, RequestOutput};
use crate::progress::ProgressSink;

struct DrainState<'a, E: ?Sized> {
    engine: &'a E,
    ready: VecDeque<EngineOutput>,
    progress: &'a mut dyn ProgressSink,
    started: Instant,
    input_tokens: usize,
    output_tokens: usize,
}

impl<E: ?Sized> DrainState<'_, E> {
    fn record(&mut self, output: &EngineOutput) {
        match output {
            EngineOutput::Generation(output) => {
                self.input_tokens += output.num_input_tokens();
                self.output_tokens += output.num_output_tokens();
                let elapsed = self.started.elapsed().as_secs_f64().max(f64::EPSILON);
                self.progress.set_postfix(&format!(
                    "est. speed input: {:.2} toks/s, output: {:.2} toks/s",
                    self.input_tokens as f64 / elapsed,
                    self.output_tokens as f64 / elapsed,
                ));
                self.progress.advance(output.outputs.len());
            }
            EngineOutput::Pooling(_) => self.progress.advance(1),
        }
    }
}

async fn next_finished<E>(mut state: DrainState<'_, E>) -> Result<Option<(EngineOutput, DrainState<'_, E>)>>
where E: SteppingEngine + ?Sized
{
    loop {
        if let Some(output) = state.ready.pop_front() {
            state.record(&output);
            return Ok(Some((output, state)));
        }
        if !state.engine.has_unfinished_requests().await {
            return Ok(None);
        }
        let step_outputs = state.engine.step().await?;
        state.ready.extend(step_outputs.into_iter().filter(EngineOutput::finished));
    }
}

/// Yields every finished output until the engine runs dry.
///
/// Unfinished status updates are dropped. An engine error ends the stream
/// with that error.
///
/// # Parameters
///
/// * `engine` - Engine to step
/// * `progress` - Advanced by one per finished completion
pub(crate) fn finished_outputs<'a, E>(
    engine: &'a E,
    progress: &'a mut dyn ProgressSink,
) -> impl Stream<Item = Result<EngineOutput>> + 'a
where E: SteppingEngine + ?Sized
{
    let state = DrainState {
        engine,
        ready: VecDeque::new(),
        progress,
        started: Instant::now(),
        input_tokens: 0,
        output_tokens: 0,
    };
    stream::try_unfold(state, |state| next_finished(state))
}

/// Drains the engine and returns its finished outputs sorted by request id.
pub(crate) async fn run_engine<E>(engine: &E, progress: &mut dyn ProgressSink) -> Result<Vec<EngineOutput>>
where E: SteppingEngine + ?Sized
{
    let pending = engine.num_unfinished_requests().await;
    debug!("Draining engine with {} unfinished requests", pending);
    progress.start("Processed prompts", pending);
    progress.set_postfix("est. speed input: 0.00 toks/s, output: 0.00 toks/s");

    let collected = finished_outputs(engine, &mut *progress)
        .try_collect::<Vec<_>>()
        .await;
    progress.close();

    let mut outputs = collected?;
    // Requests can finish in any order
    outputs.sort_by_key(EngineOutput::request_id);
    Ok(outputs)
}

/// Checks that every output came from a generation request.
pub(crate) fn into_generation(outputs: Vec<EngineOutput>) -> Result<Vec<RequestOutput>> {
    outputs.into_iter()
        .map(|output| match output {
            EngineOutput::Generation(output) => Ok(output),
            other => Err(unexpected(&other, "RequestOutput")),
        })
        .collect()
}

/// Checks that every output came from a pooling request.
pub(crate) fn into_pooling(outputs: Vec<EngineOutput>) -> Result<Vec<PoolingRequestOutput>> {
    outputs.into_iter()
        .map(|output| match output {
            EngineOutput::Pooling(output) => Ok(output),
            other => Err(unexpected(&other, "PoolingRequestOutput")),
        })
        .collect()
}

fn unexpected(output: &EngineOutput, expected: &'static str) -> TeppanError {
    TeppanError::UnexpectedOutput {
        request_id: output.request_id().to_string(),
        expected,
        actual: output.kind(),
    }
}

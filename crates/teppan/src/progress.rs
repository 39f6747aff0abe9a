//! # Progress Reporting
//!
//! Long calls can report progress through a caller-supplied [`ProgressSink`].
//! Reporting is cosmetic: nothing the sink does can change which requests are
//! submitted or the order results come back in.

use tracing::info;

pub trait ProgressSink: Send {
    /// Begins a new phase of `total` units.
    fn start(&mut self, description: &str, total: usize);

    fn advance(&mut self, n: usize);

    /// Replaces the free-form status text shown next to the count.
    fn set_postfix(&mut self, postfix: &str);

    fn close(&mut self);
}

/// Discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn start(&mut self, _description: &str, _total: usize) {}

    fn advance(&mut self, _n: usize) {}

    fn set_postfix(&mut self, _postfix: &str) {}

    fn close(&mut self) {}
}

/// Reports progress as `tracing` events.
///
/// An event is emitted every `every` units and when a phase closes.
#[derive(Debug, Clone)]
pub struct LogProgress {
    description: String,
    total: usize,
    done: usize,
    postfix: String,
    every: usize,
}

impl LogProgress {
    pub fn new(every: usize) -> Self {
        Self {
            description: String::new(),
            total: 0,
            done: 0,
            postfix: String::new(),
            every: every.max(1),
        }
    }

    pub fn done(&self) -> usize {
        self.done
    }

    pub fn postfix(&self) -> &str {
        &self.postfix
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::new(1)
    }
}

impl ProgressSink for LogProgress {
    fn start(&mut self, description: &str, total: usize) {
        self.description = description.to_string();
        self.total = total;
        self.done = 0;
        self.postfix.clear();
    }

    fn advance(&mut self, n: usize) {
        let before = self.done / self.every;
        self.done += n;
        if self.done / self.every != before {
            info!(
                "{}: {}/{} {}",
                self.description, self.done, self.total, self.postfix
            );
        }
    }

    fn set_postfix(&mut self, postfix: &str) {
        self.postfix = postfix.to_string();
    }

    fn close(&mut self) {
        info!(
            "{}: finished {}/{} {}",
            self.description, self.done, self.total, self.postfix
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_progress_counts() {
        let mut progress = LogProgress::new(2);
        progress.start("Adding requests", 3);
        progress.advance(1);
        progress.advance(2);
        progress.set_postfix("est. speed input: 0.00 toks/s");
        assert_eq!(progress.done(), 3);
        assert_eq!(progress.postfix(), "est. speed input: 0.00 toks/s");

        progress.start("Processed prompts", 3);
        assert_eq!(progress.done(), 0);
        assert!(progress.postfix().is_empty());
        progress.close();
    }
}

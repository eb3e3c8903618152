use async_trait::async_trait;
use errors::UpstreamFailure;
use gw_core::{Commentary, CommentaryRequest, InferenceBackend};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// One scripted reaction of a [`ScriptedBackend`].
#[derive(Debug, Clone)]
pub enum Step {
    Reply(Commentary),
    Fail(UpstreamFailure),
    /// Reply after sleeping on the tokio clock.
    Delayed(Duration, Commentary),
    /// Never complete; the caller's timeout must fire.
    Hang
}

/// Backend that replays a script and records every request.
///
/// Once the script is exhausted it falls back to `fallback`, which defaults
/// to a fixed commentary.
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Step>>,
    fallback: Step,
    calls: AtomicUsize,
    requests: Mutex<Vec<CommentaryRequest>>
}

impl ScriptedBackend {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            script: Mutex::new(steps.into_iter().collect()),
            fallback: Step::Reply(sample_commentary()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new())
        }
    }

    /// Always replies with the same commentary.
    pub fn always_ok() -> Self {
        Self::new([])
    }

    /// Fails `times` times with `failure`, then replies.
    pub fn failing_then_ok(times: usize, failure: UpstreamFailure) -> Self {
        Self::new(std::iter::repeat_n(Step::Fail(failure), times))
    }

    /// Repeats `step` for every call.
    pub fn always(step: Step) -> Self {
        Self::new([]).with_fallback(step)
    }

    pub fn with_fallback(mut self, step: Step) -> Self {
        self.fallback = step;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<CommentaryRequest> {
        self.requests.lock().clone()
    }

    fn next_step(&self) -> Step {
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl InferenceBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &CommentaryRequest) -> Result<Commentary, UpstreamFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        match self.next_step() {
            Step::Reply(commentary) => Ok(commentary),
            Step::Fail(failure) => Err(failure),
            Step::Delayed(delay, commentary) => {
                tokio::time::sleep(delay).await;
                Ok(commentary)
            }
            Step::Hang => std::future::pending().await
        }
    }
}

/// Backend whose calls never complete.
#[derive(Default)]
pub struct PendingBackend {
    calls: AtomicUsize
}

impl PendingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InferenceBackend for PendingBackend {
    fn name(&self) -> &str {
        "pending"
    }

    async fn generate(&self, _request: &CommentaryRequest) -> Result<Commentary, UpstreamFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}

pub fn sample_commentary() -> Commentary {
    Commentary::new(
        "Higher policy rates are strengthening the currency while cooling asset prices.",
        "scripted-model"
    )
}

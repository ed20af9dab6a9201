//! Bounded-parallel driver that executes invocations through a pluggable engine.

use crate::engine::{AcvpEngine, InvocationResult};
use crate::invocation::Invocation;
use crate::model::{CaseKey, TestFamily};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use tracing::debug;

/// A finished invocation, tagged with the case it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub family: TestFamily,
    pub key: CaseKey,
    pub result: InvocationResult,
}

/// Fixed-size worker pool over one batch of invocations.
pub struct Runner<'e, E: AcvpEngine> {
    engine: &'e E,
    concurrency: usize,
}

impl<'e, E: AcvpEngine> Runner<'e, E> {
    /// `concurrency` is clamped to at least one worker.
    pub fn new(engine: &'e E, concurrency: usize) -> Self {
        Self {
            engine,
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Execute every invocation exactly once and hand each completion to
    /// `on_completion` on the calling thread as soon as it arrives.
    /// Completion order is unspecified. Returns the number delivered.
    pub fn run<F>(&self, invocations: &[Invocation], mut on_completion: F) -> usize
    where
        F: FnMut(Completion),
    {
        if invocations.is_empty() {
            return 0;
        }

        let workers = self.concurrency.min(invocations.len());
        let next = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel::<Completion>();
        let mut delivered = 0;

        debug!(
            invocations = invocations.len(),
            workers, "dispatching batch"
        );

        thread::scope(|scope| {
            for _ in 0..workers {
                let tx = tx.clone();
                let next = &next;
                scope.spawn(move || loop {
                    let idx = next.fetch_add(1, Ordering::Relaxed);
                    let Some(invocation) = invocations.get(idx) else {
                        return;
                    };
                    debug!(key = %invocation.key, family = %invocation.family, "executing");
                    let result = self.engine.execute(invocation);
                    let completion = Completion {
                        family: invocation.family,
                        key: invocation.key,
                        result,
                    };
                    if tx.send(completion).is_err() {
                        return;
                    }
                });
            }
            // Workers hold the remaining senders; the loop ends when the last one finishes.
            drop(tx);

            for completion in rx {
                delivered += 1;
                on_completion(completion);
            }
        });

        delivered
    }

    /// Like [`Runner::run`] but gathers the completions instead of streaming them.
    pub fn run_collect(&self, invocations: &[Invocation]) -> Vec<Completion> {
        let mut completions = Vec::with_capacity(invocations.len());
        self.run(invocations, |completion| completions.push(completion));
        completions
    }
}

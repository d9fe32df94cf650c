//! Optimistic Mutation Layer
//!
//! Every user action runs through the same sequence: snapshot and
//! speculatively update local state, call the remote action, then confirm
//! on success or roll the snapshot back on failure. The runner owns the
//! pending flag and surfaces failures through a `Notifier`; errors never
//! escape a dispatched mutation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{DomainError, DomainResult};

/// User-facing notification sink (the toast layer of the hosting UI)
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// Default sink: routes notifications to the log
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn success(&self, message: &str) {
        log::info!("{message}");
    }

    fn error(&self, message: &str) {
        log::error!("{message}");
    }
}

/// One optimistic create/update/delete flow
#[async_trait]
pub trait OptimisticMutation: Send + Sync {
    type Input: Send + Sync;
    type Output: Send;
    /// Rollback context captured before the remote call (snapshots,
    /// synthesized temp ids)
    type Context: Send;

    /// Short verb phrase for logs and failure notices, e.g. "send message"
    fn describe(&self) -> &'static str;

    /// Runs synchronously before the network call: capture the snapshot
    /// and apply the speculative local update
    fn on_mutate(&self, input: &Self::Input) -> DomainResult<Self::Context>;

    /// The remote action
    async fn execute(&self, input: &Self::Input) -> DomainResult<Self::Output>;

    /// Roll local state back to the captured snapshot
    fn on_error(&self, input: &Self::Input, context: Self::Context, error: &DomainError);

    /// Confirm the speculative update: merge the server record in place
    /// of the optimistic entry and/or invalidate dependent collections
    fn on_success(&self, input: &Self::Input, context: Self::Context, output: &Self::Output);

    /// Runs after settlement regardless of outcome
    fn on_settled(&self, _input: &Self::Input) {}

    fn failure_notice(&self) -> String {
        format!("Failed to {}", self.describe())
    }
}

/// Drives a mutation through mutate → execute → settle
pub struct MutationRunner<M: OptimisticMutation> {
    mutation: M,
    notifier: Arc<dyn Notifier>,
    pending: AtomicBool,
}

impl<M: OptimisticMutation> MutationRunner<M> {
    pub fn new(mutation: M, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            mutation,
            notifier,
            pending: AtomicBool::new(false),
        }
    }

    /// True while a call is in flight
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    /// Run the mutation and return the remote result. On failure local
    /// state has already been rolled back and the user notified.
    pub async fn run(&self, input: M::Input) -> DomainResult<M::Output> {
        self.pending.store(true, Ordering::SeqCst);

        let result = match self.mutation.on_mutate(&input) {
            Ok(context) => match self.mutation.execute(&input).await {
                Ok(output) => {
                    self.mutation.on_success(&input, context, &output);
                    Ok(output)
                }
                Err(error) => {
                    self.mutation.on_error(&input, context, &error);
                    self.notifier.error(&self.mutation.failure_notice());
                    log::warn!("{} failed: {}", self.mutation.describe(), error);
                    Err(error)
                }
            },
            Err(error) => {
                log::warn!("{} aborted before execute: {}", self.mutation.describe(), error);
                Err(error)
            }
        };

        self.mutation.on_settled(&input);
        self.pending.store(false, Ordering::SeqCst);
        result
    }
}

impl<M> MutationRunner<M>
where
    M: OptimisticMutation + 'static,
    M::Input: 'static,
    M::Output: 'static,
    M::Context: 'static,
{
    /// Fire-and-forget variant; the result is settled and logged inside
    pub fn dispatch(self: &Arc<Self>, input: M::Input) {
        let runner = Arc::clone(self);
        tokio::spawn(async move {
            let _ = runner.run(input).await;
        });
    }
}

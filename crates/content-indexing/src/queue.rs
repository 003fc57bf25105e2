//! Ordered operation queue with a single index writer.
//!
//! Producers append through a bounded channel; one blocking task owns the
//! [`IndexUpdater`] and applies operations strictly in enqueue order. The
//! writer drains whatever is queued, applies it, then commits once, so a
//! burst of operations costs a single commit.
//!
//! In [`QueueMode::Sync`] `enqueue` resolves after the operation has been
//! applied and committed and returns the writer's result. In
//! [`QueueMode::Async`] it resolves once the operation is accepted; writer
//! failures only reach the observer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use content_types::{IndexOperation, NodeId, Settings};

use crate::error::IndexingError;
use crate::observer::{IndexObserver, IndexingErrorEvent};
use crate::updater::{IndexUpdater, UpdateResult};

const DEFAULT_CAPACITY: usize = 1024;
const DEFAULT_MAX_BATCH: usize = 256;

/// When `enqueue` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueueMode {
    /// After the operation is applied and committed
    Sync,
    /// As soon as the operation is queued
    #[default]
    Async,
}

impl QueueMode {
    pub fn from_async_flag(async_queue: bool) -> Self {
        if async_queue {
            QueueMode::Async
        } else {
            QueueMode::Sync
        }
    }
}

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub mode: QueueMode,
    /// Operations buffered before producers wait
    pub capacity: usize,
    /// Most operations applied per commit
    pub max_batch: usize,
    /// Reported with writer errors
    pub index_set_name: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            mode: QueueMode::default(),
            capacity: DEFAULT_CAPACITY,
            max_batch: DEFAULT_MAX_BATCH,
            index_set_name: "ContentIndexSet".to_string(),
        }
    }
}

impl QueueConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            mode: QueueMode::from_async_flag(settings.async_queue),
            index_set_name: settings.index_set_name.clone(),
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, mode: QueueMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

/// Counters since the queue started.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    pub enqueued: u64,
    pub applied: u64,
    pub failed: u64,
    pub commits: u64,
}

#[derive(Debug, Default)]
struct Counters {
    enqueued: AtomicU64,
    applied: AtomicU64,
    failed: AtomicU64,
    commits: AtomicU64,
}

impl Counters {
    fn record(&self, result: &UpdateResult) {
        self.applied
            .fetch_add(result.applied as u64, Ordering::Relaxed);
        self.failed.fetch_add(result.errors as u64, Ordering::Relaxed);
        self.commits
            .fetch_add(result.commits as u64, Ordering::Relaxed);
    }
}

type Ack = oneshot::Sender<Result<(), IndexingError>>;

enum Command {
    Apply(IndexOperation, Option<Ack>),
    Flush(oneshot::Sender<()>),
    Optimize,
    Clear(Ack),
}

/// FIFO of index operations consumed by one writer task.
pub struct IndexOperationQueue {
    sender: Mutex<Option<mpsc::Sender<Command>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    mode: QueueMode,
    counters: Arc<Counters>,
}

impl IndexOperationQueue {
    /// Start the writer task. Must be called within a Tokio runtime.
    pub fn start(
        updater: Arc<dyn IndexUpdater>,
        observer: Arc<dyn IndexObserver>,
        config: QueueConfig,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(config.capacity.max(1));
        let counters = Arc::new(Counters::default());

        info!(
            updater = updater.name(),
            mode = ?config.mode,
            capacity = config.capacity,
            "Starting operation queue"
        );

        let writer = Writer {
            updater,
            observer,
            counters: counters.clone(),
            index_set: config.index_set_name,
            max_batch: config.max_batch.max(1),
        };
        let worker = tokio::task::spawn_blocking(move || writer.run(receiver));

        Self {
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
            mode: config.mode,
            counters,
        }
    }

    pub fn mode(&self) -> QueueMode {
        self.mode
    }

    /// True once `shutdown` has been called.
    pub fn is_closed(&self) -> bool {
        self.sender().is_err()
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            enqueued: self.counters.enqueued.load(Ordering::Relaxed),
            applied: self.counters.applied.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            commits: self.counters.commits.load(Ordering::Relaxed),
        }
    }

    fn sender(&self) -> Result<mpsc::Sender<Command>, IndexingError> {
        self.sender
            .lock()
            .ok()
            .and_then(|guard| guard.as_ref().cloned())
            .ok_or(IndexingError::QueueClosed)
    }

    async fn send(&self, command: Command) -> Result<(), IndexingError> {
        self.sender()?
            .send(command)
            .await
            .map_err(|_| IndexingError::QueueClosed)
    }

    /// Append an operation.
    pub async fn enqueue(&self, operation: IndexOperation) -> Result<(), IndexingError> {
        debug!(
            node_id = %operation.id(),
            kind = operation.kind().as_str(),
            "Enqueue operation"
        );

        self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
        let outcome = match self.mode {
            QueueMode::Async => self.send(Command::Apply(operation, None)).await,
            QueueMode::Sync => {
                let (ack, done) = oneshot::channel();
                match self.send(Command::Apply(operation, Some(ack))).await {
                    Ok(()) => return done.await.map_err(|_| IndexingError::QueueClosed)?,
                    Err(e) => Err(e),
                }
            }
        };
        if outcome.is_err() {
            self.counters.enqueued.fetch_sub(1, Ordering::Relaxed);
        }
        outcome
    }

    /// Wait until everything enqueued so far is applied and committed.
    pub async fn flush(&self) -> Result<(), IndexingError> {
        let (ack, done) = oneshot::channel();
        self.send(Command::Flush(ack)).await?;
        done.await.map_err(|_| IndexingError::QueueClosed)
    }

    /// Ask the writer to merge segments. Does not wait for the merge.
    pub async fn optimize(&self) -> Result<(), IndexingError> {
        self.send(Command::Optimize).await
    }

    /// Remove every document once the operations queued before are applied.
    pub async fn clear(&self) -> Result<(), IndexingError> {
        let (ack, done) = oneshot::channel();
        self.send(Command::Clear(ack)).await?;
        done.await.map_err(|_| IndexingError::QueueClosed)?
    }

    /// Stop accepting operations, drain and commit the queue, release the writer.
    pub async fn shutdown(&self) -> Result<(), IndexingError> {
        let sender = self.sender.lock().ok().and_then(|mut guard| guard.take());
        drop(sender);

        let worker = self.worker.lock().ok().and_then(|mut guard| guard.take());
        if let Some(worker) = worker {
            worker
                .await
                .map_err(|e| IndexingError::Task(format!("writer task failed: {}", e)))?;
            info!(stats = ?self.stats(), "Operation queue shut down");
        }
        Ok(())
    }
}

struct Writer {
    updater: Arc<dyn IndexUpdater>,
    observer: Arc<dyn IndexObserver>,
    counters: Arc<Counters>,
    index_set: String,
    max_batch: usize,
}

impl Writer {
    fn run(self, mut receiver: mpsc::Receiver<Command>) {
        while let Some(first) = receiver.blocking_recv() {
            let mut batch = vec![first];
            while batch.len() < self.max_batch {
                match receiver.try_recv() {
                    Ok(command) => batch.push(command),
                    Err(_) => break,
                }
            }
            self.process(batch);
        }
        debug!(updater = self.updater.name(), "Writer stopped");
    }

    fn report(&self, node_id: Option<NodeId>, error: &IndexingError) {
        let event = IndexingErrorEvent::new(node_id, error.to_string(), self.index_set.as_str());
        self.observer.on_indexing_error(&event);
    }

    fn process(&self, batch: Vec<Command>) {
        let mut result = UpdateResult::new();
        let mut pending: Vec<(Ack, Result<(), IndexingError>)> = Vec::new();
        let mut uncommitted: Vec<NodeId> = Vec::new();
        let mut flushes = Vec::new();
        let mut optimize = false;

        for command in batch {
            match command {
                Command::Apply(operation, ack) => {
                    let outcome = self.updater.apply(&operation);
                    match &outcome {
                        Ok(()) => {
                            result.record_success();
                            uncommitted.push(operation.id());
                        }
                        Err(e) => {
                            result.record_error();
                            self.report(Some(operation.id()), e);
                        }
                    }
                    if let Some(ack) = ack {
                        pending.push((ack, outcome));
                    }
                }
                Command::Flush(done) => flushes.push(done),
                Command::Optimize => optimize = true,
                Command::Clear(ack) => {
                    // Uncommitted adds survive a clear, so settle them first.
                    self.settle(&mut pending, &mut uncommitted, &mut result);
                    let outcome = self.updater.clear().and_then(|()| self.updater.commit());
                    match &outcome {
                        Ok(()) => result.record_commit(),
                        Err(e) => self.report(None, e),
                    }
                    let _ = ack.send(outcome);
                }
            }
        }

        self.settle(&mut pending, &mut uncommitted, &mut result);
        self.counters.record(&result);

        if optimize {
            self.observer.on_optimizing(&self.index_set);
            match self.updater.optimize() {
                Ok(scheduled) => debug!(scheduled, "Optimize requested"),
                Err(e) => self.report(None, &e),
            }
        }

        for done in flushes {
            let _ = done.send(());
        }
    }

    /// Commit the operations applied since the last commit, then answer the
    /// waiting producers.
    ///
    /// A failed commit discards the whole batch: every operation in it is
    /// counted as failed and reported under its own node id.
    fn settle(
        &self,
        pending: &mut Vec<(Ack, Result<(), IndexingError>)>,
        uncommitted: &mut Vec<NodeId>,
        result: &mut UpdateResult,
    ) {
        let commit_error = if uncommitted.is_empty() {
            None
        } else {
            match self.updater.commit() {
                Ok(()) => {
                    result.record_commit();
                    None
                }
                Err(e) => {
                    let message = format!("commit failed: {}", e);
                    result.record_discarded(uncommitted.len());
                    for id in uncommitted.iter() {
                        self.report(Some(*id), &IndexingError::Writer(message.clone()));
                    }
                    Some(message)
                }
            }
        };
        uncommitted.clear();

        for (ack, outcome) in pending.drain(..) {
            let outcome = match (outcome, &commit_error) {
                (Ok(()), Some(message)) => Err(IndexingError::Writer(message.clone())),
                (outcome, _) => outcome,
            };
            let _ = ack.send(outcome);
        }
    }
}

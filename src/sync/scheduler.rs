//! Chunked concurrent execution with per-item timeouts
//!
//! Items run in chunks of `concurrency`. Every item in a chunk is spawned as
//! its own task racing the per-item timeout, and chunk `i + 1` starts only
//! after every task of chunk `i` has settled. A timed-out item's future is
//! dropped; a panicking worker is reported like any other failure.

use std::future::Future;
use std::time::Duration;

use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{DEFAULT_CONCURRENCY, DEFAULT_TIMEOUT_MS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub concurrency: usize,
    pub timeout: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

#[derive(Debug, Error)]
pub enum BatchError<E> {
    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("{0}")]
    Worker(E),

    #[error("worker panicked: {0}")]
    Panicked(String),
}

#[derive(Debug)]
pub struct BatchFailure<I, E> {
    pub item: I,
    pub error: BatchError<E>,
}

#[derive(Debug)]
pub struct BatchOutcome<I, T, E> {
    pub results: Vec<T>,
    pub errors: Vec<BatchFailure<I, E>>,
}

impl<I, T, E> BatchOutcome<I, T, E> {
    pub fn total(&self) -> usize {
        self.results.len() + self.errors.len()
    }
}

/// Runs `worker` over every item, `concurrency` at a time
///
/// Never fails as a whole: each item's success or failure lands in the
/// returned outcome. A `concurrency` of zero is treated as one.
pub async fn process_in_batches<I, T, E, F, Fut>(
    items: Vec<I>,
    worker: F,
    options: BatchOptions,
) -> BatchOutcome<I, T, E>
where
    I: Clone + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    let concurrency = options.concurrency.max(1);
    let mut outcome = BatchOutcome {
        results: Vec::with_capacity(items.len()),
        errors: Vec::new(),
    };

    for (index, chunk) in items.chunks(concurrency).enumerate() {
        debug!(chunk = index, size = chunk.len(), "Starting chunk");

        let handles = chunk.iter().map(|item| {
            let task = worker(item.clone());
            let timeout = options.timeout;
            tokio::spawn(async move {
                match tokio::time::timeout(timeout, task).await {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(err)) => Err(BatchError::Worker(err)),
                    Err(_) => Err(BatchError::Timeout(timeout)),
                }
            })
        });

        let settled = join_all(handles).await;

        for (item, result) in chunk.iter().zip(settled) {
            let result = result.unwrap_or_else(|e| {
                warn!(error = %e, "Batch task panicked");
                Err(BatchError::Panicked(e.to_string()))
            });
            match result {
                Ok(value) => outcome.results.push(value),
                Err(error) => outcome.errors.push(BatchFailure {
                    item: item.clone(),
                    error,
                }),
            }
        }
    }

    outcome
}

//! Chunk coordinator
//!
//! Partitions the link queue into fixed-size chunks and drives the extraction
//! pool chunk by chunk, serialized: the only concurrency lives inside a
//! single chunk's extraction call. A chunk whose extraction call keeps
//! failing is retried with exponential backoff and finally requeued, whole,
//! at the tail of the queue — work is never dropped. Links that keep coming
//! back unresolved are moved to a dead-letter list once they exceed their
//! requeue budget, so a poisoned link cannot cycle forever.

use crate::config::ChunkConfig;
use crate::crawler::pool::ChunkExtractor;
use crate::state::WorkState;
use rand::Rng;
use std::time::Duration;

/// Drives a [`WorkState`] to completion, one chunk at a time
pub struct ChunkCoordinator<E> {
    config: ChunkConfig,
    extractor: E,
}

impl<E: ChunkExtractor> ChunkCoordinator<E> {
    pub fn new(config: ChunkConfig, extractor: E) -> Self {
        Self { config, extractor }
    }

    /// Processes one chunk off the front of the queue
    ///
    /// Returns whether pending work remains, so a driver can checkpoint the
    /// state between chunks. Includes the politeness pause between chunks.
    pub async fn step(&self, state: &mut WorkState) -> bool {
        if state.pending.is_empty() {
            return false;
        }

        let take = self.config.chunk_size.min(state.pending.len());
        let chunk: Vec<String> = state.pending.drain(..take).collect();
        state.chunk_calls += 1;

        let mut attempt: u32 = 0;
        loop {
            match self.extractor.extract_chunk(chunk.clone()).await {
                Ok(outcome) => {
                    tracing::info!(
                        "Chunk of {} resolved: {} records, {} requeued",
                        chunk.len(),
                        outcome.records.len(),
                        outcome.remaining.len()
                    );
                    state.records.extend(outcome.records);
                    for url in outcome.remaining {
                        self.requeue(state, url);
                    }
                    break;
                }
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.config.max_retries_per_chunk {
                        tracing::error!(
                            "Chunk failed after {} attempts, requeueing {} links at tail: {}",
                            attempt,
                            chunk.len(),
                            e
                        );
                        for url in &chunk {
                            self.requeue(state, url.clone());
                        }
                        break;
                    }
                    let backoff =
                        Duration::from_millis(self.config.retry_backoff_base_ms) * 2u32.pow(attempt);
                    tracing::warn!(
                        "Chunk attempt {} failed ({}), retrying in {:?}",
                        attempt,
                        e,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }

        let more = !state.pending.is_empty();
        if more {
            tokio::time::sleep(self.pause_between_chunks()).await;
        }
        more
    }

    /// Processes chunks until the queue is empty
    pub async fn run(&self, state: &mut WorkState) {
        while self.step(state).await {}
        tracing::info!(
            "Coordinator done: {} records, {} unresolved after {} extraction calls",
            state.records.len(),
            state.unresolved.len(),
            state.chunk_calls
        );
    }

    /// Requeues a link at the tail, or dead-letters it once its requeue
    /// budget is spent
    fn requeue(&self, state: &mut WorkState, url: String) {
        let count = state.requeue_counts.entry(url.clone()).or_insert(0);
        *count += 1;
        if *count > self.config.max_link_requeues {
            tracing::warn!("Link exceeded requeue budget, dead-lettering: {}", url);
            state.unresolved.push(url);
        } else {
            state.pending.push_back(url);
        }
    }

    fn pause_between_chunks(&self) -> Duration {
        let ms = rand::thread_rng().gen_range(self.config.pause_min_ms..=self.config.pause_max_ms);
        Duration::from_millis(ms)
    }
}

//! Extraction worker pool
//!
//! Fetches and extracts a batch of item URLs concurrently, capped by an
//! in-flight limit and by the batch time budget. Every input URL is
//! accounted for: it yields either a record or an entry in `remaining`,
//! regardless of task errors or panics.

use crate::config::{FetchConfig, PoolConfig};
use crate::crawler::fetcher::fetch_page;
use crate::extract::{ExtractRule, Record};
use crate::Result;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Result of one batch extraction
#[derive(Debug, Clone, Default)]
pub struct PoolOutcome {
    /// Successfully extracted records, completion order
    pub records: Vec<Record>,
    /// URLs that were not started, failed, or yielded no content
    pub remaining: Vec<String>,
}

/// Seam between the chunk coordinator and the extraction pool
///
/// An `Err` from `extract_chunk` is a chunk-level failure: the coordinator
/// retries the whole chunk with backoff. Per-URL failures are not errors —
/// they come back inside [`PoolOutcome::remaining`].
#[allow(async_fn_in_trait)]
pub trait ChunkExtractor {
    async fn extract_chunk(&self, urls: Vec<String>) -> Result<PoolOutcome>;
}

/// Concurrent fetch+extract over a batch of item URLs
pub struct WorkerPool<R> {
    client: Client,
    rule: Arc<R>,
    fetch_config: FetchConfig,
    config: PoolConfig,
}

impl<R: ExtractRule + 'static> WorkerPool<R> {
    pub fn new(client: Client, rule: Arc<R>, fetch_config: FetchConfig, config: PoolConfig) -> Self {
        Self {
            client,
            rule,
            fetch_config,
            config,
        }
    }

    /// Fetches and extracts every URL in the batch
    ///
    /// Launching stops once the batch time budget has elapsed; URLs not yet
    /// started are returned as remaining. Started tasks are allowed to finish
    /// on their own timeout rather than being aborted mid-flight.
    pub async fn extract_all(&self, urls: Vec<String>) -> PoolOutcome {
        let deadline = Instant::now() + self.config.time_budget();
        let semaphore = Arc::new(Semaphore::new(self.config.max_in_flight as usize));
        let mut join_set = JoinSet::new();

        let mut remaining = Vec::new();
        // Multiset of launched URLs; drained as tasks report back. Whatever
        // is left after the join loop belongs to tasks that panicked.
        let mut in_flight: HashMap<String, usize> = HashMap::new();

        let total = urls.len();
        for url in urls {
            if Instant::now() >= deadline {
                remaining.push(url);
                continue;
            }

            *in_flight.entry(url.clone()).or_insert(0) += 1;
            let semaphore = Arc::clone(&semaphore);
            let client = self.client.clone();
            let rule = Arc::clone(&self.rule);
            let fetch_config = self.fetch_config.clone();

            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let record = match fetch_page(&client, &url, &fetch_config).await {
                    Some(html) => Some(rule.item(&html, &url)),
                    None => None,
                };
                (url, record)
            });
        }

        if !remaining.is_empty() {
            tracing::warn!(
                "Batch time budget reached: {} of {} URLs not started",
                remaining.len(),
                total
            );
        }

        let mut records = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((url, outcome)) => {
                    if let Some(count) = in_flight.get_mut(&url) {
                        *count -= 1;
                        if *count == 0 {
                            in_flight.remove(&url);
                        }
                    }
                    match outcome {
                        Some(record) => records.push(record),
                        None => remaining.push(url),
                    }
                }
                Err(e) => {
                    tracing::error!("Extraction task failed: {}", e);
                }
            }
        }

        // Tasks that never reported back (panic, abort) forfeit their URLs to
        // the remaining list instead of dropping them.
        for (url, count) in in_flight {
            for _ in 0..count {
                remaining.push(url.clone());
            }
        }

        tracing::info!(
            "Batch done: {} records, {} remaining of {} URLs",
            records.len(),
            remaining.len(),
            total
        );

        PoolOutcome { records, remaining }
    }
}

impl<R: ExtractRule + 'static> ChunkExtractor for WorkerPool<R> {
    async fn extract_chunk(&self, urls: Vec<String>) -> Result<PoolOutcome> {
        Ok(self.extract_all(urls).await)
    }
}

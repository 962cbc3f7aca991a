//! Top-level pipeline driver
//!
//! Replays the durable-workflow pattern as an explicit state machine: the
//! orchestrator loads the checkpointed [`PipelineState`], performs the next
//! uncompleted step (one walker invocation, or one chunk), saves the state,
//! and repeats. Re-running with the same task therefore never re-executes a
//! completed step — a finished pipeline just replays its report.

use crate::config::Config;
use crate::crawler::coordinator::ChunkCoordinator;
use crate::crawler::fetcher::build_http_client;
use crate::crawler::pool::WorkerPool;
use crate::crawler::walker::walk;
use crate::extract::{ExtractRule, Record};
use crate::state::{CrawlTask, Phase, PipelineState, WorkState};
use crate::storage::CheckpointStore;
use crate::{regions, Result};
use rand::Rng;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Final aggregated result of a harvest
#[derive(Debug, Clone)]
pub struct HarvestReport {
    /// Every discovered item link, in page-visit order
    pub links: Vec<String>,
    pub pages_scraped: u32,
    pub links_found: usize,
    /// Successfully extracted records
    pub records: Vec<Record>,
    /// Links still unresolved after the full run — never silently dropped
    pub remaining_links: Vec<String>,
    /// Sub-phase invocation counts (observability)
    pub walker_calls: u32,
    pub extractor_calls: u32,
}

/// Drives discovery and extraction to completion, checkpointing every step
pub struct Orchestrator<R, S> {
    config: Config,
    client: Client,
    rule: Arc<R>,
    store: S,
}

impl<R: ExtractRule + 'static, S: CheckpointStore> Orchestrator<R, S> {
    pub fn new(config: Config, rule: Arc<R>, store: S) -> Result<Self> {
        let client = build_http_client(&config.fetch)?;
        Ok(Self {
            config,
            client,
            rule,
            store,
        })
    }

    /// Runs the pipeline for `task`, resuming any checkpointed progress
    ///
    /// Idempotent-resumable: each call continues from the state recorded by
    /// the last completed step. A checkpoint belonging to a different task is
    /// discarded.
    pub async fn run(&self, task: CrawlTask) -> Result<HarvestReport> {
        // Unsupported region is a fatal input error, checked before anything
        // else runs.
        let base_url = regions::base_url(&task.region)?;

        let mut state = match self.store.load()? {
            Some(saved) if saved.task == task => {
                tracing::info!("Resuming from checkpoint (phase {:?})", saved.phase);
                saved
            }
            Some(_) => {
                tracing::warn!("Checkpoint belongs to a different task, starting fresh");
                PipelineState::new(task)
            }
            None => PipelineState::new(task),
        };

        while state.phase == Phase::Discover {
            let Some(cursor) = state.cursor.clone() else {
                // Cursor exhausted; a stale checkpoint can land here.
                self.enter_extract(&mut state);
                self.store.save(&state)?;
                break;
            };

            state.walker_calls += 1;
            let outcome = walk(
                &self.client,
                self.rule.as_ref(),
                cursor,
                &base_url,
                &self.config.walker,
                &self.config.fetch,
            )
            .await;

            state.links.extend(outcome.links);
            state.page_urls.extend(outcome.page_urls);
            state.pages_scraped += outcome.pages_scraped;
            state.cursor = outcome.next_page_url;

            if state.cursor.is_none() {
                tracing::info!(
                    "Discovery complete: {} links across {} pages in {} walker calls",
                    state.links.len(),
                    state.pages_scraped,
                    state.walker_calls
                );
                self.enter_extract(&mut state);
            }
            self.store.save(&state)?;

            if state.phase == Phase::Discover {
                tokio::time::sleep(self.walker_pause()).await;
            }
        }

        if state.phase == Phase::Extract {
            let pool = WorkerPool::new(
                self.client.clone(),
                Arc::clone(&self.rule),
                self.config.fetch.clone(),
                self.config.pool.clone(),
            );
            let coordinator = ChunkCoordinator::new(self.config.chunks.clone(), pool);

            if state.work.is_none() {
                self.enter_extract(&mut state);
            }

            loop {
                let more = match state.work.as_mut() {
                    Some(work) => coordinator.step(work).await,
                    None => false,
                };
                if more {
                    self.store.save(&state)?;
                } else {
                    state.phase = Phase::Done;
                    self.store.save(&state)?;
                    break;
                }
            }
        }

        Ok(Self::report(state))
    }

    /// Seeds extraction work from the discovered link set
    fn enter_extract(&self, state: &mut PipelineState) {
        state.phase = Phase::Extract;
        if state.work.is_none() {
            state.work = Some(WorkState::new(state.links.clone()));
        }
    }

    fn walker_pause(&self) -> Duration {
        let walker = &self.config.walker;
        let ms = rand::thread_rng().gen_range(walker.politeness_min_ms..=walker.politeness_max_ms);
        Duration::from_millis(ms)
    }

    fn report(state: PipelineState) -> HarvestReport {
        let (records, remaining_links, extractor_calls) = match state.work {
            Some(work) => {
                let mut remaining = work.unresolved;
                remaining.extend(work.pending);
                (work.records, remaining, work.chunk_calls)
            }
            None => (Vec::new(), Vec::new(), 0),
        };

        tracing::info!(
            "Harvest done: {} records, {} unresolved; walker called {} times, extractor {} times",
            records.len(),
            remaining_links.len(),
            state.walker_calls,
            extractor_calls
        );

        HarvestReport {
            links_found: state.links.len(),
            links: state.links,
            pages_scraped: state.pages_scraped,
            records,
            remaining_links,
            walker_calls: state.walker_calls,
            extractor_calls,
        }
    }
}

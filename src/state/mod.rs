//! Pipeline state that survives across invocations
//!
//! The whole pipeline runs under externally imposed per-invocation time caps,
//! so everything needed to resume — the pending link queue, accumulated
//! records, the walk cursor — is plain serializable data, checkpointed by the
//! orchestrator after every step.

use crate::extract::Record;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// One crawl invocation's immutable input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlTask {
    /// First listing page to walk
    pub start_url: String,
    /// Region name; resolves to a base URL via the static region table
    pub region: String,
}

/// Which phase of the pipeline the next step belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Walking listing pages to discover item links
    Discover,
    /// Driving the chunk coordinator over the discovered links
    Extract,
    /// Nothing left to do; the report can be replayed
    Done,
}

/// Extraction work owned by the chunk coordinator
///
/// Mutated only by the coordinator. Every link that enters ends up in exactly
/// one of `records` (as its source URL) or `unresolved` — links are requeued,
/// never dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkState {
    /// Links not yet resolved, in processing order
    pub pending: VecDeque<String>,
    /// Successfully extracted records
    pub records: Vec<Record>,
    /// Dead-letter list: links that exceeded their requeue budget
    pub unresolved: Vec<String>,
    /// Times each link has been requeued after a failed resolution
    pub requeue_counts: HashMap<String, u32>,
    /// Extraction calls issued so far (observability)
    pub chunk_calls: u32,
}

impl WorkState {
    pub fn new(links: impl IntoIterator<Item = String>) -> Self {
        Self {
            pending: links.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn is_done(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Full checkpointed pipeline state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    pub task: CrawlTask,
    pub phase: Phase,

    /// Discovered item links in page-visit order; duplicates across pages are
    /// tolerated by construction
    pub links: Vec<String>,
    /// Listing pages visited, in order
    pub page_urls: Vec<String>,
    pub pages_scraped: u32,
    /// Listing page the next walker invocation starts from; None once the
    /// catalog is exhausted
    pub cursor: Option<String>,

    /// Extraction state, present once the Extract phase has been entered
    pub work: Option<WorkState>,

    /// Walker invocations so far (observability)
    pub walker_calls: u32,
}

impl PipelineState {
    pub fn new(task: CrawlTask) -> Self {
        let cursor = Some(task.start_url.clone());
        Self {
            task,
            phase: Phase::Discover,
            links: Vec::new(),
            page_urls: Vec::new(),
            pages_scraped: 0,
            cursor,
            work: None,
            walker_calls: 0,
        }
    }
}

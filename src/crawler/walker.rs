//! Link walker
//!
//! Walks listing pages sequentially, collecting item links until pagination
//! is exhausted or the invocation's time budget expires. Pagination is
//! inherently serial: each page's URL comes from the prior page's response.

use crate::config::{FetchConfig, WalkerConfig};
use crate::crawler::fetcher::fetch_page;
use crate::extract::{ExtractRule, ListingPage};
use rand::Rng;
use reqwest::Client;
use std::time::{Duration, Instant};
use url::Url;

/// Result of one walker invocation
#[derive(Debug, Clone, Default)]
pub struct WalkOutcome {
    /// Item links in page-visit order; may contain duplicates across pages
    pub links: Vec<String>,
    /// Resume cursor: the listing page a later invocation continues from.
    /// None once the catalog is exhausted.
    pub next_page_url: Option<String>,
    /// Listing pages processed in this invocation
    pub pages_scraped: u32,
    /// The pages visited, in order
    pub page_urls: Vec<String>,
}

fn politeness_delay(config: &WalkerConfig) -> Duration {
    let ms = rand::thread_rng().gen_range(config.politeness_min_ms..=config.politeness_max_ms);
    Duration::from_millis(ms)
}

/// Walks listing pages starting at `start_url`
///
/// A page whose fetch fails yields zero links and no next-page link; the
/// failure is absorbed here, not retried (the fetcher already retried
/// transient errors).
///
/// When the time budget expires the walk stops and returns the next-page URL
/// as the resume cursor, so resuming from it is equivalent to never having
/// stopped: no page is fetched twice, no link is collected twice.
pub async fn walk<R: ExtractRule>(
    client: &Client,
    rule: &R,
    start_url: String,
    base_url: &Url,
    config: &WalkerConfig,
    fetch_config: &FetchConfig,
) -> WalkOutcome {
    let started = Instant::now();
    let budget = config.time_budget();

    let mut outcome = WalkOutcome::default();
    let mut current = start_url;

    loop {
        let page = match fetch_page(client, &current, fetch_config).await {
            Some(html) => rule.listing(&html, base_url),
            None => {
                tracing::warn!("Listing page {} yielded no content", current);
                ListingPage::default()
            }
        };

        outcome.links.extend(page.item_links);
        outcome.page_urls.push(current.clone());
        outcome.pages_scraped += 1;

        if started.elapsed() >= budget {
            tracing::warn!(
                "Walker time budget reached after {} pages, stopping",
                outcome.pages_scraped
            );
            outcome.next_page_url = page.next_page_url;
            return outcome;
        }

        match page.next_page_url {
            None => {
                tracing::info!(
                    "No more pages to walk; {} links across {} pages",
                    outcome.links.len(),
                    outcome.pages_scraped
                );
                outcome.next_page_url = None;
                return outcome;
            }
            Some(next) => {
                tokio::time::sleep(politeness_delay(config)).await;
                current = next;
            }
        }
    }
}

//! HTTP fetcher
//!
//! One GET per attempt with a randomized identity header, an explicit
//! timeout, and exponential backoff on 503 or transport errors. Any other
//! non-200 status is permanent for that URL and is not retried.

use crate::config::FetchConfig;
use rand::seq::SliceRandom;
use reqwest::{header, Client, StatusCode};

/// Identity header pool; process-wide and read-only. Which entry a request
/// uses does not affect correctness.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:115.0) Gecko/20100101 Firefox/115.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/100.0.4896.75 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 11_6_1) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/104.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/98.0.4758.102 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:91.0) Gecko/20100101 Firefox/91.0",
];

/// Builds the HTTP client shared by all fetches
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(config.request_timeout())
        .connect_timeout(config.request_timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

fn pick_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Fetches a URL, retrying transient failures with exponential backoff
///
/// Behavior per attempt:
/// - 200: return the body.
/// - 503: sleep the current delay, double it, try again (rate limited).
/// - any other status: permanent for this URL, return `None` immediately.
/// - transport error (timeout, reset): treated like 503.
///
/// After `max_retries` attempts the fetch gives up. Callers see both
/// "permanent error" and "retries exhausted" as `None`; only the logs
/// distinguish them.
pub async fn fetch_page(client: &Client, url: &str, config: &FetchConfig) -> Option<String> {
    let mut delay = config.initial_delay();

    for attempt in 1..=config.max_retries {
        let response = client
            .get(url)
            .header(header::USER_AGENT, pick_user_agent())
            .header(
                header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            )
            .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.5")
            .header(header::CONNECTION, "keep-alive")
            .header(header::UPGRADE_INSECURE_REQUESTS, "1")
            .send()
            .await;

        match response {
            Ok(response) => match response.status() {
                StatusCode::OK => match response.text().await {
                    Ok(body) => return Some(body),
                    Err(e) => {
                        tracing::warn!("Error reading body from {}: {}", url, e);
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                    }
                },
                StatusCode::SERVICE_UNAVAILABLE => {
                    tracing::warn!(
                        "Received 503 from {} (attempt {}), retrying in {:?}",
                        url,
                        attempt,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                status => {
                    tracing::error!("Error fetching {}: HTTP status {}", url, status);
                    return None;
                }
            },
            Err(e) => {
                tracing::warn!("Error fetching {} (attempt {}): {}", url, attempt, e);
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }
    }

    tracing::error!("Max retries reached for {}", url);
    None
}

//! Integration tests for the harvest pipeline
//!
//! These use wiremock mock servers to exercise the fetcher's retry behavior,
//! the walker's pagination and budget handling, the worker pool's membership
//! guarantee, and the checkpointed end-to-end pipeline.

use std::sync::Arc;
use std::time::{Duration, Instant};
use trawline::config::{ChunkConfig, Config, FetchConfig, PoolConfig, WalkerConfig};
use trawline::crawler::{build_http_client, fetch_page, walk, WorkerPool};
use trawline::extract::{SelectorConfig, SelectorRule, TableKind};
use trawline::{CrawlTask, MemoryStore, Orchestrator, Phase};
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Selector rule matching the simple markup the mock site serves
fn test_rule() -> SelectorRule {
    SelectorRule::new(SelectorConfig {
        site: "mock_site".to_string(),
        category: "widgets".to_string(),
        item_link: "a.item".to_string(),
        next_page: "a.next".to_string(),
        title: "#title".to_string(),
        price_primary: ".price".to_string(),
        price_fallback: ".price-alt".to_string(),
        price_before_discount: ".price-was".to_string(),
        discount_candidates: vec![".deal".to_string()],
        rating: ".stars".to_string(),
        image: "#photo img".to_string(),
        description: "#blurb".to_string(),
        detail_tables: vec![("#specs".to_string(), TableKind::Rows)],
        review_card: "div.review".to_string(),
        reviewer_name: ".who".to_string(),
        review_rating: ".review-stars".to_string(),
        review_date: ".when".to_string(),
        review_body: ".what".to_string(),
        max_reviews: 5,
    })
    .expect("test selectors must parse")
}

fn fast_fetch() -> FetchConfig {
    FetchConfig {
        max_retries: 3,
        initial_delay_ms: 20,
        request_timeout_secs: 5,
    }
}

fn fast_walker() -> WalkerConfig {
    WalkerConfig {
        time_budget_secs: 240,
        politeness_min_ms: 0,
        politeness_max_ms: 1,
    }
}

fn listing_body(items: &[&str], next: Option<&str>) -> String {
    let mut body = String::new();
    for item in items {
        body.push_str(&format!(r#"<a class="item" href="{item}">item</a>"#));
    }
    if let Some(next) = next {
        body.push_str(&format!(r#"<a class="next" href="{next}">next</a>"#));
    }
    format!("<html><body>{body}</body></html>")
}

fn item_body(title: &str, price: &str) -> String {
    format!(
        r#"<html><body>
        <h1 id="title">{title}</h1>
        <span class="price">{price}</span>
        </body></html>"#
    )
}

async fn mount_listing(server: &MockServer, page: &str, items: &[&str], next: Option<&str>) {
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("page", page))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_body(items, next)))
        .mount(server)
        .await;
}

async fn mount_item(server: &MockServer, item_path: &str, title: &str) {
    Mock::given(method("GET"))
        .and(path(item_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(item_body(title, "99")))
        .mount(server)
        .await;
}

#[tokio::test]
async fn fetch_backs_off_on_503_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/item"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/item"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let config = FetchConfig {
        max_retries: 3,
        initial_delay_ms: 50,
        request_timeout_secs: 5,
    };
    let client = build_http_client(&config).expect("client");

    let started = Instant::now();
    let body = fetch_page(&client, &format!("{}/item", server.uri()), &config).await;

    assert_eq!(body.as_deref(), Some("ok"));
    // Backoff slept at least initial + 2 * initial
    assert!(started.elapsed() >= Duration::from_millis(150));
}

#[tokio::test]
async fn fetch_gives_up_after_retries_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/item"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let config = fast_fetch();
    let client = build_http_client(&config).expect("client");
    let body = fetch_page(&client, &format!("{}/item", server.uri()), &config).await;
    assert_eq!(body, None);
}

#[tokio::test]
async fn fetch_does_not_retry_permanent_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/item"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let config = fast_fetch();
    let client = build_http_client(&config).expect("client");
    let body = fetch_page(&client, &format!("{}/item", server.uri()), &config).await;
    assert_eq!(body, None);
}

#[tokio::test]
async fn walker_follows_pagination_to_exhaustion() {
    let server = MockServer::start().await;
    mount_listing(&server, "1", &["/item/a1", "/item/a2"], Some("/list?page=2")).await;
    mount_listing(&server, "2", &["/item/b1"], Some("/list?page=3")).await;
    mount_listing(&server, "3", &["/item/c1"], None).await;

    let base = Url::parse(&server.uri()).expect("base url");
    let client = build_http_client(&fast_fetch()).expect("client");
    let rule = test_rule();

    let outcome = walk(
        &client,
        &rule,
        format!("{}/list?page=1", server.uri()),
        &base,
        &fast_walker(),
        &fast_fetch(),
    )
    .await;

    assert_eq!(outcome.pages_scraped, 3);
    assert_eq!(outcome.next_page_url, None);
    // Links arrive in page-visit order
    let expected: Vec<String> = ["/item/a1", "/item/a2", "/item/b1", "/item/c1"]
        .iter()
        .map(|p| format!("{}{}", server.uri(), p))
        .collect();
    assert_eq!(outcome.links, expected);
    assert_eq!(outcome.page_urls.len(), 3);
}

#[tokio::test]
async fn walker_stops_at_budget_and_returns_resume_cursor() {
    let server = MockServer::start().await;
    mount_listing(&server, "1", &["/item/a1", "/item/a2"], Some("/list?page=2")).await;
    mount_listing(&server, "2", &["/item/b1"], None).await;

    let base = Url::parse(&server.uri()).expect("base url");
    let client = build_http_client(&fast_fetch()).expect("client");
    let rule = test_rule();

    // Zero budget: expired as soon as the first page is processed
    let config = WalkerConfig {
        time_budget_secs: 0,
        politeness_min_ms: 0,
        politeness_max_ms: 1,
    };

    let outcome = walk(
        &client,
        &rule,
        format!("{}/list?page=1", server.uri()),
        &base,
        &config,
        &fast_fetch(),
    )
    .await;

    assert_eq!(outcome.pages_scraped, 1);
    let expected: Vec<String> = ["/item/a1", "/item/a2"]
        .iter()
        .map(|p| format!("{}{}", server.uri(), p))
        .collect();
    assert_eq!(outcome.links, expected);
    // Resume cursor is the page that was never fetched
    assert_eq!(
        outcome.next_page_url,
        Some(format!("{}/list?page=2", server.uri()))
    );
}

#[tokio::test]
async fn walker_absorbs_failed_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let base = Url::parse(&server.uri()).expect("base url");
    let client = build_http_client(&fast_fetch()).expect("client");
    let rule = test_rule();

    let outcome = walk(
        &client,
        &rule,
        format!("{}/list?page=1", server.uri()),
        &base,
        &fast_walker(),
        &fast_fetch(),
    )
    .await;

    assert_eq!(outcome.pages_scraped, 1);
    assert!(outcome.links.is_empty());
    assert_eq!(outcome.next_page_url, None);
}

#[tokio::test]
async fn pool_accounts_for_every_url() {
    let server = MockServer::start().await;
    mount_item(&server, "/item/1", "One").await;
    mount_item(&server, "/item/2", "Two").await;
    Mock::given(method("GET"))
        .and(path("/item/broken"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = build_http_client(&fast_fetch()).expect("client");
    let pool = WorkerPool::new(
        client,
        Arc::new(test_rule()),
        fast_fetch(),
        PoolConfig {
            time_budget_secs: 240,
            max_in_flight: 2,
        },
    );

    let urls: Vec<String> = ["/item/1", "/item/2", "/item/broken"]
        .iter()
        .map(|p| format!("{}{}", server.uri(), p))
        .collect();
    let outcome = pool.extract_all(urls.clone()).await;

    assert_eq!(outcome.records.len(), 2);
    assert_eq!(outcome.remaining, vec![urls[2].clone()]);
    assert_eq!(outcome.records.len() + outcome.remaining.len(), urls.len());
}

#[tokio::test]
async fn pool_classifies_unlaunched_urls_as_remaining() {
    let server = MockServer::start().await;
    mount_item(&server, "/item/1", "One").await;

    let client = build_http_client(&fast_fetch()).expect("client");
    let pool = WorkerPool::new(
        client,
        Arc::new(test_rule()),
        fast_fetch(),
        // Zero budget: nothing gets launched
        PoolConfig {
            time_budget_secs: 0,
            max_in_flight: 2,
        },
    );

    let urls = vec![format!("{}/item/1", server.uri())];
    let outcome = pool.extract_all(urls.clone()).await;
    assert!(outcome.records.is_empty());
    assert_eq!(outcome.remaining, urls);
}

/// Orchestrator config tuned for fast tests
fn pipeline_config() -> Config {
    Config {
        fetch: fast_fetch(),
        walker: fast_walker(),
        pool: PoolConfig {
            time_budget_secs: 240,
            max_in_flight: 4,
        },
        chunks: ChunkConfig {
            chunk_size: 2,
            max_retries_per_chunk: 3,
            max_link_requeues: 1,
            retry_backoff_base_ms: 1,
            pause_min_ms: 0,
            pause_max_ms: 1,
        },
        output: Default::default(),
    }
}

/// Mounts a 2-page listing with three items, one of which permanently 404s.
/// The orchestrator resolves the region to the real storefront base URL, so
/// these pages carry absolute links back to the mock server.
async fn mount_catalog(server: &MockServer) {
    let uri = server.uri();
    let item1 = format!("{uri}/item/1");
    let item2 = format!("{uri}/item/2");
    let item3 = format!("{uri}/item/3");
    let page2 = format!("{uri}/list?page=2");

    mount_listing(server, "1", &[item1.as_str(), item2.as_str()], Some(page2.as_str())).await;
    mount_listing(server, "2", &[item3.as_str()], None).await;
    mount_item(server, "/item/1", "One").await;
    Mock::given(method("GET"))
        .and(path("/item/2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
    mount_item(server, "/item/3", "Three").await;
}

#[tokio::test]
async fn end_to_end_partial_success_with_unresolved_link() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;

    let store = MemoryStore::new();
    let orchestrator =
        Orchestrator::new(pipeline_config(), Arc::new(test_rule()), store).expect("orchestrator");

    let task = CrawlTask {
        start_url: format!("{}/list?page=1", server.uri()),
        region: "saudi".to_string(),
    };
    let report = orchestrator.run(task).await.expect("run");

    assert_eq!(report.pages_scraped, 2);
    assert_eq!(report.links_found, 3);
    assert_eq!(report.records.len(), 2);
    assert_eq!(
        report.remaining_links,
        vec![format!("{}/item/2", server.uri())]
    );
    // Conservation: every discovered link is accounted for
    assert_eq!(
        report.records.len() + report.remaining_links.len(),
        report.links_found
    );
    assert_eq!(report.walker_calls, 1);
    assert!(report.extractor_calls >= 2);
}

#[tokio::test]
async fn completed_pipeline_replays_without_refetching() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;

    let store = MemoryStore::new();
    let orchestrator =
        Orchestrator::new(pipeline_config(), Arc::new(test_rule()), store).expect("orchestrator");

    let task = CrawlTask {
        start_url: format!("{}/list?page=1", server.uri()),
        region: "saudi".to_string(),
    };

    let first = orchestrator.run(task.clone()).await.expect("first run");
    let requests_after_first = server.received_requests().await.map(|r| r.len());

    let second = orchestrator.run(task).await.expect("second run");
    let requests_after_second = server.received_requests().await.map(|r| r.len());

    assert_eq!(first.records.len(), second.records.len());
    assert_eq!(first.remaining_links, second.remaining_links);
    // The replay came entirely from the checkpoint
    assert_eq!(requests_after_first, requests_after_second);
}

#[tokio::test]
async fn discovery_resumes_across_walker_invocations() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;

    let mut config = pipeline_config();
    // Zero walker budget: one listing page per walker invocation
    config.walker.time_budget_secs = 0;

    let store = MemoryStore::new();
    let orchestrator =
        Orchestrator::new(config, Arc::new(test_rule()), store).expect("orchestrator");

    let task = CrawlTask {
        start_url: format!("{}/list?page=1", server.uri()),
        region: "saudi".to_string(),
    };
    let report = orchestrator.run(task).await.expect("run");

    assert_eq!(report.walker_calls, 2);
    assert_eq!(report.pages_scraped, 2);
    assert_eq!(report.links_found, 3);
    assert_eq!(report.records.len(), 2);
}

#[tokio::test]
async fn checkpoint_reaches_done_phase() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;

    let store = Arc::new(MemoryStore::new());
    let orchestrator = Orchestrator::new(
        pipeline_config(),
        Arc::new(test_rule()),
        Arc::clone(&store),
    )
    .expect("orchestrator");

    let task = CrawlTask {
        start_url: format!("{}/list?page=1", server.uri()),
        region: "saudi".to_string(),
    };
    orchestrator.run(task.clone()).await.expect("run");

    let saved = store.snapshot().expect("checkpoint saved");
    assert_eq!(saved.phase, Phase::Done);
    assert_eq!(saved.task, task);
    assert_eq!(saved.pages_scraped, 2);
    let work = saved.work.expect("work state");
    assert!(work.pending.is_empty());
    assert_eq!(work.records.len(), 2);
    assert_eq!(work.unresolved.len(), 1);
}

#[tokio::test]
async fn unsupported_region_fails_before_any_fetch() {
    let server = MockServer::start().await;
    // No mocks mounted: any request would 404 loudly in received_requests
    let store = MemoryStore::new();
    let orchestrator =
        Orchestrator::new(pipeline_config(), Arc::new(test_rule()), store).expect("orchestrator");

    let task = CrawlTask {
        start_url: format!("{}/list?page=1", server.uri()),
        region: "atlantis".to_string(),
    };
    let err = orchestrator.run(task).await.unwrap_err();
    assert!(matches!(err, trawline::HarvestError::UnsupportedRegion(_)));
    assert_eq!(server.received_requests().await.map(|r| r.len()), Some(0));
}

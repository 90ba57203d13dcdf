//! Integration tests for the crawler
//!
//! Most tests drive the full `Coordinator` against an in-memory site served by
//! a fake renderer, so batch timing and failures can be controlled exactly.
//! The last tests use wiremock to run the built-in HTTP renderer end-to-end.

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sumi_audit::analyzer::{AccessibilityAnalyzer, AnalyzeError, Impact, Violation};
use sumi_audit::config::{CrawlerConfig, RendererConfig};
use sumi_audit::crawler::{Coordinator, CrawlEvent, CrawlOutcome, EventSink};
use sumi_audit::render::{
    body_snapshot, ElementNode, HttpRenderer, PageRenderer, RenderError, RenderOptions,
    RenderedPage,
};
use sumi_audit::report::{render_html, to_report_model, write_html_report, DEFAULT_TEMPLATE};
use sumi_audit::state::PageState;
use sumi_audit::url::{ExclusionPolicy, NoExclusions, NormalizedUrl, PatternExclusion};
use tokio::sync::mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEED: &str = "https://example.com/";

#[derive(Clone, Copy)]
enum Behavior {
    Serve,
    Hang,
    Fail,
}

#[derive(Clone)]
struct FakePage {
    html: String,
    delay: Duration,
    behavior: Behavior,
}

#[derive(Default)]
struct Counters {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    closed: AtomicUsize,
    shutdowns: AtomicUsize,
    opened: Mutex<Vec<String>>,
}

/// In-memory site keyed by path
struct FakeSite {
    pages: HashMap<String, FakePage>,
    counters: Arc<Counters>,
}

impl FakeSite {
    fn new() -> Self {
        Self {
            pages: HashMap::new(),
            counters: Arc::new(Counters::default()),
        }
    }

    fn page(mut self, path: &str, body: &str) -> Self {
        self.pages.insert(
            path.to_string(),
            FakePage {
                html: format!("<html><head><title>{}</title></head><body>{}</body></html>", path, body),
                delay: Duration::ZERO,
                behavior: Behavior::Serve,
            },
        );
        self
    }

    fn slow_page(mut self, path: &str, body: &str, delay_ms: u64) -> Self {
        self = self.page(path, body);
        if let Some(page) = self.pages.get_mut(path) {
            page.delay = Duration::from_millis(delay_ms);
        }
        self
    }

    fn hanging_page(mut self, path: &str) -> Self {
        self = self.page(path, "<p>never</p>");
        if let Some(page) = self.pages.get_mut(path) {
            page.behavior = Behavior::Hang;
        }
        self
    }

    fn broken_page(mut self, path: &str) -> Self {
        self = self.page(path, "<p>broken</p>");
        if let Some(page) = self.pages.get_mut(path) {
            page.behavior = Behavior::Fail;
        }
        self
    }

    fn opened(&self) -> Vec<String> {
        self.counters.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageRenderer for FakeSite {
    async fn open(
        &self,
        url: &NormalizedUrl,
        options: &RenderOptions,
    ) -> Result<Box<dyn RenderedPage>, RenderError> {
        self.counters.opened.lock().unwrap().push(url.to_string());

        let Some(page) = self.pages.get(url.path()).cloned() else {
            return Err(RenderError::Http {
                url: url.to_string(),
                status: 404,
            });
        };

        let current = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let load = async {
            tokio::time::sleep(page.delay).await;
            match page.behavior {
                Behavior::Serve => Ok(()),
                Behavior::Hang => std::future::pending().await,
                Behavior::Fail => Err(RenderError::Navigation {
                    url: url.to_string(),
                    message: "net::ERR_ABORTED".to_string(),
                }),
            }
        };

        let loaded = match tokio::time::timeout(options.timeout, load).await {
            Ok(loaded) => loaded,
            Err(_) => Err(RenderError::Timeout {
                url: url.to_string(),
                timeout_ms: options.timeout.as_millis() as u64,
            }),
        };

        if let Err(e) = loaded {
            self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
            return Err(e);
        }

        Ok(Box::new(FakeRenderedPage {
            url: url.clone(),
            html: page.html,
            counters: self.counters.clone(),
        }))
    }

    async fn shutdown(&self) -> Result<(), RenderError> {
        self.counters.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FakeRenderedPage {
    url: NormalizedUrl,
    html: String,
    counters: Arc<Counters>,
}

#[async_trait]
impl RenderedPage for FakeRenderedPage {
    fn url(&self) -> &NormalizedUrl {
        &self.url
    }

    async fn links(&self) -> Result<Vec<String>, RenderError> {
        let document = Html::parse_document(&self.html);
        let selector = Selector::parse("a[href]").unwrap();
        Ok(document
            .select(&selector)
            .filter_map(|a| a.value().attr("href"))
            .map(|href| match self.url.as_url().join(href) {
                Ok(absolute) => absolute.to_string(),
                Err(_) => href.to_string(),
            })
            .collect())
    }

    async fn body_snapshot(&self) -> Result<ElementNode, RenderError> {
        Ok(body_snapshot(&self.html))
    }

    async fn close(&self) -> Result<(), RenderError> {
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Reports one violation per page; panics on `/explode`
struct FakeAnalyzer;

#[async_trait]
impl AccessibilityAnalyzer for FakeAnalyzer {
    async fn analyze(&self, page: &dyn RenderedPage) -> Result<Vec<Violation>, AnalyzeError> {
        let path = page.url().path().to_string();
        if path == "/explode" {
            panic!("analyzer crashed on {}", path);
        }
        if path == "/engine-error" {
            return Err(AnalyzeError::Engine {
                url: page.url().to_string(),
                message: "axe exited with 1".to_string(),
            });
        }

        Ok(vec![Violation {
            id: "region".to_string(),
            description: format!("Landmarks on {}", path),
            help: "All page content should be contained by landmarks".to_string(),
            help_url: "https://dequeuniversity.com/rules/axe/4.8/region".to_string(),
            impact: Impact::Moderate,
            nodes: vec!["body > div".to_string()],
        }])
    }
}

fn crawler_config(concurrency_limit: usize, max_iterations: usize) -> CrawlerConfig {
    CrawlerConfig {
        concurrency_limit,
        max_iterations,
        navigation_timeout_ms: 200,
        ..CrawlerConfig::default()
    }
}

fn url(path: &str) -> NormalizedUrl {
    sumi_audit::url::normalize(path, &url::Url::parse(SEED).unwrap()).unwrap()
}

async fn run_site(
    site: Arc<FakeSite>,
    config: CrawlerConfig,
    exclusions: Arc<dyn ExclusionPolicy>,
) -> (CrawlOutcome, Vec<CrawlEvent>) {
    let (tx, mut rx) = mpsc::unbounded_channel();

    let outcome = Coordinator::new(SEED, &config, site, Arc::new(FakeAnalyzer))
        .expect("Failed to create coordinator")
        .with_exclusions(exclusions)
        .with_events(EventSink::new(tx))
        .run()
        .await
        .expect("Crawl failed");

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    (outcome, events)
}

fn recorded_paths(outcome: &CrawlOutcome) -> Vec<String> {
    outcome
        .result
        .iter()
        .map(|record| record.url.path().to_string())
        .collect()
}

#[tokio::test]
async fn test_query_variants_collapse_and_cross_origin_dropped() {
    let site = Arc::new(
        FakeSite::new()
            .page(
                "/",
                r##"<nav>
                    <a href="/about">About</a>
                    <a href="/about?ref=1#x">About again</a>
                    <a href="https://other.com/">Elsewhere</a>
                </nav>"##,
            )
            .page("/about", "<main><h1>About</h1></main>"),
    );

    // One batch only, so the frontier can be observed after the seed scan
    let (outcome, _) = run_site(site, crawler_config(5, 1), Arc::new(NoExclusions)).await;

    assert_eq!(outcome.pending, vec![url("/about")]);
    assert_eq!(outcome.statistics.links_discovered, 1);
    assert_eq!(recorded_paths(&outcome), vec!["/"]);
}

#[tokio::test]
async fn test_identical_skeleton_yields_one_record() {
    let site = Arc::new(
        FakeSite::new()
            .page("/", r#"<main><h1>Hot smoked salmon</h1><a href="/twin">More</a></main>"#)
            .page("/twin", r#"<main><h1>Classic beef tacos</h1><a href="/twin">Again</a></main>"#),
    );

    let (outcome, events) = run_site(site, crawler_config(5, 20), Arc::new(NoExclusions)).await;

    assert_eq!(outcome.result.len(), 1);
    assert_eq!(recorded_paths(&outcome), vec!["/"]);
    assert_eq!(outcome.visited, vec![url("/"), url("/twin")]);
    assert_eq!(outcome.statistics.pages(PageState::Duplicate), 1);

    assert!(events.iter().any(|e| matches!(
        e,
        CrawlEvent::PageSkippedDuplicate { url: u, .. } if u == &url("/twin")
    )));
}

#[tokio::test]
async fn test_text_and_images_do_not_change_structure() {
    let site = Arc::new(
        FakeSite::new()
            .page("/", r#"<div class="card"><a href="/b">b</a></div>"#)
            .page(
                "/b",
                r#"<div class="card" style="color: red"><img src="x.png"><a href="/b">other text</a><script>1</script></div>"#,
            ),
    );

    let (outcome, _) = run_site(site, crawler_config(5, 20), Arc::new(NoExclusions)).await;
    assert_eq!(outcome.result.len(), 1);
    assert_eq!(outcome.statistics.pages(PageState::Duplicate), 1);
}

#[tokio::test]
async fn test_timeout_is_isolated_to_its_page() {
    let site = Arc::new(
        FakeSite::new()
            .page(
                "/",
                r#"<ul><li><a href="/a">A</a></li><li><a href="/slow">Slow</a></li><li><a href="/b">B</a></li></ul>"#,
            )
            .page("/a", "<article><h2>A</h2></article>")
            .hanging_page("/slow")
            .page("/b", "<section><h2>B</h2></section>"),
    );

    let (outcome, events) = run_site(site.clone(), crawler_config(5, 20), Arc::new(NoExclusions)).await;

    let mut recorded = recorded_paths(&outcome);
    recorded.sort();
    assert_eq!(recorded, vec!["/", "/a", "/b"]);
    assert!(outcome.visited.contains(&url("/slow")));
    assert!(outcome.result.get(&url("/slow")).is_none());
    assert_eq!(outcome.statistics.pages(PageState::Failed), 1);

    let failed: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            CrawlEvent::PageFailed { url, error, .. } => Some((url.clone(), error.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].0, url("/slow"));
    assert!(failed[0].1.contains("Timed out"));

    // Every opened page was closed again
    assert_eq!(site.counters.in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_navigation_and_analyzer_errors_are_isolated() {
    let site = Arc::new(
        FakeSite::new()
            .page(
                "/",
                r#"<p><a href="/broken">1</a><a href="/engine-error">2</a><a href="/missing">3</a><a href="/ok">4</a></p>"#,
            )
            .broken_page("/broken")
            .page("/engine-error", "<table><tr><td>x</td></tr></table>")
            .page("/ok", "<form><input name=q></form>"),
    );

    let (outcome, _) = run_site(site.clone(), crawler_config(5, 20), Arc::new(NoExclusions)).await;

    let mut recorded = recorded_paths(&outcome);
    recorded.sort();
    assert_eq!(recorded, vec!["/", "/ok"]);
    assert_eq!(outcome.statistics.pages(PageState::Failed), 3);
    assert_eq!(outcome.visited.len(), 5);
    assert_eq!(site.counters.in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_panicking_task_counts_as_failure() {
    let site = Arc::new(
        FakeSite::new()
            .page("/", r#"<p><a href="/explode">boom</a><a href="/fine">fine</a></p>"#)
            .page("/explode", "<div><span>x</span></div>")
            .page("/fine", "<div><em>y</em></div>"),
    );

    let (outcome, events) = run_site(site.clone(), crawler_config(5, 20), Arc::new(NoExclusions)).await;

    let mut recorded = recorded_paths(&outcome);
    recorded.sort();
    assert_eq!(recorded, vec!["/", "/fine"]);
    assert_eq!(outcome.statistics.pages(PageState::Failed), 1);

    // The page whose analysis panicked was still closed
    assert_eq!(site.counters.in_flight.load(Ordering::SeqCst), 0);
    assert_eq!(site.counters.closed.load(Ordering::SeqCst), 3);
    assert!(events.iter().any(|e| matches!(
        e,
        CrawlEvent::PageFailed { url: u, .. } if u == &url("/explode")
    )));
}

#[tokio::test]
async fn test_frontier_exhausted_before_iteration_cap() {
    let site = Arc::new(
        FakeSite::new()
            .page("/", r#"<a href="/leaf">Leaf</a>"#)
            .page("/leaf", "<main><p>end</p></main>"),
    );

    let (outcome, events) = run_site(site.clone(), crawler_config(5, 20), Arc::new(NoExclusions)).await;

    assert_eq!(outcome.statistics.iterations, 2);
    assert!(outcome.pending.is_empty());
    assert_eq!(recorded_paths(&outcome), vec!["/", "/leaf"]);
    assert_eq!(site.counters.shutdowns.load(Ordering::SeqCst), 1);

    assert!(matches!(
        events.last(),
        Some(CrawlEvent::CrawlFinished { iterations: 2, .. })
    ));
}

#[tokio::test]
async fn test_iteration_cap_stops_crawl() {
    let mut site = FakeSite::new().page("/", r#"<a href="/p1">next</a>"#);
    for n in 1..=10 {
        site = site.page(
            &format!("/p{}", n),
            &format!(r#"<div data-step="{}"><a href="/p{}">next</a></div>"#, n, n + 1),
        );
    }

    let (outcome, _) = run_site(Arc::new(site), crawler_config(5, 3), Arc::new(NoExclusions)).await;

    assert_eq!(outcome.statistics.iterations, 3);
    assert_eq!(outcome.visited, vec![url("/"), url("/p1"), url("/p2")]);
    assert_eq!(outcome.pending, vec![url("/p3")]);
    assert_eq!(outcome.statistics.pages_left_pending, 1);
}

#[tokio::test]
async fn test_excluded_detail_pages_never_scanned() {
    let site = Arc::new(
        FakeSite::new()
            .page(
                "/",
                r#"<a href="/products">All</a><a href="/products/salmon-352">Salmon</a><a href="/recipes/tacos-12">Tacos</a>"#,
            )
            .page("/products", "<main><ul><li>x</li></ul></main>")
            .page("/products/salmon-352", "<main><h1>Salmon</h1></main>")
            .page("/recipes/tacos-12", "<main><h1>Tacos</h1></main>"),
    );

    let exclusions = Arc::new(PatternExclusion::with_defaults().unwrap());
    let (outcome, events) = run_site(site.clone(), crawler_config(5, 20), exclusions).await;

    assert_eq!(outcome.visited, vec![url("/"), url("/products")]);
    assert_eq!(outcome.statistics.links_excluded, 2);
    assert!(!site.opened().iter().any(|u| u.contains("salmon")));
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, CrawlEvent::LinkExcluded { .. }))
            .count(),
        2
    );
}

/// Site where every page links to every other page
fn dense_site(count: usize) -> FakeSite {
    let links: String = (0..count)
        .map(|n| format!(r#"<a href="/n{}">{}</a>"#, n, n))
        .collect();

    let mut site = FakeSite::new().page("/", &links);
    for n in 0..count {
        // Distinct ids keep every skeleton unique
        site = site.slow_page(
            &format!("/n{}", n),
            &format!(r#"<nav id="n{}">{}</nav>"#, n, links),
            (n as u64 % 4) * 5,
        );
    }
    site
}

#[tokio::test]
async fn test_no_url_scanned_twice() {
    let site = Arc::new(dense_site(12));
    let (outcome, _) = run_site(site.clone(), crawler_config(3, 20), Arc::new(NoExclusions)).await;

    let visited: HashSet<_> = outcome.visited.iter().collect();
    assert_eq!(visited.len(), outcome.visited.len());
    assert_eq!(outcome.visited.len(), 13);

    let recorded: HashSet<_> = outcome.result.iter().map(|r| r.url.clone()).collect();
    assert_eq!(recorded.len(), outcome.result.len());
    assert_eq!(outcome.result.len(), 13);

    let opened = site.opened();
    let unique: HashSet<_> = opened.iter().collect();
    assert_eq!(unique.len(), opened.len());
}

#[tokio::test]
async fn test_batches_never_overlap() {
    let site = Arc::new(dense_site(9));
    let (outcome, events) = run_site(site.clone(), crawler_config(4, 20), Arc::new(NoExclusions)).await;

    let mut outstanding: HashSet<NormalizedUrl> = HashSet::new();
    let mut batches = 0;

    for event in &events {
        match event {
            CrawlEvent::BatchStarted { urls, .. } => {
                assert!(
                    outstanding.is_empty(),
                    "batch started while {:?} were still running",
                    outstanding
                );
                assert!(urls.len() <= 4);
                outstanding = urls.iter().cloned().collect();
                batches += 1;
            }
            CrawlEvent::LinkDiscovered { from, .. } | CrawlEvent::LinkExcluded { from, .. } => {
                assert!(outstanding.contains(from), "offer from outside the current batch");
            }
            CrawlEvent::PageScanned { url, .. }
            | CrawlEvent::PageSkippedDuplicate { url, .. }
            | CrawlEvent::PageFailed { url, .. } => {
                assert!(outstanding.remove(url));
            }
            _ => {}
        }
    }

    assert!(outstanding.is_empty());
    assert_eq!(batches, outcome.statistics.iterations);
    // 1 seed batch + 9 pages in batches of 4
    assert_eq!(batches, 4);

    let max = site.counters.max_in_flight.load(Ordering::SeqCst);
    assert!(max <= 4, "{} pages were open at once", max);
    assert!(max >= 2, "batch members did not run concurrently");
    assert_eq!(site.counters.closed.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn test_records_follow_completion_order() {
    let site = Arc::new(
        FakeSite::new()
            .page("/", r#"<a href="/slow">s</a><a href="/fast">f</a>"#)
            .slow_page("/slow", "<main><h1>slow</h1></main>", 80)
            .page("/fast", "<aside><h1>fast</h1></aside>"),
    );

    let (outcome, _) = run_site(site, crawler_config(5, 20), Arc::new(NoExclusions)).await;

    // Discovery order is slow, fast; completion order is fast, slow
    assert_eq!(outcome.visited, vec![url("/"), url("/slow"), url("/fast")]);
    assert_eq!(recorded_paths(&outcome), vec!["/", "/fast", "/slow"]);
}

#[tokio::test]
async fn test_report_model_from_crawl() {
    let site = Arc::new(
        FakeSite::new()
            .page("/", r#"<a href="/a">a</a>"#)
            .page("/a", "<main></main>"),
    );

    let (outcome, _) = run_site(site, crawler_config(5, 20), Arc::new(NoExclusions)).await;
    let model = to_report_model(&outcome.result);

    assert_eq!(model.len(), 2);
    assert_eq!(model.rows[0].url, url("/"));
    assert_eq!(model.rows[1].details_id(), "details-1-0");

    let html = render_html(&model, DEFAULT_TEMPLATE).unwrap();
    assert_eq!(html.matches("Show Details").count(), 2);
    assert!(html.contains("Landmarks on /a"));
}

#[tokio::test]
async fn test_http_renderer_end_to_end() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            format!(
                r##"<html><head><title>Home</title></head><body>
                <a href="/about">About</a>
                <a href="/about?ref=1#team">About (tracked)</a>
                <a href="https://other.example/">Elsewhere</a>
                <a href="/missing">Missing</a>
                <a href="{}/data.json">Data</a>
                </body></html>"##,
                base_url
            ),
            "text/html",
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<html><head><title>About</title></head><body><main><h1>About</h1></main></body></html>"#,
            "text/html",
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"a": 1}"#, "application/json"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let renderer = HttpRenderer::launch(&RendererConfig::default()).expect("Failed to launch renderer");
    let seed = format!("{}/", base_url);

    let outcome = Coordinator::new(
        &seed,
        &crawler_config(5, 20),
        Arc::new(renderer),
        Arc::new(FakeAnalyzer),
    )
    .expect("Failed to create coordinator")
    .run()
    .await
    .expect("Crawl failed");

    let mut recorded = recorded_paths(&outcome);
    recorded.sort();
    assert_eq!(recorded, vec!["/", "/about"]);
    assert_eq!(outcome.visited.len(), 4);
    assert_eq!(outcome.statistics.pages(PageState::Failed), 2);
    assert_eq!(outcome.statistics.iterations, 2);

    // Write the report to a temporary file
    let dir = tempfile::tempdir().unwrap();
    let report_path = dir.path().join("accessibility-report.html");
    write_html_report(&to_report_model(&outcome.result), DEFAULT_TEMPLATE, &report_path).unwrap();

    let report = std::fs::read_to_string(&report_path).unwrap();
    assert_eq!(report.matches("class=\"hidden-row\"").count(), 2);
    assert!(report.contains(&format!("{}/about", base_url)));
}

#[tokio::test]
async fn test_http_renderer_missing_seed_page() {
    // No mocks mounted: every request gets a 404
    let mock_server = MockServer::start().await;
    let seed = format!("{}/", mock_server.uri());

    let renderer = HttpRenderer::launch(&RendererConfig::default()).expect("Failed to launch renderer");
    let outcome = Coordinator::new(
        &seed,
        &crawler_config(5, 20),
        Arc::new(renderer),
        Arc::new(FakeAnalyzer),
    )
    .expect("Failed to create coordinator")
    .run()
    .await
    .expect("Crawl failed");

    assert!(outcome.result.is_empty());
    assert_eq!(outcome.visited.len(), 1);
    assert_eq!(outcome.statistics.pages(PageState::Failed), 1);
    assert_eq!(outcome.statistics.iterations, 1);
}

//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop. Each iteration:
//! - Takes a batch of up to `concurrency-limit` URLs from the frontier
//! - Spawns one scan task per URL
//! - Waits for every task of the batch before the next batch is taken
//! - Appends page records in task-completion order
//!
//! The loop stops when the frontier is empty or when `max-iterations`
//! batches have run. The renderer is shut down once the loop is done.

use crate::analyzer::{AccessibilityAnalyzer, CommandAnalyzer};
use crate::config::{Config, CrawlerConfig};
use crate::crawler::events::{CrawlEvent, EventSink};
use crate::crawler::frontier::Frontier;
use crate::crawler::scan::{scan_page, ScanContext, ScanOutcome};
use crate::render::{HttpRenderer, PageRenderer};
use crate::report::{CrawlResult, CrawlStatistics};
use crate::state::{CrawlState, PageState};
use crate::url::{ExclusionPolicy, NoExclusions, NormalizedUrl, PatternExclusion};
use crate::AuditError;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::task::JoinSet;

/// Everything a finished crawl produced
#[derive(Debug)]
pub struct CrawlOutcome {
    /// Page records in scan order
    pub result: CrawlResult,

    /// Counters collected during the crawl
    pub statistics: CrawlStatistics,

    /// Every URL taken for scanning, in the order it was taken
    pub visited: Vec<NormalizedUrl>,

    /// URLs still pending when the loop stopped
    pub pending: Vec<NormalizedUrl>,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    seed: NormalizedUrl,
    config: CrawlerConfig,
    renderer: Arc<dyn PageRenderer>,
    analyzer: Arc<dyn AccessibilityAnalyzer>,
    exclusions: Arc<dyn ExclusionPolicy>,
    events: EventSink,
    state: CrawlState,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `seed` - The seed URL; its origin bounds the crawl
    /// * `config` - The crawl loop configuration
    /// * `renderer` - The shared rendering session
    /// * `analyzer` - The accessibility engine
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run, with no exclusions and no event subscriber
    /// * `Err(AuditError::InvalidSeed)` - The seed is not an absolute http(s) URL
    pub fn new(
        seed: &str,
        config: &CrawlerConfig,
        renderer: Arc<dyn PageRenderer>,
        analyzer: Arc<dyn AccessibilityAnalyzer>,
    ) -> Result<Self, AuditError> {
        let seed = NormalizedUrl::parse_seed(seed).map_err(|e| AuditError::InvalidSeed {
            url: seed.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            seed,
            config: config.clone(),
            renderer,
            analyzer,
            exclusions: Arc::new(NoExclusions),
            events: EventSink::disabled(),
            state: CrawlState::Running,
        })
    }

    /// Sets the exclusion policy applied to discovered links
    pub fn with_exclusions(mut self, exclusions: Arc<dyn ExclusionPolicy>) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Sets the sink that receives crawl events
    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    /// Returns the normalized seed
    pub fn seed(&self) -> &NormalizedUrl {
        &self.seed
    }

    /// Returns the current loop state
    pub fn state(&self) -> CrawlState {
        self.state
    }

    fn transition(&mut self, next: CrawlState) -> Result<(), AuditError> {
        if !self.state.can_transition_to(next) {
            return Err(AuditError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }

        tracing::debug!("Crawl state: {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// Runs the crawl loop to completion
    ///
    /// Per-page failures never abort the crawl. The only errors returned are
    /// internal state machine violations.
    pub async fn run(mut self) -> Result<CrawlOutcome, AuditError> {
        let start_time = Instant::now();
        let concurrency_limit = self.config.concurrency_limit.max(1);
        let max_iterations = self.config.max_iterations;

        let frontier = Arc::new(Mutex::new(Frontier::new(self.seed.clone())));
        let ctx = Arc::new(ScanContext {
            renderer: self.renderer.clone(),
            analyzer: self.analyzer.clone(),
            frontier: frontier.clone(),
            exclusions: self.exclusions.clone(),
            base: self.seed.as_url().clone(),
            options: self.config.render_options(),
            events: self.events.clone(),
        });

        self.events.emit(CrawlEvent::CrawlStarted {
            seed: self.seed.clone(),
            concurrency_limit,
            max_iterations,
            timestamp: Utc::now(),
        });

        let mut result = CrawlResult::new();
        let mut stats = CrawlStatistics::new();
        let mut iterations = 0;

        while self.state.is_running() {
            let batch = {
                let mut frontier = frontier.lock().unwrap_or_else(PoisonError::into_inner);
                if frontier.is_empty() {
                    tracing::info!("Frontier is empty, crawl complete");
                    None
                } else if iterations >= max_iterations {
                    tracing::info!(
                        "Reached the limit of {} batches with {} URLs pending",
                        max_iterations,
                        frontier.pending_len()
                    );
                    None
                } else {
                    Some(frontier.take_batch(concurrency_limit))
                }
            };

            let Some(batch) = batch else {
                self.transition(CrawlState::Draining)?;
                break;
            };

            iterations += 1;
            stats.urls_visited += batch.len() as u64;
            tracing::debug!("Batch {}: scanning {} URLs", iterations, batch.len());

            self.events.emit(CrawlEvent::BatchStarted {
                iteration: iterations,
                urls: batch.clone(),
                timestamp: Utc::now(),
            });

            self.run_batch(&ctx, batch, &mut result, &mut stats).await;
        }

        // The shared session outlives every page
        if let Err(e) = self.renderer.shutdown().await {
            tracing::warn!("Failed to shut down renderer: {}", e);
        }
        self.transition(CrawlState::Done)?;

        let (visited, pending) = {
            let frontier = frontier.lock().unwrap_or_else(PoisonError::into_inner);
            (
                frontier.visited().to_vec(),
                frontier.pending().cloned().collect::<Vec<_>>(),
            )
        };

        stats.iterations = iterations;
        stats.pages_left_pending = pending.len() as u64;
        stats.duration = start_time.elapsed();
        stats.record_violations(&result);

        self.events.emit(CrawlEvent::CrawlFinished {
            iterations,
            pages_recorded: result.len(),
            urls_visited: visited.len(),
            duration: stats.duration,
            timestamp: Utc::now(),
        });

        Ok(CrawlOutcome {
            result,
            statistics: stats,
            visited,
            pending,
        })
    }

    /// Scans one batch concurrently and waits for all of its tasks
    async fn run_batch(
        &self,
        ctx: &Arc<ScanContext>,
        batch: Vec<NormalizedUrl>,
        result: &mut CrawlResult,
        stats: &mut CrawlStatistics,
    ) {
        let mut outstanding: HashSet<NormalizedUrl> = batch.iter().cloned().collect();
        let mut tasks = JoinSet::new();

        for url in batch {
            tasks.spawn(scan_page(ctx.clone(), url));
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => {
                    outstanding.remove(outcome.url());
                    record_outcome(outcome, result, stats);
                }
                Err(e) => {
                    tracing::error!("Scan task did not complete: {}", e);
                }
            }
        }

        // Tasks that panicked outside page inspection never reported back
        for url in outstanding {
            stats.record_page(PageState::Failed);
            self.events.emit(CrawlEvent::PageFailed {
                url,
                error: "scan task aborted".to_string(),
                timestamp: Utc::now(),
            });
        }
    }
}

fn record_outcome(outcome: ScanOutcome, result: &mut CrawlResult, stats: &mut CrawlStatistics) {
    stats.record_page(outcome.state());

    match outcome {
        ScanOutcome::Recorded { record, links } => {
            tracing::debug!(
                "Recorded {} with {} violations",
                record.url,
                record.violations.len()
            );
            stats.links_discovered += links.accepted.len() as u64;
            stats.links_excluded += links.excluded.len() as u64;
            result.push(record);
        }
        ScanOutcome::Duplicate { url, .. } => {
            tracing::debug!("Duplicate structure: {}", url);
        }
        ScanOutcome::Failed { url, error } => {
            tracing::debug!("Failed: {}: {}", url, error);
        }
    }
}

/// Runs a complete crawl with the built-in renderer and analyzer
///
/// This function:
/// 1. Launches the HTTP renderer (fatal on failure)
/// 2. Builds the command analyzer and the exclusion policy from config
/// 3. Runs the crawl loop from `seed`
///
/// # Arguments
///
/// * `config` - The audit configuration
/// * `seed` - The seed URL
/// * `events` - Where crawl events are sent
///
/// # Returns
///
/// * `Ok(CrawlOutcome)` - The crawl ran to completion
/// * `Err(AuditError)` - The seed is invalid, the exclusion patterns do not
///   compile or the renderer could not be launched
///
/// # Example
///
/// ```no_run
/// use sumi_audit::config::Config;
/// use sumi_audit::crawler::{run_crawl, EventSink};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let outcome = run_crawl(&Config::default(), "https://example.com/", EventSink::disabled()).await?;
/// println!("{} pages recorded", outcome.result.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: &Config,
    seed: &str,
    events: EventSink,
) -> Result<CrawlOutcome, AuditError> {
    let exclusions = PatternExclusion::new(&config.exclusions.patterns)?;
    tracing::debug!("Loaded {} exclusion patterns", exclusions.len());

    let renderer = HttpRenderer::launch(&config.renderer)
        .map_err(|e| AuditError::RendererLaunch(e.to_string()))?;
    let analyzer = CommandAnalyzer::new(&config.analyzer);

    let coordinator = Coordinator::new(seed, &config.crawler, Arc::new(renderer), Arc::new(analyzer))?
        .with_exclusions(Arc::new(exclusions))
        .with_events(events);

    coordinator.run().await
}

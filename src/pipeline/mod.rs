// src/pipeline/mod.rs
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::extractors::{chunk_text, RecordExtractor};
use crate::fetch::TableSource;
use crate::records::{merge_by_domain, merge_by_key, BankRecord};
use crate::utils::error::FetchError;

pub const DEFAULT_CHUNK_SIZE: NonZeroUsize = match NonZeroUsize::new(500) {
    Some(size) => size,
    None => unreachable!(),
};
pub const DEFAULT_MAX_WORKERS: usize = 10;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;

/// Knobs for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Pages fetched concurrently.
    pub max_workers: usize,
    /// Segments of one page extracted concurrently.
    pub extract_concurrency: usize,
    /// Upper bound on one page fetch, including any headless render.
    pub fetch_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            extract_concurrency: 1,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }
}

/// Why a URL contributed nothing to the results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    /// The entry could not be used as a URL at all.
    InvalidUrl(String),
    /// Transport error, bad status, render failure or timeout.
    Retrieval(String),
    /// Page retrieved, but no table found.
    NoTables,
    /// Every segment of the page failed extraction.
    ExtractionFailed { segments: usize },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::InvalidUrl(cause) => write!(f, "invalid URL: {}", cause),
            FailureReason::Retrieval(cause) => write!(f, "retrieval failed: {}", cause),
            FailureReason::NoTables => write!(f, "no tables found"),
            FailureReason::ExtractionFailed { segments } => {
                write!(f, "all {} segment(s) failed extraction", segments)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnsuccessfulUrl {
    pub url: String,
    pub reason: FailureReason,
}

/// Serialized tables of one page, kept for debug output.
#[derive(Debug, Clone)]
pub struct PageTables {
    pub url: String,
    pub tables: Vec<String>,
}

#[derive(Debug, Default)]
pub struct PipelineOutput {
    /// One record per normalized institution domain, in first-seen order.
    pub records: Vec<BankRecord>,
    /// URLs that produced no page-level record, in input order.
    pub unsuccessful: Vec<UnsuccessfulUrl>,
    /// URLs whose page-level record went into `records`, in input order.
    pub contributing_urls: Vec<String>,
    pub tables: Vec<PageTables>,
}

/// Drives fetch, chunk, extract and merge for a batch of URLs.
pub struct Pipeline {
    source: Box<dyn TableSource>,
    extractor: Box<dyn RecordExtractor>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        source: Box<dyn TableSource>,
        extractor: Box<dyn RecordExtractor>,
        config: PipelineConfig,
    ) -> Self {
        Self { source, extractor, config }
    }

    /// Runs the whole batch. A failing page never aborts the batch: it ends
    /// up in `unsuccessful` and the other pages carry on.
    pub async fn run(&self, urls: &[String], segment_size: NonZeroUsize) -> PipelineOutput {
        let urls = dedup_urls(urls);
        tracing::info!(
            "Processing {} URL(s) with segment size {} using {}",
            urls.len(),
            segment_size,
            self.extractor.model()
        );

        let mut fetched = self.fetch_all(&urls).await;
        let mut output = PipelineOutput::default();
        let mut partials: Vec<(String, BankRecord)> = Vec::new();

        // Walk in input order so results do not depend on fetch completion order.
        for url in urls {
            if url.trim().is_empty() {
                tracing::warn!("Skipping empty URL entry");
                output.unsuccessful.push(UnsuccessfulUrl {
                    url: url.to_string(),
                    reason: FailureReason::InvalidUrl("empty URL".to_string()),
                });
                continue;
            }

            let tables = match fetched.remove(url) {
                Some(Ok(tables)) => tables,
                Some(Err(e)) => {
                    tracing::warn!("Failed to retrieve {}: {}", url, e);
                    output.unsuccessful.push(UnsuccessfulUrl {
                        url: url.to_string(),
                        reason: FailureReason::Retrieval(e.to_string()),
                    });
                    continue;
                }
                None => {
                    output.unsuccessful.push(UnsuccessfulUrl {
                        url: url.to_string(),
                        reason: FailureReason::Retrieval("no fetch result".to_string()),
                    });
                    continue;
                }
            };

            if tables.is_empty() {
                tracing::warn!("No tables found on {}", url);
                output.unsuccessful.push(UnsuccessfulUrl {
                    url: url.to_string(),
                    reason: FailureReason::NoTables,
                });
                continue;
            }

            let started = Instant::now();
            let combined = tables.concat();
            let segments = chunk_text(&combined, segment_size);
            let records = self.extract_segments(url, &segments).await;
            tracing::info!(
                "Processing time for {}: {:.2} seconds ({} of {} segment(s) extracted, {} item(s))",
                url,
                started.elapsed().as_secs_f64(),
                records.len(),
                segments.len(),
                records.iter().map(BankRecord::item_count).sum::<usize>()
            );

            output.tables.push(PageTables {
                url: url.to_string(),
                tables,
            });

            if records.is_empty() {
                output.unsuccessful.push(UnsuccessfulUrl {
                    url: url.to_string(),
                    reason: FailureReason::ExtractionFailed {
                        segments: segments.len(),
                    },
                });
                continue;
            }
            partials.extend(records.into_iter().map(|record| (url.to_string(), record)));
        }

        let pages = merge_by_key(partials);
        output.contributing_urls = pages.iter().map(|(url, _)| url.clone()).collect();
        output.records = merge_by_domain(pages.into_iter().map(|(_, page)| page).collect());

        tracing::info!(
            "Merged {} page(s) into {} institution record(s); {} unsuccessful URL(s)",
            output.contributing_urls.len(),
            output.records.len(),
            output.unsuccessful.len()
        );
        output
    }

    /// Fetches every non-blank URL with at most `max_workers` in flight.
    /// Workers only return their result; this task owns the map and does every
    /// insert. Entries are fetched trimmed but keyed as given.
    async fn fetch_all<'u>(
        &self,
        urls: &[&'u str],
    ) -> HashMap<&'u str, Result<Vec<String>, FetchError>> {
        let limit = self.config.fetch_timeout;
        let fetches = urls.iter().filter(|url| !url.trim().is_empty()).map(|&url| async move {
            let result = match tokio::time::timeout(limit, self.source.fetch_tables(url.trim())).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout(limit)),
            };
            (url, result)
        });

        stream::iter(fetches)
            .buffer_unordered(self.config.max_workers.max(1))
            .collect::<HashMap<_, _>>()
            .await
    }

    /// Extracts each segment; failed segments are logged and skipped. The
    /// returned records keep segment order.
    async fn extract_segments(&self, url: &str, segments: &[&str]) -> Vec<BankRecord> {
        let results: Vec<_> = stream::iter(segments.iter().map(|segment| self.extractor.extract(segment)))
            .buffered(self.config.extract_concurrency.max(1))
            .collect()
            .await;

        let total = results.len();
        results
            .into_iter()
            .enumerate()
            .filter_map(|(idx, result)| match result {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("Extraction failed for segment {}/{} of {}: {}", idx + 1, total, url, e);
                    None
                }
            })
            .collect()
    }
}

// Results are keyed by the URL as given, so a repeated entry is processed once.
fn dedup_urls(urls: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    urls.iter()
        .map(String::as_str)
        .filter(|url| {
            let first = seen.insert(*url);
            if !first {
                tracing::debug!("Skipping duplicate URL {}", url);
            }
            first
        })
        .collect()
}

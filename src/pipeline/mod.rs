use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Config;
use crate::feed::{self, Feed};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::materialize::Materializer;
use crate::report::{RunOutcome, RunReport, RunSummary};
use crate::resolver;
use crate::utils::{sanitize_filename, validate_and_normalize_url};
use crate::{Result, TranscriptError};

/// Main transcript download pipeline
pub struct TranscriptPipeline {
    config: Config,
    fetcher: Box<dyn Fetcher>,
}

impl TranscriptPipeline {
    /// Create a pipeline backed by the HTTP fetcher
    pub fn new(config: Config) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.http)?;
        Ok(Self::with_fetcher(config, Box::new(fetcher)))
    }

    pub fn with_fetcher(config: Config, fetcher: Box<dyn Fetcher>) -> Self {
        Self { config, fetcher }
    }

    /// Download every transcript of the feed at `feed_url`, then aggregate them.
    ///
    /// Only feed-level problems are errors; episode failures are logged, counted
    /// and reported in the returned summary.
    pub async fn run(&self, feed_url: &str) -> Result<RunSummary> {
        let url = validate_and_normalize_url(feed_url)?;

        println!("Parsing feed: {}", url);
        let content = self
            .fetcher
            .fetch(&url)
            .await
            .map_err(|source| TranscriptError::FeedFetch {
                url: url.clone(),
                source,
            })?;

        let feed = feed::parse(&content)?;
        if let Some(reason) = &feed.malformed {
            tracing::warn!("Malformed feed data detected. Error: {}", reason);
        }

        let podcast_title = sanitize_filename(&feed.title);
        let output_dir = self.config.app.output_dir.join(&podcast_title);
        fs_err::create_dir_all(&output_dir).context("Failed to create output directory")?;

        println!("Podcast Title: {}", feed.title);
        println!("Saving to: {}", output_dir.display());

        let mut report = RunReport::open(&output_dir)?;
        println!("Found {} episodes.", feed.entries.len());

        let materializer = Materializer::new(&*self.fetcher, &output_dir);
        self.process_entries(&feed, &materializer, &mut report).await?;

        let summary = report.finalize(&output_dir, &podcast_title)?;
        tracing::info!(
            "Finished {}: {} downloaded, {} skipped, {} failed",
            podcast_title,
            summary.success,
            summary.skipped,
            summary.failed
        );
        Ok(summary)
    }

    /// Resolve, download and record each entry in feed order
    async fn process_entries(
        &self,
        feed: &Feed,
        materializer: &Materializer<'_>,
        report: &mut RunReport,
    ) -> Result<()> {
        let progress = if self.config.app.show_progress {
            let bar = ProgressBar::new(feed.entries.len() as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                    .progress_chars("#>-"),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        for entry in &feed.entries {
            progress.set_message(entry.title.clone());

            let outcome = match resolver::resolve(entry) {
                Some(transcript) => materializer.materialize(entry, &transcript).await,
                None => RunOutcome::SkippedNoTranscript,
            };
            if let RunOutcome::DownloadFailed { error } = &outcome {
                progress.println(format!("Failed to download {}: {}", entry.title, error));
            }

            report.record(&entry.title, &entry.date_prefix(), &outcome)?;
            progress.inc(1);
        }

        progress.finish_and_clear();
        tracing::debug!(
            "Processed {} entries into {}",
            feed.entries.len(),
            materializer.output_dir().display()
        );
        Ok(())
    }
}

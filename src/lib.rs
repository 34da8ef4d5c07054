//! Podcast Transcripts - A Rust CLI tool for collecting podcast transcripts
//!
//! This library fetches a podcast RSS feed, resolves the transcript declared for each
//! episode (`podcast:transcript` or a `rel="transcript"` link), downloads it next to the
//! other episodes, flattens HTML transcripts to plain text and aggregates everything into
//! a single document per podcast.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod feed;
pub mod fetch;
pub mod materialize;
pub mod pipeline;
pub mod report;
pub mod resolver;
pub mod utils;

pub use cli::Cli;
pub use config::Config;
pub use feed::{Entry, Feed, TranscriptField};
pub use fetch::{FetchError, Fetcher, HttpFetcher};
pub use pipeline::TranscriptPipeline;
pub use report::{RunOutcome, RunReport, RunSummary};
pub use resolver::{MediaType, TranscriptRef};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error types that abort a run
#[derive(thiserror::Error, Debug)]
pub enum TranscriptError {
    #[error("Invalid feed URL: {0}")]
    InvalidUrl(String),

    #[error("Error fetching feed {url}: {source}")]
    FeedFetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("Could not parse feed title. Is this a valid RSS feed? ({0})")]
    InvalidFeed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

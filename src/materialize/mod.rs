use anyhow::Context;
use std::path::{Path, PathBuf};

mod html;

pub use html::html_to_text;

use crate::feed::Entry;
use crate::fetch::Fetcher;
use crate::report::RunOutcome;
use crate::resolver::{MediaType, TranscriptRef};
use crate::Result;

/// Downloads resolved transcripts into a podcast's output directory
pub struct Materializer<'a> {
    fetcher: &'a dyn Fetcher,
    output_dir: PathBuf,
}

impl<'a> Materializer<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Bring one episode's transcript onto disk.
    ///
    /// Nothing is fetched when the canonical file already exists. A failed
    /// download leaves no file behind, so the next run tries again.
    pub async fn materialize(&self, entry: &Entry, transcript: &TranscriptRef) -> RunOutcome {
        let canonical = self.output_dir.join(transcript.canonical_filename());
        if canonical.exists() {
            tracing::debug!("Exists: {}", canonical.display());
            return RunOutcome::SkippedAlreadyExists { path: canonical };
        }

        tracing::info!("Downloading transcript for: {}", entry.title);
        let content = match self.fetcher.fetch(&transcript.url).await {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to download {}: {}", entry.title, err);
                return RunOutcome::DownloadFailed {
                    error: err.to_string(),
                };
            }
        };
        match self.write_artifacts(transcript, &content) {
            Ok(path) => RunOutcome::Success {
                path,
                from_html: transcript.media_type == MediaType::Html,
                bytes: content.len() as u64,
            },
            Err(err) => {
                tracing::warn!("Failed to save {}: {:#}", entry.title, err);
                RunOutcome::DownloadFailed {
                    error: format!("{:#}", err),
                }
            }
        }
    }

    /// Write the raw download and, for HTML, its flattened `.txt` sibling.
    /// Returns the canonical path.
    fn write_artifacts(&self, transcript: &TranscriptRef, content: &[u8]) -> Result<PathBuf> {
        let raw_path = self.output_dir.join(&transcript.filename);
        fs_err::write(&raw_path, content).context("Failed to save transcript")?;

        if transcript.media_type != MediaType::Html {
            return Ok(raw_path);
        }

        let text_path = self.output_dir.join(transcript.canonical_filename());
        fs_err::write(&text_path, html_to_text(content))
            .context("Failed to save converted transcript")?;
        tracing::info!("Converted to: {}", transcript.canonical_filename());

        Ok(text_path)
    }
}

use anyhow::Context;
use console::style;
use fs_err::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::aggregate;
use crate::utils::format_file_size;
use crate::Result;

/// Append-only log of every run and episode outcome
pub const LOG_FILE_NAME: &str = "download_log.txt";

/// Append-only record of skipped and failed episodes
pub const CSV_FILE_NAME: &str = "skipped_episodes.csv";

const CSV_HEADER: [&str; 4] = ["Episode Title", "Reason", "Date", "Details"];

/// What happened to one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// `bytes` is the size of the download as served
    Success {
        path: PathBuf,
        from_html: bool,
        bytes: u64,
    },
    SkippedNoTranscript,
    SkippedAlreadyExists { path: PathBuf },
    DownloadFailed { error: String },
}

impl RunOutcome {
    /// Reason code and detail for the skipped-episodes CSV, if the outcome
    /// belongs there
    fn csv_reason(&self) -> Option<(&'static str, String)> {
        match self {
            RunOutcome::SkippedNoTranscript => {
                Some(("No Tag", "No podcast:transcript tag found".to_string()))
            }
            RunOutcome::DownloadFailed { error } => Some(("Download Error", error.clone())),
            RunOutcome::Success { .. } | RunOutcome::SkippedAlreadyExists { .. } => None,
        }
    }

    fn log_line(&self, title: &str) -> String {
        match self {
            RunOutcome::Success {
                path,
                from_html,
                bytes,
            } => {
                let file_name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let source = if *from_html { " (from HTML)" } else { "" };
                format!(
                    "SUCCESS: {} -> {}{} [{}]",
                    title,
                    file_name,
                    source,
                    format_file_size(*bytes)
                )
            }
            RunOutcome::SkippedNoTranscript => format!("SKIP [No Tag]: {}", title),
            RunOutcome::SkippedAlreadyExists { .. } => format!("SKIP [Exists]: {}", title),
            RunOutcome::DownloadFailed { error } => format!("ERROR: {} - {}", title, error),
        }
    }
}

/// Final counters of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub success: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Aggregated transcript file, when there was anything to aggregate
    pub aggregate_path: Option<PathBuf>,
}

/// Run state threaded through the pipeline: the open log, the CSV location and
/// the outcome counters
pub struct RunReport {
    log: File,
    csv_path: PathBuf,
    summary: RunSummary,
}

impl RunReport {
    /// Open the log and CSV in `output_dir` and write the run banner
    pub fn open(output_dir: &Path) -> Result<Self> {
        let csv_path = output_dir.join(CSV_FILE_NAME);
        if !csv_path.exists() {
            let mut writer = csv::Writer::from_writer(File::create(&csv_path)?);
            writer.write_record(CSV_HEADER)?;
            writer.flush()?;
        }

        let mut log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(output_dir.join(LOG_FILE_NAME))
            .context("Failed to open download log")?;
        writeln!(log, "--- Run started at {} ---", chrono::Local::now())?;

        Ok(Self {
            log,
            csv_path,
            summary: RunSummary::default(),
        })
    }

    /// Log one entry's outcome, append it to the CSV when skipped or failed,
    /// and count it
    pub fn record(&mut self, title: &str, date_prefix: &str, outcome: &RunOutcome) -> Result<()> {
        writeln!(self.log, "{}", outcome.log_line(title))?;

        if let Some((reason, details)) = outcome.csv_reason() {
            let file = OpenOptions::new().append(true).open(&self.csv_path)?;
            let mut writer = csv::Writer::from_writer(file);
            writer.write_record([title, reason, date_prefix, details.as_str()])?;
            writer.flush()?;
        }

        match outcome {
            RunOutcome::Success { .. } => self.summary.success += 1,
            RunOutcome::SkippedNoTranscript | RunOutcome::SkippedAlreadyExists { .. } => {
                self.summary.skipped += 1
            }
            RunOutcome::DownloadFailed { .. } => self.summary.failed += 1,
        }

        Ok(())
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Print the counters and build the aggregated transcript
    pub fn finalize(mut self, output_dir: &Path, podcast_title: &str) -> Result<RunSummary> {
        self.log.flush()?;

        println!(
            "\n{} Success: {}, Skipped: {}, Failed: {}",
            style("Done.").bold(),
            style(self.summary.success).green(),
            style(self.summary.skipped).yellow(),
            style(self.summary.failed).red()
        );

        self.summary.aggregate_path = aggregate::create_aggregated_file(output_dir, podcast_title)?;
        Ok(self.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(dir: &Path, name: &str) -> String {
        fs_err::read_to_string(dir.join(name)).unwrap()
    }

    #[test]
    fn test_csv_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        RunReport::open(dir.path()).unwrap();
        RunReport::open(dir.path()).unwrap();

        assert_eq!(
            read(dir.path(), CSV_FILE_NAME),
            "Episode Title,Reason,Date,Details\n"
        );
        let log = read(dir.path(), LOG_FILE_NAME);
        assert_eq!(log.matches("--- Run started at ").count(), 2);
    }

    #[test]
    fn test_record_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = RunReport::open(dir.path()).unwrap();

        report
            .record(
                "Ep 1",
                "2023-01-01",
                &RunOutcome::Success {
                    path: dir.path().join("2023-01-01_Ep 1.txt"),
                    from_html: true,
                    bytes: 2048,
                },
            )
            .unwrap();
        report
            .record("Ep 2", "0000-00-00", &RunOutcome::SkippedNoTranscript)
            .unwrap();
        report
            .record(
                "Ep 3",
                "2023-01-03",
                &RunOutcome::SkippedAlreadyExists {
                    path: dir.path().join("2023-01-03_Ep 3.vtt"),
                },
            )
            .unwrap();
        report
            .record(
                "Ep 4, \"live\"",
                "2023-01-04",
                &RunOutcome::DownloadFailed {
                    error: "HTTP 404 for https://x/4".to_string(),
                },
            )
            .unwrap();

        assert_eq!(
            report.summary(),
            &RunSummary {
                success: 1,
                skipped: 2,
                failed: 1,
                aggregate_path: None,
            }
        );

        let log = read(dir.path(), LOG_FILE_NAME);
        assert!(log.contains("SUCCESS: Ep 1 -> 2023-01-01_Ep 1.txt (from HTML) [2.0 KB]\n"));
        assert!(log.contains("SKIP [No Tag]: Ep 2\n"));
        assert!(log.contains("SKIP [Exists]: Ep 3\n"));
        assert!(log.contains("ERROR: Ep 4, \"live\" - HTTP 404 for https://x/4\n"));

        let csv = read(dir.path(), CSV_FILE_NAME);
        assert_eq!(
            csv,
            "Episode Title,Reason,Date,Details\n\
             Ep 2,No Tag,0000-00-00,No podcast:transcript tag found\n\
             \"Ep 4, \"\"live\"\"\",Download Error,2023-01-04,HTTP 404 for https://x/4\n"
        );
    }

    #[test]
    fn test_finalize_aggregates() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = RunReport::open(dir.path()).unwrap();
        let path = dir.path().join("2023-01-01_Ep 1.txt");
        fs_err::write(&path, "hello").unwrap();
        report
            .record(
                "Ep 1",
                "2023-01-01",
                &RunOutcome::Success {
                    path,
                    from_html: false,
                    bytes: 5,
                },
            )
            .unwrap();

        let log = read(dir.path(), LOG_FILE_NAME);
        assert!(log.contains("SUCCESS: Ep 1 -> 2023-01-01_Ep 1.txt [5 B]\n"));

        let summary = report.finalize(dir.path(), "Show").unwrap();
        assert_eq!(summary.success, 1);
        assert_eq!(
            summary.aggregate_path,
            Some(dir.path().join("Show_All_Transcripts.txt"))
        );
    }
}

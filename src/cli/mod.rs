use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "transcripts",
    about = "Podcast Transcripts - Download every transcript referenced by a podcast RSS feed",
    version,
    long_about = "Fetches a podcast RSS feed, downloads the transcript declared for each episode (podcast:transcript tags or rel=\"transcript\" links), converts HTML transcripts to plain text and writes one aggregated transcript file per podcast."
)]
pub struct Cli {
    /// RSS feed URL
    #[arg(value_name = "URL")]
    pub url: String,

    /// Output directory (one sub-directory per podcast is created inside it)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Verify TLS certificates instead of accepting invalid ones
    #[arg(long)]
    pub verify_tls: bool,

    /// HTTP timeout in seconds for the feed and each transcript
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Apply command line overrides on top of the loaded configuration
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(output) = &self.output {
            config.app.output_dir = output.clone();
        }
        if let Some(timeout) = self.timeout {
            config.http.timeout_secs = timeout;
        }
        if self.verify_tls {
            config.http.accept_invalid_certs = false;
        }
        if self.quiet {
            config.app.show_progress = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_leave_config_untouched() {
        let cli = Cli::parse_from(["transcripts", "https://example.com/feed.xml"]);
        let mut config = Config::default();
        cli.apply_to(&mut config);

        assert_eq!(cli.url, "https://example.com/feed.xml");
        assert_eq!(config.app.output_dir, PathBuf::from("downloads"));
        assert!(config.http.accept_invalid_certs);
        assert_eq!(config.http.timeout_secs, 10);
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from([
            "transcripts",
            "https://example.com/feed.xml",
            "--output",
            "/tmp/out",
            "--verify-tls",
            "--timeout",
            "30",
            "-q",
        ]);
        let mut config = Config::default();
        cli.apply_to(&mut config);

        assert_eq!(config.app.output_dir, PathBuf::from("/tmp/out"));
        assert!(!config.http.accept_invalid_certs);
        assert_eq!(config.http.timeout_secs, 30);
        assert!(!config.app.show_progress);
    }
}

use anyhow::Result;
use url::Url;

use crate::TranscriptError;

/// Characters that are not allowed in file names on common filesystems
const ILLEGAL_FILENAME_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Validate a URL and return normalized version
pub fn validate_and_normalize_url(url: &str) -> Result<String> {
    let parsed = Url::parse(url)
        .map_err(|_| TranscriptError::InvalidUrl(format!("Invalid URL format: {}", url)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(TranscriptError::InvalidUrl(
            "URL must use HTTP or HTTPS protocol".to_string(),
        )
        .into());
    }

    Ok(parsed.to_string())
}

/// Size of a downloaded transcript as shown in the download log
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}

/// Sanitize a title for use as a file name.
///
/// Only the characters in [`ILLEGAL_FILENAME_CHARS`] are removed; spaces and
/// punctuation are kept so that episode files stay readable.
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .filter(|c| !ILLEGAL_FILENAME_CHARS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

use anyhow::Context;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::report::LOG_FILE_NAME;
use crate::utils::sanitize_filename;
use crate::Result;

/// Marker in the aggregated file name; such files are never re-aggregated
pub const AGGREGATE_MARKER: &str = "All_Transcripts";

const RULE_WIDTH: usize = 80;

/// Name of the aggregated transcript file for a podcast
pub fn aggregate_file_name(podcast_title: &str) -> String {
    format!("{}_{}.txt", sanitize_filename(podcast_title), AGGREGATE_MARKER)
}

/// Episode `.txt` files in `output_dir`, sorted by name (and so by date prefix)
pub fn transcript_files(output_dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs_err::read_dir(output_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".txt") && !name.contains(AGGREGATE_MARKER) && name != LOG_FILE_NAME {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Concatenate every episode transcript into `{title}_All_Transcripts.txt`.
///
/// Any previous aggregate is overwritten. Files that cannot be read are
/// reported and left out. Returns `None` when there are no transcripts.
pub fn create_aggregated_file(output_dir: &Path, podcast_title: &str) -> Result<Option<PathBuf>> {
    let files = transcript_files(output_dir)?;
    if files.is_empty() {
        tracing::info!("No transcripts to aggregate in {}", output_dir.display());
        return Ok(None);
    }

    let agg_filename = aggregate_file_name(podcast_title);
    let agg_path = output_dir.join(&agg_filename);
    println!("\nCreating aggregated file: {}", agg_filename);

    let heavy_rule = "=".repeat(RULE_WIDTH);
    let light_rule = "-".repeat(RULE_WIDTH);

    let mut document = String::new();
    writeln!(document, "AGGREGATED TRANSCRIPTS FOR: {}", podcast_title)?;
    writeln!(document, "Generated: {}", chrono::Local::now())?;
    writeln!(document, "{}\n", heavy_rule)?;

    let mut included = 0usize;
    for name in &files {
        let content = match fs_err::read_to_string(output_dir.join(name)) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Error reading {}: {}", name, err);
                continue;
            }
        };

        writeln!(document, "EPISODE: {}", name)?;
        writeln!(document, "{}", light_rule)?;
        document.push_str(&content);
        write!(document, "\n\n{}\n\n", heavy_rule)?;
        included += 1;
    }

    fs_err::write(&agg_path, document).context("Failed to write aggregated transcript")?;
    tracing::info!("Aggregated {} of {} transcripts into {}", included, files.len(), agg_filename);

    Ok(Some(agg_path))
}

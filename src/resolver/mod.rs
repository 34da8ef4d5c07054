use crate::feed::Entry;
use crate::utils::sanitize_filename;

/// Link relation that marks a transcript link
const TRANSCRIPT_REL: &str = "transcript";

/// Declared transcript media types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Text,
    Json,
    Vtt,
    Srt,
    Html,
    Unknown,
}

impl MediaType {
    /// Map a declared `type` attribute. The match is exact and case-sensitive.
    pub fn from_declared(declared: Option<&str>) -> Self {
        match declared {
            Some("application/json") => MediaType::Json,
            Some("text/vtt") => MediaType::Vtt,
            Some("application/srt") => MediaType::Srt,
            Some("text/html") => MediaType::Html,
            Some("text/plain") => MediaType::Text,
            _ => MediaType::Unknown,
        }
    }

    /// File extension of the downloaded artifact, including the dot
    pub fn extension(&self) -> &'static str {
        match self {
            MediaType::Json => ".json",
            MediaType::Vtt => ".vtt",
            MediaType::Srt => ".srt",
            MediaType::Html => ".html",
            MediaType::Text | MediaType::Unknown => ".txt",
        }
    }
}

/// Where an episode's transcript lives and how it will be stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptRef {
    pub url: String,
    pub media_type: MediaType,
    /// `{date}_{title}{ext}` for the raw download
    pub filename: String,
    stem: String,
}

impl TranscriptRef {
    pub fn new(url: String, media_type: MediaType, date_prefix: &str, title: &str) -> Self {
        let stem = format!("{}_{}", date_prefix, sanitize_filename(title));
        Self {
            url,
            media_type,
            filename: format!("{}{}", stem, media_type.extension()),
            stem,
        }
    }

    /// File whose presence means the episode is done: the converted `.txt` for
    /// HTML transcripts, the raw download otherwise
    pub fn canonical_filename(&self) -> String {
        match self.media_type {
            MediaType::Html => format!("{}.txt", self.stem),
            _ => self.filename.clone(),
        }
    }
}

/// Find the transcript of an entry.
///
/// The transcript extension field wins (its first variant when there are
/// several); otherwise the first `rel="transcript"` link is used. Returns `None`
/// when neither yields a URL.
pub fn resolve(entry: &Entry) -> Option<TranscriptRef> {
    let (url, declared) = entry
        .transcripts
        .first()
        .and_then(|candidate| {
            candidate
                .url
                .as_deref()
                .filter(|url| !url.is_empty())
                .map(|url| (url, candidate.media_type.as_deref()))
        })
        .or_else(|| {
            entry
                .links
                .iter()
                .find(|link| link.rel.as_deref() == Some(TRANSCRIPT_REL))
                .and_then(|link| {
                    link.href
                        .as_deref()
                        .filter(|href| !href.is_empty())
                        .map(|href| (href, link.media_type.as_deref()))
                })
        })?;

    Some(TranscriptRef::new(
        url.to_string(),
        MediaType::from_declared(declared),
        &entry.date_prefix(),
        &entry.title,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{Link, TranscriptCandidate, TranscriptField};
    use chrono::{TimeZone, Utc};

    fn entry(title: &str) -> Entry {
        Entry {
            title: title.to_string(),
            published: Some(Utc.with_ymd_and_hms(2023, 1, 5, 12, 0, 0).unwrap()),
            transcripts: TranscriptField::None,
            links: Vec::new(),
        }
    }

    fn candidate(url: &str, media_type: Option<&str>) -> TranscriptCandidate {
        TranscriptCandidate {
            url: Some(url.to_string()),
            media_type: media_type.map(str::to_string),
        }
    }

    fn transcript_link(href: &str, media_type: &str) -> Link {
        Link {
            href: Some(href.to_string()),
            rel: Some("transcript".to_string()),
            media_type: Some(media_type.to_string()),
        }
    }

    #[test]
    fn test_canonical_path_for_html() {
        let mut ep = entry("Ep 1: A/B?");
        ep.transcripts = TranscriptField::One(candidate("https://x/1.html", Some("text/html")));

        let tref = resolve(&ep).unwrap();
        assert_eq!(tref.media_type, MediaType::Html);
        assert_eq!(tref.filename, "2023-01-05_Ep 1 AB.html");
        assert_eq!(tref.canonical_filename(), "2023-01-05_Ep 1 AB.txt");
    }

    #[test]
    fn test_extension_field_wins_over_link() {
        let mut ep = entry("Ep");
        ep.transcripts = TranscriptField::One(candidate("https://x/field.vtt", Some("text/vtt")));
        ep.links.push(transcript_link("https://x/link.srt", "application/srt"));

        let tref = resolve(&ep).unwrap();
        assert_eq!(tref.url, "https://x/field.vtt");
        assert_eq!(tref.media_type, MediaType::Vtt);
    }

    #[test]
    fn test_first_variant_is_used() {
        let mut ep = entry("Ep");
        ep.transcripts = TranscriptField::Many(vec![
            candidate("https://x/a.srt", Some("application/srt")),
            candidate("https://x/b.json", Some("application/json")),
        ]);

        let tref = resolve(&ep).unwrap();
        assert_eq!(tref.url, "https://x/a.srt");
        assert_eq!(tref.filename, "2023-01-05_Ep.srt");
    }

    #[test]
    fn test_link_fallback() {
        let mut ep = entry("Ep");
        ep.links.push(Link {
            href: Some("https://x/alternate".to_string()),
            rel: Some("alternate".to_string()),
            media_type: None,
        });
        ep.links.push(transcript_link("https://x/t.json", "application/json"));
        ep.links.push(transcript_link("https://x/t2.vtt", "text/vtt"));

        let tref = resolve(&ep).unwrap();
        assert_eq!(tref.url, "https://x/t.json");
        assert_eq!(tref.filename, "2023-01-05_Ep.json");
    }

    #[test]
    fn test_field_without_url_falls_back_to_link() {
        let mut ep = entry("Ep");
        ep.transcripts = TranscriptField::One(TranscriptCandidate {
            url: None,
            media_type: Some("text/vtt".to_string()),
        });
        ep.links.push(transcript_link("https://x/t.srt", "application/srt"));

        assert_eq!(resolve(&ep).unwrap().url, "https://x/t.srt");
    }

    #[test]
    fn test_no_transcript() {
        let mut ep = entry("Ep");
        assert!(resolve(&ep).is_none());

        ep.links.push(Link {
            href: Some("https://x/page".to_string()),
            rel: Some("Transcript".to_string()),
            media_type: None,
        });
        assert!(resolve(&ep).is_none());
    }

    #[test]
    fn test_type_mapping() {
        let cases = [
            (Some("application/json"), ".json"),
            (Some("text/vtt"), ".vtt"),
            (Some("application/srt"), ".srt"),
            (Some("text/html"), ".html"),
            (Some("text/plain"), ".txt"),
            (Some("application/x-subrip"), ".txt"),
            (Some("TEXT/HTML"), ".txt"),
            (None, ".txt"),
        ];

        for (declared, extension) in cases {
            assert_eq!(
                MediaType::from_declared(declared).extension(),
                extension,
                "declared type {:?}",
                declared
            );
        }
    }

    #[test]
    fn test_missing_date_prefix() {
        let mut ep = entry("Ep");
        ep.published = None;
        ep.transcripts = TranscriptField::One(candidate("https://x/t", None));

        let tref = resolve(&ep).unwrap();
        assert_eq!(tref.filename, "0000-00-00_Ep.txt");
        assert_eq!(tref.canonical_filename(), tref.filename);
    }
}

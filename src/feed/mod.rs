use chrono::{DateTime, Utc};

mod lenient;
mod parser;

pub use parser::parse;

/// Date prefix used for episodes without a publish date
pub const UNKNOWN_DATE: &str = "0000-00-00";

/// A parsed podcast feed
#[derive(Debug, Clone)]
pub struct Feed {
    /// Podcast title as declared by the feed
    pub title: String,

    /// Episodes in document order
    pub entries: Vec<Entry>,

    /// Set when the document was ill-formed and had to be read leniently
    pub malformed: Option<String>,
}

/// One episode of a feed
#[derive(Debug, Clone)]
pub struct Entry {
    pub title: String,
    pub published: Option<DateTime<Utc>>,
    pub transcripts: TranscriptField,
    pub links: Vec<Link>,
}

/// Contents of the transcript extension field of an entry.
///
/// Feeds may declare one transcript or several variants of it (usually ordered
/// by the producer's preference).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TranscriptField {
    #[default]
    None,
    One(TranscriptCandidate),
    Many(Vec<TranscriptCandidate>),
}

/// A transcript declared through the extension field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptCandidate {
    pub url: Option<String>,
    pub media_type: Option<String>,
}

/// An entry link (`atom:link` or Atom `<link>`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Link {
    pub href: Option<String>,
    pub rel: Option<String>,
    pub media_type: Option<String>,
}

impl TranscriptField {
    pub fn from_candidates(mut candidates: Vec<TranscriptCandidate>) -> Self {
        match candidates.len() {
            0 => TranscriptField::None,
            1 => TranscriptField::One(candidates.remove(0)),
            _ => TranscriptField::Many(candidates),
        }
    }

    /// The candidate resolution uses: the record itself, or the first variant
    pub fn first(&self) -> Option<&TranscriptCandidate> {
        match self {
            TranscriptField::None => None,
            TranscriptField::One(candidate) => Some(candidate),
            TranscriptField::Many(candidates) => candidates.first(),
        }
    }
}

impl Entry {
    /// `YYYY-MM-DD` of the publish date, or [`UNKNOWN_DATE`]
    pub fn date_prefix(&self) -> String {
        self.published
            .map(|published| published.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| UNKNOWN_DATE.to_string())
    }
}

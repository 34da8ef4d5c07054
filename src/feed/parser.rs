use chrono::{DateTime, Utc};
use rss::extension::Extension;

use super::{lenient, Entry, Feed, Link, TranscriptCandidate, TranscriptField};
use crate::{Result, TranscriptError};

/// Parse raw feed bytes.
///
/// RSS 2.0 is tried first since it carries the `podcast:` and `atom:` extension
/// elements. Documents with some other root (Atom, RDF) go to the multi-format
/// reader. RSS that fails to parse is marked malformed and read again, first
/// with bare `&` escaped, then event by event, so transcript tags survive.
pub fn parse(bytes: &[u8]) -> Result<Feed> {
    let rss_err = match rss::Channel::read_from(bytes) {
        Ok(channel) => {
            let feed = from_channel(&channel);
            tracing::debug!("Parsed as RSS, found {} entries", feed.entries.len());
            return ensure_title(feed);
        }
        Err(rss::Error::InvalidStartTag) => return parse_other_format(bytes),
        Err(err) => err,
    };

    tracing::debug!("Failed to parse as RSS: {}, reading leniently", rss_err);
    let repaired = lenient::escape_bare_ampersands(bytes);
    let mut feed = match rss::Channel::read_from(repaired.as_slice()) {
        Ok(channel) => from_channel(&channel),
        Err(err) => {
            tracing::debug!("Escaped RSS still unreadable: {}, reading event by event", err);
            lenient::read_channel(bytes)
        }
    };
    feed.malformed = Some(rss_err.to_string());
    tracing::debug!("Parsed leniently, found {} entries", feed.entries.len());

    if feed.title.trim().is_empty() {
        let reason = format!("feed has no title, RSS error: {}", rss_err);
        return Err(TranscriptError::InvalidFeed(reason).into());
    }
    Ok(feed)
}

/// Non-RSS documents, through feed-rs
fn parse_other_format(bytes: &[u8]) -> Result<Feed> {
    let parsed = feed_rs::parser::parse(bytes)
        .map_err(|err| TranscriptError::InvalidFeed(format!("not an RSS feed: {}", err)))?;

    let feed = from_feed_rs(parsed);
    tracing::debug!("Parsed as non-RSS feed, found {} entries", feed.entries.len());
    ensure_title(feed)
}

/// A feed without a usable title has no output directory; an empty
/// `<title></title>` counts as missing.
fn ensure_title(feed: Feed) -> Result<Feed> {
    if feed.title.trim().is_empty() {
        return Err(TranscriptError::InvalidFeed("feed has no title".to_string()).into());
    }
    Ok(feed)
}

fn from_channel(channel: &rss::Channel) -> Feed {
    let entries = channel
        .items()
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let transcripts = TranscriptField::from_candidates(
                extension_elements(item, "podcast", "transcript")
                    .iter()
                    .map(|ext| TranscriptCandidate {
                        url: ext.attrs().get("url").cloned(),
                        media_type: ext.attrs().get("type").cloned(),
                    })
                    .collect(),
            );

            let links = extension_elements(item, "atom", "link")
                .iter()
                .map(|ext| Link {
                    href: ext.attrs().get("href").cloned(),
                    rel: ext.attrs().get("rel").cloned(),
                    media_type: ext.attrs().get("type").cloned(),
                })
                .collect();

            Entry {
                title: entry_title(item.title(), index),
                published: item.pub_date().and_then(parse_date),
                transcripts,
                links,
            }
        })
        .collect();

    Feed {
        title: channel.title().to_string(),
        entries,
        malformed: None,
    }
}

/// Extension elements of an item, keyed by namespace prefix and local name
fn extension_elements<'a>(item: &'a rss::Item, prefix: &str, name: &str) -> &'a [Extension] {
    item.extensions()
        .get(prefix)
        .and_then(|elements| elements.get(name))
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn from_feed_rs(feed: feed_rs::model::Feed) -> Feed {
    let entries = feed
        .entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| Entry {
            title: entry_title(entry.title.as_ref().map(|t| t.content.as_str()), index),
            published: entry.published,
            transcripts: TranscriptField::None,
            links: entry
                .links
                .into_iter()
                .map(|link| Link {
                    href: Some(link.href),
                    rel: link.rel,
                    media_type: link.media_type,
                })
                .collect(),
        })
        .collect();

    Feed {
        title: feed.title.map(|t| t.content).unwrap_or_default(),
        entries,
        malformed: None,
    }
}

pub(super) fn entry_title(title: Option<&str>, index: usize) -> String {
    title
        .map(str::to_string)
        .unwrap_or_else(|| format!("Episode_{}", index))
}

pub(super) fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|date| date.with_timezone(&Utc))
        .map_err(|err| tracing::debug!("Unparseable publish date '{}': {}", raw, err))
        .ok()
}

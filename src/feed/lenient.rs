//! Event-level RSS reader for feeds the strict reader rejects.
//!
//! End tags are not matched against start tags and reader errors are stepped
//! over, so an unclosed `<item>` or a stray `&` costs at most the element it
//! appears in. Only the fields the downloader needs are collected.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::parser::{entry_title, parse_date};
use super::{Entry, Feed, Link, TranscriptCandidate, TranscriptField};

/// Reader errors tolerated before the rest of the document is given up on
const MAX_READ_ERRORS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextField {
    ChannelTitle,
    ItemTitle,
    ItemPubDate,
}

#[derive(Debug, Default)]
struct ItemDraft {
    title: Option<String>,
    pub_date: Option<String>,
    transcripts: Vec<TranscriptCandidate>,
    links: Vec<Link>,
}

#[derive(Debug, Default)]
struct ChannelDraft {
    title: Option<String>,
    entries: Vec<Entry>,
    item: Option<ItemDraft>,
    in_image: bool,
    capture: Option<(TextField, String)>,
}

impl ChannelDraft {
    fn start(&mut self, element: &BytesStart<'_>) {
        match element.name().as_ref() {
            b"item" => {
                // A new item implicitly closes one left open
                self.finish_item();
                self.item = Some(ItemDraft::default());
            }
            b"image" => self.in_image = true,
            b"title" => {
                if self.item.is_some() {
                    self.capture = Some((TextField::ItemTitle, String::new()));
                } else if self.title.is_none() && !self.in_image {
                    self.capture = Some((TextField::ChannelTitle, String::new()));
                }
            }
            b"pubDate" if self.item.is_some() => {
                self.capture = Some((TextField::ItemPubDate, String::new()));
            }
            b"podcast:transcript" => {
                if let Some(item) = self.item.as_mut() {
                    item.transcripts.push(TranscriptCandidate {
                        url: attribute(element, b"url"),
                        media_type: attribute(element, b"type"),
                    });
                }
            }
            b"atom:link" => {
                if let Some(item) = self.item.as_mut() {
                    item.links.push(Link {
                        href: attribute(element, b"href"),
                        rel: attribute(element, b"rel"),
                        media_type: attribute(element, b"type"),
                    });
                }
            }
            _ => {}
        }
    }

    fn end(&mut self, name: &[u8]) {
        match name {
            b"title" | b"pubDate" => self.finish_text(),
            b"item" | b"channel" | b"rss" => {
                self.finish_text();
                self.finish_item();
            }
            b"image" => self.in_image = false,
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some((_, buffer)) = self.capture.as_mut() {
            buffer.push_str(text);
        }
    }

    fn finish_text(&mut self) {
        let Some((field, buffer)) = self.capture.take() else {
            return;
        };
        let value = buffer.trim().to_string();
        match (field, self.item.as_mut()) {
            (TextField::ChannelTitle, _) => self.title = Some(value),
            (TextField::ItemTitle, Some(item)) => item.title = Some(value),
            (TextField::ItemPubDate, Some(item)) => item.pub_date = Some(value),
            _ => {}
        }
    }

    fn finish_item(&mut self) {
        let Some(item) = self.item.take() else {
            return;
        };
        let index = self.entries.len();
        self.entries.push(Entry {
            title: entry_title(item.title.as_deref(), index),
            published: item.pub_date.as_deref().and_then(parse_date),
            transcripts: TranscriptField::from_candidates(item.transcripts),
            links: item.links,
        });
    }

    fn into_feed(mut self) -> Feed {
        self.finish_text();
        self.finish_item();
        Feed {
            title: self.title.unwrap_or_default(),
            entries: self.entries,
            malformed: None,
        }
    }
}

/// Read channel title, items, transcript tags and item `atom:link`s from
/// possibly broken RSS.
pub(super) fn read_channel(bytes: &[u8]) -> Feed {
    let repaired = escape_bare_ampersands(bytes);
    let mut reader = Reader::from_reader(repaired.as_slice());
    let config = reader.config_mut();
    config.check_end_names = false;
    config.expand_empty_elements = true;

    let mut draft = ChannelDraft::default();
    let mut buf = Vec::new();
    let mut errors = 0;

    loop {
        let position = reader.buffer_position();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => draft.start(&e),
            Ok(Event::End(e)) => draft.end(e.name().as_ref()),
            Ok(Event::Text(e)) => {
                let text = match e.decode() {
                    Ok(text) => text.into_owned(),
                    Err(_) => String::from_utf8_lossy(&e).into_owned(),
                };
                draft.text(&text);
            }
            Ok(Event::CData(e)) => draft.text(&String::from_utf8_lossy(&e)),
            Ok(Event::GeneralRef(e)) => draft.text(&resolve_reference(&String::from_utf8_lossy(&e))),
            Ok(Event::Eof) => break,
            Err(err) => {
                errors += 1;
                tracing::debug!(
                    "Skipping unreadable feed data at position {}: {}",
                    position,
                    err
                );
                if errors >= MAX_READ_ERRORS || reader.buffer_position() == position {
                    break;
                }
            }
            _ => {}
        }
        buf.clear();
    }

    draft.into_feed()
}

fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| match attr.unescape_value() {
            Ok(value) => value.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        })
}

/// Text of a `&name;` reference; unknown names are kept verbatim
fn resolve_reference(name: &str) -> String {
    let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok()
    } else if let Some(decimal) = name.strip_prefix('#') {
        decimal.parse().ok()
    } else {
        None
    };
    if let Some(c) = code.and_then(char::from_u32) {
        return c.to_string();
    }

    match name {
        "amp" => "&".to_string(),
        "lt" => "<".to_string(),
        "gt" => ">".to_string(),
        "quot" => "\"".to_string(),
        "apos" => "'".to_string(),
        _ => format!("&{};", name),
    }
}

/// Escape every `&` that does not start a well-formed entity or character
/// reference. CDATA sections are copied untouched.
pub(super) fn escape_bare_ampersands(bytes: &[u8]) -> Vec<u8> {
    const CDATA_OPEN: &[u8] = b"<![CDATA[";
    const CDATA_CLOSE: &[u8] = b"]]>";

    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i..].starts_with(CDATA_OPEN) {
            let end = bytes[i..]
                .windows(CDATA_CLOSE.len())
                .position(|window| window == CDATA_CLOSE)
                .map(|offset| i + offset + CDATA_CLOSE.len())
                .unwrap_or(bytes.len());
            out.extend_from_slice(&bytes[i..end]);
            i = end;
            continue;
        }

        if bytes[i] == b'&' && !starts_reference(&bytes[i + 1..]) {
            out.extend_from_slice(b"&amp;");
        } else {
            out.push(bytes[i]);
        }
        i += 1;
    }
    out
}

/// `name;`, `#digits;` or `#xhex;`
fn starts_reference(rest: &[u8]) -> bool {
    let Some(end) = rest.iter().take(32).position(|&b| b == b';') else {
        return false;
    };
    let body = &rest[..end];
    match body {
        [b'#', b'x' | b'X', hex @ ..] => !hex.is_empty() && hex.iter().all(u8::is_ascii_hexdigit),
        [b'#', digits @ ..] => !digits.is_empty() && digits.iter().all(u8::is_ascii_digit),
        [first, tail @ ..] => {
            (first.is_ascii_alphabetic() || *first == b'_')
                && tail
                    .iter()
                    .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'))
        }
        [] => false,
    }
}

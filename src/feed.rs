//! RSS and Atom feed reading with keyword filtering.
//!
//! Feeds are read with quick-xml's event reader. The root element decides the
//! format: `<rss>` documents yield their `<item>`s and Atom `<feed>`s their
//! `<entry>`s, both reduced to a [`FeedItem`]. Only elements in the root's
//! namespace prefix are read, so extensions such as `<atom:link>` or
//! `<media:description>` inside an RSS item are ignored.

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::Reader;
use reqwest::Client;
use scraper::Html;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("failed to fetch feed: {0}")]
    FetchError(#[from] reqwest::Error),
    #[error("failed to parse feed: {0}")]
    ParseError(#[from] quick_xml::Error),
    #[error("not an RSS or Atom feed (root element: {0})")]
    UnknownFormat(String),
}

/// One headline from a feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    /// Plain-text teaser; HTML in the feed is stripped
    pub description: String,
}

impl FeedItem {
    pub fn new(title: &str, link: &str, description: &str) -> Self {
        Self {
            title: title.trim().to_string(),
            link: link.trim().to_string(),
            description: description.trim().to_string(),
        }
    }

    /// Case-insensitive substring match against title and description.
    pub fn matches(&self, query: &str) -> bool {
        let haystack = format!("{} {}", self.title, self.description).to_lowercase();
        haystack.contains(&query.trim().to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Rss,
    Atom,
}

impl Format {
    fn from_root(local_name: &[u8]) -> Option<Self> {
        match local_name {
            b"rss" => Some(Format::Rss),
            b"feed" => Some(Format::Atom),
            _ => None,
        }
    }

    fn entry_tag(self) -> &'static [u8] {
        match self {
            Format::Rss => b"item",
            Format::Atom => b"entry",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Summary,
    Content,
}

impl Field {
    fn from_tag(local_name: &[u8]) -> Option<Self> {
        match local_name {
            b"title" => Some(Field::Title),
            b"link" => Some(Field::Link),
            b"description" | b"summary" => Some(Field::Summary),
            b"content" => Some(Field::Content),
            _ => None,
        }
    }
}

/// Fields of one `<item>` or `<entry>`; the first non-empty value wins.
#[derive(Default)]
struct EntryDraft {
    title: Option<String>,
    link: Option<String>,
    link_is_alternate: bool,
    summary: Option<String>,
    content: Option<String>,
}

impl EntryDraft {
    fn set(&mut self, field: Field, text: String) {
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::Summary => &mut self.summary,
            Field::Content => &mut self.content,
        };
        if slot.is_none() && !text.trim().is_empty() {
            *slot = Some(text);
        }
    }

    /// Atom links live in attributes. A `rel="alternate"` (or rel-less) link
    /// beats any other relation.
    fn add_atom_link(&mut self, tag: &BytesStart<'_>) -> Result<(), FeedError> {
        let mut href = None;
        let mut rel = None;
        for attr in tag.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            match attr.key.local_name().as_ref() {
                b"href" => href = Some(attr.unescape_value()?.into_owned()),
                b"rel" => rel = Some(attr.unescape_value()?.into_owned()),
                _ => {}
            }
        }
        let Some(href) = href else {
            return Ok(());
        };
        let alternate = rel.as_deref().map_or(true, |rel| rel == "alternate");
        if self.link.is_none() || (alternate && !self.link_is_alternate) {
            self.link = Some(href);
            self.link_is_alternate = alternate;
        }
        Ok(())
    }

    fn into_item(self) -> FeedItem {
        let description = self.summary.or(self.content).unwrap_or_default();
        FeedItem::new(
            &plain_text(self.title.as_deref().unwrap_or_default()),
            self.link.as_deref().unwrap_or_default(),
            &plain_text(&description),
        )
    }
}

/// Element-depth bookkeeping while walking the document
#[derive(Default)]
struct FeedParser {
    format: Option<Format>,
    root_prefix: Vec<u8>,
    depth: usize,
    entry: Option<(usize, EntryDraft)>,
    field: Option<(usize, Field, String)>,
    items: Vec<FeedItem>,
}

impl FeedParser {
    fn open(&mut self, tag: &BytesStart<'_>) -> Result<(), FeedError> {
        self.depth += 1;
        let name = tag.name();
        let prefix = name.prefix().map(|p| p.as_ref().to_vec()).unwrap_or_default();

        let Some(format) = self.format else {
            let format = Format::from_root(name.local_name().as_ref()).ok_or_else(|| {
                FeedError::UnknownFormat(String::from_utf8_lossy(name.as_ref()).into_owned())
            })?;
            self.format = Some(format);
            self.root_prefix = prefix;
            return Ok(());
        };

        // Markup nested inside a field only contributes its text
        if self.field.is_some() || prefix != self.root_prefix {
            return Ok(());
        }

        let local = name.local_name();
        let depth = self.depth;
        let Some((entry_depth, entry)) = &mut self.entry else {
            if local.as_ref() == format.entry_tag() {
                self.entry = Some((depth, EntryDraft::default()));
            }
            return Ok(());
        };
        if depth != *entry_depth + 1 {
            return Ok(());
        }
        match Field::from_tag(local.as_ref()) {
            Some(Field::Link) if format == Format::Atom => entry.add_atom_link(tag)?,
            Some(field) => self.field = Some((depth, field, String::new())),
            None => {}
        }
        Ok(())
    }

    fn close(&mut self) {
        match self.field.take() {
            Some((depth, field, text)) if depth == self.depth => {
                if let Some((_, entry)) = &mut self.entry {
                    entry.set(field, text);
                }
            }
            other => self.field = other,
        }
        match self.entry.take() {
            Some((depth, entry)) if depth == self.depth => self.items.push(entry.into_item()),
            other => self.entry = other,
        }
        self.depth = self.depth.saturating_sub(1);
    }

    fn text(&mut self, chunk: &str) {
        if let Some((_, _, text)) = &mut self.field {
            text.push_str(chunk);
        }
    }

    fn reference(&mut self, reference: &BytesRef<'_>) -> Result<(), FeedError> {
        if let Some(ch) = reference.resolve_char_ref()? {
            self.text(ch.encode_utf8(&mut [0; 4]));
            return Ok(());
        }
        let name = reference.decode().map_err(quick_xml::Error::from)?;
        match resolve_predefined_entity(&name) {
            Some(resolved) => self.text(resolved),
            None => self.text(&format!("&{name};")),
        }
        Ok(())
    }
}

/// Parse an RSS 2.0 or Atom document into feed items.
///
/// Entries with neither a title nor a description are dropped. A document
/// whose root is neither `<rss>` nor `<feed>` is an error, not an empty feed.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedItem>, FeedError> {
    let mut reader = Reader::from_str(xml);
    let mut parser = FeedParser::default();

    loop {
        match reader.read_event()? {
            Event::Start(tag) => parser.open(&tag)?,
            Event::Empty(tag) => {
                parser.open(&tag)?;
                parser.close();
            }
            Event::End(_) => parser.close(),
            Event::Text(text) => parser.text(&text.decode().map_err(quick_xml::Error::from)?),
            Event::CData(data) => parser.text(&data.decode().map_err(quick_xml::Error::from)?),
            Event::GeneralRef(reference) => parser.reference(&reference)?,
            Event::Eof => break,
            _ => {}
        }
    }

    if parser.format.is_none() {
        return Err(FeedError::UnknownFormat("none".to_string()));
    }
    Ok(parser
        .items
        .into_iter()
        .filter(|item| !item.title.is_empty() || !item.description.is_empty())
        .collect())
}

/// Fetch and parse a single feed
pub async fn fetch_feed_items(client: &Client, feed_url: &str) -> Result<Vec<FeedItem>, FeedError> {
    let response = client.get(feed_url).send().await?.error_for_status()?;
    let xml = response.text().await?;
    parse_feed(&xml)
}

/// Fetch every feed in order. A feed that fails is logged and skipped.
pub async fn collect_items(client: &Client, feeds: &[String]) -> Vec<FeedItem> {
    let mut all_items = Vec::new();
    for feed_url in feeds {
        match fetch_feed_items(client, feed_url).await {
            Ok(items) => {
                info!(feed = %feed_url, items = items.len(), "fetched feed");
                all_items.extend(items);
            }
            Err(e) => warn!(feed = %feed_url, error = %e, "skipping feed"),
        }
    }
    all_items
}

/// Items whose title or description contains `query`, in feed order
pub fn filter_items<'a>(items: &'a [FeedItem], query: &str) -> Vec<&'a FeedItem> {
    items.iter().filter(|item| item.matches(query)).collect()
}

/// Strip markup from feed text, which often carries escaped HTML
fn plain_text(text: &str) -> String {
    if !text.contains('<') {
        return text.split_whitespace().collect::<Vec<_>>().join(" ");
    }
    let fragment = Html::parse_fragment(text);
    fragment
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

//! Streaming, namespace-aware reader for NCTS Atom syndication feeds.

use crate::error::{FeedError, Result};
use crate::types::Entry;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

/// Atom syndication format namespace
pub const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";

/// NCTS syndication extension namespace
pub const NCTS_NAMESPACE: &str =
    "http://ns.electronichealth.net.au/ncts/syndication/asf/extensions/1.0.0";

/// Root element depth
const FEED_DEPTH: usize = 1;
/// Depth of `<entry>` elements directly under the root
const ENTRY_DEPTH: usize = 2;
/// Depth of the children of an entry
const FIELD_DEPTH: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Ns {
    Atom,
    Ncts,
    Other,
}

impl Ns {
    fn of(resolved: &ResolveResult) -> Self {
        match resolved {
            ResolveResult::Bound(Namespace(ns)) if *ns == ATOM_NAMESPACE.as_bytes() => Ns::Atom,
            ResolveResult::Bound(Namespace(ns)) if *ns == NCTS_NAMESPACE.as_bytes() => Ns::Ncts,
            _ => Ns::Other,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TextField {
    Id,
    Title,
    ContentItemIdentifier,
    ContentItemVersion,
}

#[derive(Debug, Default)]
struct CategoryAttrs {
    term: Option<String>,
    scheme: Option<String>,
}

#[derive(Debug, Default)]
struct LinkAttrs {
    href: Option<String>,
    length: Option<String>,
    hash: Option<String>,
    media_type: Option<String>,
}

#[derive(Debug, Default)]
struct EntryBuilder {
    id: Option<String>,
    title: Option<String>,
    content_item_identifier: Option<String>,
    content_item_version: Option<String>,
    categories: Vec<CategoryAttrs>,
    links: Vec<LinkAttrs>,
}

impl EntryBuilder {
    fn set_text(&mut self, field: TextField, value: String) {
        let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
        match field {
            TextField::Id => self.id = value,
            TextField::Title => self.title = value,
            TextField::ContentItemIdentifier => self.content_item_identifier = value,
            TextField::ContentItemVersion => self.content_item_version = value,
        }
    }

    fn build(self) -> Result<Entry> {
        let id = self.id.ok_or(FeedError::MissingField {
            id: String::new(),
            field: "id",
        })?;

        let [category]: [CategoryAttrs; 1] =
            self.categories
                .try_into()
                .map_err(|found: Vec<CategoryAttrs>| FeedError::CategoryCardinality {
                    id: id.clone(),
                    count: found.len(),
                })?;
        let [link]: [LinkAttrs; 1] =
            self.links
                .try_into()
                .map_err(|found: Vec<LinkAttrs>| FeedError::LinkCardinality {
                    id: id.clone(),
                    count: found.len(),
                })?;

        let missing = |field: &'static str| FeedError::MissingField {
            id: id.clone(),
            field,
        };

        let term = category.term.ok_or_else(|| missing("category term"))?;
        let href = link.href.ok_or_else(|| missing("link href"))?;
        let raw_length = link.length.ok_or_else(|| missing("link length"))?;
        let hash = link.hash.ok_or_else(|| missing("link ncts:sha256Hash"))?;
        let content_item_identifier = self
            .content_item_identifier
            .ok_or_else(|| missing("ncts:contentItemIdentifier"))?;
        let content_item_version = self
            .content_item_version
            .ok_or_else(|| missing("ncts:contentItemVersion"))?;

        let content_length =
            raw_length
                .trim()
                .parse::<u64>()
                .map_err(|_| FeedError::InvalidLength {
                    id: id.clone(),
                    value: raw_length.clone(),
                })?;

        Ok(Entry {
            id,
            title: self.title,
            content_item_identifier,
            content_item_version,
            category: term,
            category_scheme: category.scheme,
            content_hash: hash,
            content_length,
            source_url: href,
            media_type: link.media_type,
            local_file: None,
        })
    }
}

fn xml_error(reader: &NsReader<&[u8]>, message: impl std::fmt::Display) -> FeedError {
    FeedError::Xml(format!(
        "{} at position {}",
        message,
        reader.buffer_position()
    ))
}

/// Read the `term`/`scheme` attributes of an Atom category
fn category_attrs(reader: &NsReader<&[u8]>, element: &BytesStart) -> Result<CategoryAttrs> {
    let mut attrs = CategoryAttrs::default();
    for attr in element.attributes() {
        let attr = attr.map_err(|e| xml_error(reader, e))?;
        let (ns, local) = reader.resolve_attribute(attr.key);
        if !matches!(ns, ResolveResult::Unbound) {
            continue;
        }
        let value = attr.unescape_value().map_err(|e| xml_error(reader, e))?;
        match local.as_ref() {
            b"term" => attrs.term = Some(value.into_owned()),
            b"scheme" => attrs.scheme = Some(value.into_owned()),
            _ => {}
        }
    }
    Ok(attrs)
}

/// Read `href`, `length`, `type` and the namespaced hash attribute of an Atom link
fn link_attrs(reader: &NsReader<&[u8]>, element: &BytesStart) -> Result<LinkAttrs> {
    let mut attrs = LinkAttrs::default();
    for attr in element.attributes() {
        let attr = attr.map_err(|e| xml_error(reader, e))?;
        let (ns, local) = reader.resolve_attribute(attr.key);
        let ns = Ns::of(&ns);
        let value = attr.unescape_value().map_err(|e| xml_error(reader, e))?;
        match (ns, local.as_ref()) {
            (Ns::Ncts, b"sha256Hash") => attrs.hash = Some(value.trim().to_string()),
            (Ns::Other, b"href") => attrs.href = Some(value.trim().to_string()),
            (Ns::Other, b"length") => attrs.length = Some(value.into_owned()),
            (Ns::Other, b"type") => attrs.media_type = Some(value.into_owned()),
            _ => {}
        }
    }
    Ok(attrs)
}

/// Parse a feed document into its entries, in document order
///
/// Entry-level validation (cardinality, required fields) happens here;
/// ID uniqueness is enforced by the [`CategoryIndex`](super::CategoryIndex).
pub fn parse_entries(xml: &str) -> Result<Vec<Entry>> {
    let mut reader = NsReader::from_str(xml);
    reader.trim_text(true);

    let mut entries = Vec::new();
    let mut depth = 0usize;
    let mut saw_root = false;
    let mut current: Option<EntryBuilder> = None;
    let mut capture: Option<(TextField, String)> = None;

    loop {
        let read = reader
            .read_resolved_event()
            .map(|(resolved, event)| (Ns::of(&resolved), event));
        let (ns, event) = match read {
            Ok(read) => read,
            Err(e) => return Err(xml_error(&reader, e).into()),
        };

        match event {
            Event::Start(ref element) | Event::Empty(ref element) => {
                let is_empty = matches!(event, Event::Empty(_));
                let element_depth = depth + 1;
                let local = element.local_name();

                if element_depth == FEED_DEPTH {
                    if ns != Ns::Atom || local.as_ref() != b"feed" {
                        return Err(FeedError::NotAtomFeed.into());
                    }
                    saw_root = true;
                } else if element_depth == ENTRY_DEPTH && ns == Ns::Atom && local.as_ref() == b"entry" {
                    if is_empty {
                        entries.push(EntryBuilder::default().build()?);
                    } else {
                        current = Some(EntryBuilder::default());
                    }
                } else if element_depth == FIELD_DEPTH
                    && let Some(builder) = current.as_mut()
                {
                    let field = match (ns, local.as_ref()) {
                        (Ns::Atom, b"category") => {
                            builder.categories.push(category_attrs(&reader, element)?);
                            None
                        }
                        (Ns::Atom, b"link") => {
                            builder.links.push(link_attrs(&reader, element)?);
                            None
                        }
                        (Ns::Atom, b"id") => Some(TextField::Id),
                        (Ns::Atom, b"title") => Some(TextField::Title),
                        (Ns::Ncts, b"contentItemIdentifier") => {
                            Some(TextField::ContentItemIdentifier)
                        }
                        (Ns::Ncts, b"contentItemVersion") => Some(TextField::ContentItemVersion),
                        _ => None,
                    };
                    if let Some(field) = field {
                        if is_empty {
                            builder.set_text(field, String::new());
                        } else {
                            capture = Some((field, String::new()));
                        }
                    }
                }

                if !is_empty {
                    depth = element_depth;
                }
            }
            Event::Text(ref text) => {
                if let Some((_, buffer)) = capture.as_mut() {
                    let text = text.unescape().map_err(|e| xml_error(&reader, e))?;
                    buffer.push_str(&text);
                }
            }
            Event::CData(ref data) => {
                if let Some((_, buffer)) = capture.as_mut() {
                    buffer.push_str(&String::from_utf8_lossy(data));
                }
            }
            Event::End(_) => {
                if depth == FIELD_DEPTH
                    && let Some((field, value)) = capture.take()
                    && let Some(builder) = current.as_mut()
                {
                    builder.set_text(field, value);
                } else if depth == ENTRY_DEPTH
                    && let Some(builder) = current.take()
                {
                    entries.push(builder.build()?);
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(FeedError::NotAtomFeed.into());
    }

    Ok(entries)
}

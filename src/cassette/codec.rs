//! Diagnostic decoding of recorded bodies.
//!
//! Bodies are always stored verbatim. When the content type says XML or
//! JSON, a structured copy is attached as `decodedBody` so cassette files
//! stay readable. Replay never looks at it.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{json, Map, Value};

use super::format::InteractionEntry;
use crate::error::{CassetteError, Result};

/// Media families the codec knows how to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Xml,
    Json,
}

impl BodyKind {
    /// Classify a `Content-Type` header value, ignoring parameters.
    fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        if essence == "application/xml" || essence == "text/xml" || essence.ends_with("+xml") {
            Some(Self::Xml)
        } else if essence == "application/json" || essence.ends_with("+json") {
            Some(Self::Json)
        } else {
            None
        }
    }

    /// Guess from the first meaningful character of a body.
    fn sniff(body: &str) -> Option<Self> {
        match body.trim_start().chars().next() {
            Some('<') => Some(Self::Xml),
            Some('{' | '[') => Some(Self::Json),
            _ => None,
        }
    }
}

/// Decode `body` according to its declared content type.
///
/// Returns `Ok(None)` when there is no body, the body is blank, or the
/// content type is neither XML nor JSON. Invalid XML yields a marker
/// object rather than an error.
///
/// # Errors
///
/// Returns [`CassetteError::InvalidJsonBody`] when a JSON-typed body does not parse.
pub fn decode_body(body: Option<&str>, content_type: Option<&str>) -> Result<Option<Value>> {
    let Some(kind) = content_type.and_then(BodyKind::from_content_type) else {
        return Ok(None);
    };
    decode_as(body, kind)
}

/// Decode a request body, whose content type is inferred from the body itself.
///
/// A guessed type is never trusted enough to fail on: a body that looks
/// like JSON but does not parse yields an `invalidJson` marker.
#[must_use]
pub fn decode_request_body(body: Option<&str>) -> Option<Value> {
    let kind = body.and_then(BodyKind::sniff)?;
    match decode_as(body, kind) {
        Ok(value) => value,
        Err(err) => Some(json!({ "invalidJson": true, "reason": err.to_string() })),
    }
}

/// Attach `decodedBody` to both halves of `entry`.
///
/// # Errors
///
/// Propagates JSON decoding failures from [`decode_body`].
pub fn enrich(entry: &mut InteractionEntry) -> Result<()> {
    entry.request.decoded_body = decode_request_body(entry.request.body.as_deref());
    entry.response.decoded_body =
        decode_body(entry.response.body.as_deref(), entry.response.content_type.as_deref())?;
    Ok(())
}

fn decode_as(body: Option<&str>, kind: BodyKind) -> Result<Option<Value>> {
    let Some(body) = body.filter(|b| !b.trim().is_empty()) else {
        return Ok(None);
    };
    match kind {
        BodyKind::Json => {
            serde_json::from_str(body).map(Some).map_err(CassetteError::InvalidJsonBody)
        }
        BodyKind::Xml => Ok(Some(match xml_to_value(body) {
            Ok(value) => value,
            Err(reason) => json!({ "invalidXml": true, "reason": reason }),
        })),
    }
}

/// An element under construction.
struct XmlNode {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<(String, Value)>,
    text: String,
}

impl XmlNode {
    fn open(start: &BytesStart<'_>) -> std::result::Result<Self, String> {
        let name = utf8(start.local_name().as_ref())?;
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| e.to_string())?;
            if attr.key.as_namespace_binding().is_some() {
                continue;
            }
            let key = utf8(attr.key.local_name().as_ref())?;
            let value = attr.unescape_value().map_err(|e| e.to_string())?;
            attributes.push((key, value.into_owned()));
        }
        Ok(Self { name, attributes, children: Vec::new(), text: String::new() })
    }

    fn into_value(self) -> Value {
        if self.attributes.is_empty() && self.children.is_empty() {
            return Value::String(self.text);
        }

        let mut map = Map::new();
        for (key, value) in self.attributes {
            map.insert(format!("@{key}"), Value::String(value));
        }
        for (name, value) in self.children {
            // Element values are never arrays, so an array here means a repeated name.
            match map.get_mut(&name) {
                Some(Value::Array(items)) => items.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    map.insert(name, value);
                }
            }
        }
        if !self.text.is_empty() {
            map.insert("#text".to_string(), Value::String(self.text));
        }
        Value::Object(map)
    }
}

fn utf8(bytes: &[u8]) -> std::result::Result<String, String> {
    std::str::from_utf8(bytes).map(str::to_string).map_err(|e| e.to_string())
}

/// Validate `xml` and convert it to `{rootName: value}` with namespace prefixes stripped.
fn xml_to_value(xml: &str) -> std::result::Result<Value, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    let mut close = |node: XmlNode, stack: &mut Vec<XmlNode>| -> std::result::Result<(), String> {
        let name = node.name.clone();
        let value = node.into_value();
        match stack.last_mut() {
            Some(parent) => parent.children.push((name, value)),
            None if root.is_some() => return Err("multiple root elements".to_string()),
            None => root = Some((name, value)),
        }
        Ok(())
    };

    loop {
        let position = reader.buffer_position();
        match reader.read_event() {
            Err(e) => return Err(format!("{e} (near byte {position})")),
            Ok(Event::Eof) => break,
            Ok(Event::Start(start)) => stack.push(XmlNode::open(&start)?),
            Ok(Event::Empty(start)) => {
                let node = XmlNode::open(&start)?;
                close(node, &mut stack)?;
            }
            Ok(Event::End(end)) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| format!("unmatched closing tag near byte {position}"))?;
                if node.name.as_bytes() != end.local_name().as_ref() {
                    return Err(format!("mismatched closing tag near byte {position}"));
                }
                close(node, &mut stack)?;
            }
            Ok(Event::Text(text)) => {
                let text = text.unescape().map_err(|e| e.to_string())?;
                match stack.last_mut() {
                    Some(node) => node.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => return Err("text outside the root element".to_string()),
                }
            }
            Ok(Event::CData(data)) => {
                let text = utf8(&data.into_inner())?;
                match stack.last_mut() {
                    Some(node) => node.text.push_str(&text),
                    None => return Err("CDATA outside the root element".to_string()),
                }
            }
            Ok(_) => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(format!("unclosed element <{}>", open.name));
    }
    let (name, value) = root.ok_or_else(|| "no root element".to_string())?;
    let mut document = Map::new();
    document.insert(name, value);
    Ok(Value::Object(document))
}

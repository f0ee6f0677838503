//! XML to nested-mapping decoding.
//!
//! Goodreads answers in XML. Rather than typing every response, documents
//! are decoded into a `serde_json::Value` tree with the usual XML-to-dict
//! conventions:
//!
//! * an element holding only text becomes a string (trimmed);
//! * an empty element becomes `null`;
//! * attributes become `@name` keys, and text next to attributes or child
//!   elements becomes `#text`;
//! * repeated sibling elements become an array in document order.
//!
//! The document element is returned as `{name: value}`.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::error::{GoodreadsError, Result};

/// One element still open while reading.
struct Frame {
    name: String,
    children: Map<String, Value>,
    text: String,
}

impl Frame {
    fn open(reader: &Reader<&[u8]>, start: &BytesStart<'_>) -> Result<Self> {
        let name = decode(reader, start.name().as_ref())?.into_owned();
        let mut children = Map::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| malformed(format!("bad attribute in <{name}>: {e}")))?;
            let key = decode(reader, attr.key.as_ref())?;
            let value = attr
                .decode_and_unescape_value(reader.decoder())
                .map_err(|e| malformed(format!("bad attribute value in <{name}>: {e}")))?;
            children.insert(format!("@{key}"), Value::String(value.into_owned()));
        }
        Ok(Self {
            name,
            children,
            text: String::new(),
        })
    }

    fn close(self) -> (String, Value) {
        let text = self.text.trim();
        let value = if self.children.is_empty() {
            if text.is_empty() {
                Value::Null
            } else {
                Value::String(text.to_string())
            }
        } else {
            let mut children = self.children;
            if !text.is_empty() {
                children.insert("#text".to_string(), Value::String(text.to_string()));
            }
            Value::Object(children)
        };
        (self.name, value)
    }
}

/// Decode an XML document into a nested mapping.
pub fn decode_document(body: &str) -> Result<Value> {
    let mut reader = Reader::from_str(body);
    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| malformed(format!("at byte {}: {e}", reader.buffer_position())))?;
        match event {
            Event::Start(start) => stack.push(Frame::open(&reader, &start)?),
            Event::Empty(start) => {
                let frame = Frame::open(&reader, &start)?;
                attach(&mut stack, &mut root, frame.close())?;
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| malformed("unbalanced closing tag".to_string()))?;
                attach(&mut stack, &mut root, frame.close())?;
            }
            Event::Text(text) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&decode(&reader, &text)?);
                }
            }
            Event::CData(data) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&decode(&reader, &data)?);
                }
            }
            Event::GeneralRef(reference) => {
                if let Some(frame) = stack.last_mut() {
                    let name = decode(&reader, &reference)?;
                    frame.text.push_str(&resolve_reference(&name)?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(malformed(format!("unclosed element <{}>", open.name)));
    }
    let (name, value) = root.ok_or_else(|| malformed("document has no root element".to_string()))?;
    let mut document = Map::new();
    document.insert(name, value);
    Ok(Value::Object(document))
}

/// Hang a closed element on its parent, or make it the root.
fn attach(
    stack: &mut [Frame],
    root: &mut Option<(String, Value)>,
    (name, value): (String, Value),
) -> Result<()> {
    let Some(parent) = stack.last_mut() else {
        if root.is_some() {
            return Err(malformed("more than one root element".to_string()));
        }
        *root = Some((name, value));
        return Ok(());
    };
    match parent.children.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            parent.children.insert(name, value);
        }
    }
    Ok(())
}

fn resolve_reference(name: &str) -> Result<String> {
    if let Some(code) = name.strip_prefix('#') {
        let parsed = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => code.parse::<u32>(),
        };
        return parsed
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .ok_or_else(|| malformed(format!("invalid character reference &{name};")));
    }
    quick_xml::escape::resolve_predefined_entity(name)
        .map(str::to_string)
        .ok_or_else(|| malformed(format!("unknown entity &{name};")))
}

fn decode<'a>(reader: &Reader<&[u8]>, bytes: &'a [u8]) -> Result<std::borrow::Cow<'a, str>> {
    reader
        .decoder()
        .decode(bytes)
        .map_err(|e| malformed(format!("invalid text encoding: {e}")))
}

fn malformed(reason: String) -> GoodreadsError {
    GoodreadsError::MalformedResponse(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_elements_become_strings() {
        let doc = decode_document("<user><id>1</id><name> Jane Doe </name></user>").unwrap();
        assert_eq!(doc, json!({"user": {"id": "1", "name": "Jane Doe"}}));
    }

    #[test]
    fn repeated_siblings_become_an_array() {
        let doc = decode_document(
            "<list><group><id>1</id></group><group><id>2</id></group><group><id>3</id></group></list>",
        )
        .unwrap();
        assert_eq!(
            doc,
            json!({"list": {"group": [{"id": "1"}, {"id": "2"}, {"id": "3"}]}})
        );
    }

    #[test]
    fn empty_elements_are_null() {
        let doc = decode_document("<r><a/><b></b><c>\n  </c></r>").unwrap();
        assert_eq!(doc, json!({"r": {"a": null, "b": null, "c": null}}));
    }

    #[test]
    fn attributes_are_prefixed_and_text_moves_to_hash_text() {
        let doc = decode_document(r#"<r><id type="integer">42</id><n nil="true"/></r>"#).unwrap();
        assert_eq!(
            doc,
            json!({"r": {"id": {"@type": "integer", "#text": "42"}, "n": {"@nil": "true"}}})
        );
    }

    #[test]
    fn cdata_and_references_are_resolved() {
        let doc = decode_document(
            "<r><body><![CDATA[<b>great</b> book]]></body><t>Tom &amp; Jerry &#233;</t></r>",
        )
        .unwrap();
        assert_eq!(doc["r"]["body"], "<b>great</b> book");
        assert_eq!(doc["r"]["t"], "Tom & Jerry é");
    }

    #[test]
    fn declaration_is_ignored() {
        let doc = decode_document("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<r>x</r>").unwrap();
        assert_eq!(doc, json!({"r": "x"}));
    }

    #[test]
    fn unclosed_document_is_malformed() {
        let err = decode_document("<r><a>1</a>").unwrap_err();
        assert!(matches!(err, GoodreadsError::MalformedResponse(_)));
    }

    #[test]
    fn empty_body_is_malformed() {
        let err = decode_document("").unwrap_err();
        assert!(matches!(err, GoodreadsError::MalformedResponse(_)));
    }
}

//! Response envelope decoder.

use super::{DecodeError, ResponseOutcome, ARRAY, ASSOC, ITEM, ROOT};
use crate::value::{AttributeValue, Attributes};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Decode a response envelope.
///
/// Fails with [`DecodeError`] when the input is not well-formed XML or the
/// `OPS_envelope/body/data_block/dt_assoc` block is missing. A well-formed
/// failure response decodes fine; callers check `is_success`.
pub fn decode(xml: &str) -> Result<ResponseOutcome, DecodeError> {
    let root = parse_tree(xml)?;
    if root.name != ROOT {
        return Err(DecodeError::Missing("OPS_envelope root element"));
    }

    let top = root
        .child("body")
        .ok_or(DecodeError::Missing("body"))?
        .child("data_block")
        .ok_or(DecodeError::Missing("data_block"))?
        .child(ASSOC)
        .ok_or(DecodeError::Missing("top-level dt_assoc"))?;

    let mut top = decode_assoc(top);

    let response_code = top
        .get_str("response_code")
        .and_then(|code| code.trim().parse::<i64>().ok())
        .unwrap_or(0);
    let is_success = top.get_str("is_success") == Some("1");
    let response_text = top.get_str("response_text").unwrap_or_default().to_string();

    let attributes = match top.remove("attributes") {
        None => Attributes::new(),
        Some(AttributeValue::Mapping(map)) => map,
        Some(AttributeValue::Scalar(text)) if text.trim().is_empty() => Attributes::new(),
        Some(AttributeValue::Scalar(_)) => {
            return Err(DecodeError::Shape(
                "attributes item holds text instead of dt_assoc".to_string(),
            ))
        }
        Some(AttributeValue::List(_)) => {
            return Err(DecodeError::Shape(
                "attributes item holds dt_array instead of dt_assoc".to_string(),
            ))
        }
    };

    Ok(ResponseOutcome {
        response_code,
        is_success,
        response_text,
        attributes,
    })
}

/// Generic XML element.
#[derive(Debug, Default)]
struct Element {
    name: String,
    /// Value of the `key` attribute, if any
    key: Option<String>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> Result<Self, DecodeError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut key = None;
        for attr in start.attributes() {
            let attr = attr.map_err(|e| DecodeError::Xml(e.to_string()))?;
            if attr.key.as_ref() == b"key" {
                let value = attr
                    .unescape_value()
                    .map_err(|e| DecodeError::Xml(e.to_string()))?;
                key = Some(value.into_owned());
            }
        }
        Ok(Self {
            name,
            key,
            ..Default::default()
        })
    }

    /// First child element with the given name.
    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }
}

fn parse_tree(xml: &str) -> Result<Element, DecodeError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| DecodeError::Xml(e.to_string()))?;
        match event {
            Event::Start(start) => stack.push(Element::open(&start)?),
            Event::Empty(start) => {
                let element = Element::open(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| DecodeError::Xml("unmatched closing tag".to_string()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| DecodeError::Xml(e.to_string()))?;
                match stack.last_mut() {
                    Some(current) => current.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => {
                        return Err(DecodeError::Xml(
                            "text outside the root element".to_string(),
                        ))
                    }
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            // Declaration, doctype, comments, processing instructions
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(DecodeError::Xml("unexpected end of document".to_string()));
    }
    root.ok_or(DecodeError::Missing("root element"))
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), DecodeError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_some() => {
            return Err(DecodeError::Xml("multiple root elements".to_string()))
        }
        None => *root = Some(element),
    }
    Ok(())
}

/// Decode the value held by an `<item>`.
fn decode_item(item: &Element) -> AttributeValue {
    if let Some(assoc) = item.child(ASSOC) {
        AttributeValue::Mapping(decode_assoc(assoc))
    } else if let Some(array) = item.child(ARRAY) {
        AttributeValue::List(decode_array(array))
    } else {
        AttributeValue::Scalar(item.text.clone())
    }
}

/// Keyed items become mapping entries; unkeyed items are skipped.
fn decode_assoc(assoc: &Element) -> Attributes {
    let mut map = Attributes::new();
    for item in assoc.children.iter().filter(|c| c.name == ITEM) {
        if let Some(key) = &item.key {
            map.insert(key.clone(), decode_item(item));
        }
    }
    map
}

/// Array items keep document order; positional `key` attributes are ignored.
fn decode_array(array: &Element) -> Vec<AttributeValue> {
    array
        .children
        .iter()
        .filter(|c| c.name == ITEM)
        .map(decode_item)
        .collect()
}

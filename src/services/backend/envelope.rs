//! # Envelope Parsing

//! Turns backend response bodies into a [`ParsedEnvelope`]. Two payload shapes are understood:
//!
//! * Atom XML: an `entry`, or a `feed` of entries, each holding `m:properties` with one child per property
//!   (`<d:Docno>4711</d:Docno>`, `<d:Carrier m:null="true"/>`)
//! * OData v2 JSON, returned when `$format=json` is requested: `{"d": {"results": [...]}}` or `{"d": {...}}`
//!
//! Namespace prefixes are dropped from property names. Malformed documents are `Parse` faults.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::Value;
use crate::errors::{DockBookingError, DockBookingResult};
use crate::models::{ODataRecord, ParsedEnvelope};

pub fn parse_envelope(body: &str) -> DockBookingResult<ParsedEnvelope> {
    match body.trim_start().chars().next() {
        Some('{') => parse_json_envelope(body),
        Some('<') => parse_atom_envelope(body),
        Some(_) => Err(DockBookingError::Parse("response body is neither XML nor JSON".to_string())),
        None => Err(DockBookingError::Parse("response body is empty".to_string())),
    }
}

pub fn parse_json_envelope(body: &str) -> DockBookingResult<ParsedEnvelope> {
    let document: Value = serde_json::from_str(body)
        .map_err(|e| DockBookingError::Parse(format!("invalid JSON payload: {}", e)))?;
    let data = document
        .get("d")
        .ok_or_else(|| DockBookingError::Parse("JSON payload has no 'd' member".to_string()))?;

    match data.get("results") {
        Some(Value::Array(rows)) => rows
            .iter()
            .map(|row| {
                row.as_object()
                    .map(ODataRecord::from_json_object)
                    .ok_or_else(|| DockBookingError::Parse("result row is not an object".to_string()))
            })
            .collect::<DockBookingResult<Vec<_>>>()
            .map(ParsedEnvelope::new),
        Some(_) => Err(DockBookingError::Parse("'d.results' is not an array".to_string())),
        None => data
            .as_object()
            .map(|entity| ParsedEnvelope::new(vec![ODataRecord::from_json_object(entity)]))
            .ok_or_else(|| DockBookingError::Parse("'d' is not an object".to_string())),
    }
}

pub fn parse_atom_envelope(body: &str) -> DockBookingResult<ParsedEnvelope> {
    let mut reader = Reader::from_str(body);
    let mut records = Vec::new();

    let mut depth = 0usize;
    let mut root: Option<String> = None;
    // depth of the open m:properties element and the record being filled
    let mut properties: Option<(usize, ODataRecord)> = None;
    // name and null flag of the open property element
    let mut property: Option<(String, bool)> = None;
    let mut text = String::new();
    let mut error_message: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(element) => {
                depth += 1;
                let name = local_name(element.local_name().as_ref())?;
                if root.is_none() {
                    root = Some(name.clone());
                }
                let properties_level = properties.as_ref().map(|(level, _)| *level);
                match properties_level {
                    None if name == "properties" => properties = Some((depth, ODataRecord::new())),
                    Some(level) if depth == level + 1 => {
                        property = Some((name, is_null(&element)?));
                        text.clear();
                    }
                    None if root.as_deref() == Some("error") && name == "message" => {
                        property = Some((name, false));
                        text.clear();
                    }
                    _ => {}
                }
            }
            Event::Empty(element) => {
                let name = local_name(element.local_name().as_ref())?;
                if root.is_none() {
                    root = Some(name.clone());
                }
                match properties.as_mut() {
                    Some((level, record)) if depth == *level => {
                        let value = if is_null(&element)? { Value::Null } else { Value::String(String::new()) };
                        record.insert(name, value);
                    }
                    None if name == "properties" => records.push(ODataRecord::new()),
                    _ => {}
                }
            }
            Event::Text(content) => {
                if property.is_some() {
                    text.push_str(&content.unescape()?);
                }
            }
            Event::CData(content) => {
                if property.is_some() {
                    let raw = content.into_inner();
                    text.push_str(std::str::from_utf8(&raw)
                        .map_err(|e| DockBookingError::Parse(format!("CDATA is not UTF-8: {}", e)))?);
                }
            }
            Event::End(_) => {
                if let Some((name, null)) = property.take() {
                    match properties.as_mut() {
                        Some((_, record)) => {
                            let value = if null { Value::Null } else { Value::String(std::mem::take(&mut text)) };
                            record.insert(name, value);
                        }
                        None => error_message = Some(std::mem::take(&mut text)),
                    }
                } else if matches!(&properties, Some((level, _)) if *level == depth) {
                    if let Some((_, record)) = properties.take() {
                        records.push(record);
                    }
                }
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| DockBookingError::Parse("unbalanced closing tag".to_string()))?;
            }
            Event::Eof => {
                if depth != 0 {
                    return Err(DockBookingError::Parse("XML document ends inside an element".to_string()));
                }
                break;
            }
            _ => {}
        }
    }

    match root.as_deref() {
        None => Err(DockBookingError::Parse("XML document has no root element".to_string())),
        Some("error") => Err(DockBookingError::Parse(format!(
            "backend returned an error document: {}",
            error_message.unwrap_or_else(|| "<no message>".to_string())
        ))),
        Some(_) => Ok(ParsedEnvelope::new(records)),
    }
}

fn local_name(raw: &[u8]) -> DockBookingResult<String> {
    std::str::from_utf8(raw)
        .map(str::to_string)
        .map_err(|e| DockBookingError::Parse(format!("element name is not UTF-8: {}", e)))
}

fn is_null(element: &BytesStart) -> DockBookingResult<bool> {
    for attribute in element.attributes() {
        let attribute = attribute.map_err(quick_xml::Error::from)?;
        if attribute.key.local_name().as_ref() == b"null" {
            return Ok(attribute.unescape_value()? == "true");
        }
    }
    Ok(false)
}

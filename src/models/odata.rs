//! # OData Records

//! Flat views over the entities returned by the booking backend. Whatever the payload format
//! (Atom XML or OData v2 JSON), every entity ends up as an `ODataRecord`: property name to string, number or null.

use std::collections::BTreeMap;
use serde_json::{Map, Value};
use crate::errors::{DockBookingError, DockBookingResult};

/// One backend entity with namespace prefixes stripped from its property names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ODataRecord {
    properties: BTreeMap<String, Value>,
}

impl ODataRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.properties.insert(name.into(), value);
    }

    /// Keeps scalar properties of a JSON entity; nested objects such as `__metadata` or
    /// deferred navigation links are skipped.
    pub fn from_json_object(object: &Map<String, Value>) -> Self {
        let properties = object
            .iter()
            .filter(|(_, value)| !value.is_object() && !value.is_array())
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        Self { properties }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// String form of a property; numbers are rendered, null and absent are `None`.
    pub fn text(&self, name: &str) -> Option<String> {
        match self.properties.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn require_text(&self, name: &str) -> DockBookingResult<String> {
        self.text(name)
            .ok_or_else(|| DockBookingError::Parse(format!("property '{}' is missing", name)))
    }

    /// Non-negative integer property. Accepts JSON numbers and numeric strings.
    pub fn unsigned(&self, name: &str) -> DockBookingResult<Option<u32>> {
        match self.properties.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .map(Some)
                .ok_or_else(|| DockBookingError::Parse(format!("property '{}' is not a non-negative integer: {}", name, n))),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => s
                .trim()
                .parse::<u32>()
                .map(Some)
                .map_err(|_| DockBookingError::Parse(format!("property '{}' is not a non-negative integer: '{}'", name, s))),
            Some(other) => Err(DockBookingError::Parse(format!("property '{}' has unexpected type: {}", name, other))),
        }
    }
}

/// The entities carried by one backend response, in backend order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedEnvelope {
    pub records: Vec<ODataRecord>,
}

impl ParsedEnvelope {
    pub fn new(records: Vec<ODataRecord>) -> Self {
        Self { records }
    }

    /// The single entity of an `entry` response
    pub fn single(&self) -> DockBookingResult<&ODataRecord> {
        self.records
            .first()
            .ok_or_else(|| DockBookingError::Parse("response carries no entity".to_string()))
    }
}

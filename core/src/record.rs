//! Immutable backing mappings for fetched resources.
//!
//! # Design
//! A `Record` is the decoded content of one XML element: field name to
//! nested value. Lookups never fall back to defaults; an absent field is a
//! `MissingField` error and an absent nesting level is a `MalformedResponse`
//! error, so callers always learn which key was missing.

use serde_json::{Map, Value};

use crate::error::{GoodreadsError, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Wrap a decoded value, which must be a mapping.
    ///
    /// An empty element (`null`) is accepted as an empty record.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            Value::Null => Ok(Self::default()),
            other => Err(GoodreadsError::MalformedResponse(format!(
                "expected a mapping, found {}",
                kind_of(&other)
            ))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    /// A required text field.
    pub fn text(&self, key: &str) -> Result<&str> {
        self.optional_text(key)?
            .ok_or_else(|| GoodreadsError::missing(key))
    }

    /// A text field that may be absent.
    ///
    /// Elements carrying attributes yield their `#text`; empty and
    /// attribute-only elements yield `""`.
    pub fn optional_text(&self, key: &str) -> Result<Option<&str>> {
        let Some(value) = self.fields.get(key) else {
            return Ok(None);
        };
        match value {
            Value::String(s) => Ok(Some(s.as_str())),
            Value::Null => Ok(Some("")),
            Value::Object(map) => match map.get("#text") {
                Some(Value::String(s)) => Ok(Some(s.as_str())),
                _ if map.keys().all(|k| k.starts_with('@')) => Ok(Some("")),
                _ => Err(not_text(key, value)),
            },
            _ => Err(not_text(key, value)),
        }
    }

    /// Walk nested mappings along `path`.
    pub fn descend(&self, path: &[&str]) -> Result<&Value> {
        let Some((first, rest)) = path.split_first() else {
            return Err(GoodreadsError::MalformedResponse("empty path".to_string()));
        };
        let mut current = self
            .fields
            .get(*first)
            .ok_or_else(|| absent(&path[..1]))?;
        for (depth, segment) in rest.iter().enumerate() {
            current = current
                .as_object()
                .and_then(|map| map.get(*segment))
                .ok_or_else(|| absent(&path[..depth + 2]))?;
        }
        Ok(current)
    }

    /// The nested mapping at `path` as its own record.
    pub fn record_at(&self, path: &[&str]) -> Result<Record> {
        let value = self.descend(path)?;
        Record::from_value(value.clone())
            .map_err(|_| GoodreadsError::MalformedResponse(format!("`{}` is not a mapping", path.join("."))))
    }

    /// The repeated `item` elements inside the container at `container`.
    ///
    /// The container must exist. One item decodes as a mapping and several
    /// as an array; both come back as a vector. An empty container yields an
    /// empty vector.
    pub fn records_at(&self, container: &[&str], item: &str) -> Result<Vec<Record>> {
        let holder = self.descend(container)?;
        let items = match holder {
            Value::Null => return Ok(Vec::new()),
            Value::Object(map) => match map.get(item) {
                Some(items) => items,
                None => return Ok(Vec::new()),
            },
            other => {
                return Err(GoodreadsError::MalformedResponse(format!(
                    "`{}` is {}, expected a mapping",
                    container.join("."),
                    kind_of(other)
                )))
            }
        };
        match items {
            Value::Array(values) => values.iter().cloned().map(Record::from_value).collect(),
            single => Ok(vec![Record::from_value(single.clone())?]),
        }
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

fn absent(path: &[&str]) -> GoodreadsError {
    GoodreadsError::MalformedResponse(format!("missing `{}`", path.join(".")))
}

fn not_text(key: &str, value: &Value) -> GoodreadsError {
    GoodreadsError::MalformedResponse(format!("field `{key}` is {}, not text", kind_of(value)))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "empty",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "text",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

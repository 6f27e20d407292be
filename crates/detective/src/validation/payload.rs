//! Strict navigation over decoded JSON response bodies.
//!
//! Storage API responses are decoded into an untyped tree and then walked
//! field by field. Every access is fallible: a missing field or a value of
//! the wrong kind is a [`CheckError::SchemaMismatch`] naming the JSON path,
//! never a silent default.

use serde_json::{Map, Value};

use super::outcome::{excerpt, CheckError};

/// A decoded response body.
#[derive(Debug, Clone)]
pub struct Payload {
    root: Value,
}

impl Payload {
    /// Decode raw bytes as JSON.
    pub fn parse(body: &[u8]) -> Result<Self, CheckError> {
        serde_json::from_slice(body)
            .map(|root| Self { root })
            .map_err(|e| CheckError::MalformedPayload {
                reason: e.to_string(),
                excerpt: excerpt(&String::from_utf8_lossy(body)),
            })
    }

    /// Cursor at the top of the document (`$`).
    pub fn root(&self) -> Field<'_> {
        Field {
            value: &self.root,
            path: "$".to_string(),
        }
    }
}

/// A cursor into a [`Payload`] that remembers how it got there.
#[derive(Debug, Clone)]
pub struct Field<'a> {
    value: &'a Value,
    path: String,
}

impl<'a> Field<'a> {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Step into an object member.
    pub fn get(&self, name: &str) -> Result<Field<'a>, CheckError> {
        self.member(name, "a value")
    }

    /// Step into an object member that must be a string.
    pub fn str_field(&self, name: &str) -> Result<&'a str, CheckError> {
        self.member(name, "a string")?.as_str()
    }

    /// Step into an object member that must be an array.
    pub fn array_field(&self, name: &str) -> Result<Vec<Field<'a>>, CheckError> {
        self.member(name, "an array")?.elements()
    }

    /// Step into an object member that must be a string or a number.
    pub fn scalar_field(&self, name: &str) -> Result<String, CheckError> {
        self.member(name, "a string or number")?.scalar()
    }

    /// Step into an array element.
    pub fn index(&self, index: usize) -> Result<Field<'a>, CheckError> {
        let items = self.value.as_array().ok_or_else(|| self.mismatch("an array"))?;
        let path = format!("{}[{index}]", self.path);
        match items.get(index) {
            Some(value) => Ok(Field { value, path }),
            None => Err(CheckError::SchemaMismatch {
                path,
                expected: "an array element",
                found: format!("array of length {}", items.len()),
            }),
        }
    }

    /// All elements of an array, each with its own path.
    pub fn elements(&self) -> Result<Vec<Field<'a>>, CheckError> {
        let items = self.value.as_array().ok_or_else(|| self.mismatch("an array"))?;
        Ok(items
            .iter()
            .enumerate()
            .map(|(i, value)| Field {
                value,
                path: format!("{}[{i}]", self.path),
            })
            .collect())
    }

    pub fn as_object(&self) -> Result<&'a Map<String, Value>, CheckError> {
        self.value.as_object().ok_or_else(|| self.mismatch("an object"))
    }

    pub fn as_str(&self) -> Result<&'a str, CheckError> {
        self.value.as_str().ok_or_else(|| self.mismatch("a string"))
    }

    /// Render a string or number as text (identifiers come as either).
    pub fn scalar(&self) -> Result<String, CheckError> {
        match self.value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            _ => Err(self.mismatch("a string or number")),
        }
    }

    fn member(&self, name: &str, expected: &'static str) -> Result<Field<'a>, CheckError> {
        let object = self.as_object()?;
        let path = format!("{}.{name}", self.path);
        match object.get(name) {
            Some(value) => Ok(Field { value, path }),
            None => Err(CheckError::SchemaMismatch {
                path,
                expected,
                found: "missing".to_string(),
            }),
        }
    }

    fn mismatch(&self, expected: &'static str) -> CheckError {
        CheckError::SchemaMismatch {
            path: self.path.clone(),
            expected,
            found: kind_name(self.value).to_string(),
        }
    }
}

/// JSON kind of a value, as used in mismatch messages.
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

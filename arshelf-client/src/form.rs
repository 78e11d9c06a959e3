//! Form encoding
//!
//! The API only accepts JSON, so file inputs are base64-encoded and sent as
//! `{ "name", "content_type", "data" }` objects next to the text fields.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Map, Value};

/// A single form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Text(String),
    File {
        file_name: String,
        content_type: String,
        bytes: Vec<u8>,
    },
}

/// Ordered set of named fields
#[derive(Debug, Clone, Default)]
pub struct FormData {
    fields: Vec<(String, Field)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a text field, replacing any earlier value under `name`.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name.into(), Field::Text(value.into()));
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.set(
            name.into(),
            Field::File {
                file_name: file_name.into(),
                content_type: content_type.into(),
                bytes,
            },
        );
        self
    }

    /// Read a file from disk into a file field. The content type is left
    /// empty for the server to infer from the extension.
    pub fn file_from_path(self, name: impl Into<String>, path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(self.file(name, file_name, "", bytes))
    }

    fn set(&mut self, name: String, field: Field) {
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = field,
            None => self.fields.push((name, field)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Encode as the JSON object the API expects.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        for (name, field) in &self.fields {
            let value = match field {
                Field::Text(text) => Value::String(text.clone()),
                Field::File {
                    file_name,
                    content_type,
                    bytes,
                } => serde_json::json!({
                    "name": file_name,
                    "content_type": content_type,
                    "data": STANDARD.encode(bytes),
                }),
            };
            out.insert(name.clone(), value);
        }
        Value::Object(out)
    }
}

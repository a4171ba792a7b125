//! Dashboard manifest loading, attachment upsert, and atomic persistence.
//!
//! The manifest is kept as an order-preserving JSON object so fields this
//! tool does not own survive a load/upsert/persist cycle untouched.
use crate::error::DashError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

pub const ATTACHMENTS_KEY: &str = "attachments";

/// One named blob of text embedded in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub value: String,
}

/// Character count for one attachment, used in the post-embed report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentSummary {
    pub name: String,
    pub chars: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    doc: Map<String, Value>,
}

impl Manifest {
    /// Wrap a JSON document, checking the attachment list can be upserted.
    ///
    /// A missing `attachments` field is fine; a present one must be an array
    /// of objects.
    pub fn from_value(value: Value) -> Result<Self, String> {
        let Value::Object(doc) = value else {
            return Err("top-level JSON value is not an object".to_string());
        };
        if let Some(attachments) = doc.get(ATTACHMENTS_KEY) {
            let Some(list) = attachments.as_array() else {
                return Err(format!("`{ATTACHMENTS_KEY}` is not an array"));
            };
            if let Some(index) = list.iter().position(|entry| !entry.is_object()) {
                return Err(format!("`{ATTACHMENTS_KEY}[{index}]` is not an object"));
            }
        }
        Ok(Self { doc })
    }

    pub fn parse(text: &str) -> Result<Self, String> {
        let value: Value = serde_json::from_str(text).map_err(|err| format!("invalid JSON: {err}"))?;
        Self::from_value(value)
    }

    /// Read and validate a manifest file. Nothing is mutated on failure.
    pub fn load(path: &Path) -> Result<Self, DashError> {
        let text = fs::read_to_string(path).map_err(|err| DashError::manifest_load(path, err.to_string()))?;
        let manifest = Self::parse(&text).map_err(|reason| DashError::manifest_load(path, reason))?;
        tracing::debug!(
            path = %path.display(),
            attachments = manifest.attachment_count(),
            "loaded manifest"
        );
        Ok(manifest)
    }

    /// Set attachment contents by name.
    ///
    /// Existing attachments keep their position and any extra fields; names
    /// not present yet are appended in the order given.
    pub fn upsert<'a, I>(&mut self, items: I)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let list = self.attachments_mut();
        for (name, content) in items {
            let position = list.iter().position(|entry| entry_name(entry) == Some(name));
            match position {
                Some(index) => {
                    if let Some(entry) = list[index].as_object_mut() {
                        entry.insert("value".to_string(), Value::String(content.to_string()));
                    }
                    let duplicates = list[index + 1..]
                        .iter()
                        .filter(|entry| entry_name(entry) == Some(name))
                        .count();
                    if duplicates > 0 {
                        tracing::warn!(name, duplicates, "duplicate attachment names; updated the first");
                    }
                    tracing::debug!(name, chars = content.chars().count(), "updated attachment");
                }
                None => {
                    list.push(attachment_value(&Attachment {
                        name: name.to_string(),
                        value: content.to_string(),
                    }));
                    tracing::debug!(name, chars = content.chars().count(), "appended attachment");
                }
            }
        }
    }

    pub fn attachment(&self, name: &str) -> Option<&str> {
        self.attachment_entries()
            .find(|entry| entry.get("name").and_then(Value::as_str) == Some(name))
            .and_then(|entry| entry.get("value"))
            .and_then(Value::as_str)
    }

    pub fn attachment_count(&self) -> usize {
        self.doc
            .get(ATTACHMENTS_KEY)
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    /// Attachments with a string name and value, in manifest order.
    pub fn attachments(&self) -> Vec<Attachment> {
        self.attachment_entries()
            .filter_map(|entry| serde_json::from_value(Value::Object(entry.clone())).ok())
            .collect()
    }

    pub fn summary(&self) -> Vec<AttachmentSummary> {
        self.attachments()
            .into_iter()
            .map(|attachment| AttachmentSummary {
                chars: attachment.value.chars().count(),
                name: attachment.name,
            })
            .collect()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.doc
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.doc)
    }

    /// Four-space indented JSON with a trailing newline. Non-ASCII text is
    /// written as-is.
    pub fn render(&self) -> io::Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.doc.serialize(&mut ser).map_err(io::Error::other)?;
        buf.push(b'\n');
        String::from_utf8(buf).map_err(io::Error::other)
    }

    /// Replace the file at `path` with this manifest, all or nothing.
    ///
    /// The document is written to a temp file beside the target, synced, then
    /// renamed over it. On any failure the previous file is left as it was.
    pub fn persist(&self, path: &Path) -> Result<(), DashError> {
        let text = self.render().map_err(|err| DashError::manifest_write(path, err))?;
        let dir = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut tmp = tempfile::Builder::new()
            .prefix(".dashpack-")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|err| DashError::manifest_write(path, err))?;
        tmp.write_all(text.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|err| DashError::manifest_write(path, err))?;
        if let Ok(meta) = fs::metadata(path) {
            fs::set_permissions(tmp.path(), meta.permissions())
                .map_err(|err| DashError::manifest_write(path, err))?;
        }
        tmp.persist(path)
            .map_err(|err| DashError::manifest_write(path, err.error))?;
        tracing::info!(
            path = %path.display(),
            bytes = text.len(),
            attachments = self.attachment_count(),
            "wrote manifest"
        );
        Ok(())
    }

    fn attachment_entries(&self) -> impl Iterator<Item = &Map<String, Value>> {
        self.doc
            .get(ATTACHMENTS_KEY)
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_object)
    }

    fn attachments_mut(&mut self) -> &mut Vec<Value> {
        let slot = self
            .doc
            .entry(ATTACHMENTS_KEY)
            .or_insert_with(|| Value::Array(Vec::new()));
        if !slot.is_array() {
            *slot = Value::Array(Vec::new());
        }
        slot.as_array_mut().expect("attachments slot is an array")
    }
}

fn attachment_value(attachment: &Attachment) -> Value {
    serde_json::json!({ "name": attachment.name, "value": attachment.value })
}

fn entry_name(entry: &Value) -> Option<&str> {
    entry.get("name").and_then(Value::as_str)
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;

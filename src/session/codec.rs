// ABOUTME: Session codec — converts session records to and from their JSON file format.
// ABOUTME: Unsaved buffers travel as "buffer:"-prefixed strings, files as plain absolute paths.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::error::{Result, SessionError};

/// Marks an entry string as inline buffer content rather than a file path.
///
/// A real file path starting with this prefix is read back as a buffer.
pub const BUFFER_PREFIX: &str = "buffer:";

/// One tab in a saved group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryRef {
    /// A view backed by a file on disk.
    File(PathBuf),
    /// An unsaved view, stored with its full text.
    Buffer(String),
}

impl EntryRef {
    /// The string stored in the session file for this entry.
    pub fn to_wire(&self) -> String {
        match self {
            EntryRef::File(path) => path.to_string_lossy().into_owned(),
            EntryRef::Buffer(text) => format!("{}{}", BUFFER_PREFIX, text),
        }
    }

    /// Classify a stored entry string.
    pub fn from_wire(raw: &str) -> Self {
        match raw.strip_prefix(BUFFER_PREFIX) {
            Some(text) => EntryRef::Buffer(text.to_string()),
            None => EntryRef::File(PathBuf::from(raw)),
        }
    }
}

/// Snapshot of a window: entries per group plus the host's layout descriptor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionRecord {
    pub groups: BTreeMap<usize, Vec<EntryRef>>,
    pub layout: Value,
}

impl SessionRecord {
    pub fn new(layout: Value) -> Self {
        Self {
            groups: BTreeMap::new(),
            layout,
        }
    }

    /// Number of group slots, counting from index 0 to the highest index present.
    pub fn group_count(&self) -> usize {
        self.groups.keys().next_back().map_or(0, |last| last + 1)
    }

    pub fn entry_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

/// Why a session document could not be decoded.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("top level is not an object")]
    NotAnObject,
    #[error("missing \"{0}\" key")]
    MissingKey(&'static str),
    #[error("\"groups\" is not an object")]
    GroupsNotAnObject,
    #[error("group key {0:?} is not an integer")]
    BadGroupKey(String),
    #[error("group {0} is not a list of strings")]
    BadEntries(String),
}

/// Build the JSON document for a record.
pub fn encode(record: &SessionRecord) -> Value {
    let groups: Map<String, Value> = record
        .groups
        .iter()
        .map(|(index, entries)| {
            let entries = entries.iter().map(|e| Value::String(e.to_wire())).collect();
            (index.to_string(), Value::Array(entries))
        })
        .collect();

    let mut doc = Map::new();
    doc.insert("groups".to_string(), Value::Object(groups));
    doc.insert("layout".to_string(), record.layout.clone());
    Value::Object(doc)
}

/// Encode a record as pretty-printed JSON with 4-space indentation.
pub fn to_json(record: &SessionRecord) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    encode(record).serialize(&mut ser)?;
    // serde_json only ever emits UTF-8.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Parse a session document.
pub fn decode(text: &str) -> std::result::Result<SessionRecord, DecodeError> {
    let doc: Value = serde_json::from_str(text)?;
    let doc = doc.as_object().ok_or(DecodeError::NotAnObject)?;
    let groups = doc.get("groups").ok_or(DecodeError::MissingKey("groups"))?;
    let layout = doc.get("layout").ok_or(DecodeError::MissingKey("layout"))?;
    let groups = groups.as_object().ok_or(DecodeError::GroupsNotAnObject)?;

    let mut record = SessionRecord::new(layout.clone());
    for (key, entries) in groups {
        let index: usize = key
            .parse()
            .map_err(|_| DecodeError::BadGroupKey(key.clone()))?;
        let entries = entries
            .as_array()
            .ok_or_else(|| DecodeError::BadEntries(key.clone()))?
            .iter()
            .map(|v| v.as_str().map(EntryRef::from_wire))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| DecodeError::BadEntries(key.clone()))?;
        // "1" and "+1" name the same group.
        if record.groups.insert(index, entries).is_some() {
            return Err(DecodeError::BadGroupKey(key.clone()));
        }
    }
    Ok(record)
}

/// Read and decode a session file.
pub fn load_from(path: &Path) -> Result<SessionRecord> {
    let content = std::fs::read_to_string(path).map_err(|e| SessionError::io(path, e))?;
    let record = decode(&content).map_err(|e| SessionError::malformed(path, e.to_string()))?;
    debug!(
        "decoded {} ({} groups, {} entries)",
        path.display(),
        record.group_count(),
        record.entry_count()
    );
    Ok(record)
}

/// Encode and write a session file (atomic write via hidden tmp + rename).
pub fn save_to(path: &Path, record: &SessionRecord) -> Result<()> {
    let content = to_json(record).map_err(|e| SessionError::Io {
        path: path.to_path_buf(),
        source: std::io::Error::other(e),
    })?;
    let tmp_path = tmp_path_for(path);
    std::fs::write(&tmp_path, &content).map_err(|e| SessionError::io(&tmp_path, e))?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(SessionError::io(path, e));
    }
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Helper: the two-group window used throughout these tests.
    fn sample_record() -> SessionRecord {
        let mut record = SessionRecord::new(json!({
            "cols": [0.0, 0.5, 1.0],
            "rows": [0.0, 1.0],
            "cells": [[0, 0, 1, 1], [1, 0, 2, 1]]
        }));
        record.groups.insert(
            0,
            vec![
                EntryRef::File(PathBuf::from("/tmp/a.txt")),
                EntryRef::Buffer("hello".to_string()),
            ],
        );
        record.groups.insert(1, vec![]);
        record
    }

    #[test]
    fn entry_wire_format() {
        assert_eq!(EntryRef::File(PathBuf::from("/x/y.rs")).to_wire(), "/x/y.rs");
        assert_eq!(EntryRef::Buffer("hi\nthere".into()).to_wire(), "buffer:hi\nthere");
        assert_eq!(EntryRef::from_wire("buffer:"), EntryRef::Buffer(String::new()));
        assert_eq!(
            EntryRef::from_wire("/buffer:not-prefix"),
            EntryRef::File(PathBuf::from("/buffer:not-prefix"))
        );
    }

    #[test]
    fn encoded_shape_matches_file_format() {
        let doc = encode(&sample_record());
        assert_eq!(doc["groups"]["0"], json!(["/tmp/a.txt", "buffer:hello"]));
        assert_eq!(doc["groups"]["1"], json!([]));
        assert_eq!(doc["layout"]["rows"], json!([0.0, 1.0]));
    }

    #[test]
    fn pretty_output_uses_four_space_indent() {
        let text = to_json(&sample_record()).unwrap();
        assert!(text.starts_with("{\n    \""), "unexpected indent: {}", text);
        assert!(text.contains("\n        \"0\": ["));
    }

    #[test]
    fn decode_restores_record() {
        let record = sample_record();
        let decoded = decode(&to_json(&record).unwrap()).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn decode_accepts_buffer_text_with_prefix_inside() {
        let text = r#"{"groups": {"0": ["buffer:buffer:nested"]}, "layout": null}"#;
        let record = decode(text).unwrap();
        assert_eq!(record.groups[&0], vec![EntryRef::Buffer("buffer:nested".into())]);
        assert_eq!(record.layout, Value::Null);
    }

    #[test]
    fn decode_rejects_missing_keys() {
        assert!(matches!(
            decode(r#"{"layout": {}}"#),
            Err(DecodeError::MissingKey("groups"))
        ));
        assert!(matches!(
            decode(r#"{"groups": {}}"#),
            Err(DecodeError::MissingKey("layout"))
        ));
    }

    #[test]
    fn decode_rejects_non_integer_group_key() {
        let err = decode(r#"{"groups": {"left": []}, "layout": {}}"#).unwrap_err();
        assert!(matches!(err, DecodeError::BadGroupKey(ref k) if k == "left"));
    }

    #[test]
    fn decode_rejects_padded_group_key() {
        let err = decode(r#"{"groups": {" 1": []}, "layout": {}}"#).unwrap_err();
        assert!(matches!(err, DecodeError::BadGroupKey(ref k) if k == " 1"));
    }

    #[test]
    fn decode_rejects_duplicate_group_index() {
        let text = r#"{"groups": {"1": ["buffer:a"], "+1": ["buffer:b"]}, "layout": {}}"#;
        let err = decode(text).unwrap_err();
        assert!(matches!(err, DecodeError::BadGroupKey(_)));
    }

    #[test]
    fn decode_rejects_invalid_json() {
        assert!(matches!(decode("{not json"), Err(DecodeError::Json(_))));
        assert!(matches!(decode("[1, 2]"), Err(DecodeError::NotAnObject)));
    }

    #[test]
    fn decode_rejects_non_string_entries() {
        let err = decode(r#"{"groups": {"0": [1]}, "layout": {}}"#).unwrap_err();
        assert!(matches!(err, DecodeError::BadEntries(_)));
    }

    #[test]
    fn group_count_spans_highest_index() {
        let mut record = SessionRecord::default();
        assert_eq!(record.group_count(), 0);
        record.groups.insert(2, vec![]);
        assert_eq!(record.group_count(), 3);
    }

    #[test]
    fn save_and_load_roundtrip_leaves_no_tmp() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("work.simplesession");
        save_to(&path, &sample_record()).unwrap();

        assert!(!tmp_path_for(&path).exists());
        assert_eq!(load_from(&path).unwrap(), sample_record());
    }

    #[test]
    fn failed_rename_removes_tmp_file() {
        let tmp = tempfile::tempdir().unwrap();
        // A non-empty directory in the way makes the rename fail.
        let path = tmp.path().join("blocked.simplesession");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("inner"), "x").unwrap();

        assert!(save_to(&path, &sample_record()).is_err());
        assert!(!tmp_path_for(&path).exists());
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("missing.simplesession");
        assert!(matches!(load_from(&path), Err(SessionError::NotFound(_))));
    }

    #[test]
    fn load_garbage_is_malformed() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.simplesession");
        std::fs::write(&path, "{\"groups\": {}}").unwrap();
        match load_from(&path) {
            Err(SessionError::MalformedSession { reason, .. }) => {
                assert!(reason.contains("layout"))
            }
            other => panic!("expected MalformedSession, got {:?}", other),
        }
    }
}

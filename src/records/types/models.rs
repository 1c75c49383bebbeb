//! Core data structures shared by the decoder and the cursor.
//!
//! This module defines:
//! - [`CursorOptions`], the construction-time configuration of a cursor
//! - [`Record`], the decoded value of one line

use encoding_rs::{Encoding, UTF_8};
use log::warn;
use serde::ser::{Serialize, SerializeMap, Serializer};

use super::error::{RecordsError, Result};

/// Key prefix used for fields that have no caller-supplied name.
pub const DEFAULT_KEY_PREFIX: &str = "_";

/// Construction-time configuration for a `RecordCursor`.
///
/// The defaults describe a plain line reader: no delimiter, so every record
/// is the line itself, decoded as UTF-8.
#[derive(Debug, Clone)]
pub struct CursorOptions {
    /// Enables field splitting of each record when set.
    pub delimiter: Option<String>,
    /// Maps zero-based field position to output key.
    pub field_names: Vec<String>,
    /// Prefix of the synthetic key given to unnamed fields (`_0`, `_1`, ...).
    pub key_prefix: String,
    /// Text encoding of the stream.
    pub encoding: &'static Encoding,
}

impl Default for CursorOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            field_names: Vec::new(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            encoding: UTF_8,
        }
    }
}

impl CursorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    pub fn with_field_names<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.field_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Sets the stream encoding from a WHATWG label such as `"latin1"` or `"gbk"`.
    ///
    /// Unknown labels fall back to UTF-8. Encodings that are not ASCII
    /// compatible (UTF-16) are rejected because lines are split on the raw
    /// `\n` byte.
    pub fn with_encoding(mut self, label: &str) -> Result<Self> {
        let encoding = match Encoding::for_label(label.trim().as_bytes()) {
            Some(encoding) => encoding,
            None => {
                warn!("Unknown encoding label '{}', falling back to UTF-8", label);
                UTF_8
            }
        };
        if !encoding.is_ascii_compatible() {
            return Err(RecordsError::UnsupportedEncoding(encoding.name().to_string()));
        }
        self.encoding = encoding;
        Ok(self)
    }
}

/// One decoded line of the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// The whole line, produced when no delimiter is configured.
    Scalar(String),
    /// Field key and value pairs in field order.
    Fields(Vec<(String, String)>),
}

impl Record {
    /// Returns the line text of a scalar record.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Record::Scalar(text) => Some(text),
            Record::Fields(_) => None,
        }
    }

    /// Looks up a field value by key. Always `None` for scalar records.
    pub fn get(&self, key: &str) -> Option<&str> {
        match self {
            Record::Scalar(_) => None,
            Record::Fields(fields) => fields
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.as_str()),
        }
    }

    /// Field keys in field order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        let fields: &[(String, String)] = match self {
            Record::Scalar(_) => &[],
            Record::Fields(fields) => fields,
        };
        fields.iter().map(|(name, _)| name.as_str())
    }

    /// Number of fields; a scalar counts as one.
    pub fn len(&self) -> usize {
        match self {
            Record::Scalar(_) => 1,
            Record::Fields(fields) => fields.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Record::Fields(fields) if fields.is_empty())
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Record::Scalar(text) => serializer.serialize_str(text),
            Record::Fields(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (key, value) in fields {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

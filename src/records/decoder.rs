//! Turns one raw line into a [`Record`].

use std::borrow::Cow;

use encoding_rs::Encoding;

use super::types::models::{CursorOptions, Record};

/// Decodes raw lines according to the cursor's delimiter and field names.
#[derive(Debug, Clone)]
pub struct RecordDecoder {
    delimiter: Option<String>,
    field_names: Vec<String>,
    key_prefix: String,
    encoding: &'static Encoding,
}

impl RecordDecoder {
    pub fn new(options: &CursorOptions) -> Self {
        Self {
            // An empty delimiter would split between every character.
            delimiter: options.delimiter.clone().filter(|d| !d.is_empty()),
            field_names: options.field_names.clone(),
            key_prefix: options.key_prefix.clone(),
            encoding: options.encoding,
        }
    }

    /// Decodes `raw`, a line as read from the stream with its terminator.
    ///
    /// Without a delimiter the trimmed line is returned as a scalar. With one,
    /// field `i` is keyed by `field_names[i]` or by `key_prefix` + `i` when the
    /// name list is shorter than the line. Lines shorter than the name list
    /// just produce fewer fields. When two positions map to the same key the
    /// later value replaces the earlier one in place.
    pub fn decode(&self, raw: &[u8]) -> Record {
        let text = self.decode_text(raw);
        let line = text.trim_end_matches(['\r', '\n']);

        let Some(delimiter) = self.delimiter.as_deref() else {
            return Record::Scalar(line.to_owned());
        };

        let mut fields: Vec<(String, String)> = Vec::new();
        for (position, value) in line.split(delimiter).enumerate() {
            let key = self.field_key(position);
            match fields.iter_mut().find(|(existing, _)| *existing == key) {
                Some((_, slot)) => *slot = value.to_owned(),
                None => fields.push((key, value.to_owned())),
            }
        }
        Record::Fields(fields)
    }

    /// Key for the field at zero-based `position`.
    pub fn field_key(&self, position: usize) -> String {
        match self.field_names.get(position) {
            Some(name) => name.clone(),
            None => format!("{}{}", self.key_prefix, position),
        }
    }

    fn decode_text<'b>(&self, raw: &'b [u8]) -> Cow<'b, str> {
        // Malformed sequences become U+FFFD rather than failing the record.
        // A leading U+FEFF is record content and is kept.
        let (text, _) = self.encoding.decode_without_bom_handling(raw);
        text
    }
}

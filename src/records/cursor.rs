//! # Record Cursor
//!
//! Sequential and positional access to the records of a [`LineSource`].
//!
//! Sequential movement (`next`) reads lines straight from the stream. Random
//! positioning (`seek`, `count`) goes through the lazily built
//! [`OffsetIndex`], so a cursor that is only ever iterated never scans the
//! stream twice.
//!
//! ## States
//! - *unfetched*: nothing buffered yet (fresh, or after `seek`/`rewind`)
//! - *positioned*: a raw line is buffered for the current ordinal
//! - *exhausted*: the stream ended at the current ordinal

use log::trace;

use super::decoder::RecordDecoder;
use super::index::OffsetIndex;
use super::iter::RecordIter;
use super::table::OffsetTable;
use super::types::error::Result;
use super::types::models::{CursorOptions, Record};
use super::types::source::LineSource;

#[derive(Debug)]
enum Buffered {
    Unfetched,
    Line(Vec<u8>),
    Exhausted,
}

/// A read-only, seekable cursor over the records of a borrowed stream.
///
/// The cursor borrows the stream exclusively for its lifetime but never
/// closes it. Dropping the cursor leaves the stream wherever the cursor last
/// moved it.
///
/// # Example
/// ```
/// # use std::io::Cursor;
/// # use line_records::{CursorOptions, RecordCursor};
/// let mut stream = Cursor::new("1,a\n2,b\n3,c\n");
/// let options = CursorOptions::new()
///     .with_delimiter(",")
///     .with_field_names(["id", "val"]);
/// let mut cursor = RecordCursor::new(&mut stream, options);
///
/// cursor.seek(2).unwrap();
/// let record = cursor.current().unwrap().unwrap();
/// assert_eq!(record.get("val"), Some("c"));
/// assert_eq!(cursor.count().unwrap(), 3);
/// ```
pub struct RecordCursor<'a, S: LineSource + ?Sized> {
    source: &'a mut S,
    decoder: RecordDecoder,
    index: OffsetIndex,
    ordinal: u64,
    buffered: Buffered,
}

impl<'a, S: LineSource + ?Sized> RecordCursor<'a, S> {
    /// Binds a cursor to `source`. Nothing is read until the cursor is used.
    pub fn new(source: &'a mut S, options: CursorOptions) -> Self {
        Self {
            source,
            decoder: RecordDecoder::new(&options),
            index: OffsetIndex::new(),
            ordinal: 0,
            buffered: Buffered::Unfetched,
        }
    }

    /// Returns `true` unless the stream is exhausted at the current ordinal.
    pub fn valid(&mut self) -> Result<bool> {
        self.fill()?;
        Ok(matches!(self.buffered, Buffered::Line(_)))
    }

    /// Decodes the record at the current ordinal without advancing.
    ///
    /// Returns `None` once the stream is exhausted. Repeated calls return
    /// equal records until the cursor is moved.
    pub fn current(&mut self) -> Result<Option<Record>> {
        self.fill()?;
        Ok(match &self.buffered {
            Buffered::Line(raw) => Some(self.decoder.decode(raw)),
            Buffered::Unfetched | Buffered::Exhausted => None,
        })
    }

    /// The current ordinal.
    pub fn key(&self) -> u64 {
        self.ordinal
    }

    /// Advances to the following record.
    ///
    /// Exactly one line is read for the new position, whether or not the
    /// caller looked at the current one. If the current line was never
    /// fetched (right after `seek` or `rewind`) it is consumed first, so the
    /// buffered line always belongs to the ordinal reported by `key`.
    pub fn next(&mut self) -> Result<()> {
        if matches!(self.buffered, Buffered::Unfetched) {
            self.fill()?;
        }
        self.buffered = self.read_raw()?;
        self.ordinal += 1;
        Ok(())
    }

    /// Returns to the first record.
    ///
    /// Does nothing when the ordinal is already 0.
    pub fn rewind(&mut self) -> Result<()> {
        if self.ordinal == 0 {
            return Ok(());
        }
        self.source.seek_to(0)?;
        self.ordinal = 0;
        self.buffered = Buffered::Unfetched;
        Ok(())
    }

    /// Moves to the record at `position`, clamped to the last record.
    ///
    /// Builds the offset index on first use. The buffered line is always
    /// discarded, so `current` afterwards reflects the new position. On an
    /// empty stream the cursor is placed at ordinal 0, byte 0.
    pub fn seek(&mut self, position: u64) -> Result<()> {
        let table = self.index.get(&mut *self.source)?;
        let ordinal = table.clamp(position);
        let offset = table.get(ordinal).unwrap_or(0);
        trace!("Seek to record {} (requested {}) at byte {}", ordinal, position, offset);

        self.source.seek_to(offset)?;
        self.ordinal = ordinal;
        self.buffered = Buffered::Unfetched;
        Ok(())
    }

    /// Total number of records, building the offset index on first use.
    pub fn count(&mut self) -> Result<u64> {
        self.index.count(&mut *self.source)
    }

    /// The offset table, building it on first use.
    pub fn offset_table(&mut self) -> Result<&OffsetTable> {
        self.index.get(&mut *self.source)
    }

    /// Installs a precomputed offset table, e.g. one loaded from a side index.
    ///
    /// No scan of the stream happens afterwards.
    pub fn set_offset_table(&mut self, table: OffsetTable) {
        self.index.set(table);
    }

    pub fn offset_index(&self) -> &OffsetIndex {
        &self.index
    }

    /// Iterates from the current position to the end of the stream.
    pub fn records(&mut self) -> RecordIter<'_, 'a, S> {
        RecordIter::new(self)
    }

    /// Reads the current line if nothing is buffered.
    fn fill(&mut self) -> Result<()> {
        if matches!(self.buffered, Buffered::Unfetched) {
            self.buffered = self.read_raw()?;
        }
        Ok(())
    }

    fn read_raw(&mut self) -> Result<Buffered> {
        let mut line = Vec::new();
        let read = LineSource::read_line(&mut *self.source, &mut line)?;
        if read == 0 {
            trace!("End of stream at record {}", self.ordinal);
            return Ok(Buffered::Exhausted);
        }
        Ok(Buffered::Line(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::index::tests::CountingSource;
    use std::io::Cursor;

    fn fields(pairs: &[(&str, &str)]) -> Option<Record> {
        Some(Record::Fields(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ))
    }

    fn scalar(text: &str) -> Option<Record> {
        Some(Record::Scalar(text.to_string()))
    }

    #[test]
    fn end_to_end_walk_and_seek() {
        let mut stream = Cursor::new("1,a\n2,b\n3,c\n");
        let options = CursorOptions::new()
            .with_delimiter(",")
            .with_field_names(["id", "val"]);
        let mut cursor = RecordCursor::new(&mut stream, options);

        cursor.rewind().unwrap();
        assert_eq!(cursor.current().unwrap(), fields(&[("id", "1"), ("val", "a")]));
        cursor.next().unwrap();
        assert_eq!(cursor.current().unwrap(), fields(&[("id", "2"), ("val", "b")]));
        cursor.seek(0).unwrap();
        assert_eq!(cursor.current().unwrap(), fields(&[("id", "1"), ("val", "a")]));
        assert_eq!(cursor.count().unwrap(), 3);
    }

    #[test]
    fn iterates_every_line_once() {
        let mut stream = Cursor::new("alpha\r\nbeta\ngamma");
        let mut cursor = RecordCursor::new(&mut stream, CursorOptions::default());

        cursor.rewind().unwrap();
        let mut seen = Vec::new();
        while cursor.valid().unwrap() {
            seen.push((cursor.key(), cursor.current().unwrap().unwrap()));
            cursor.next().unwrap();
        }
        assert_eq!(
            seen,
            vec![
                (0, Record::Scalar("alpha".into())),
                (1, Record::Scalar("beta".into())),
                (2, Record::Scalar("gamma".into())),
            ]
        );
        assert_eq!(cursor.count().unwrap(), 3);
        assert_eq!(cursor.current().unwrap(), None);
    }

    #[test]
    fn current_is_idempotent() {
        let mut stream = Cursor::new("hello\nworld\n");
        let mut cursor = RecordCursor::new(&mut stream, CursorOptions::default());
        assert_eq!(cursor.current().unwrap(), scalar("hello"));
        assert_eq!(cursor.current().unwrap(), scalar("hello"));
        assert!(cursor.valid().unwrap());
        assert_eq!(cursor.current().unwrap(), scalar("hello"));
    }

    #[test]
    fn seek_past_end_clamps_to_last_record() {
        let mut stream = Cursor::new("a\nb\nc\n");
        let mut cursor = RecordCursor::new(&mut stream, CursorOptions::default());
        cursor.seek(10).unwrap();
        assert_eq!(cursor.key(), 2);
        assert_eq!(cursor.current().unwrap(), scalar("c"));
    }

    #[test]
    fn seek_discards_buffered_line() {
        let mut stream = Cursor::new("a\nb\nc\n");
        let mut cursor = RecordCursor::new(&mut stream, CursorOptions::default());
        assert_eq!(cursor.current().unwrap(), scalar("a"));
        cursor.seek(1).unwrap();
        assert_eq!(cursor.current().unwrap(), scalar("b"));
    }

    #[test]
    fn next_after_seek_moves_one_record() {
        let mut stream = Cursor::new("a\nb\nc\nd\n");
        let mut cursor = RecordCursor::new(&mut stream, CursorOptions::default());
        cursor.seek(1).unwrap();
        cursor.next().unwrap();
        assert_eq!(cursor.key(), 2);
        assert_eq!(cursor.current().unwrap(), scalar("c"));
    }

    #[test]
    fn next_reads_even_when_current_was_skipped() {
        let mut source = CountingSource::new("a\nb\nc\n");
        let mut cursor = RecordCursor::new(&mut source, CursorOptions::default());
        assert!(cursor.valid().unwrap());
        cursor.next().unwrap();
        cursor.next().unwrap();
        assert_eq!(cursor.current().unwrap(), scalar("c"));
        drop(cursor);
        assert_eq!(source.reads, 3);
    }

    #[test]
    fn rewind_returns_to_start() {
        let mut stream = Cursor::new("a\nb\n");
        let mut cursor = RecordCursor::new(&mut stream, CursorOptions::default());
        cursor.next().unwrap();
        cursor.next().unwrap();
        assert!(!cursor.valid().unwrap());
        cursor.rewind().unwrap();
        assert_eq!(cursor.key(), 0);
        assert_eq!(cursor.current().unwrap(), scalar("a"));
    }

    #[test]
    fn rewind_at_start_does_not_touch_stream() {
        let mut source = CountingSource::new("a\n");
        let mut cursor = RecordCursor::new(&mut source, CursorOptions::default());
        cursor.rewind().unwrap();
        drop(cursor);
        assert_eq!(source.seeks, 0);
    }

    #[test]
    fn count_twice_scans_once() {
        let mut source = CountingSource::new("a\nb\nc\n");
        let mut cursor = RecordCursor::new(&mut source, CursorOptions::default());
        assert_eq!(cursor.count().unwrap(), 3);
        assert_eq!(cursor.count().unwrap(), 3);
        cursor.seek(2).unwrap();
        drop(cursor);
        assert_eq!(source.reads, 4);
    }

    #[test]
    fn count_keeps_sequential_position() {
        let mut stream = Cursor::new("a\nb\nc\n");
        let mut cursor = RecordCursor::new(&mut stream, CursorOptions::default());
        cursor.valid().unwrap();
        cursor.next().unwrap();
        assert_eq!(cursor.count().unwrap(), 3);
        cursor.next().unwrap();
        assert_eq!(cursor.current().unwrap(), scalar("c"));
    }

    #[test]
    fn injected_table_is_used_for_seeking() {
        let mut source = CountingSource::new("a\nb\nc\n");
        let mut cursor = RecordCursor::new(&mut source, CursorOptions::default());
        cursor.set_offset_table(OffsetTable::new(vec![0, 2]).unwrap());
        assert_eq!(cursor.count().unwrap(), 2);
        cursor.seek(5).unwrap();
        assert_eq!(cursor.current().unwrap(), scalar("b"));
        drop(cursor);
        // One read for `current`, none for a scan.
        assert_eq!(source.reads, 1);
    }

    #[test]
    fn empty_stream() {
        let mut stream = Cursor::new("");
        let mut cursor = RecordCursor::new(&mut stream, CursorOptions::default());
        assert!(!cursor.valid().unwrap());
        assert_eq!(cursor.count().unwrap(), 0);
        cursor.seek(3).unwrap();
        assert_eq!(cursor.key(), 0);
        assert_eq!(cursor.current().unwrap(), None);
    }

    #[test]
    fn read_failure_propagates() {
        let mut source = CountingSource::new("a\nb\n");
        source.fail_on_read = Some(1);
        let mut cursor = RecordCursor::new(&mut source, CursorOptions::default());
        assert!(cursor.current().is_err());
        // The failed fetch leaves the cursor unfetched; the next attempt reads again.
        assert_eq!(cursor.current().unwrap(), scalar("a"));
    }
}

//! # Lazy Byte Offset Index
//!
//! Builds the [`OffsetTable`] of a stream with one forward scan, at most once,
//! and caches it. A caller may install a table instead (for example one loaded
//! from a side index), in which case no scan ever happens.
//!
//! The scan temporarily moves the stream to byte 0. A [`PositionGuard`] puts
//! the stream back where it was, both after a complete scan and when a read
//! fails half way.

use std::io;
use std::ops::{Deref, DerefMut};

use log::{debug, info, warn};

use super::table::OffsetTable;
use super::types::error::Result;
use super::types::source::LineSource;

/// Cached-or-injected ordinal → offset table owned by a cursor.
#[derive(Debug, Default)]
pub struct OffsetIndex {
    table: Option<OffsetTable>,
}

impl OffsetIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans `source` from byte 0 and records where every line starts.
    ///
    /// The stream position in effect before the call is restored afterwards.
    /// This is the only O(stream size) operation of the crate.
    pub fn build<S: LineSource + ?Sized>(source: &mut S) -> Result<OffsetTable> {
        let mut guard = PositionGuard::new(source)?;
        debug!("Building offset index (restoring to byte {} afterwards)", guard.saved);
        guard.seek_to(0)?;

        let mut offsets = Vec::new();
        let mut line = Vec::new();
        let mut next_start = 0u64;
        loop {
            line.clear();
            let read = guard.read_line(&mut line)?;
            if read == 0 {
                break;
            }
            offsets.push(next_start);
            next_start += read as u64;
        }

        guard.restore()?;
        info!("Offset index built: {} records over {} bytes", offsets.len(), next_start);
        Ok(OffsetTable::from_scan(offsets))
    }

    /// Returns the cached table, scanning `source` first if there is none.
    pub fn get<S: LineSource + ?Sized>(&mut self, source: &mut S) -> Result<&OffsetTable> {
        let table = match self.table.take() {
            Some(table) => table,
            None => Self::build(source)?,
        };
        Ok(self.table.insert(table))
    }

    /// Installs an externally supplied table, replacing any scan result.
    pub fn set(&mut self, table: OffsetTable) {
        debug!("Offset index overridden with {} records", table.len());
        self.table = Some(table);
    }

    /// Number of records, scanning `source` first if needed.
    pub fn count<S: LineSource + ?Sized>(&mut self, source: &mut S) -> Result<u64> {
        Ok(self.get(source)?.len())
    }

    /// The table if it has already been built or installed.
    pub fn table(&self) -> Option<&OffsetTable> {
        self.table.as_ref()
    }

    pub fn is_built(&self) -> bool {
        self.table.is_some()
    }

    /// Removes the cached table; the next `get` scans again.
    pub fn take(&mut self) -> Option<OffsetTable> {
        self.table.take()
    }
}

/// Remembers a stream offset and seeks back to it when released.
///
/// `restore` is the normal exit and reports a failed seek. Dropping the guard
/// without calling it (an early `?` return) still seeks back; a failure there
/// is only logged.
struct PositionGuard<'a, S: LineSource + ?Sized> {
    source: &'a mut S,
    saved: u64,
    restored: bool,
}

impl<'a, S: LineSource + ?Sized> PositionGuard<'a, S> {
    fn new(source: &'a mut S) -> io::Result<Self> {
        let saved = source.tell()?;
        Ok(Self {
            source,
            saved,
            restored: false,
        })
    }

    fn restore(mut self) -> io::Result<()> {
        self.restored = true;
        self.source.seek_to(self.saved)
    }
}

impl<S: LineSource + ?Sized> Deref for PositionGuard<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        &*self.source
    }
}

impl<S: LineSource + ?Sized> DerefMut for PositionGuard<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut *self.source
    }
}

impl<S: LineSource + ?Sized> Drop for PositionGuard<'_, S> {
    fn drop(&mut self) {
        if !self.restored {
            if let Err(e) = self.source.seek_to(self.saved) {
                warn!("Failed to restore stream position {}: {}", self.saved, e);
            }
        }
    }
}

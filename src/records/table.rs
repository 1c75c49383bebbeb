//! # Ordinal → Byte Offset Table
//!
//! The translation table that turns "go to record N" into "seek the stream to
//! byte X". Entry `n` is the byte offset at which record `n` starts, so entry
//! 0 of a non-empty table is always 0 and entries strictly increase.
//!
//! ## Side Index Layout
//! A table can be persisted next to its stream and loaded later to skip the
//! full scan:
//! ```text
//! [4 bytes] Magic "LREC"
//! [1 byte]  Format version (1)
//! [8 bytes] Record count N (big-endian u64)
//! [8*N]     Start offsets (big-endian u64)
//! [4 bytes] Adler32 checksum of the offset bytes (little-endian u32)
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use adler2::adler32_slice;
use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, trace};

use super::types::error::{RecordsError, Result};

const MAGIC: &[u8; 4] = b"LREC";
const FORMAT_VERSION: u8 = 1;

/// Start offsets of every record, indexed by ordinal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetTable {
    offsets: Vec<u64>,
}

impl OffsetTable {
    /// Wraps a caller-supplied offset list after checking it is a valid table.
    ///
    /// # Errors
    /// - `InvalidTable` if the first offset is not 0
    /// - `NonMonotonicOffsets` if an offset does not exceed its predecessor
    pub fn new(offsets: Vec<u64>) -> Result<Self> {
        if let Some(&first) = offsets.first() {
            if first != 0 {
                return Err(RecordsError::InvalidTable(format!(
                    "first record must start at byte 0, found {}",
                    first
                )));
            }
        }
        for (ordinal, pair) in offsets.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(RecordsError::NonMonotonicOffsets {
                    ordinal: ordinal as u64 + 1,
                    previous: pair[0],
                    offset: pair[1],
                });
            }
        }
        Ok(Self { offsets })
    }

    /// Used by the index scan, which produces increasing offsets by construction.
    pub(crate) fn from_scan(offsets: Vec<u64>) -> Self {
        debug_assert!(offsets.windows(2).all(|pair| pair[0] < pair[1]));
        Self { offsets }
    }

    pub fn len(&self) -> u64 {
        self.offsets.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Start offset of the record at `ordinal`.
    pub fn get(&self, ordinal: u64) -> Option<u64> {
        usize::try_from(ordinal)
            .ok()
            .and_then(|index| self.offsets.get(index))
            .copied()
    }

    /// Clamps `ordinal` into `[0, len - 1]`. An empty table clamps to 0.
    pub fn clamp(&self, ordinal: u64) -> u64 {
        ordinal.min(self.len().saturating_sub(1))
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.offsets
    }

    pub fn into_inner(self) -> Vec<u64> {
        self.offsets
    }

    /// Serializes the table in the side index layout.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut payload = vec![0u8; self.offsets.len() * 8];
        BigEndian::write_u64_into(&self.offsets, &mut payload);

        writer.write_all(MAGIC)?;
        writer.write_u8(FORMAT_VERSION)?;
        writer.write_u64::<BigEndian>(self.len())?;
        writer.write_all(&payload)?;
        writer.write_u32::<LittleEndian>(adler32_slice(&payload))?;
        trace!("Wrote offset table: {} records, {} payload bytes", self.len(), payload.len());
        Ok(())
    }

    /// Reads a table written by [`OffsetTable::write_to`].
    ///
    /// The loaded offsets go through the same validation as [`OffsetTable::new`].
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(RecordsError::InvalidFormat(format!(
                "Bad side index magic: {:02x?}",
                magic
            )));
        }

        let version = reader.read_u8()?;
        if version != FORMAT_VERSION {
            return Err(RecordsError::InvalidFormat(format!(
                "Unsupported side index version: {}",
                version
            )));
        }

        let count = reader.read_u64::<BigEndian>()?;
        let payload_len = usize::try_from(count)
            .ok()
            .and_then(|count| count.checked_mul(8))
            .ok_or_else(|| {
                RecordsError::InvalidFormat(format!("Side index record count too large: {}", count))
            })?;

        // Read through `take` so a corrupt count cannot force a huge allocation.
        let mut payload = Vec::new();
        reader.by_ref().take(payload_len as u64).read_to_end(&mut payload)?;
        if payload.len() != payload_len {
            return Err(RecordsError::InvalidFormat(format!(
                "Side index truncated: expected {} offset bytes, found {}",
                payload_len,
                payload.len()
            )));
        }

        let checksum_expected = reader.read_u32::<LittleEndian>()?;
        let checksum_actual = adler32_slice(&payload);
        trace!(
            "Side index checksum: expected={:#010x}, actual={:#010x}",
            checksum_expected,
            checksum_actual
        );
        if checksum_actual != checksum_expected {
            return Err(RecordsError::ChecksumMismatch {
                expected: checksum_expected,
                actual: checksum_actual,
            });
        }

        let mut offsets = vec![0u64; count as usize];
        BigEndian::read_u64_into(&payload, &mut offsets);
        Self::new(offsets)
    }

    /// Writes the table to a side index file, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        debug!("Saving offset table ({} records) to {}", self.len(), path.display());
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Loads a table from a side index file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading offset table from {}", path.display());
        let mut reader = BufReader::new(File::open(path)?);
        Self::read_from(&mut reader)
    }
}

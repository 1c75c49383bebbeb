//! The byte stream a cursor reads from.

use std::io::{self, BufRead, Seek, SeekFrom};

/// A readable, seekable, line-oriented byte stream.
///
/// The cursor never opens or closes a source; it only borrows one. Every
/// `BufRead + Seek` type is a source, so `BufReader<File>` and
/// `io::Cursor<Vec<u8>>` can be handed to a cursor directly.
pub trait LineSource {
    /// Appends the next line, terminator included, to `buf`.
    ///
    /// Returns the number of bytes read; `0` signals end of stream.
    fn read_line(&mut self, buf: &mut Vec<u8>) -> io::Result<usize>;

    /// Returns the current byte offset.
    fn tell(&mut self) -> io::Result<u64>;

    /// Moves to an absolute byte offset.
    fn seek_to(&mut self, offset: u64) -> io::Result<()>;
}

impl<R: BufRead + Seek> LineSource for R {
    fn read_line(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        self.read_until(b'\n', buf)
    }

    fn tell(&mut self) -> io::Result<u64> {
        self.stream_position()
    }

    fn seek_to(&mut self, offset: u64) -> io::Result<()> {
        self.seek(SeekFrom::Start(offset)).map(|_| ())
    }
}

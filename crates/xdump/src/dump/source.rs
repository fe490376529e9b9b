//! Random-access, zero-copy view over a dump file.
//!
//! Backed by a memory-mapped file in the CLI's normal usage, or by an
//! in-memory buffer in tests — both implement the same bounded-read
//! contract so the scanner and parsers never need to know which one they
//! have.

use crate::error::{DumpError, OutOfBoundsError};
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

enum Backing {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Backing {
    fn as_slice(&self) -> &[u8] {
        match self {
            Backing::Mapped(m) => &m[..],
            Backing::Owned(v) => &v[..],
        }
    }
}

/// A read-only, randomly addressable byte source of known length.
pub struct DumpSource {
    backing: Backing,
}

impl DumpSource {
    /// Opens `path` as a zero-copy memory-mapped view over the whole file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DumpError> {
        let file = File::open(path)?;
        // Safety: the dump file is treated as immutable for the lifetime of
        // the run; external mutation during a scan is out of scope.
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(DumpSource {
            backing: Backing::Mapped(mmap),
        })
    }

    /// Wraps an in-memory buffer as a dump source, for tests and for small
    /// synthetic inputs.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        DumpSource {
            backing: Backing::Owned(bytes),
        }
    }

    pub fn len(&self) -> u64 {
        self.backing.as_slice().len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Zero-copy view of the entire dump.
    pub fn as_slice(&self) -> &[u8] {
        self.backing.as_slice()
    }

    /// Reads exactly `len` bytes at `offset`, or fails with `OutOfBounds`.
    /// No partial reads.
    pub fn read_at(&self, offset: u64, len: u64) -> Result<&[u8], OutOfBoundsError> {
        let data = self.backing.as_slice();
        let offset = offset as usize;
        let len = len as usize;
        let end = offset
            .checked_add(len)
            .filter(|&e| e <= data.len())
            .ok_or(OutOfBoundsError {
                offset: offset as u64,
                len: len as u64,
                available: data.len().saturating_sub(offset) as u64,
            })?;
        Ok(&data[offset..end])
    }

    /// Builds a chunked, overlapping window iterator over the dump. Each
    /// window after the first repeats the last `overlap` bytes of the
    /// previous window, so a pattern of length `<= overlap + 1` spanning a
    /// window boundary is never missed.
    pub fn windows(&self, chunk_size: usize, overlap: usize) -> ChunkWindows<'_> {
        ChunkWindows {
            data: self.as_slice(),
            chunk_size,
            overlap,
            cursor: 0,
        }
    }
}

/// One window into the dump: `global_offset` is where `bytes[0]` sits in
/// the dump's address space.
pub struct Window<'a> {
    pub global_offset: u64,
    pub bytes: &'a [u8],
}

/// Iterator over overlapping chunks of a [`DumpSource`].
///
/// Invariant: for any byte offset `o` in the dump, at least one emitted
/// window covers `o`; concatenating the non-overlapping prefix of each
/// window after the first reconstructs the dump exactly.
pub struct ChunkWindows<'a> {
    data: &'a [u8],
    chunk_size: usize,
    overlap: usize,
    cursor: usize,
}

impl<'a> Iterator for ChunkWindows<'a> {
    type Item = Window<'a>;

    fn next(&mut self) -> Option<Window<'a>> {
        if self.cursor >= self.data.len() {
            return None;
        }

        let start = self.cursor.saturating_sub(if self.cursor == 0 { 0 } else { self.overlap });
        let end = (start + self.chunk_size).min(self.data.len());

        let window = Window {
            global_offset: start as u64,
            bytes: &self.data[start..end],
        };

        if end >= self.data.len() {
            self.cursor = self.data.len();
        } else {
            self.cursor = end;
        }

        Some(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_at_is_bounds_checked() {
        let src = DumpSource::from_bytes(vec![1, 2, 3, 4]);
        assert_eq!(src.read_at(0, 4).unwrap(), &[1, 2, 3, 4]);
        assert!(src.read_at(0, 5).is_err());
        assert!(src.read_at(4, 1).is_err());
    }

    #[test]
    fn windows_cover_every_offset_with_overlap() {
        let data: Vec<u8> = (0u8..=250).collect();
        let src = DumpSource::from_bytes(data.clone());

        let mut seen = vec![false; data.len()];
        for w in src.windows(64, 8) {
            for (i, _) in w.bytes.iter().enumerate() {
                seen[w.global_offset as usize + i] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn windows_reconstruct_dump_from_nonoverlapping_prefixes() {
        let data: Vec<u8> = (0u8..=200).collect();
        let src = DumpSource::from_bytes(data.clone());

        let mut reconstructed = Vec::new();
        let overlap = 8;
        for (i, w) in src.windows(32, overlap).enumerate() {
            let skip = if i == 0 { 0 } else { overlap };
            reconstructed.extend_from_slice(&w.bytes[skip.min(w.bytes.len())..]);
        }
        assert_eq!(reconstructed, data);
    }

    #[test]
    fn single_window_when_chunk_covers_whole_dump() {
        let src = DumpSource::from_bytes(vec![0u8; 10]);
        let windows: Vec<_> = src.windows(1024, 16).collect();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].global_offset, 0);
        assert_eq!(windows[0].bytes.len(), 10);
    }
}

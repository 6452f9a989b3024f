//! Memory-mapped input for endian-neutral reading
//!
//! This module maps a file into memory as a mutable region suitable for
//! in-place byte reversal. The mapping is private (copy-on-write): pages
//! the reader reverses are duplicated by the kernel on first write, so
//! the file on disk is never modified and unreversed pages stay shared
//! with other processes mapping the same file.
//!
//! # Example
//!
//! ```no_run
//! use byteflip::mmap::MappedBuffer;
//! use byteflip::Endianness;
//!
//! let mut mapped = MappedBuffer::open("telemetry.bin")?;
//! let mut reader = mapped.reader_with_byte_order_mark(Endianness::Little)?;
//! let record_count: u32 = reader.read_at::<u32>(4)?;
//! # let _ = record_count;
//! # Ok::<(), byteflip::SwapError>(())
//! ```

use crate::endian::Endianness;
use crate::error::{Result, SwapError};
use crate::reader::EndianReader;
use memmap2::{MmapMut, MmapOptions};
use std::fmt;
use std::fs::File;
use std::path::Path;

/// A file mapped privately into memory for endian-neutral access
///
/// The mapping is automatically released when the `MappedBuffer` is
/// dropped. Reversal performed through readers built on this buffer
/// mutates only the private mapping, never the file.
pub struct MappedBuffer {
    map: MmapMut,
    len: usize,
}

impl MappedBuffer {
    /// Open and privately map a file
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the file cannot be opened or mapped;
    /// empty files cannot be mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let len = file.metadata()?.len() as usize;
        if len == 0 {
            return Err(SwapError::Io(format!(
                "cannot map empty file {}",
                path.as_ref().display()
            )));
        }
        let map = unsafe { MmapOptions::new().map_copy(&file)? };
        Ok(MappedBuffer { map, len })
    }

    /// Size of the mapped region in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the mapped region is empty (never the case for a
    /// successfully opened buffer)
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The mapped bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.map[..]
    }

    /// The mapped bytes, mutably
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.map[..]
    }

    /// A reader over the whole region with a known target endianness
    pub fn reader(&mut self, endian: Endianness) -> EndianReader<'_> {
        EndianReader::new(&mut self.map[..], endian)
    }

    /// A reader over the whole region, resolving the target endianness
    /// from the byte-order mark at the start of the file
    pub fn reader_with_byte_order_mark(&mut self, initial: Endianness) -> Result<EndianReader<'_>> {
        EndianReader::with_byte_order_mark(&mut self.map[..], initial)
    }
}

impl fmt::Debug for MappedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedBuffer").field("len", &self.len).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_file(data: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(data).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_empty_file_is_rejected() {
        let file = create_test_file(&[]);
        assert!(matches!(
            MappedBuffer::open(file.path()),
            Err(SwapError::Io(_))
        ));
    }

    #[test]
    fn test_nonexistent_file() {
        assert!(matches!(
            MappedBuffer::open("/nonexistent/path/to/data.bin"),
            Err(SwapError::Io(_))
        ));
    }

    #[test]
    fn test_maps_file_contents() {
        let file = create_test_file(&[1, 2, 3, 4]);
        let mapped = MappedBuffer::open(file.path()).unwrap();
        assert_eq!(mapped.len(), 4);
        assert_eq!(mapped.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_reversal_does_not_write_back() {
        let file = create_test_file(&[0x12, 0x34, 0x56, 0x78]);
        {
            let mut mapped = MappedBuffer::open(file.path()).unwrap();
            let mut reader = mapped.reader(Endianness::native().opposite());
            let _: u32 = reader.read().unwrap();
            // The private mapping saw the reversal...
            assert_eq!(mapped.as_slice(), &[0x78, 0x56, 0x34, 0x12]);
        }
        // ...but the file did not.
        let on_disk = std::fs::read(file.path()).unwrap();
        assert_eq!(on_disk, vec![0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn test_reader_with_bom() {
        let file = create_test_file(&[0xFF, 0xFE, 0xAB, 0xCD]);
        let mut mapped = MappedBuffer::open(file.path()).unwrap();
        let reader = mapped
            .reader_with_byte_order_mark(Endianness::Little)
            .unwrap();
        assert_eq!(reader.endianness(), Endianness::Big);
    }
}

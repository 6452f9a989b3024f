//! Cursor-based endian-neutral writes to a sequential output channel
//!
//! [`EndianWriter`] mirrors [`crate::reader::EndianReader`] on the output
//! side. Because the caller's value must never be mutated, each swapped
//! write stages the value first: values up to [`INLINE_STAGE`] bytes stage
//! in a fixed stack buffer, larger ones rent from the process-wide
//! [`crate::scratch`] pool. Writes under a native target go straight to
//! the channel with no staging at all.
//!
//! `align_up` physically emits zero-valued padding bytes so that the
//! on-wire layout matches what a reader expects byte for byte.
//!
//! # Example
//!
//! ```
//! use byteflip::{Endianness, EndianReader, EndianWriter};
//! use std::io::Cursor;
//!
//! let mut out = Cursor::new(Vec::new());
//! let mut writer = EndianWriter::new(&mut out, Endianness::Big)?;
//! writer.write(&0x12345678u32)?;
//! writer.write(&0xABCDu16)?;
//!
//! let mut buf = out.into_inner();
//! assert_eq!(buf, [0x12, 0x34, 0x56, 0x78, 0xAB, 0xCD]);
//!
//! let mut reader = EndianReader::new(&mut buf, Endianness::Big);
//! assert_eq!(reader.read::<u32>()?, 0x12345678);
//! # Ok::<(), byteflip::SwapError>(())
//! ```

use crate::align::padding_for;
use crate::endian::{Endianness, BYTE_ORDER_MARK};
use crate::error::Result;
use crate::plan::{EndianSwap, SwapLayout};
use crate::scratch;
use std::io::{Seek, SeekFrom, Write};
use zerocopy::{Immutable, IntoBytes};

/// Largest value staged in the writer's fixed stack buffer; bigger values
/// rent pooled scratch space
pub const INLINE_STAGE: usize = 64;

/// Endian-neutral writer over a borrowed, seekable output channel
///
/// The channel position is tracked alongside the channel itself so that
/// alignment arithmetic never needs to query the channel.
#[derive(Debug)]
pub struct EndianWriter<'a, W: Write + Seek> {
    out: &'a mut W,
    pos: u64,
    endian: Endianness,
    swap: bool,
}

impl<'a, W: Write + Seek> EndianWriter<'a, W> {
    /// Wrap an output channel with a target endianness, starting at the
    /// channel's current position
    pub fn new(out: &'a mut W, endian: Endianness) -> Result<Self> {
        let pos = out.stream_position()?;
        Ok(EndianWriter {
            out,
            pos,
            endian,
            swap: endian.needs_swap(),
        })
    }

    /// The writer's target endianness
    #[inline]
    pub fn endianness(&self) -> Endianness {
        self.endian
    }

    /// Current channel position in bytes
    #[inline]
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Emit raw bytes unchanged
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.out.write_all(bytes)?;
        self.pos += bytes.len() as u64;
        Ok(())
    }

    /// Write one primitive in the target order
    pub fn write<T: EndianSwap + IntoBytes + Immutable>(&mut self, value: &T) -> Result<()> {
        let src = value.as_bytes();
        if !self.swap {
            return self.write_bytes(src);
        }
        self.write_staged(src, |bytes| {
            T::swap_bytes(bytes);
            Ok(())
        })
    }

    /// Write one composite in the target order through its compiled plan
    pub fn write_composite<T>(&mut self, value: &T) -> Result<()>
    where
        T: SwapLayout + IntoBytes + Immutable,
    {
        let plan = T::plan()?;
        let src = value.as_bytes();
        if !self.swap {
            return self.write_bytes(src);
        }
        self.write_staged(src, |bytes| plan.apply(bytes))
    }

    /// Write a homogeneous run of primitives in the target order
    pub fn write_sequence<T: EndianSwap + IntoBytes + Immutable>(
        &mut self,
        values: &[T],
    ) -> Result<()> {
        if !self.swap || T::SIZE <= 1 {
            return self.write_bytes(values.as_bytes());
        }
        self.write_staged(values.as_bytes(), |bytes| {
            for chunk in bytes.chunks_exact_mut(T::SIZE) {
                T::swap_bytes(chunk);
            }
            Ok(())
        })
    }

    /// Write a homogeneous run of composites in the target order
    pub fn write_composite_sequence<T>(&mut self, values: &[T]) -> Result<()>
    where
        T: SwapLayout + IntoBytes + Immutable,
    {
        let plan = T::plan()?;
        if !self.swap {
            return self.write_bytes(values.as_bytes());
        }
        self.write_staged(values.as_bytes(), |bytes| {
            for chunk in bytes.chunks_exact_mut(plan.size().max(1)) {
                plan.apply(chunk)?;
            }
            Ok(())
        })
    }

    /// Stage `src`, let `swap` correct the copy, emit the copy. The
    /// caller's bytes are never touched.
    fn write_staged(
        &mut self,
        src: &[u8],
        swap: impl FnOnce(&mut [u8]) -> Result<()>,
    ) -> Result<()> {
        if src.len() <= INLINE_STAGE {
            let mut stage = [0u8; INLINE_STAGE];
            let staged = &mut stage[..src.len()];
            staged.copy_from_slice(src);
            swap(staged)?;
            self.write_bytes(staged)
        } else {
            let mut staged = scratch::global().rent(src.len());
            staged.copy_from_slice(src);
            swap(&mut staged)?;
            self.write_bytes(&staged)
        }
    }

    /// Emit the byte-order mark sentinel in the target order
    ///
    /// Readers recover the stream's endianness from the resulting wire
    /// pattern via
    /// [`EndianReader::with_byte_order_mark`](crate::reader::EndianReader::with_byte_order_mark).
    pub fn write_byte_order_mark(&mut self) -> Result<()> {
        self.write(&BYTE_ORDER_MARK)
    }

    /// Move the channel to an absolute position
    pub fn seek(&mut self, pos: u64) -> Result<()> {
        self.out.seek(SeekFrom::Start(pos))?;
        self.pos = pos;
        Ok(())
    }

    /// Advance the channel to the next multiple of `pack`, emitting
    /// zero-valued padding bytes on the way
    pub fn align_up(&mut self, pack: usize) -> Result<()> {
        const ZEROS: [u8; 64] = [0u8; 64];
        let mut pad = padding_for(self.pos as usize, pack);
        while pad > 0 {
            let chunk = pad.min(ZEROS.len());
            self.write_bytes(&ZEROS[..chunk])?;
            pad -= chunk;
        }
        Ok(())
    }

    /// Move the channel back to the previous multiple of `pack`
    pub fn align_down(&mut self, pack: usize) -> Result<()> {
        if pack != 0 {
            let new = self.pos - self.pos % pack as u64;
            self.seek(new)?;
        }
        Ok(())
    }

    /// Flush the underlying channel
    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

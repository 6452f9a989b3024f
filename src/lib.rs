//! Byteflip - Endian-Neutral Access to Fixed-Layout Binary Data
//!
//! Byteflip reads and writes fixed-layout binary values whose on-disk or
//! on-wire byte order may differ from the host's, without ever building a
//! second allocated copy: bytes in native order are left untouched, and
//! foreign-order bytes are corrected by reversing precisely the right
//! ranges in place.
//!
//! # Quick Start
//!
//! ```rust
//! use byteflip::{Endianness, EndianReader, FieldDef, TypeLayout};
//!
//! // Describe a composite's layout once...
//! let layout = TypeLayout::builder("Record")
//!     .pack(2)
//!     .field(FieldDef::primitive("tag", 2))
//!     .field(FieldDef::primitive("level", 1))
//!     .field(FieldDef::primitive("count", 2))
//!     .build(6);
//!
//! // ...compile it into a reversal plan...
//! let plan = layout.compile()?;
//!
//! // ...and read foreign-order buffers through it.
//! let mut buf = [0x00, 0x2A, 0x07, 0x00, 0x01, 0x00];
//! let foreign = Endianness::native().opposite();
//! let mut reader = EndianReader::new(&mut buf, foreign);
//! let bytes = reader.read_with_plan(&plan)?;
//! assert_eq!(bytes[0..2], [0x2A, 0x00]); // tag reversed in place
//! # Ok::<(), byteflip::SwapError>(())
//! ```
//!
//! # Key Ideas
//!
//! - **Compiled reversal plans**: a composite's layout (field order,
//!   sizes, pack rules, explicit offsets, skip fields, nesting, inline
//!   arrays) is compiled once into an ordered list of byte ranges to
//!   reverse; the plan is immutable and shared by every reader and writer.
//! - **In-place correction**: readers borrow a caller-owned mutable
//!   region and reverse only what is read; writers stage values before
//!   emission so the caller's data is never touched.
//! - **Static dispatch**: primitives reverse through [`EndianSwap`],
//!   composites through [`SwapLayout`] and their cached plan; both
//!   resolve at compile time with no virtual calls on the hot path.
//! - **Byte-order marks**: streams can carry a 2-byte mark that readers
//!   probe to resolve the actual byte order at run time.
//!
//! # Architecture
//!
//! ```text
//! TypeLayout (descriptor)          schema.rs (JSON tables)
//!        │ compile                        │ parse + compile
//!        ▼                                ▼
//!    SwapPlan  ◄────── process-wide plan cache (by TypeId)
//!        │ apply
//!        ▼
//!  EndianReader / EndianWriter ── in-place reversal over
//!                                 caller-owned bytes / channels
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Module declarations
/// Alignment arithmetic
pub mod align;
/// Endianness and byte-order marks
pub mod endian;
/// Error types for byteflip operations
pub mod error;
/// Layout descriptors and the plan compiler
pub mod layout;
/// Memory-mapped input
pub mod mmap;
/// Compiled reversal plans and capability traits
pub mod plan;
/// Endian-neutral reading
pub mod reader;
/// Declarative schema tables
pub mod schema;
/// Pooled scratch buffers
pub mod scratch;
/// Endian-neutral writing
pub mod writer;

// Re-exports for the common surface

/// Byte order of a buffer or channel
pub use crate::endian::{Endianness, BYTE_ORDER_MARK};

/// Crate-wide error and result types
pub use crate::error::{Result, SwapError};

/// Layout description surface
pub use crate::layout::{FieldDef, FieldKind, LayoutBuilder, TypeLayout};

/// Compiled plans and the reversal capability traits
pub use crate::plan::{cached_plan, EndianSwap, SwapLayout, SwapOp, SwapPlan};

/// Cursor-based endian-neutral reader
pub use crate::reader::EndianReader;

/// Cursor-based endian-neutral writer
pub use crate::writer::EndianWriter;

/// Pooled scratch buffers
pub use crate::scratch::{Scratch, ScratchPool};

/// Error types for the byteflip library
use std::fmt;
use std::io;

/// Result type alias for byteflip operations
pub type Result<T> = std::result::Result<T, SwapError>;

/// Main error type for layout compilation and endian-neutral access
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapError {
    /// A field whose type cannot be decomposed into fixed-size atomic slices
    Layout {
        /// Name of the composite type being compiled
        type_name: String,
        /// Name of the offending field
        field: String,
        /// Why the field cannot be compiled
        reason: String,
    },

    /// Computed layout size disagrees with the declared total size
    SizeMismatch {
        /// Name of the composite type being compiled
        type_name: String,
        /// Cursor position after processing every field
        computed: usize,
        /// Total size the descriptor declared
        declared: usize,
    },

    /// Unrecognized byte-order mark value while probing a buffer
    UnknownByteOrderMark(u16),

    /// Access past the bounds of the borrowed region
    OutOfRange {
        /// Starting offset of the attempted access
        offset: usize,
        /// Length of the attempted access
        len: usize,
        /// Size of the borrowed region
        size: usize,
    },

    /// Buffer length does not match the plan or value it is applied against
    LengthMismatch {
        /// Length the operation requires
        expected: usize,
        /// Length that was supplied
        actual: usize,
    },

    /// A zero-copy typed view was requested at a misaligned offset
    Misaligned {
        /// Buffer offset of the attempted cast
        offset: usize,
        /// Alignment the target type requires
        align: usize,
    },

    /// Schema table parsing errors
    Schema(String),

    /// I/O errors
    Io(String),
}

impl fmt::Display for SwapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwapError::Layout {
                type_name,
                field,
                reason,
            } => write!(f, "Layout error in {}.{}: {}", type_name, field, reason),
            SwapError::SizeMismatch {
                type_name,
                computed,
                declared,
            } => write!(
                f,
                "Layout of {} computes to {} bytes but declares {}",
                type_name, computed, declared
            ),
            SwapError::UnknownByteOrderMark(value) => {
                write!(f, "Unrecognized byte-order mark: {:#06x}", value)
            }
            SwapError::OutOfRange { offset, len, size } => write!(
                f,
                "Access of {} bytes at offset {} is outside the {}-byte region",
                len, offset, size
            ),
            SwapError::LengthMismatch { expected, actual } => {
                write!(f, "Buffer is {} bytes, expected {}", actual, expected)
            }
            SwapError::Misaligned { offset, align } => {
                write!(f, "Offset {} is not aligned to {} bytes", offset, align)
            }
            SwapError::Schema(msg) => write!(f, "Schema error: {}", msg),
            SwapError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for SwapError {}

impl From<io::Error> for SwapError {
    fn from(err: io::Error) -> Self {
        SwapError::Io(err.to_string())
    }
}

//! Compiled byte-reversal plans and the capability traits that apply them
//!
//! A [`SwapPlan`] is the immutable product of compiling a
//! [`crate::layout::TypeLayout`]: an ordered list of byte ranges that must
//! be reversed to flip a composite value's endianness. Plans are applied in
//! place against a buffer of exactly the composite's size, and application
//! is an involution (applying the same plan twice restores the original
//! bytes).
//!
//! Two capability traits select the reversal strategy at compile time:
//!
//! - [`EndianSwap`] — endian-symmetric primitives reversed as one flat run
//! - [`SwapLayout`] — composites that carry a field layout and reverse
//!   through their compiled plan
//!
//! Plans for `SwapLayout` types are memoized in a process-wide table keyed
//! by `TypeId`, populated lazily on first use. A type whose layout fails to
//! compile reports its error on every call without affecting other types.

use crate::error::{Result, SwapError};
use crate::layout::TypeLayout;
use rustc_hash::FxHashMap;
use std::any::TypeId;
use std::mem;
use std::sync::{Arc, OnceLock, RwLock};

/// One entry of a compiled reversal plan
///
/// Offsets and lengths are `u32` byte counts relative to the start of the
/// composite value (4GB limit, matching the offset-based format
/// convention).
#[derive(Debug, Clone)]
pub enum SwapOp {
    /// Reverse a contiguous run of bytes in place
    Reverse {
        /// Byte offset of the run
        offset: u32,
        /// Length of the run in bytes
        len: u32,
    },
    /// Delegate a span to a nested composite's own plan, once per element
    Delegate {
        /// Byte offset of the first element
        offset: u32,
        /// Size of one element in bytes
        elem_size: u32,
        /// Number of consecutive elements
        count: u32,
        /// The nested composite's compiled plan
        plan: Arc<SwapPlan>,
    },
}

impl SwapOp {
    /// Byte offset where this entry starts
    #[inline]
    pub fn offset(&self) -> usize {
        match self {
            SwapOp::Reverse { offset, .. } | SwapOp::Delegate { offset, .. } => *offset as usize,
        }
    }

    /// Total number of bytes this entry covers
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            SwapOp::Reverse { len, .. } => *len as usize,
            SwapOp::Delegate {
                elem_size, count, ..
            } => (*elem_size as usize) * (*count as usize),
        }
    }

    /// True when the entry covers no bytes
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Compiled, immutable reversal plan for one composite type
///
/// Produced by [`TypeLayout::compile`]. Immutable once built and safe to
/// share across any number of readers and writers without synchronization.
#[derive(Debug, Clone)]
pub struct SwapPlan {
    size: u32,
    ops: Vec<SwapOp>,
}

impl SwapPlan {
    pub(crate) fn new(size: u32, ops: Vec<SwapOp>) -> Self {
        SwapPlan { size, ops }
    }

    /// Size in bytes of the composite this plan reverses
    #[inline]
    pub fn size(&self) -> usize {
        self.size as usize
    }

    /// The plan's entries, in increasing offset order for auto-placed
    /// layouts
    #[inline]
    pub fn ops(&self) -> &[SwapOp] {
        &self.ops
    }

    /// Reverse one value's endianness in place
    ///
    /// `bytes` must be exactly [`SwapPlan::size`] bytes long. Flat ranges
    /// are byte-reversed; delegate ranges invoke the nested plan on each
    /// consecutive element. Applying the same plan twice restores the
    /// original bytes.
    pub fn apply(&self, bytes: &mut [u8]) -> Result<()> {
        if bytes.len() != self.size() {
            return Err(SwapError::LengthMismatch {
                expected: self.size(),
                actual: bytes.len(),
            });
        }
        for op in &self.ops {
            match op {
                SwapOp::Reverse { offset, len } => {
                    let start = *offset as usize;
                    bytes[start..start + *len as usize].reverse();
                }
                SwapOp::Delegate {
                    offset,
                    elem_size,
                    count,
                    plan,
                } => {
                    let elem = *elem_size as usize;
                    for i in 0..*count as usize {
                        let start = *offset as usize + i * elem;
                        plan.apply(&mut bytes[start..start + elem])?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Endian-symmetric values reversed as a single flat byte run
///
/// Implemented for the fixed-width integer and float primitives. The
/// access types use this for `read`/`write` of scalars and for the
/// per-element reversal of homogeneous sequences. Implementations must
/// keep `SIZE` equal to the type's memory size; `swap_bytes` receives a
/// slice of exactly `SIZE` bytes.
pub trait EndianSwap {
    /// Size in bytes of the value's fixed layout
    const SIZE: usize;

    /// Reverse one value's bytes in place
    fn swap_bytes(bytes: &mut [u8]);
}

macro_rules! impl_endian_swap {
    ($($t:ty),* $(,)?) => {
        $(
            impl EndianSwap for $t {
                const SIZE: usize = mem::size_of::<$t>();

                #[inline(always)]
                fn swap_bytes(bytes: &mut [u8]) {
                    debug_assert_eq!(bytes.len(), Self::SIZE);
                    bytes.reverse();
                }
            }
        )*
    };
}

impl_endian_swap!(u16, u32, u64, u128, i16, i32, i64, i128, f32, f64);

impl EndianSwap for u8 {
    const SIZE: usize = 1;

    #[inline(always)]
    fn swap_bytes(_bytes: &mut [u8]) {}
}

impl EndianSwap for i8 {
    const SIZE: usize = 1;

    #[inline(always)]
    fn swap_bytes(_bytes: &mut [u8]) {}
}

/// Composites that reverse their endianness through a compiled plan
///
/// Implementors describe their field layout once; the compiled plan is
/// memoized process-wide and shared by every reader and writer. The
/// descriptor's declared size must match the Rust type's size.
///
/// # Example
///
/// ```
/// use byteflip::{FieldDef, SwapLayout, TypeLayout};
/// use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};
///
/// #[repr(C)]
/// #[derive(FromBytes, IntoBytes, Immutable, KnownLayout)]
/// struct Vec3 {
///     x: f32,
///     y: f32,
///     z: f32,
/// }
///
/// impl SwapLayout for Vec3 {
///     fn layout() -> TypeLayout {
///         TypeLayout::builder("Vec3")
///             .pack(4)
///             .field(FieldDef::primitive("x", 4))
///             .field(FieldDef::primitive("y", 4))
///             .field(FieldDef::primitive("z", 4))
///             .build(12)
///     }
/// }
///
/// let plan = Vec3::plan().unwrap();
/// assert_eq!(plan.size(), 12);
/// assert_eq!(plan.ops().len(), 3);
/// ```
pub trait SwapLayout: Sized + 'static {
    /// Size in bytes of the type's fixed layout
    const SIZE: usize = mem::size_of::<Self>();

    /// Describe the type's fields, pack rule, and total size
    fn layout() -> TypeLayout;

    /// The type's compiled reversal plan, from the process-wide cache
    fn plan() -> Result<Arc<SwapPlan>> {
        cached_plan::<Self>()
    }
}

type PlanCache = RwLock<FxHashMap<TypeId, Arc<SwapPlan>>>;

fn cache() -> &'static PlanCache {
    static CACHE: OnceLock<PlanCache> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(FxHashMap::default()))
}

/// Fetch or lazily compile the reversal plan for `T`
///
/// The first successful compile is memoized for the life of the process;
/// a type whose layout fails to compile returns the error on every call
/// without affecting any other cached type.
pub fn cached_plan<T: SwapLayout>() -> Result<Arc<SwapPlan>> {
    let key = TypeId::of::<T>();
    {
        let map = match cache().read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(plan) = map.get(&key) {
            return Ok(plan.clone());
        }
    }

    let layout = T::layout();
    if layout.size() != T::SIZE {
        return Err(SwapError::SizeMismatch {
            type_name: layout.name().to_string(),
            computed: layout.size(),
            declared: T::SIZE,
        });
    }
    let plan = Arc::new(layout.compile()?);

    let mut map = match cache().write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    let entry = map.entry(key).or_insert_with(|| plan.clone());
    Ok(entry.clone())
}

//! Composite type descriptors and the reversal-plan compiler
//!
//! A [`TypeLayout`] is an explicit, language-neutral description of a
//! fixed-size composite: an ordered field list, a pack size governing
//! alignment padding (0 disables padding), and a declared total size.
//! [`TypeLayout::compile`] walks the fields once, left to right, and
//! produces the ordered, non-overlapping [`SwapPlan`] that flips the
//! composite's endianness.
//!
//! # Placement rules
//!
//! The compiler maintains a running cursor, starting at 0:
//!
//! 1. A field with an explicit offset jumps the cursor there first.
//! 2. A skip field advances the cursor past its bytes and emits nothing.
//! 3. A nested composite with its own compiled plan emits one delegate
//!    entry covering `size x count` bytes.
//! 4. Everything else decomposes into atomic slices: primitives and enum
//!    widths directly, inline composites recursively (their own pack takes
//!    over inside). Each slice is padded up to the smaller of its own size
//!    and the governing pack boundary, the way host layout rules place
//!    packed fields, then emitted as a flat reversal range.
//!
//! The final cursor must land exactly on the declared total size;
//! anything else is a layout error, as is any field extending past the
//! declared size.
//!
//! Explicit offsets may jump backward or overlap earlier fields. That is
//! deliberate (overlay and union-style layouts) and left to caller
//! discipline; the compiler only enforces the declared-size bounds.

use crate::align::align_up;
use crate::error::{Result, SwapError};
use crate::plan::{SwapLayout, SwapOp, SwapPlan};
use std::sync::Arc;

/// What one field contains, for reversal purposes
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Endian-symmetric scalar reversed as one flat run
    Primitive {
        /// Scalar size in bytes (1 to 16)
        size: usize,
    },
    /// Enumeration, reversed as its underlying integer width
    Enum {
        /// Underlying integer width in bytes
        width: usize,
    },
    /// Nested composite without its own plan, flattened field by field
    Inline {
        /// The nested composite's descriptor
        layout: Arc<TypeLayout>,
    },
    /// Nested composite with its own compiled plan, delegated per element
    Nested {
        /// Size of one nested value in bytes
        size: usize,
        /// The nested composite's compiled plan
        plan: Arc<SwapPlan>,
    },
}

/// One member of a composite type
///
/// Built through the constructors below and the chainable modifiers
/// [`FieldDef::array`], [`FieldDef::at`], and [`FieldDef::skip`].
#[derive(Debug, Clone)]
pub struct FieldDef {
    name: String,
    kind: FieldKind,
    count: usize,
    at: Option<usize>,
    skip: bool,
}

impl FieldDef {
    fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        FieldDef {
            name: name.into(),
            kind,
            count: 1,
            at: None,
            skip: false,
        }
    }

    /// An endian-symmetric scalar of `size` bytes
    pub fn primitive(name: impl Into<String>, size: usize) -> Self {
        Self::new(name, FieldKind::Primitive { size })
    }

    /// An enumeration stored as a `width`-byte integer
    pub fn enumeration(name: impl Into<String>, width: usize) -> Self {
        Self::new(name, FieldKind::Enum { width })
    }

    /// A nested composite flattened into the containing plan
    pub fn inline(name: impl Into<String>, layout: Arc<TypeLayout>) -> Self {
        Self::new(name, FieldKind::Inline { layout })
    }

    /// A nested composite reversed through the given compiled plan
    pub fn nested(name: impl Into<String>, size: usize, plan: Arc<SwapPlan>) -> Self {
        Self::new(name, FieldKind::Nested { size, plan })
    }

    /// A nested composite reversed through `T`'s own cached plan
    pub fn nested_of<T: SwapLayout>(name: impl Into<String>) -> Result<Self> {
        Ok(Self::nested(name, T::SIZE, T::plan()?))
    }

    /// Make this field an inline fixed-length array of `count` elements
    pub fn array(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Place this field at an explicit byte offset instead of the running
    /// cursor
    pub fn at(mut self, offset: usize) -> Self {
        self.at = Some(offset);
        self
    }

    /// Exclude this field from reversal; the cursor still advances past it
    pub fn skip(mut self) -> Self {
        self.skip = true;
        self
    }

    /// Field name, used in layout error reports
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field's kind
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Inline array length (1 for scalars)
    pub fn count(&self) -> usize {
        self.count
    }

    /// Explicit byte offset, if any
    pub fn offset(&self) -> Option<usize> {
        self.at
    }

    /// True when the field is excluded from reversal
    pub fn is_skip(&self) -> bool {
        self.skip
    }

    /// Size in bytes of one element of this field
    pub fn elem_size(&self) -> usize {
        match &self.kind {
            FieldKind::Primitive { size } => *size,
            FieldKind::Enum { width } => *width,
            FieldKind::Inline { layout } => layout.size(),
            FieldKind::Nested { size, .. } => *size,
        }
    }

    fn validate(&self, type_name: &str) -> Result<()> {
        let reason = match &self.kind {
            FieldKind::Primitive { size: 0 } => Some("zero-size primitive".to_string()),
            FieldKind::Primitive { size } if *size > 16 => {
                Some(format!("{}-byte primitive is wider than 16 bytes", size))
            }
            FieldKind::Enum { width } if !matches!(width, 1 | 2 | 4 | 8 | 16) => Some(format!(
                "enum width {} is not one of 1, 2, 4, 8, or 16",
                width
            )),
            FieldKind::Nested { size, plan } if *size != plan.size() => Some(format!(
                "delegate plan covers {} bytes but the field declares {}",
                plan.size(),
                size
            )),
            _ if self.count == 0 => Some("zero-length inline array".to_string()),
            _ => None,
        };
        match reason {
            Some(reason) => Err(SwapError::Layout {
                type_name: type_name.to_string(),
                field: self.name.clone(),
                reason,
            }),
            None => Ok(()),
        }
    }
}

/// Descriptor of one fixed-size composite type
///
/// Immutable once built; share via `Arc` when nesting. Compile once with
/// [`TypeLayout::compile`] and reuse the resulting plan across arbitrarily
/// many readers and writers.
#[derive(Debug, Clone)]
pub struct TypeLayout {
    name: String,
    pack: usize,
    size: usize,
    fields: Vec<FieldDef>,
}

impl TypeLayout {
    /// Start describing a composite type
    pub fn builder(name: impl Into<String>) -> LayoutBuilder {
        LayoutBuilder {
            name: name.into(),
            pack: 0,
            fields: Vec::new(),
        }
    }

    /// Type name, used in layout error reports
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Alignment boundary fields are padded up to (0 disables padding)
    pub fn pack(&self) -> usize {
        self.pack
    }

    /// Declared total size in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    /// The ordered field list
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Compile this descriptor into its reversal plan
    pub fn compile(&self) -> Result<SwapPlan> {
        let mut ops = Vec::new();
        let mut pos = 0usize;
        walk(self, self, 0, &mut pos, &mut ops)?;
        if pos != self.size {
            return Err(SwapError::SizeMismatch {
                type_name: self.name.clone(),
                computed: pos,
                declared: self.size,
            });
        }
        Ok(SwapPlan::new(self.size as u32, ops))
    }
}

/// Builder for [`TypeLayout`]
#[derive(Debug)]
pub struct LayoutBuilder {
    name: String,
    pack: usize,
    fields: Vec<FieldDef>,
}

impl LayoutBuilder {
    /// Set the pack size (alignment boundary; 0 disables padding)
    pub fn pack(mut self, pack: usize) -> Self {
        self.pack = pack;
        self
    }

    /// Append a field in declaration order
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Finish with the declared total size
    pub fn build(self, size: usize) -> TypeLayout {
        TypeLayout {
            name: self.name,
            pack: self.pack,
            size,
            fields: self.fields,
        }
    }
}

/// Walk `layout`'s fields with the running cursor, emitting plan entries
/// bounded by `root`'s declared size. `base` is the buffer offset where
/// this layout instance begins; explicit field offsets are relative to it.
fn walk(
    root: &TypeLayout,
    layout: &TypeLayout,
    base: usize,
    pos: &mut usize,
    ops: &mut Vec<SwapOp>,
) -> Result<()> {
    for field in &layout.fields {
        field.validate(&layout.name)?;

        if let Some(at) = field.at {
            *pos = checked_offset(base, at, layout, field)?;
        }

        let total = field
            .elem_size()
            .checked_mul(field.count)
            .filter(|t| *t <= u32::MAX as usize)
            .ok_or_else(|| SwapError::Layout {
                type_name: layout.name.clone(),
                field: field.name.clone(),
                reason: "total field size overflows the 4GB offset limit".to_string(),
            })?;

        if field.skip {
            *pos = pos.checked_add(total).ok_or_else(|| SwapError::Layout {
                type_name: layout.name.clone(),
                field: field.name.clone(),
                reason: "skip field advances the cursor past addressable range".to_string(),
            })?;
            continue;
        }

        match &field.kind {
            FieldKind::Nested { size, plan } => {
                check_bounds(root, layout, field, *pos, total)?;
                ops.push(SwapOp::Delegate {
                    offset: *pos as u32,
                    elem_size: *size as u32,
                    count: field.count as u32,
                    plan: plan.clone(),
                });
                *pos += total;
            }
            FieldKind::Primitive { size } | FieldKind::Enum { width: size } => {
                for _ in 0..field.count {
                    *pos = align_up(*pos, slice_pack(*size, layout.pack));
                    check_bounds(root, layout, field, *pos, *size)?;
                    ops.push(SwapOp::Reverse {
                        offset: *pos as u32,
                        len: *size as u32,
                    });
                    *pos += *size;
                }
            }
            FieldKind::Inline { layout: inner } => {
                for _ in 0..field.count {
                    let elem_base = *pos;
                    walk(root, inner, elem_base, pos, ops)?;
                    let end = elem_base + inner.size;
                    if *pos > end {
                        return Err(SwapError::Layout {
                            type_name: layout.name.clone(),
                            field: field.name.clone(),
                            reason: format!(
                                "inline composite {} overflows its declared {}-byte size here",
                                inner.name, inner.size
                            ),
                        });
                    }
                    // Trailing padding inside the nested composite still
                    // occupies its declared size.
                    *pos = end;
                    check_bounds(root, layout, field, elem_base, inner.size)?;
                }
            }
        }
    }
    Ok(())
}

/// Alignment boundary of one atomic slice: a slice never pads beyond its
/// own size, matching host layout rules for packed composites.
#[inline]
fn slice_pack(size: usize, pack: usize) -> usize {
    if pack == 0 {
        0
    } else {
        size.min(pack)
    }
}

fn checked_offset(
    base: usize,
    at: usize,
    layout: &TypeLayout,
    field: &FieldDef,
) -> Result<usize> {
    base.checked_add(at).ok_or_else(|| SwapError::Layout {
        type_name: layout.name.clone(),
        field: field.name.clone(),
        reason: "explicit offset overflows".to_string(),
    })
}

fn check_bounds(
    root: &TypeLayout,
    layout: &TypeLayout,
    field: &FieldDef,
    offset: usize,
    len: usize,
) -> Result<()> {
    let end = offset.checked_add(len);
    if end.is_none() || end.is_some_and(|e| e > root.size) {
        return Err(SwapError::Layout {
            type_name: layout.name.clone(),
            field: field.name.clone(),
            reason: format!(
                "field at offset {} extends past the declared {}-byte size of {}",
                offset, root.size, root.name
            ),
        });
    }
    Ok(())
}

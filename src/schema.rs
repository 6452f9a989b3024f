//! Declarative schema tables for composite layouts
//!
//! Layouts can be described in JSON instead of through the builder API,
//! which keeps field tables next to the data files they describe and out
//! of compiled code. A schema document is a list of type entries; each
//! entry names its fields in declaration order with the same attributes
//! the builder exposes (kind, size, array count, explicit offset, skip).
//!
//! Types may reference earlier types in the same document, either
//! flattened into the containing plan or delegated to the referenced
//! type's own plan. References are resolved in declaration order, so
//! forward references are schema errors.
//!
//! A malformed type does not abort the rest of the table: every entry is
//! resolved and compiled independently, and per-type failures are
//! collected alongside the successfully compiled plans.
//!
//! # Example
//!
//! ```
//! let doc = r#"{
//!     "types": [
//!         {
//!             "name": "Vec3",
//!             "pack": 4,
//!             "size": 12,
//!             "fields": [
//!                 {"name": "x", "kind": {"type": "primitive", "size": 4}},
//!                 {"name": "y", "kind": {"type": "primitive", "size": 4}},
//!                 {"name": "z", "kind": {"type": "primitive", "size": 4}}
//!             ]
//!         },
//!         {
//!             "name": "Segment",
//!             "pack": 4,
//!             "size": 28,
//!             "fields": [
//!                 {"name": "endpoints", "kind": {"type": "struct", "name": "Vec3"}, "count": 2},
//!                 {"name": "flags", "kind": {"type": "enum", "width": 4}}
//!             ]
//!         }
//!     ]
//! }"#;
//!
//! let set = byteflip::schema::parse(doc)?;
//! assert!(set.is_clean());
//! assert_eq!(set.plan("Segment").unwrap().size(), 28);
//! # Ok::<(), byteflip::SwapError>(())
//! ```

use crate::error::{Result, SwapError};
use crate::layout::{FieldDef, TypeLayout};
use crate::plan::SwapPlan;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::sync::Arc;

/// Top-level schema document
#[derive(Debug, Deserialize)]
struct SchemaDoc {
    types: Vec<TypeEntry>,
}

/// One composite type in a schema document
#[derive(Debug, Deserialize)]
struct TypeEntry {
    name: String,
    #[serde(default)]
    pack: usize,
    size: usize,
    fields: Vec<FieldEntry>,
}

/// One field of a schema type
#[derive(Debug, Deserialize)]
struct FieldEntry {
    name: String,
    kind: KindEntry,
    #[serde(default = "one")]
    count: usize,
    #[serde(default)]
    offset: Option<usize>,
    #[serde(default)]
    skip: bool,
}

fn one() -> usize {
    1
}

/// Field kind in a schema document
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum KindEntry {
    /// Endian-symmetric scalar
    Primitive {
        /// Scalar size in bytes
        size: usize,
    },
    /// Enumeration stored as an integer
    Enum {
        /// Underlying integer width in bytes
        width: usize,
    },
    /// Reference to an earlier type in the document
    Struct {
        /// Name of the referenced type
        name: String,
        /// Flatten into the containing plan instead of delegating
        #[serde(default)]
        flatten: bool,
    },
}

/// The resolved result of a schema document
///
/// Holds the layout and compiled plan of every well-formed type plus the
/// per-type errors of the malformed ones.
#[derive(Debug, Default)]
pub struct SchemaSet {
    layouts: FxHashMap<String, Arc<TypeLayout>>,
    plans: FxHashMap<String, Arc<SwapPlan>>,
    errors: Vec<SwapError>,
}

impl SchemaSet {
    /// Look up a resolved layout by type name
    pub fn layout(&self, name: &str) -> Option<&Arc<TypeLayout>> {
        self.layouts.get(name)
    }

    /// Look up a compiled plan by type name
    pub fn plan(&self, name: &str) -> Option<&Arc<SwapPlan>> {
        self.plans.get(name)
    }

    /// Per-type failures collected while resolving the document
    pub fn errors(&self) -> &[SwapError] {
        &self.errors
    }

    /// True when every type in the document compiled
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse a JSON schema document and compile every type it declares
///
/// Returns an error only when the document itself cannot be parsed;
/// individual type failures are collected in the returned set.
pub fn parse(json: &str) -> Result<SchemaSet> {
    let doc: SchemaDoc = serde_json::from_str(json).map_err(|e| SwapError::Schema(e.to_string()))?;

    let mut set = SchemaSet::default();
    for entry in &doc.types {
        match resolve(entry, &set) {
            Ok((layout, plan)) => {
                set.layouts.insert(entry.name.clone(), layout);
                set.plans.insert(entry.name.clone(), plan);
            }
            Err(err) => set.errors.push(err),
        }
    }
    Ok(set)
}

fn resolve(entry: &TypeEntry, set: &SchemaSet) -> Result<(Arc<TypeLayout>, Arc<SwapPlan>)> {
    let mut builder = TypeLayout::builder(entry.name.clone()).pack(entry.pack);
    for field in &entry.fields {
        let mut def = match &field.kind {
            KindEntry::Primitive { size } => FieldDef::primitive(field.name.clone(), *size),
            KindEntry::Enum { width } => FieldDef::enumeration(field.name.clone(), *width),
            KindEntry::Struct { name, flatten } => {
                let layout = set.layout(name).ok_or_else(|| SwapError::Layout {
                    type_name: entry.name.clone(),
                    field: field.name.clone(),
                    reason: format!("references unknown type {}", name),
                })?;
                if *flatten {
                    FieldDef::inline(field.name.clone(), layout.clone())
                } else {
                    let plan = set.plan(name).ok_or_else(|| SwapError::Layout {
                        type_name: entry.name.clone(),
                        field: field.name.clone(),
                        reason: format!("type {} has no compiled plan", name),
                    })?;
                    FieldDef::nested(field.name.clone(), layout.size(), plan.clone())
                }
            }
        };
        def = def.array(field.count);
        if let Some(offset) = field.offset {
            def = def.at(offset);
        }
        if field.skip {
            def = def.skip();
        }
        builder = builder.field(def);
    }
    let layout = Arc::new(builder.build(entry.size));
    let plan = Arc::new(layout.compile()?);
    Ok((layout, plan))
}

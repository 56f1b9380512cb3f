//! Config metadata.
//!
//! Metadata is produced by the [`EnvConfig`](macro@crate::EnvConfig) derive macro as a `const`
//! table, so it can be inspected without creating a config instance.

use std::{any, fmt};

use self::_private::ErasedSlot;
use crate::{convert::Decoder, visit::VisitEnv};

#[doc(hidden)] // used in the derive macro
pub mod _private;

/// Metadata for a configuration (i.e., a group of related fields).
#[derive(Debug, Clone)]
pub struct ConfigMetadata {
    /// Type of the config.
    pub ty: RustType,
    /// Fields included in the config, in the declaration order. Fields marked with
    /// `#[env(skip)]` are not included.
    pub fields: &'static [FieldMetadata],
}

impl ConfigMetadata {
    /// Finds a field by its name in Rust code.
    pub fn field(&self, rust_name: &str) -> Option<&'static FieldMetadata> {
        self.fields
            .iter()
            .find(|field| field.rust_field_name == rust_name)
    }
}

/// Metadata for a single field of a config.
#[derive(Clone)]
pub struct FieldMetadata {
    /// Name of the field in Rust code.
    pub rust_field_name: &'static str,
    /// Declared type of the field.
    pub rust_type: RustType,
    /// Type of the values the field is built from. For `Option<T>`, `Box<T>`, `Vec<T>` and similar
    /// wrappers, this is `T`; for other fields, it's the same as `rust_type`.
    pub elem_type: RustType,
    /// Whether the field is visible outside the config module (i.e., has a visibility qualifier).
    /// Only exported fields are populated.
    pub exported: bool,
    /// Tags attached to the field.
    pub tags: Tags,
    /// Kind of the field.
    pub kind: FieldKind,
    #[doc(hidden)] // implementation detail
    pub slot: &'static dyn ErasedSlot,
    #[doc(hidden)] // implementation detail
    pub decoder: fn() -> Option<Decoder>,
}

impl fmt::Debug for FieldMetadata {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("FieldMetadata")
            .field("rust_field_name", &self.rust_field_name)
            .field("rust_type", &self.rust_type)
            .field("elem_type", &self.elem_type)
            .field("shape", &self.shape())
            .field("exported", &self.exported)
            .field("tags", &self.tags)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl FieldMetadata {
    /// Returns the shape of the field.
    pub fn shape(&self) -> FieldShape {
        self.slot.shape()
    }

    /// Checks whether the element type of this field can be decoded via [`DecodeText`](crate::DecodeText).
    pub fn is_text_decodable(&self) -> bool {
        (self.decoder)().is_some()
    }
}

/// Shape of a field, i.e. how converted values are assigned to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum FieldShape {
    /// Value is assigned directly.
    Scalar,
    /// Value is placed into a freshly allocated cell: `Option<T>`, `Box<T>` or `Option<Box<T>>`.
    Pointer,
    /// Raw value is split into tokens; each token is converted separately: `Vec<T>` or `Option<Vec<T>>`.
    Sequence,
    /// Sequence with each element placed into a cell: `Vec<Box<T>>` or `Vec<Option<T>>`.
    PointerSequence,
}

impl FieldShape {
    /// Checks whether raw values for this shape are split into tokens.
    pub const fn is_sequence(self) -> bool {
        matches!(self, Self::Sequence | Self::PointerSequence)
    }
}

/// Kind of a config field.
#[derive(Debug, Clone, Copy)]
#[non_exhaustive]
pub enum FieldKind {
    /// Field is a leaf populated from a single env var.
    Param,
    /// Field is a nested config (`#[env(nest)]`). Its fields are looked up with the prefix
    /// extended by the `prefix` tag of the field.
    Nested(NestedConfig),
    /// Field is a flattened config (`#[env(flatten)]`). Its fields are promoted into the enclosing config.
    Flattened(NestedConfig),
}

/// Reference to a nested config.
#[derive(Clone, Copy)]
pub struct NestedConfig {
    /// Metadata of the nested config.
    pub meta: &'static ConfigMetadata,
    #[doc(hidden)] // implementation detail
    pub ensure: fn(&mut dyn any::Any) -> &mut dyn VisitEnv,
}

impl fmt::Debug for NestedConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("NestedConfig")
            .field("ty", &self.meta.ty)
            .finish_non_exhaustive()
    }
}

/// Raw tags attached to a field: `(tag name, value)` pairs.
///
/// The primary tag specified as `#[env("KEY,options")]` is stored under the name `env`; sibling
/// attributes like `default = "..."` are stored under their names.
#[derive(Debug, Clone, Copy)]
pub struct Tags(pub &'static [(&'static str, &'static str)]);

impl Tags {
    /// Returns a value of the tag with the specified name.
    pub fn get(&self, name: &str) -> Option<&'static str> {
        self.0
            .iter()
            .find_map(|&(tag_name, value)| (tag_name == name).then_some(value))
    }
}

/// Representation of a Rust type.
#[derive(Clone, Copy)]
pub struct RustType {
    id: fn() -> any::TypeId,
    name_in_code: &'static str,
}

impl fmt::Debug for RustType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name_in_code)
    }
}

impl PartialEq for RustType {
    fn eq(&self, other: &Self) -> bool {
        (self.id)() == (other.id)()
    }
}

impl RustType {
    /// Creates a new type.
    pub const fn of<T: 'static>(name_in_code: &'static str) -> Self {
        Self {
            id: any::TypeId::of::<T>,
            name_in_code,
        }
    }

    /// Returns the unique ID of this type.
    pub fn id(&self) -> any::TypeId {
        (self.id)()
    }

    /// Returns the name of this type as specified in code.
    pub const fn name_in_code(&self) -> &'static str {
        self.name_in_code
    }
}

//! Field slots, text decoding probes and compile-time tag validation used by the derive macro.

use std::{any, fmt, marker::PhantomData};

use compile_fmt::{clip, compile_panic};

use super::FieldShape;
use crate::{
    EnvConfig,
    convert::{DecodeText, Decoder},
    tag::TagOptions,
    visit::VisitEnv,
};

/// Describes how converted values are assigned to a field.
pub trait SlotShape: 'static {
    type Field: 'static;
    type Elem: 'static;
    const SHAPE: FieldShape;

    fn fill(field: &mut Self::Field, values: Vec<Self::Elem>);
}

macro_rules! define_shapes {
    ($($name:ident: $field:ty => $shape:ident, |$field_var:ident, $values:ident| $fill:expr;)+) => {
        $(
        #[derive(Debug)]
        pub struct $name<T>(PhantomData<fn() -> T>);

        impl<T: 'static> SlotShape for $name<T> {
            type Field = $field;
            type Elem = T;
            const SHAPE: FieldShape = FieldShape::$shape;

            fn fill($field_var: &mut Self::Field, $values: Vec<T>) {
                $fill
            }
        }
        )+
    };
}

define_shapes! {
    Scalar: T => Scalar, |field, values| {
        if let Some(value) = values.into_iter().next() {
            *field = value;
        }
    };
    Optional: Option<T> => Pointer, |field, values| {
        if let Some(value) = values.into_iter().next() {
            *field = Some(value);
        }
    };
    Boxed: Box<T> => Pointer, |field, values| {
        if let Some(value) = values.into_iter().next() {
            *field = Box::new(value);
        }
    };
    OptionalBoxed: Option<Box<T>> => Pointer, |field, values| {
        if let Some(value) = values.into_iter().next() {
            *field = Some(Box::new(value));
        }
    };
    Repeated: Vec<T> => Sequence, |field, values| *field = values;
    OptionalRepeated: Option<Vec<T>> => Sequence, |field, values| *field = Some(values);
    RepeatedBoxed: Vec<Box<T>> => PointerSequence, |field, values| {
        *field = values.into_iter().map(Box::new).collect();
    };
    RepeatedOptional: Vec<Option<T>> => PointerSequence, |field, values| {
        *field = values.into_iter().map(Some).collect();
    };
}

/// Object-safe counterpart of [`SlotShape`].
pub trait ErasedSlot: fmt::Debug + Send + Sync {
    fn shape(&self) -> FieldShape;

    /// Assigns values of the element type to the field.
    fn fill(&self, field: &mut dyn any::Any, values: Vec<Box<dyn any::Any>>);

    /// Replaces the field with a value of the field type.
    fn replace(&self, field: &mut dyn any::Any, value: Box<dyn any::Any>);
}

pub struct Erased<S>(PhantomData<fn() -> S>);

impl<S> fmt::Debug for Erased<S> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_tuple("Erased")
            .field(&any::type_name::<S>())
            .finish()
    }
}

#[allow(clippy::new_without_default)]
impl<S: SlotShape> Erased<S> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }

    fn field(field: &mut dyn any::Any) -> &mut S::Field {
        field
            .downcast_mut()
            .expect("Internal error: field has unexpected type")
    }
}

impl<S: SlotShape> ErasedSlot for Erased<S> {
    fn shape(&self) -> FieldShape {
        S::SHAPE
    }

    fn fill(&self, field: &mut dyn any::Any, values: Vec<Box<dyn any::Any>>) {
        let values = values.into_iter().map(|value| {
            *value
                .downcast::<S::Elem>()
                .expect("Internal error: converted value has unexpected type")
        });
        S::fill(Self::field(field), values.collect());
    }

    fn replace(&self, field: &mut dyn any::Any, value: Box<dyn any::Any>) {
        *Self::field(field) = *value
            .downcast::<S::Field>()
            .expect("Internal error: converted value has unexpected type");
    }
}

/// Probe detecting whether `T` implements [`DecodeText`]. Must be called via autoref,
/// as in `(&DecodeProbe::<T>::new()).decoder()`, with both probe traits in scope.
pub struct DecodeProbe<T>(PhantomData<fn() -> T>);

impl<T> fmt::Debug for DecodeProbe<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_tuple("DecodeProbe")
            .field(&any::type_name::<T>())
            .finish()
    }
}

#[allow(clippy::new_without_default)]
impl<T> DecodeProbe<T> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

pub trait ViaDecodeText {
    fn decoder(&self) -> Option<Decoder>;
}

impl<T: DecodeText + 'static> ViaDecodeText for DecodeProbe<T> {
    fn decoder(&self) -> Option<Decoder> {
        let decoder: Decoder =
            |raw| T::decode_text(raw).map(|value| Box::new(value) as Box<dyn any::Any>);
        Some(decoder)
    }
}

pub trait NoDecodeText {
    fn decoder(&self) -> Option<Decoder>;
}

impl<T> NoDecodeText for &DecodeProbe<T> {
    fn decoder(&self) -> Option<Decoder> {
        None
    }
}

fn downcast_config<T: 'static>(field: &mut dyn any::Any) -> &mut T {
    field
        .downcast_mut()
        .expect("Internal error: nested config has unexpected type")
}

pub fn ensure_config<C: EnvConfig>(field: &mut dyn any::Any) -> &mut dyn VisitEnv {
    downcast_config::<C>(field)
}

pub fn ensure_optional_config<C: EnvConfig + Default>(
    field: &mut dyn any::Any,
) -> &mut dyn VisitEnv {
    downcast_config::<Option<C>>(field).get_or_insert_with(C::default)
}

pub fn ensure_boxed_config<C: EnvConfig>(field: &mut dyn any::Any) -> &mut dyn VisitEnv {
    &mut **downcast_config::<Box<C>>(field)
}

pub fn ensure_optional_boxed_config<C: EnvConfig + Default>(
    field: &mut dyn any::Any,
) -> &mut dyn VisitEnv {
    &mut **downcast_config::<Option<Box<C>>>(field).get_or_insert_with(Box::default)
}

const fn is_supported_option(tag: &[u8], start: usize, end: usize) -> bool {
    if start == end {
        return true; // empty options are ignored
    }

    let mut i = 0;
    while i < TagOptions::NAMES.len() {
        let option = TagOptions::NAMES[i].as_bytes();
        if option.len() == end - start {
            let mut pos = 0;
            while pos < option.len() && option[pos] == tag[start + pos] {
                pos += 1;
            }
            if pos == option.len() {
                return true;
            }
        }
        i += 1;
    }
    false
}

/// Checks that options in the primary `env` tag are supported.
#[track_caller]
pub const fn assert_tag_options(tag: &str) {
    let bytes = tag.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() && bytes[pos] != b',' {
        pos += 1;
    }

    while pos < bytes.len() {
        let start = pos + 1;
        let mut end = start;
        while end < bytes.len() && bytes[end] != b',' {
            end += 1;
        }
        if !is_supported_option(bytes, start, end) {
            compile_panic!(
                "Tag `", tag => clip(64, "…"),
                "` contains an unsupported option; supported options are `required`, `notEmpty`, `unset` and `file`"
            );
        }
        pos = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checking_tag_options() {
        assert_tag_options("");
        assert_tag_options("KEY");
        assert_tag_options("KEY,");
        assert_tag_options(",required");
        assert_tag_options("KEY,required,notEmpty,unset,file");
        assert_tag_options("KEY,,file,");
    }

    #[test]
    #[should_panic(expected = "unsupported option")]
    fn unsupported_tag_option() {
        assert_tag_options("KEY,required,nope");
    }

    #[test]
    #[should_panic(expected = "unsupported option")]
    fn option_names_are_case_sensitive() {
        assert_tag_options("KEY,Required");
    }

    #[test]
    fn filling_slots() {
        let slot = Erased::<Repeated<u32>>::new();
        assert_eq!(slot.shape(), FieldShape::Sequence);
        let mut field = vec![1_u32];
        slot.fill(&mut field, vec![Box::new(2_u32) as Box<dyn any::Any>, Box::new(3_u32)]);
        assert_eq!(field, [2, 3]);

        let slot = Erased::<OptionalBoxed<String>>::new();
        assert_eq!(slot.shape(), FieldShape::Pointer);
        let mut field: Option<Box<String>> = None;
        slot.fill(&mut field, vec![]);
        assert_eq!(field, None);
        slot.fill(&mut field, vec![Box::new("test".to_owned()) as Box<dyn any::Any>]);
        assert_eq!(field.as_deref().map(String::as_str), Some("test"));

        let slot = Erased::<RepeatedOptional<bool>>::new();
        assert_eq!(slot.shape(), FieldShape::PointerSequence);
        let mut field: Vec<Option<bool>> = vec![];
        slot.fill(&mut field, vec![Box::new(true) as Box<dyn any::Any>, Box::new(false)]);
        assert_eq!(field, [Some(true), Some(false)]);

        let slot = Erased::<OptionalRepeated<u8>>::new();
        let mut field: Option<Vec<u8>> = None;
        slot.replace(&mut field, Box::new(Some(vec![1_u8, 2])));
        assert_eq!(field, Some(vec![1, 2]));
    }
}

//! Helpers for field types.

use proc_macro2::{Ident, Span};
use quote::quote;
use syn::{GenericArgument, PathArguments, Type, TypePath};

/// Shape of a field type, mirroring slot shapes in the main crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldShape {
    Scalar,
    Optional,
    Boxed,
    OptionalBoxed,
    Repeated,
    OptionalRepeated,
    RepeatedBoxed,
    RepeatedOptional,
}

impl FieldShape {
    /// Detects the shape of the type and returns it together with the element type.
    pub(crate) fn detect(ty: &Type) -> (Self, &Type) {
        if let Some(inner) = unwrap_generic(ty, "Option") {
            if let Some(elem) = unwrap_generic(inner, "Box") {
                (Self::OptionalBoxed, elem)
            } else if let Some(elem) = unwrap_generic(inner, "Vec")
                && !is_u8(elem)
            {
                (Self::OptionalRepeated, elem)
            } else {
                (Self::Optional, inner)
            }
        } else if let Some(elem) = unwrap_generic(ty, "Box") {
            (Self::Boxed, elem)
        } else if let Some(inner) = unwrap_generic(ty, "Vec") {
            if is_u8(inner) {
                (Self::Scalar, ty)
            } else if let Some(elem) = unwrap_generic(inner, "Box") {
                (Self::RepeatedBoxed, elem)
            } else if let Some(elem) = unwrap_generic(inner, "Option") {
                (Self::RepeatedOptional, elem)
            } else {
                (Self::Repeated, inner)
            }
        } else {
            (Self::Scalar, ty)
        }
    }

    fn slot_name(self) -> &'static str {
        match self {
            Self::Scalar => "Scalar",
            Self::Optional => "Optional",
            Self::Boxed => "Boxed",
            Self::OptionalBoxed => "OptionalBoxed",
            Self::Repeated => "Repeated",
            Self::OptionalRepeated => "OptionalRepeated",
            Self::RepeatedBoxed => "RepeatedBoxed",
            Self::RepeatedOptional => "RepeatedOptional",
        }
    }

    pub(crate) fn slot_ident(self, span: Span) -> Ident {
        Ident::new(self.slot_name(), span)
    }

    /// Returns the name of the function ensuring that a nested config with this shape is initialized.
    pub(crate) fn ensure_fn(self, span: Span) -> syn::Result<Ident> {
        let name = match self {
            Self::Scalar => "ensure_config",
            Self::Optional => "ensure_optional_config",
            Self::Boxed => "ensure_boxed_config",
            Self::OptionalBoxed => "ensure_optional_boxed_config",
            _ => {
                let message = "nested configs can only be wrapped in `Option` and / or `Box`";
                return Err(syn::Error::new(span, message));
            }
        };
        Ok(Ident::new(name, span))
    }
}

/// Unwraps `Wrapper<T>` into `T`. Only unqualified wrapper paths are recognized.
fn unwrap_generic<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(TypePath { qself: None, path }) = ty else {
        return None;
    };
    if path.segments.len() != 1 {
        return None;
    }
    let segment = &path.segments[0];
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(angle_bracketed) = &segment.arguments else {
        return None;
    };
    if angle_bracketed.args.len() != 1 {
        return None;
    }
    match &angle_bracketed.args[0] {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    }
}

fn is_u8(ty: &Type) -> bool {
    matches!(ty, Type::Path(TypePath { qself: None, path }) if path.is_ident("u8"))
}

/// Renders the type as it would be written in code. `Span::source_text()` cannot be used here
/// since on stable Rust it only covers the first token of a compound type.
pub(crate) fn type_in_code(ty: &Type) -> String {
    let raw = quote!(#ty).to_string();
    let mut text = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == ' ' {
            let prev = text.chars().next_back();
            let next = chars.peek().copied();
            let glued_to_prev = matches!(prev, Some('<' | ':' | '&' | '(' | '['));
            let glued_to_next = matches!(next, Some('<' | '>' | ',' | ':' | ')' | ']' | ';'));
            if glued_to_prev || glued_to_next {
                continue;
            }
        }
        text.push(ch);
    }
    text
}

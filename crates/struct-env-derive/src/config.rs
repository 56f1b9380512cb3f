//! Parsing `#[env(_)]` attributes on configs and their fields.

use proc_macro2::{Ident, Span};
use quote::{quote, quote_spanned};
use syn::{
    Attribute, Data, DeriveInput, Field, Fields, LitStr, Path, Token, Type, Visibility,
    ext::IdentExt,
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
};

/// Name under which the primary tag (a string literal in `#[env("KEY,options")]`) is stored.
const PRIMARY_TAG: &str = "env";
/// Sibling attributes that are stored as tags, but cannot be used as alternate tag names.
const SIBLING_TAGS: &[&str] = &["default", "separator", "expand", "prefix"];

/// Single item in a field `#[env(_)]` attribute.
enum FieldAttrItem {
    /// Primary tag, e.g. `"KEY,required"`.
    Primary(LitStr),
    /// Flag, e.g. `nest`.
    Flag(Ident),
    /// Named value, e.g. `default = "3000"` or `json = "KEY"`.
    Named(Ident, LitStr),
}

impl Parse for FieldAttrItem {
    fn parse(input: ParseStream<'_>) -> syn::Result<Self> {
        if input.peek(LitStr) {
            return Ok(Self::Primary(input.parse()?));
        }
        let name = Ident::parse_any(input)?;
        if input.peek(Token![=]) {
            input.parse::<Token![=]>()?;
            Ok(Self::Named(name, input.parse()?))
        } else {
            Ok(Self::Flag(name))
        }
    }
}

#[derive(Default)]
pub(crate) struct EnvFieldAttrs {
    /// Primary tag.
    pub(crate) primary: Option<LitStr>,
    /// Tags in the declaration order, including the primary one.
    pub(crate) tags: Vec<(String, LitStr)>,
    pub(crate) nest: bool,
    pub(crate) flatten: bool,
    pub(crate) skip: bool,
}

impl EnvFieldAttrs {
    fn new(attrs: &[Attribute]) -> syn::Result<Self> {
        let env_attrs = attrs.iter().filter(|attr| attr.path().is_ident("env"));

        let mut this = Self::default();
        let mut prefix_span = None;
        for attr in env_attrs {
            let items =
                attr.parse_args_with(Punctuated::<FieldAttrItem, Token![,]>::parse_terminated)?;
            for item in items {
                match item {
                    FieldAttrItem::Primary(lit) => {
                        if this.primary.is_some() {
                            let message = "primary tag is specified multiple times";
                            return Err(syn::Error::new(lit.span(), message));
                        }
                        this.insert_tag(PRIMARY_TAG, lit.clone())?;
                        this.primary = Some(lit);
                    }
                    FieldAttrItem::Flag(flag) => {
                        if flag == "nest" {
                            this.nest = true;
                        } else if flag == "flatten" {
                            this.flatten = true;
                        } else if flag == "skip" {
                            this.skip = true;
                        } else if flag == "expand" {
                            this.insert_tag("expand", LitStr::new("true", flag.span()))?;
                        } else {
                            let message = "Unsupported attribute; only `nest`, `flatten`, `skip` and `expand` flags are supported";
                            return Err(syn::Error::new(flag.span(), message));
                        }
                    }
                    FieldAttrItem::Named(name, value) => {
                        let name_str = name.unraw().to_string();
                        if name_str == PRIMARY_TAG {
                            let message = "primary tag must be specified as a string literal, e.g. `#[env(\"KEY\")]`";
                            return Err(syn::Error::new(name.span(), message));
                        }
                        if name_str == "prefix" {
                            prefix_span = Some(name.span());
                        }
                        this.insert_tag(&name_str, value)?;
                    }
                }
            }
        }

        if this.nest && this.flatten {
            let message = "`nest` and `flatten` cannot be specified simultaneously";
            return Err(syn::Error::new(Span::call_site(), message));
        }
        if let Some(prefix_span) = prefix_span {
            if this.flatten {
                let message = "`prefix` cannot be used with flattened configs";
                return Err(syn::Error::new(prefix_span, message));
            }
            this.nest = true;
        }
        Ok(this)
    }

    fn insert_tag(&mut self, name: &str, value: LitStr) -> syn::Result<()> {
        if self.tags.iter().any(|(existing, _)| existing == name) {
            let message = if SIBLING_TAGS.contains(&name) {
                format!("`{name}` is specified multiple times")
            } else {
                format!("tag `{name}` is specified multiple times")
            };
            return Err(syn::Error::new(value.span(), message));
        }
        self.tags.push((name.to_owned(), value));
        Ok(())
    }
}

pub(crate) struct ConfigField {
    pub(crate) attrs: EnvFieldAttrs,
    pub(crate) name: Ident,
    pub(crate) ty: Type,
    pub(crate) exported: bool,
}

impl ConfigField {
    fn new(raw: &Field) -> syn::Result<Self> {
        let name = raw.ident.clone().ok_or_else(|| {
            let message = "Only named fields are supported";
            syn::Error::new_spanned(raw, message)
        })?;
        let attrs = EnvFieldAttrs::new(&raw.attrs)?;
        Ok(Self {
            attrs,
            name,
            ty: raw.ty.clone(),
            exported: !matches!(raw.vis, Visibility::Inherited),
        })
    }

    pub(crate) fn is_config(&self) -> bool {
        self.attrs.nest || self.attrs.flatten
    }
}

/// Recognized container attributes.
#[derive(Default)]
pub(crate) struct EnvContainerAttrs {
    cr: Option<Path>,
}

impl EnvContainerAttrs {
    fn new(attrs: &[Attribute]) -> syn::Result<Self> {
        let env_attrs = attrs.iter().filter(|attr| attr.path().is_ident("env"));

        let mut this = Self::default();
        for attr in env_attrs {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("crate") {
                    this.cr = Some(meta.value()?.parse()?);
                    Ok(())
                } else {
                    Err(meta.error("Unsupported attribute; only `crate` is supported"))
                }
            })?;
        }
        Ok(this)
    }
}

pub(crate) struct ConfigContainer {
    pub(crate) attrs: EnvContainerAttrs,
    pub(crate) name: Ident,
    pub(crate) fields: Vec<ConfigField>,
}

impl ConfigContainer {
    pub(crate) fn new(raw: &DeriveInput) -> syn::Result<Self> {
        let Data::Struct(data) = &raw.data else {
            let message = "#[derive(EnvConfig)] can only be placed on structs";
            return Err(syn::Error::new_spanned(raw, message));
        };
        let Fields::Named(fields) = &data.fields else {
            let message = "#[derive(EnvConfig)] can only be placed on structs with named fields";
            return Err(syn::Error::new_spanned(&data.fields, message));
        };
        if raw.generics.type_params().count() != 0
            || raw.generics.const_params().count() != 0
            || raw.generics.lifetimes().count() != 0
        {
            let message = "generics are not supported";
            return Err(syn::Error::new_spanned(&raw.generics, message));
        }

        let fields = fields
            .named
            .iter()
            .map(ConfigField::new)
            .collect::<syn::Result<Vec<_>>>()?;
        let fields = fields.into_iter().filter(|field| !field.attrs.skip);
        Ok(Self {
            attrs: EnvContainerAttrs::new(&raw.attrs)?,
            name: raw.ident.clone(),
            fields: fields.collect(),
        })
    }

    pub(crate) fn cr(&self, span: Span) -> proc_macro2::TokenStream {
        if let Some(cr) = &self.attrs.cr {
            quote!(#cr)
        } else {
            quote_spanned!(span=> ::struct_env)
        }
    }
}

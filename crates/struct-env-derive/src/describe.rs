//! `EnvConfig` derive macro implementation.

use proc_macro::TokenStream;
use quote::{quote, quote_spanned};
use syn::DeriveInput;

use crate::{
    config::{ConfigContainer, ConfigField},
    utils::{FieldShape, type_in_code},
};

impl ConfigField {
    fn describe_kind(
        &self,
        cr: &proc_macro2::TokenStream,
        shape: FieldShape,
        elem: &syn::Type,
    ) -> syn::Result<proc_macro2::TokenStream> {
        let name_span = self.name.span();
        if !self.is_config() {
            return Ok(quote_spanned!(name_span=> #cr::metadata::FieldKind::Param));
        }

        let ensure_fn = shape.ensure_fn(name_span)?;
        let nested = quote_spanned! {name_span=>
            #cr::metadata::NestedConfig {
                meta: &<#elem as #cr::EnvConfig>::DESCRIPTION,
                ensure: #cr::metadata::_private::#ensure_fn::<#elem>,
            }
        };
        Ok(if self.attrs.flatten {
            quote_spanned!(name_span=> #cr::metadata::FieldKind::Flattened(#nested))
        } else {
            quote_spanned!(name_span=> #cr::metadata::FieldKind::Nested(#nested))
        })
    }

    fn describe_field(&self, parent: &ConfigContainer) -> syn::Result<proc_macro2::TokenStream> {
        let name = &self.name;
        let name_span = name.span();
        let cr = parent.cr(name_span);

        let ty = &self.ty;
        let ty_in_code = type_in_code(ty);
        let (shape, elem) = FieldShape::detect(ty);
        let elem_in_code = type_in_code(elem);
        let slot = shape.slot_ident(name_span);
        let kind = self.describe_kind(&cr, shape, elem)?;
        let exported = self.exported;

        let tag_names = self.attrs.tags.iter().map(|(name, _)| name);
        let tag_values = self.attrs.tags.iter().map(|(_, value)| value);

        Ok(quote_spanned! {name_span=>
            #cr::metadata::FieldMetadata {
                rust_field_name: ::core::stringify!(#name),
                rust_type: #cr::metadata::RustType::of::<#ty>(#ty_in_code),
                elem_type: #cr::metadata::RustType::of::<#elem>(#elem_in_code),
                exported: #exported,
                tags: #cr::metadata::Tags(&[#((#tag_names, #tag_values),)*]),
                kind: #kind,
                slot: &#cr::metadata::_private::Erased::<#cr::metadata::_private::#slot<#elem>>::new(),
                decoder: || {
                    use #cr::metadata::_private::{NoDecodeText as _, ViaDecodeText as _};
                    let probe = &#cr::metadata::_private::DecodeProbe::<#elem>::new();
                    probe.decoder()
                },
            }
        })
    }

    fn validate_tag(&self, parent: &ConfigContainer) -> Option<proc_macro2::TokenStream> {
        let primary = self.attrs.primary.as_ref()?;
        let cr = parent.cr(primary.span());
        Some(quote_spanned! {primary.span()=>
            const _: () = #cr::metadata::_private::assert_tag_options(#primary);
        })
    }
}

impl ConfigContainer {
    fn derive_visit_env(&self) -> proc_macro2::TokenStream {
        let name = &self.name;
        let cr = self.cr(name.span());

        let fields = self.fields.iter().enumerate().map(|(i, field)| {
            let field = &field.name;
            quote_spanned!(field.span()=> visitor.visit_field(#i, &mut self.#field))
        });

        quote! {
            impl #cr::visit::VisitEnv for #name {
                fn visit_env(&mut self, visitor: &mut dyn #cr::visit::EnvVisitor) {
                    #(#fields;)*
                }
            }

            impl #cr::visit::EnvTarget for #name {
                fn root_config(
                    &mut self,
                ) -> ::core::option::Option<#cr::visit::RootConfig<'_>> {
                    ::core::option::Option::Some(#cr::visit::RootConfig::new(self))
                }
            }
        }
    }

    fn derive_env_config(&self) -> syn::Result<proc_macro2::TokenStream> {
        let name = &self.name;
        let cr = self.cr(name.span());
        let name_str = name.to_string();

        let fields = self
            .fields
            .iter()
            .map(|field| field.describe_field(self))
            .collect::<syn::Result<Vec<_>>>()?;
        let validations = self.fields.iter().filter_map(|field| field.validate_tag(self));

        Ok(quote! {
            impl #cr::EnvConfig for #name {
                const DESCRIPTION: #cr::metadata::ConfigMetadata = #cr::metadata::ConfigMetadata {
                    ty: #cr::metadata::RustType::of::<#name>(#name_str),
                    fields: &[#(#fields,)*],
                };
            }

            #(#validations)*
        })
    }

    fn derive_all(&self) -> syn::Result<proc_macro2::TokenStream> {
        let visit_impl = self.derive_visit_env();
        let describe_impl = self.derive_env_config()?;
        Ok(quote!(#visit_impl #describe_impl))
    }
}

pub(crate) fn impl_env_config(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse(input) {
        Ok(input) => input,
        Err(err) => return err.into_compile_error().into(),
    };
    let trait_impl = match ConfigContainer::new(&input) {
        Ok(trait_impl) => trait_impl,
        Err(err) => return err.into_compile_error().into(),
    };
    match trait_impl.derive_all() {
        Ok(derived) => derived.into(),
        Err(err) => err.into_compile_error().into(),
    }
}

//! Structure walker and field resolution.

use std::{any, path::Path};

use crate::{
    convert::{Conversion, Converters},
    error::{ParseError, ParseErrorKind, ParseErrors},
    metadata::{ConfigMetadata, FieldKind, FieldMetadata},
    source::{Options, expand},
    tag::{TagMetadata, TagOptions},
    visit::{EnvVisitor, RootConfig, VisitEnv},
};


/// Resolution context shared by all fields visited during a single parsing call.
pub(crate) struct Resolver<'a> {
    options: Options<'a>,
    converters: &'a Converters,
    errors: Vec<ParseError>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(converters: &'a Converters, options: Options<'a>) -> Self {
        Self {
            options,
            converters,
            errors: vec![],
        }
    }

    #[tracing::instrument(level = "debug", name = "parse_env", skip_all, fields(config = ?root.metadata.ty))]
    pub(crate) fn resolve(mut self, root: RootConfig<'_>) -> Result<(), ParseErrors> {
        let prefix = self.options.prefix.clone();
        self.visit_config(root.metadata, root.config, &prefix);
        tracing::debug!(
            error_count = self.errors.len(),
            "finished parsing config"
        );
        match ParseErrors::new(self.errors) {
            Some(errors) => Err(errors),
            None => Ok(()),
        }
    }

    fn visit_config(
        &mut self,
        metadata: &'static ConfigMetadata,
        config: &mut dyn VisitEnv,
        prefix: &str,
    ) {
        config.visit_env(&mut FieldVisitor {
            resolver: self,
            metadata,
            prefix,
        });
    }

    /// Checks whether a nested or flattened config is resolved from a single var.
    fn is_leaf_config(&self, field: &FieldMetadata) -> bool {
        self.converters.contains_id(field.rust_type.id())
            || self.converters.contains_id(field.elem_type.id())
            || field.is_text_decodable()
    }

    fn visit_field(
        &mut self,
        config: &'static ConfigMetadata,
        field: &'static FieldMetadata,
        value: &mut dyn any::Any,
        prefix: &str,
    ) {
        if !field.exported {
            tracing::trace!(field = field.rust_field_name, "skipped non-exported field");
            return;
        }

        match field.kind {
            FieldKind::Nested(nested) if !self.is_leaf_config(field) => {
                let nested_prefix =
                    format!("{prefix}{}", TagMetadata::nested_prefix(field.tags));
                tracing::trace!(
                    field = field.rust_field_name,
                    prefix = %nested_prefix,
                    "descending into nested config"
                );
                self.visit_config(nested.meta, (nested.ensure)(value), &nested_prefix);
            }
            FieldKind::Flattened(flattened)
                if field.tags.get(self.options.tag_name).is_none() && !self.is_leaf_config(field) =>
            {
                tracing::trace!(
                    field = field.rust_field_name,
                    "descending into flattened config"
                );
                self.visit_config(flattened.meta, (flattened.ensure)(value), prefix);
            }
            _ => {
                if let Err(kind) = self.resolve_leaf(field, value, prefix) {
                    self.errors.push(ParseError::for_field(kind, config, field));
                }
            }
        }
    }

    fn resolve_leaf(
        &mut self,
        field: &'static FieldMetadata,
        value: &mut dyn any::Any,
        prefix: &str,
    ) -> Result<(), ParseErrorKind> {
        let Some(tag) = TagMetadata::parse(field.tags, self.options.tag_name)? else {
            tracing::trace!(field = field.rust_field_name, "skipped field without tags");
            return Ok(());
        };

        let key = format!("{prefix}{}", tag.key);
        let env_value = if tag.key.is_empty() {
            None
        } else {
            self.options.source.get(&key)
        };
        if env_value.is_some() && tag.options.contains(TagOptions::UNSET) {
            self.options.source.unset(&key);
        }

        let is_default = env_value.is_none() && tag.default.is_some();
        let Some(raw) = env_value.or_else(|| tag.default.map(str::to_owned)) else {
            if tag.key.is_empty() {
                return Ok(());
            }
            if tag.options.contains(TagOptions::REQUIRED) || self.options.required_if_no_default {
                return Err(ParseErrorKind::Required { key });
            }
            tracing::trace!(field = field.rust_field_name, %key, "env var is not set");
            self.call_hook(&key, "", false);
            return Ok(());
        };

        let raw = if tag.options.contains(TagOptions::EXPAND) {
            expand(&raw, &*self.options.source)
        } else {
            raw
        };
        if tag.options.contains(TagOptions::NOT_EMPTY) && raw.is_empty() {
            return Err(ParseErrorKind::EmptyValue { key });
        }
        let raw = if tag.options.contains(TagOptions::FILE) && !raw.is_empty() {
            match self.options.file_loader.load(Path::new(&raw)) {
                Ok(contents) => contents,
                Err(source) => {
                    return Err(ParseErrorKind::FileRead {
                        path: raw,
                        key,
                        source,
                    });
                }
            }
        } else {
            raw
        };

        if !raw.is_empty() {
            self.convert(field, value, &raw, tag.separator)?;
        }
        tracing::trace!(
            field = field.rust_field_name,
            %key,
            is_default,
            "resolved field"
        );
        self.call_hook(&key, &raw, is_default);
        Ok(())
    }

    fn convert(
        &self,
        field: &'static FieldMetadata,
        value: &mut dyn any::Any,
        raw: &str,
        separator: &str,
    ) -> Result<(), ParseErrorKind> {
        let parse_err = |cause: anyhow::Error| ParseErrorKind::Parse {
            field: field.rust_field_name,
            ty: field.rust_type.name_in_code(),
            cause,
        };
        let conversion = self
            .converters
            .select(field)
            .ok_or(ParseErrorKind::NoParser {
                field: field.rust_field_name,
                ty: field.rust_type.name_in_code(),
            })?;

        match conversion {
            Conversion::Whole(convert) => {
                let converted = convert(raw).map_err(parse_err)?;
                field.slot.replace(value, converted);
            }
            Conversion::Elem(converter) => {
                let values = if field.shape().is_sequence() {
                    converter.convert_sequence(raw, separator)
                } else {
                    converter.convert(raw).map(|converted| vec![converted])
                };
                field.slot.fill(value, values.map_err(parse_err)?);
            }
        }
        Ok(())
    }

    fn call_hook(&mut self, key: &str, raw: &str, is_default: bool) {
        if let Some(hook) = &mut self.options.on_set {
            hook(key, raw, is_default);
        }
    }
}

struct FieldVisitor<'r, 'a> {
    resolver: &'r mut Resolver<'a>,
    metadata: &'static ConfigMetadata,
    prefix: &'r str,
}

impl EnvVisitor for FieldVisitor<'_, '_> {
    fn visit_field(&mut self, index: usize, field: &mut dyn any::Any) {
        let metadata = self.metadata;
        let field_meta = &metadata.fields[index];
        self.resolver
            .visit_field(metadata, field_meta, field, self.prefix);
    }
}

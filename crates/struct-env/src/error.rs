//! Parsing errors.

use std::{fmt, io};

use crate::metadata::{ConfigMetadata, FieldMetadata};

/// Kind of a [`ParseError`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ParseErrorKind {
    /// Parsing target is not an initialized config.
    #[error("expected a reference to an initialized config struct")]
    Structural,
    /// Unsupported option in the field tag.
    #[error("tag option {option:?} not supported")]
    TagSyntax {
        /// Option as specified in the tag.
        option: String,
    },
    /// Required env var is not set, and there's no default value.
    #[error("required environment variable {key:?} is not set")]
    Required {
        /// Name of the env var including the prefix.
        key: String,
    },
    /// Env var marked with `notEmpty` is empty.
    #[error("environment variable {key:?} should not be empty")]
    EmptyValue {
        /// Name of the env var including the prefix.
        key: String,
    },
    /// Failed reading a file for a field with the `file` option.
    #[error("could not load content of file {path:?} from variable {key}: {source}")]
    FileRead {
        /// Path to the file.
        path: String,
        /// Name of the env var including the prefix.
        key: String,
        /// I/O error.
        source: io::Error,
    },
    /// Failed converting the raw value to the field type.
    #[error("parse error on field {field:?} of type {ty:?}: {cause:#}")]
    Parse {
        /// Name of the field in Rust code.
        field: &'static str,
        /// Declared type of the field.
        ty: &'static str,
        /// Conversion error.
        cause: anyhow::Error,
    },
    /// No converter is available for the field type.
    #[error("no parser found for field {field:?} of type {ty:?}")]
    NoParser {
        /// Name of the field in Rust code.
        field: &'static str,
        /// Declared type of the field.
        ty: &'static str,
    },
}

/// Error parsing a single config field.
pub struct ParseError {
    kind: ParseErrorKind,
    config: Option<&'static ConfigMetadata>,
    field: Option<&'static FieldMetadata>,
}

impl fmt::Debug for ParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ParseError")
            .field("kind", &self.kind)
            .field("config.ty", &self.config.map(|meta| meta.ty))
            .field("field", &self.field.map(|field| field.rust_field_name))
            .finish()
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, formatter)
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.kind)
    }
}

impl From<ParseErrorKind> for ParseError {
    fn from(kind: ParseErrorKind) -> Self {
        Self {
            kind,
            config: None,
            field: None,
        }
    }
}

impl ParseError {
    pub(crate) fn for_field(
        kind: ParseErrorKind,
        config: &'static ConfigMetadata,
        field: &'static FieldMetadata,
    ) -> Self {
        Self {
            kind,
            config: Some(config),
            field: Some(field),
        }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }

    /// Converts this error into its kind.
    pub fn into_kind(self) -> ParseErrorKind {
        self.kind
    }

    /// Returns metadata for the config containing the failed field, if any.
    pub fn config(&self) -> Option<&'static ConfigMetadata> {
        self.config
    }

    /// Returns metadata for the failed field, if any. The field is guaranteed to be contained
    /// in [`Self::config()`].
    pub fn field(&self) -> Option<&'static FieldMetadata> {
        self.field
    }
}

/// Collection of errors produced by parsing a config. Contains at least one error.
#[derive(Debug)]
pub struct ParseErrors {
    errors: Vec<ParseError>,
}

impl ParseErrors {
    pub(crate) fn new(errors: Vec<ParseError>) -> Option<Self> {
        (!errors.is_empty()).then_some(Self { errors })
    }

    /// Iterates over the contained errors in the order fields were visited.
    pub fn iter(&self) -> impl Iterator<Item = &ParseError> + '_ {
        self.errors.iter()
    }

    /// Returns the number of errors.
    #[allow(clippy::len_without_is_empty)] // is_empty should always return false
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns the first error.
    pub fn first(&self) -> &ParseError {
        self.errors.first().expect("Internal error: `ParseErrors` is empty")
    }
}

impl From<ParseError> for ParseErrors {
    fn from(err: ParseError) -> Self {
        Self { errors: vec![err] }
    }
}

impl IntoIterator for ParseErrors {
    type Item = ParseError;
    type IntoIter = std::vec::IntoIter<ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ParseErrors {
    type Item = &'a ParseError;
    type IntoIter = std::slice::Iter<'a, ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl fmt::Display for ParseErrors {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                formatter.write_str("; ")?;
            }
            fmt::Display::fmt(err, formatter)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseErrors {}

//! Parsing field tags.

use std::fmt;

use crate::{error::ParseErrorKind, metadata::Tags};

/// Set of options specified for a field.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct TagOptions(u8);

impl fmt::Debug for TagOptions {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = Self::NAMES
            .iter()
            .chain(["expand"].iter())
            .enumerate()
            .filter_map(|(i, name)| (self.0 & (1 << i) != 0).then_some(name));
        formatter.debug_set().entries(names).finish()
    }
}

impl TagOptions {
    /// No options.
    pub const NONE: Self = Self(0);
    /// Env var must be present unless there is a default value.
    pub const REQUIRED: Self = Self(1);
    /// Env var must not be empty if it is present.
    pub const NOT_EMPTY: Self = Self(2);
    /// Env var is removed from the process environment after being read.
    pub const UNSET: Self = Self(4);
    /// Value is a path to the file containing the actual value.
    pub const FILE: Self = Self(8);
    /// `$VAR` / `${VAR}` references in the value are substituted.
    pub const EXPAND: Self = Self(16);

    /// Names of options that can be specified in the primary tag, ordered by their bit.
    pub(crate) const NAMES: [&'static str; 4] = ["required", "notEmpty", "unset", "file"];

    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "" => Self::NONE,
            "required" => Self::REQUIRED,
            "notEmpty" => Self::NOT_EMPTY,
            "unset" => Self::UNSET,
            "file" => Self::FILE,
            _ => return None,
        })
    }

    /// Computes a union of two sets of options.
    #[must_use]
    pub const fn or(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }

    /// Checks whether this set contains all options from `needle`.
    pub const fn contains(self, needle: Self) -> bool {
        self.0 & needle.0 == needle.0
    }
}

/// Parsed tags of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagMetadata {
    /// Name of the env var (without the prefix). May be empty.
    pub key: &'static str,
    /// Options.
    pub options: TagOptions,
    /// Raw default value.
    pub default: Option<&'static str>,
    /// Separator of sequence items.
    pub separator: &'static str,
}

impl TagMetadata {
    /// Separator used if the field doesn't specify one.
    pub const DEFAULT_SEPARATOR: &'static str = ",";

    /// Parses tags of a field. `tag_name` is the name of the primary tag (e.g., `env`).
    ///
    /// Returns `Ok(None)` if a field has neither the primary tag nor a default value; such fields
    /// are not populated.
    ///
    /// # Errors
    ///
    /// Returns an error if the primary tag has an unsupported option.
    pub fn parse(tags: Tags, tag_name: &str) -> Result<Option<Self>, ParseErrorKind> {
        let default = tags.get("default");
        let Some(primary) = tags.get(tag_name).or(default.map(|_| "")) else {
            return Ok(None);
        };

        let (key, raw_options) = primary.split_once(',').unwrap_or((primary, ""));
        let mut options = TagOptions::NONE;
        for name in raw_options.split(',') {
            let option =
                TagOptions::from_name(name).ok_or_else(|| ParseErrorKind::TagSyntax {
                    option: name.to_owned(),
                })?;
            options = options.or(option);
        }
        if tags
            .get("expand")
            .is_some_and(|flag| flag.eq_ignore_ascii_case("true"))
        {
            options = options.or(TagOptions::EXPAND);
        }

        let separator = tags
            .get("separator")
            .filter(|sep| !sep.is_empty())
            .unwrap_or(Self::DEFAULT_SEPARATOR);
        Ok(Some(Self {
            key,
            options,
            default,
            separator,
        }))
    }

    /// Returns the prefix added to keys of a nested config. Nested configs usually don't have
    /// the primary tag, so the prefix is read separately from [`Self::parse()`].
    pub fn nested_prefix(tags: Tags) -> &'static str {
        tags.get("prefix").unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parsing_primary_tag() {
        let tags = Tags(&[("env", "KEY,required,file")]);
        let tag = TagMetadata::parse(tags, "env").unwrap().unwrap();
        assert_eq!(tag.key, "KEY");
        assert!(tag.options.contains(TagOptions::REQUIRED));
        assert!(tag.options.contains(TagOptions::FILE));
        assert!(!tag.options.contains(TagOptions::NOT_EMPTY));
        assert_eq!(tag.default, None);
        assert_eq!(tag.separator, ",");
        assert_eq!(
            format!("{:?}", tag.options),
            r#"{"required", "file"}"#
        );
    }

    #[test]
    fn parsing_sibling_attributes() {
        let tags = Tags(&[
            ("env", "KEY"),
            ("default", "a:b"),
            ("separator", ":"),
            ("expand", "True"),
        ]);
        let tag = TagMetadata::parse(tags, "env").unwrap().unwrap();
        assert_eq!(tag.default, Some("a:b"));
        assert_eq!(tag.separator, ":");
        assert_eq!(tag.options, TagOptions::EXPAND);

        let tags = Tags(&[("env", "KEY"), ("expand", "yes")]);
        let tag = TagMetadata::parse(tags, "env").unwrap().unwrap();
        assert_eq!(tag.options, TagOptions::NONE);
    }

    #[test]
    fn empty_options_and_keys() {
        let tags = Tags(&[("env", "VAR,")]);
        let tag = TagMetadata::parse(tags, "env").unwrap().unwrap();
        assert_eq!(tag.key, "VAR");
        assert_eq!(tag.options, TagOptions::NONE);

        let tags = Tags(&[("env", ",required")]);
        let tag = TagMetadata::parse(tags, "env").unwrap().unwrap();
        assert_eq!(tag.key, "");
        assert_eq!(tag.options, TagOptions::REQUIRED);
    }

    #[test]
    fn field_with_default_only() {
        let tags = Tags(&[("default", "1x")]);
        let tag = TagMetadata::parse(tags, "env").unwrap().unwrap();
        assert_eq!(tag.key, "");
        assert_eq!(tag.default, Some("1x"));
    }

    #[test]
    fn nested_prefixes() {
        assert_eq!(TagMetadata::nested_prefix(Tags(&[("prefix", "DB_")])), "DB_");
        assert_eq!(TagMetadata::nested_prefix(Tags(&[("env", "KEY")])), "");
    }

    #[test]
    fn untagged_field() {
        assert_eq!(TagMetadata::parse(Tags(&[]), "env").unwrap(), None);
        let tags = Tags(&[("json", "KEY"), ("prefix", "P_")]);
        assert_eq!(TagMetadata::parse(tags, "env").unwrap(), None);
    }

    #[test]
    fn alternative_tag_name() {
        let tags = Tags(&[("env", "KEY"), ("json", "OTHER,notEmpty")]);
        let tag = TagMetadata::parse(tags, "json").unwrap().unwrap();
        assert_eq!(tag.key, "OTHER");
        assert_eq!(tag.options, TagOptions::NOT_EMPTY);
    }

    #[test]
    fn unsupported_option() {
        let tags = Tags(&[("mytag", "VAR,not_supported!")]);
        let err = TagMetadata::parse(tags, "mytag").unwrap_err();
        assert_matches!(&err, ParseErrorKind::TagSyntax { option } if option == "not_supported!");
        assert_eq!(err.to_string(), r#"tag option "not_supported!" not supported"#);
    }
}

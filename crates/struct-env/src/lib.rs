//! `struct-env` – populating strongly typed config structs from environment variables.
//!
//! # Overview
//!
//! Config structs are annotated with the [`EnvConfig`](macro@EnvConfig) derive macro. The macro produces
//! a `const` [metadata table](metadata::ConfigMetadata) describing each field: its name and type, its
//! [shape](metadata::FieldShape) (scalar, `Option` / `Box`, `Vec`) and its tags (env var name, default value,
//! options etc.). At runtime, the config is walked field by field in the declaration order, and each field
//! is resolved from a flat key–value [source](EnvSource) (by default, the process environment).
//!
//! Resolution of a single field follows a fixed precedence:
//!
//! 1. The env var named by the field key (with the accumulated prefix) is looked up.
//! 2. If the var is absent, the default value from the `default` attribute is used.
//! 3. If there is no value, the field is either reported as missing (for `required` fields) or left untouched.
//! 4. With the `expand` attribute, `${VAR}` / `$VAR` references in the value are substituted.
//! 5. With the `notEmpty` option, an empty value is an error.
//! 6. With the `file` option, the value is a path to a file containing the actual value.
//! 7. The value is [converted](convert) to the field type and assigned.
//!
//! Parsing doesn't stop on the first error. Instead, all errors are collected into [`ParseErrors`].
//!
//! # Examples
//!
//! ```
//! use std::{path::PathBuf, time::Duration};
//! use struct_env::{EnvConfig, Options};
//!
//! #[derive(Debug, Default, EnvConfig)]
//! struct AppConfig {
//!     #[env("HOME")]
//!     pub home: PathBuf,
//!     #[env("PORT", default = "3000")]
//!     pub port: u16,
//!     #[env("IS_PRODUCTION")]
//!     pub is_production: bool,
//!     #[env("HOSTS", separator = ":")]
//!     pub hosts: Vec<String>,
//!     #[env("DURATION")]
//!     pub duration: Option<Duration>,
//!     #[env(nest, prefix = "DB_")]
//!     pub database: DatabaseConfig,
//! }
//!
//! #[derive(Debug, Default, EnvConfig)]
//! struct DatabaseConfig {
//!     #[env("URL,required")]
//!     pub url: String,
//!     #[env("POOL_SIZE", default = "8")]
//!     pub pool_size: usize,
//! }
//!
//! let options = Options::default().with_vars([
//!     ("HOME", "/home/app"),
//!     ("HOSTS", "host1:host2"),
//!     ("DURATION", "1h30m"),
//!     ("DB_URL", "postgres://localhost/db"),
//! ]);
//! let mut config = AppConfig::default();
//! struct_env::parse_with(&mut config, options)?;
//!
//! assert_eq!(config.home.as_os_str(), "/home/app");
//! assert_eq!(config.port, 3_000);
//! assert!(!config.is_production);
//! assert_eq!(config.hosts, ["host1", "host2"]);
//! assert_eq!(config.duration, Some(Duration::from_secs(5_400)));
//! assert_eq!(config.database.url, "postgres://localhost/db");
//! assert_eq!(config.database.pool_size, 8);
//! # anyhow::Ok(())
//! ```
//!
//! ## Error reporting
//!
//! ```
//! # use struct_env::{EnvConfig, Options, ParseErrorKind};
//! # use assert_matches::assert_matches;
//! #[derive(Debug, Default, EnvConfig)]
//! struct TestConfig {
//!     #[env("NAME,required")]
//!     pub name: String,
//!     #[env("NUMBER")]
//!     pub number: i32,
//! }
//!
//! let options = Options::default().with_vars([("NUMBER", "not-a-number")]);
//! let errors = struct_env::parse_as::<TestConfig>(options).unwrap_err();
//! assert_eq!(
//!     errors.to_string(),
//!     "required environment variable \"NAME\" is not set; \
//!      parse error on field \"number\" of type \"i32\": invalid digit found in string"
//! );
//! assert_matches!(errors.first().kind(), ParseErrorKind::Required { key } if key == "NAME");
//! ```

// Documentation settings
#![doc(html_root_url = "https://docs.rs/struct-env/0.1.0")]
// Linter settings
#![warn(missing_docs)]

/// Derives the [`EnvConfig`](trait@EnvConfig) trait for a struct.
///
/// The macro supports structs with named fields and without generic params. Fields are configured
/// with `#[env(_)]` attributes; multiple attributes on a single field are supported.
///
/// Only fields with a visibility qualifier (e.g., `pub` or `pub(crate)`) are populated; private fields
/// are described in the metadata, but never touched.
///
/// # Field attributes
///
/// ## Primary tag
///
/// **Type:** string literal specified first, e.g. `#[env("PORT,required")]`
///
/// Name of the env var optionally followed by comma-separated options:
///
/// - `required`: the var must be set unless there's a default value.
/// - `notEmpty`: the var must not be empty.
/// - `unset`: the var is removed from the process environment after it's read. Removal isn't
///   thread-safe; see [`ProcessEnv`] for the caller's obligations.
/// - `file`: the var contains a path to the file with the actual value.
///
/// Empty options are ignored. Unsupported options lead to a compile-time error.
///
/// ## Alternate tags
///
/// **Type:** string, e.g. `#[env(json = "PORT,required")]`
///
/// Same as the primary tag, but stored under a custom name. The tag used during parsing
/// is selected via [`Options::with_tag_name()`]. Unlike the primary tag, options of alternate tags
/// are checked at runtime.
///
/// ## `default`
///
/// **Type:** string
///
/// Raw default value used if the env var is absent. A field with a default value but without
/// the primary tag is populated from the default value only.
///
/// ## `separator`
///
/// **Type:** string; `,` by default
///
/// Separator of items for `Vec` fields.
///
/// ## `expand`
///
/// **Type:** flag, or a string that is equal to `true` case-insensitively
///
/// Substitutes `${VAR}` / `$VAR` references in the raw value (either from the env var or from the default value).
///
/// ## `nest`
///
/// **Type:** flag
///
/// Marks the field as a nested config. The field type must implement [`EnvConfig`](trait@EnvConfig), and
/// may be wrapped in `Option` or `Box`; an `Option` holding `None` is initialized with the default config.
///
/// ## `prefix`
///
/// **Type:** string
///
/// Prefix prepended to the keys of all fields in a nested config. Implies `nest`.
///
/// ## `flatten`
///
/// **Type:** flag
///
/// Marks the field as a flattened config. Its fields are treated as if they were declared in the enclosing config.
///
/// ## `skip`
///
/// **Type:** flag
///
/// Excludes the field from the metadata.
///
/// # Container attributes
///
/// ## `crate`
///
/// **Type:** path
///
/// Path to the `struct_env` crate; `::struct_env` by default.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use struct_env::EnvConfig;
///
/// #[derive(Debug, Default, EnvConfig)]
/// struct TestConfig {
///     #[env("API_KEY,required,notEmpty")]
///     pub api_key: String,
///     #[env("TLS_CERT,file")]
///     pub tls_cert: Option<String>,
///     #[env("CACHE_DIR", default = "${HOME}/.cache", expand)]
///     pub cache_dir: PathBuf,
///     #[env("PORTS", separator = ";", default = "80;443")]
///     pub ports: Vec<u16>,
///     #[env(flatten)]
///     pub logging: LoggingConfig,
///     /// Private fields are never populated.
///     #[env("SECRET")]
///     internal: u64,
/// }
///
/// #[derive(Debug, Default, EnvConfig)]
/// struct LoggingConfig {
///     #[env("LOG_LEVEL", default = "info")]
///     pub level: String,
/// }
/// ```
pub use struct_env_derive::EnvConfig;

pub use self::{
    convert::{Converters, DecodeText},
    error::{ParseError, ParseErrorKind, ParseErrors},
    source::{EnvSource, FileLoader, FsLoader, MapSource, Options, ProcessEnv},
};
use self::{
    metadata::ConfigMetadata,
    resolve::Resolver,
    visit::{EnvTarget, VisitEnv},
};

pub mod convert;
mod error;
pub mod metadata;
mod resolve;
mod source;
pub mod tag;
#[cfg(test)]
mod testonly;
pub mod visit;

/// Configuration populated from env vars.
///
/// This trait should be derived using [the corresponding proc macro](macro@EnvConfig).
pub trait EnvConfig: 'static + VisitEnv {
    /// Provides the config description.
    const DESCRIPTION: ConfigMetadata;
}

/// Populates the target config from the process environment using the default [`Options`].
///
/// If the config has fields with the `unset` option, the environment must not be accessed
/// by other threads during the call; see [`ProcessEnv`].
///
/// # Errors
///
/// Returns all errors encountered while parsing. Fields that were resolved successfully are assigned
/// even if parsing fails.
pub fn parse<T: EnvTarget + ?Sized>(target: &mut T) -> Result<(), ParseErrors> {
    parse_with(target, Options::default())
}

/// Populates the target config using the provided options.
///
/// # Errors
///
/// Returns all errors encountered while parsing.
pub fn parse_with<T: EnvTarget + ?Sized>(
    target: &mut T,
    options: Options<'_>,
) -> Result<(), ParseErrors> {
    parse_with_converters(target, &Converters::default(), options)
}

/// Populates the target config using the provided custom converters and options.
///
/// # Errors
///
/// Returns all errors encountered while parsing.
pub fn parse_with_converters<T: EnvTarget + ?Sized>(
    target: &mut T,
    converters: &Converters,
    options: Options<'_>,
) -> Result<(), ParseErrors> {
    let root = target
        .root_config()
        .ok_or_else(|| ParseError::from(ParseErrorKind::Structural))?;
    Resolver::new(converters, options).resolve(root)
}

/// Creates a default config and populates it using the provided options.
///
/// # Errors
///
/// Returns all errors encountered while parsing.
pub fn parse_as<C: EnvConfig + EnvTarget + Default>(options: Options<'_>) -> Result<C, ParseErrors> {
    let mut config = C::default();
    parse_with(&mut config, options)?;
    Ok(config)
}

#[cfg(doctest)]
doc_comment::doctest!("../README.md");

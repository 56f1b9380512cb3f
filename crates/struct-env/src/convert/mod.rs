//! Converting raw string values to field types.
//!
//! # Conversion order
//!
//! For a field with the declared type `F` built from elements of type `T` (e.g., `F = Vec<T>`),
//! the converter is selected as follows:
//!
//! 1. A [custom converter](Converters) registered for `F`. The converted value replaces the field as a whole.
//! 2. A custom converter registered for `T`.
//! 3. [`DecodeText`] implementation for `T`.
//! 4. A built-in converter for `T`. Built-in converters cover `bool`, all integer types, `f32`, `f64`,
//!    `char`, `String`, `PathBuf`, IP and socket addresses, [`Duration`], [`Url`] and byte buffers
//!    (`Vec<u8>`, filled with the raw bytes of the value).
//!
//! If none of these apply, parsing fails with [`ParseErrorKind::NoParser`](crate::ParseErrorKind::NoParser).
//!
//! Type aliases (`type Alias = u64;`) are the same type as the aliased type, so a converter registered
//! for an alias is used for all fields of the underlying type. Newtypes (`struct Wrapper(u64);`) are
//! distinct types; they need a custom converter or a [`DecodeText`] implementation.
//!
//! # Examples
//!
//! ```
//! use struct_env::{Converters, EnvConfig, Options};
//!
//! #[derive(Debug, PartialEq)]
//! struct Level(u8);
//!
//! #[derive(Debug, Default, EnvConfig)]
//! struct TestConfig {
//!     #[env("LEVEL")]
//!     pub level: Option<Level>,
//!     #[env("LEVELS", separator = "|")]
//!     pub levels: Vec<Level>,
//! }
//!
//! let converters = Converters::new().with(|raw: &str| match raw {
//!     "low" => Ok(Level(0)),
//!     "high" => Ok(Level(10)),
//!     _ => anyhow::bail!("unknown level"),
//! });
//! let options = Options::default().with_vars([("LEVEL", "high"), ("LEVELS", "low|high")]);
//! let mut config = TestConfig::default();
//! struct_env::parse_with_converters(&mut config, &converters, options)?;
//! assert_eq!(config.level, Some(Level(10)));
//! assert_eq!(config.levels, [Level(0), Level(10)]);
//! # anyhow::Ok(())
//! ```
//!
//! [`Duration`]: std::time::Duration
//! [`Url`]: url::Url

use std::{
    any::{self, TypeId},
    collections::HashMap,
    fmt,
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
    path::PathBuf,
    str::FromStr,
    sync::{Arc, LazyLock},
    time::Duration,
};

use anyhow::Context as _;

pub use self::units::InvalidDuration;
use crate::metadata::FieldMetadata;

mod units;

/// Type-erased conversion function.
pub type Decoder = fn(&str) -> anyhow::Result<Box<dyn any::Any>>;

type ErasedConverter = dyn Fn(&str) -> anyhow::Result<Box<dyn any::Any>> + Send + Sync;

/// Decoding a value from text. This is a fallback for types without a [custom converter](Converters).
///
/// # Examples
///
/// ```
/// use struct_env::{DecodeText, EnvConfig, Options};
///
/// #[derive(Debug, Default, PartialEq)]
/// enum LogLevel {
///     #[default]
///     Info,
///     Debug,
/// }
///
/// impl DecodeText for LogLevel {
///     fn decode_text(raw: &str) -> anyhow::Result<Self> {
///         match raw {
///             "info" => Ok(Self::Info),
///             "debug" => Ok(Self::Debug),
///             _ => anyhow::bail!("unknown log level: {raw}"),
///         }
///     }
/// }
///
/// #[derive(Debug, Default, EnvConfig)]
/// struct TestConfig {
///     #[env("LOG_LEVEL")]
///     pub log_level: LogLevel,
/// }
///
/// let mut config = TestConfig::default();
/// let options = Options::default().with_vars([("LOG_LEVEL", "debug")]);
/// struct_env::parse_with(&mut config, options)?;
/// assert_eq!(config.log_level, LogLevel::Debug);
/// # anyhow::Ok(())
/// ```
pub trait DecodeText: Sized {
    /// Decodes a value from `raw` text.
    ///
    /// # Errors
    ///
    /// Should return an error if the text is malformed. The error is reported as the cause
    /// of [`ParseErrorKind::Parse`](crate::ParseErrorKind::Parse).
    fn decode_text(raw: &str) -> anyhow::Result<Self>;
}

struct CustomConverter {
    type_name: &'static str,
    convert: Arc<ErasedConverter>,
}

/// Custom converters for field types. Custom converters take precedence over [`DecodeText`]
/// implementations and built-in converters.
#[derive(Default, Clone)]
pub struct Converters {
    inner: HashMap<TypeId, Arc<CustomConverter>>,
}

impl fmt::Debug for Converters {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let types = self.inner.values().map(|converter| converter.type_name);
        formatter.debug_set().entries(types).finish()
    }
}

impl Converters {
    /// Creates an empty set of converters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a converter for the type `T`, replacing the previously registered one.
    pub fn insert<T, F>(&mut self, converter: F) -> &mut Self
    where
        T: 'static,
        F: Fn(&str) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let converter = CustomConverter {
            type_name: any::type_name::<T>(),
            convert: Arc::new(move |raw: &str| {
                converter(raw).map(|value| Box::new(value) as Box<dyn any::Any>)
            }),
        };
        self.inner.insert(TypeId::of::<T>(), Arc::new(converter));
        self
    }

    /// Registers a converter for the type `T`, replacing the previously registered one.
    #[must_use]
    pub fn with<T, F>(mut self, converter: F) -> Self
    where
        T: 'static,
        F: Fn(&str) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.insert(converter);
        self
    }

    /// Checks whether a converter for the type `T` is registered.
    pub fn contains<T: 'static>(&self) -> bool {
        self.inner.contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of registered converters.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Checks whether there are no registered converters.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub(crate) fn contains_id(&self, type_id: TypeId) -> bool {
        self.inner.contains_key(&type_id)
    }

    /// Selects the conversion for the specified field.
    pub(crate) fn select(&self, field: &FieldMetadata) -> Option<Conversion<'_>> {
        let field_id = field.rust_type.id();
        let elem_id = field.elem_type.id();
        if field_id != elem_id
            && let Some(converter) = self.inner.get(&field_id)
        {
            return Some(Conversion::Whole(&*converter.convert));
        }

        if let Some(converter) = self.inner.get(&elem_id) {
            Some(Conversion::Elem(ElemConverter::Custom(&*converter.convert)))
        } else if let Some(decoder) = (field.decoder)() {
            Some(Conversion::Elem(ElemConverter::DecodeText(decoder)))
        } else {
            BUILTINS
                .get(&elem_id)
                .map(|&decoder| Conversion::Elem(ElemConverter::Builtin(decoder)))
        }
    }
}

/// Conversion selected for a field.
pub(crate) enum Conversion<'a> {
    /// Custom converter for the declared field type.
    Whole(&'a ErasedConverter),
    /// Converter for elements of the field.
    Elem(ElemConverter<'a>),
}

impl fmt::Debug for Conversion<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Whole(_) => formatter.write_str("Whole"),
            Self::Elem(elem) => formatter.debug_tuple("Elem").field(elem).finish(),
        }
    }
}

pub(crate) enum ElemConverter<'a> {
    Custom(&'a ErasedConverter),
    DecodeText(Decoder),
    Builtin(Decoder),
}

impl fmt::Debug for ElemConverter<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Custom(_) => "Custom",
            Self::DecodeText(_) => "DecodeText",
            Self::Builtin(_) => "Builtin",
        })
    }
}

impl ElemConverter<'_> {
    pub(crate) fn convert(&self, raw: &str) -> anyhow::Result<Box<dyn any::Any>> {
        match self {
            Self::Custom(convert) => convert(raw),
            Self::DecodeText(decode) | Self::Builtin(decode) => decode(raw),
        }
    }

    /// Converts each `separator`-delimited token, stopping on the first error.
    pub(crate) fn convert_sequence(
        &self,
        raw: &str,
        separator: &str,
    ) -> anyhow::Result<Vec<Box<dyn any::Any>>> {
        raw.split(separator)
            .map(|token| self.convert(token))
            .collect()
    }
}

/// Parses a boolean accepting `1` / `0`, `t` / `f` and `true` / `false` in lower, upper or title case.
fn parse_bool(raw: &str) -> anyhow::Result<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => anyhow::bail!("invalid boolean value {raw:?}"),
    }
}

fn from_str_entry<T>() -> (TypeId, Decoder)
where
    T: FromStr + 'static,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let decoder: Decoder = |raw| Ok(Box::new(raw.parse::<T>()?));
    (TypeId::of::<T>(), decoder)
}

fn entry<T: 'static>(decoder: Decoder) -> (TypeId, Decoder) {
    (TypeId::of::<T>(), decoder)
}

static BUILTINS: LazyLock<HashMap<TypeId, Decoder>> = LazyLock::new(|| {
    HashMap::from([
        entry::<bool>(|raw| Ok(Box::new(parse_bool(raw)?))),
        from_str_entry::<u8>(),
        from_str_entry::<i8>(),
        from_str_entry::<u16>(),
        from_str_entry::<i16>(),
        from_str_entry::<u32>(),
        from_str_entry::<i32>(),
        from_str_entry::<u64>(),
        from_str_entry::<i64>(),
        from_str_entry::<u128>(),
        from_str_entry::<i128>(),
        from_str_entry::<usize>(),
        from_str_entry::<isize>(),
        from_str_entry::<f32>(),
        from_str_entry::<f64>(),
        from_str_entry::<char>(),
        from_str_entry::<IpAddr>(),
        from_str_entry::<Ipv4Addr>(),
        from_str_entry::<Ipv6Addr>(),
        from_str_entry::<SocketAddr>(),
        entry::<String>(|raw| Ok(Box::new(raw.to_owned()))),
        entry::<PathBuf>(|raw| Ok(Box::new(PathBuf::from(raw)))),
        entry::<Vec<u8>>(|raw| Ok(Box::new(raw.as_bytes().to_vec()))),
        entry::<Duration>(|raw| {
            let duration = units::parse_duration(raw).context("unable to parse duration")?;
            Ok(Box::new(duration))
        }),
        entry::<url::Url>(|raw| {
            let url = url::Url::parse(raw).context("unable to parse URL")?;
            Ok(Box::new(url))
        }),
    ])
});

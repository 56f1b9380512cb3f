//! Test-only functionality shared among multiple test modules.

use std::{path::PathBuf, time::Duration};

use crate::{DecodeText, EnvConfig, Options};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SimpleEnum {
    #[default]
    First,
    Second,
}

impl DecodeText for SimpleEnum {
    fn decode_text(raw: &str) -> anyhow::Result<Self> {
        match raw {
            "first" => Ok(Self::First),
            "second" => Ok(Self::Second),
            _ => anyhow::bail!("unknown variant {raw:?}, expected `first` or `second`"),
        }
    }
}

#[derive(Debug, Default, PartialEq, EnvConfig)]
#[env(crate = crate)]
pub(crate) struct ScalarsConfig {
    #[env("STRING")]
    pub string: String,
    #[env("STRING")]
    pub string_ptr: Option<String>,
    #[env("STRINGS")]
    pub strings: Vec<String>,
    #[env("STRINGS")]
    pub string_ptrs: Vec<Box<String>>,

    #[env("BOOL")]
    pub flag: bool,
    #[env("BOOL")]
    pub flag_ptr: Option<bool>,
    #[env("BOOLS")]
    pub flags: Vec<bool>,

    #[env("INT")]
    pub int: i32,
    #[env("INT")]
    pub int_ptr: Option<Box<i32>>,
    #[env("INTS")]
    pub ints: Vec<i64>,
    #[env("INTS")]
    pub int_ptrs: Vec<Option<i64>>,

    #[env("UINT")]
    pub uint: u16,
    #[env("UINT")]
    pub uint_ptr: Box<u16>,
    #[env("UINTS")]
    pub uints: Option<Vec<u64>>,

    #[env("FLOAT")]
    pub float: f64,
    #[env("FLOAT")]
    pub float_ptr: Option<f32>,
    #[env("FLOATS")]
    pub floats: Vec<f64>,

    #[env("DURATION")]
    pub duration: Duration,
    #[env("DURATION")]
    pub duration_ptr: Option<Duration>,
    #[env("DURATIONS")]
    pub durations: Vec<Duration>,
    #[env("DURATIONS")]
    pub duration_ptrs: Vec<Box<Duration>>,

    #[env("ENUM")]
    pub simple_enum: SimpleEnum,
    #[env("ENUM")]
    pub simple_enum_ptr: Option<SimpleEnum>,
    #[env("ENUMS")]
    pub simple_enums: Vec<SimpleEnum>,

    #[env("URL")]
    pub url: Option<url::Url>,
    #[env("URLS")]
    pub urls: Vec<url::Url>,

    #[env("PATH")]
    pub path: PathBuf,
    #[env("BYTES")]
    pub bytes: Vec<u8>,

    #[env("DATABASE_URL", default = "postgres://localhost:5432/db")]
    pub string_with_default: String,
    #[env("SEPSTRINGS", separator = ":")]
    pub custom_separator: Vec<String>,

    #[env(nest)]
    pub non_defined: NonDefinedConfig,
    #[env(nest, prefix = "PRF_")]
    pub nested_non_defined: NestedNonDefinedConfig,

    pub not_an_env: String,
}

#[derive(Debug, Default, PartialEq, EnvConfig)]
#[env(crate = crate)]
pub(crate) struct NonDefinedConfig {
    #[env("NONDEFINED_STR")]
    pub string: String,
}

#[derive(Debug, Default, PartialEq, EnvConfig)]
#[env(crate = crate)]
pub(crate) struct NestedNonDefinedConfig {
    #[env(prefix = "NONDEFINED_")]
    pub non_defined: InnerConfig,
}

#[derive(Debug, Default, PartialEq, EnvConfig)]
#[env(crate = crate)]
pub(crate) struct InnerConfig {
    #[env("STR")]
    pub string: String,
}

#[derive(Debug, Default, PartialEq, EnvConfig)]
#[env(crate = crate)]
pub(crate) struct ParentConfig {
    #[env(nest)]
    pub inner: Option<Box<InnerStruct>>,
    #[env(nest)]
    unexported: Option<InnerStruct>,
}

#[derive(Debug, Default, PartialEq, EnvConfig)]
#[env(crate = crate)]
pub(crate) struct InnerStruct {
    #[env("innervar")]
    pub inner: String,
    #[env("innernum")]
    pub number: u32,
}

#[derive(Debug, Default, PartialEq, EnvConfig)]
#[env(crate = crate)]
pub(crate) struct ServerConfig {
    #[env("HOST")]
    pub host: String,
    #[env("PORT")]
    pub port: u16,
}

#[derive(Debug, Default, PartialEq, EnvConfig)]
#[env(crate = crate)]
pub(crate) struct ApiConfig {
    #[env(flatten)]
    pub server: ServerConfig,
    #[env("TOKEN")]
    pub token: String,
}

/// Creates options reading from the provided vars.
pub(crate) fn options_with_vars<'a>(vars: &[(&str, &str)]) -> Options<'a> {
    Options::default().with_vars(vars.iter().copied())
}

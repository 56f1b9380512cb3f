//! Integration tests for `struct-env`.

use std::{
    cell::RefCell,
    collections::HashMap,
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use assert_matches::assert_matches;
use struct_env::{
    Converters, EnvConfig, EnvSource, MapSource, Options, ParseErrorKind,
    metadata::{FieldKind, FieldShape},
    tag::{TagMetadata, TagOptions},
};

#[derive(Debug, Default, PartialEq, EnvConfig)]
struct DatabaseConfig {
    #[env("URL,required,notEmpty")]
    pub url: String,
    #[env("POOL_SIZE", default = "8")]
    pub pool_size: usize,
    #[env("REPLICAS")]
    pub replicas: Vec<String>,
}

#[derive(Debug, Default, PartialEq, EnvConfig)]
struct HttpConfig {
    #[env("BIND_ADDR", default = "127.0.0.1:8080")]
    pub bind_addr: Option<SocketAddr>,
    #[env("TIMEOUT", default = "30s")]
    pub timeout: Duration,
}

#[derive(Debug, Default, PartialEq, EnvConfig)]
struct AppConfig {
    #[env("NAME", default = "app")]
    pub name: String,
    #[env(flatten)]
    pub http: HttpConfig,
    #[env(nest, prefix = "DB_")]
    pub database: Option<Box<DatabaseConfig>>,
    #[env("DEBUG")]
    pub debug: bool,
}

#[test]
fn describing_config() {
    let metadata = &AppConfig::DESCRIPTION;
    assert_eq!(metadata.ty.name_in_code(), "AppConfig");
    let field_names: Vec<_> = metadata.fields.iter().map(|field| field.rust_field_name).collect();
    assert_eq!(field_names, ["name", "http", "database", "debug"]);

    let database = metadata.field("database").unwrap();
    assert_eq!(database.shape(), FieldShape::Pointer);
    assert_eq!(database.rust_type.name_in_code(), "Option<Box<DatabaseConfig>>");
    let nested = assert_matches!(database.kind, FieldKind::Nested(nested) => nested);
    assert_eq!(nested.meta.ty, DatabaseConfig::DESCRIPTION.ty);

    let url = &nested.meta.fields[0];
    let tag = TagMetadata::parse(url.tags, Options::DEFAULT_TAG_NAME)
        .unwrap()
        .unwrap();
    assert_eq!(tag.key, "URL");
    assert!(tag.options.contains(TagOptions::REQUIRED.or(TagOptions::NOT_EMPTY)));
    assert_eq!(tag.default, None);

    let replicas = nested.meta.field("replicas").unwrap();
    assert!(replicas.shape().is_sequence());
}

#[test]
fn parsing_full_config() {
    let options = Options::default().with_vars([
        ("SVC_BIND_ADDR", "0.0.0.0:3000"),
        ("SVC_DB_URL", "postgres://localhost/db"),
        ("SVC_DB_REPLICAS", "replica1,replica2"),
        ("SVC_DEBUG", "1"),
    ]);
    let config: AppConfig = struct_env::parse_as(options.with_prefix("SVC_")).unwrap();

    let expected = AppConfig {
        name: "app".to_owned(),
        http: HttpConfig {
            bind_addr: Some("0.0.0.0:3000".parse().unwrap()),
            timeout: Duration::from_secs(30),
        },
        database: Some(Box::new(DatabaseConfig {
            url: "postgres://localhost/db".to_owned(),
            pool_size: 8,
            replicas: vec!["replica1".to_owned(), "replica2".to_owned()],
        })),
        debug: true,
    };
    assert_eq!(config, expected);
}

#[test]
fn parsing_errors() {
    let options = Options::default().with_vars([("DB_URL", ""), ("TIMEOUT", "soon")]);
    let errors = struct_env::parse_as::<AppConfig>(options).unwrap_err();
    assert_eq!(errors.len(), 2);

    let mut errors = errors.into_iter();
    let err = errors.next().unwrap();
    assert_matches!(err.kind(), ParseErrorKind::Parse { field: "timeout", .. });
    assert_eq!(err.config().unwrap().ty, HttpConfig::DESCRIPTION.ty);
    let err = errors.next().unwrap();
    assert_matches!(err.kind(), ParseErrorKind::EmptyValue { key } if key == "DB_URL");
    assert_eq!(err.field().unwrap().rust_field_name, "url");
}

/// Source that records all requested keys.
#[derive(Debug, Default)]
struct RecordingSource {
    vars: HashMap<String, String>,
    requested: RefCell<Vec<String>>,
}

impl EnvSource for RecordingSource {
    fn get(&self, key: &str) -> Option<String> {
        self.requested.borrow_mut().push(key.to_owned());
        self.vars.get(key).cloned()
    }
}

impl EnvSource for &RecordingSource {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

#[test]
fn custom_env_source() {
    let source = RecordingSource {
        vars: HashMap::from([("DB_URL".to_owned(), "sqlite://memory".to_owned())]),
        ..RecordingSource::default()
    };
    let mut config = AppConfig::default();
    struct_env::parse_with(&mut config, Options::default().with_source(&source)).unwrap();
    assert_eq!(config.database.unwrap().url, "sqlite://memory");

    let requested = source.requested.into_inner();
    assert_eq!(
        requested,
        [
            "NAME",
            "BIND_ADDR",
            "TIMEOUT",
            "DB_URL",
            "DB_POOL_SIZE",
            "DB_REPLICAS",
            "DEBUG"
        ]
    );
}

#[derive(Debug, Default, EnvConfig)]
struct PackageConfig {
    #[env("PKG_NAME,required")]
    pub name: String,
    #[env("MANIFEST_DIR,required")]
    pub manifest_dir: PathBuf,
    #[env("STRUCT_ENV_SURELY_MISSING", default = "fallback")]
    pub missing: String,
}

#[test]
fn parsing_process_env() {
    // Vars set by Cargo for the test process; the environment is only read.
    let options = Options::default().with_prefix("CARGO_");
    let config: PackageConfig = struct_env::parse_as(options).unwrap();
    assert_eq!(config.name, env!("CARGO_PKG_NAME"));
    assert_eq!(config.manifest_dir, Path::new(env!("CARGO_MANIFEST_DIR")));
    assert_eq!(config.missing, "fallback");
}

#[test]
fn parsing_with_custom_converters() {
    let converters = Converters::new().with(|raw: &str| -> anyhow::Result<Duration> {
        let secs = raw.parse()?;
        Ok(Duration::from_secs(secs))
    });
    let options = Options::default().with_source(MapSource::default().with("TIMEOUT", "5"));
    let mut config = HttpConfig::default();
    struct_env::parse_with_converters(&mut config, &converters, options).unwrap();
    assert_eq!(config.timeout, Duration::from_secs(5));
    assert_eq!(config.bind_addr, Some("127.0.0.1:8080".parse().unwrap()));
}

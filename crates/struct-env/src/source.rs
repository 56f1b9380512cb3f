//! Env var sources and parsing options.

use std::{collections::HashMap, env, fmt, fs, io, path::Path};

/// Source of env vars.
pub trait EnvSource {
    /// Gets the value of the specified var. Must distinguish between an absent and an empty var.
    fn get(&self, key: &str) -> Option<String>;

    /// Removes the specified var. Invoked for fields with the `unset` option after the var is read.
    /// The default implementation does nothing.
    fn unset(&mut self, _key: &str) {
        // Do nothing
    }
}

/// Process environment.
///
/// # Removing vars
///
/// Fields with the `unset` option make this source remove vars via [`env::remove_var()`]. Removal
/// is only sound if no other thread reads or writes the process environment at the same time.
/// Callers parsing configs with `unset` fields are responsible for that, e.g. by parsing
/// on startup before spawning threads. Configs without `unset` fields only read the environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        let value = env::var_os(key)?;
        Some(match value.into_string() {
            Ok(value) => value,
            Err(value) => {
                tracing::warn!(key, "env var is not valid UTF-8; replacing invalid chars");
                value.to_string_lossy().into_owned()
            }
        })
    }

    fn unset(&mut self, key: &str) {
        // SAFETY: the caller guarantees that the environment isn't accessed concurrently;
        // see the type docs.
        unsafe { env::remove_var(key) };
    }
}

/// In-memory env vars. Ignores the `unset` option.
#[derive(Debug, Clone, Default)]
pub struct MapSource {
    vars: HashMap<String, String>,
}

impl MapSource {
    /// Sets a var.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapSource {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

impl From<HashMap<String, String>> for MapSource {
    fn from(vars: HashMap<String, String>) -> Self {
        Self { vars }
    }
}

impl EnvSource for MapSource {
    fn get(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

/// Loader of file contents for fields with the `file` option.
pub trait FileLoader {
    /// Loads the file contents.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors.
    fn load(&self, path: &Path) -> io::Result<String>;
}

/// Loads files from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl FileLoader for FsLoader {
    fn load(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

type OnSetHook<'a> = Box<dyn FnMut(&str, &str, bool) + 'a>;

/// Parsing options.
///
/// # Examples
///
/// ```
/// use struct_env::{EnvConfig, Options};
///
/// #[derive(Debug, Default, EnvConfig)]
/// struct TestConfig {
///     #[env("PORT", default = "3000")]
///     pub port: u16,
///     #[env("HOST,required")]
///     pub host: String,
/// }
///
/// let mut assignments = vec![];
/// let options = Options::default()
///     .with_prefix("APP_")
///     .with_vars([("APP_HOST", "localhost")])
///     .on_set(|key, value, is_default| {
///         assignments.push(format!("{key}={value} (default: {is_default})"));
///     });
/// let mut config = TestConfig::default();
/// struct_env::parse_with(&mut config, options)?;
/// assert_eq!(config.port, 3_000);
/// assert_eq!(config.host, "localhost");
/// assert_eq!(
///     assignments,
///     ["APP_PORT=3000 (default: true)", "APP_HOST=localhost (default: false)"]
/// );
/// # anyhow::Ok(())
/// ```
pub struct Options<'a> {
    pub(crate) tag_name: &'a str,
    pub(crate) source: Box<dyn EnvSource + 'a>,
    pub(crate) prefix: String,
    pub(crate) required_if_no_default: bool,
    pub(crate) on_set: Option<OnSetHook<'a>>,
    pub(crate) file_loader: Box<dyn FileLoader + 'a>,
}

impl fmt::Debug for Options<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Options")
            .field("tag_name", &self.tag_name)
            .field("prefix", &self.prefix)
            .field("required_if_no_default", &self.required_if_no_default)
            .field("has_on_set", &self.on_set.is_some())
            .finish_non_exhaustive()
    }
}

/// Reads from the process environment, uses the `env` tag and no prefix.
impl Default for Options<'_> {
    fn default() -> Self {
        Self {
            tag_name: Self::DEFAULT_TAG_NAME,
            source: Box::new(ProcessEnv),
            prefix: String::new(),
            required_if_no_default: false,
            on_set: None,
            file_loader: Box::new(FsLoader),
        }
    }
}

impl<'a> Options<'a> {
    /// Name of the primary tag used by default.
    pub const DEFAULT_TAG_NAME: &'static str = "env";

    /// Sets the name of the primary tag, e.g. `json` for fields annotated with `#[env(json = "KEY")]`.
    #[must_use]
    pub fn with_tag_name(mut self, tag_name: &'a str) -> Self {
        self.tag_name = tag_name;
        self
    }

    /// Replaces the source of env vars.
    #[must_use]
    pub fn with_source(mut self, source: impl EnvSource + 'a) -> Self {
        self.source = Box::new(source);
        self
    }

    /// Reads env vars from the provided key–value pairs instead of the process environment.
    #[must_use]
    pub fn with_vars<K, V>(self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.with_source(vars.into_iter().collect::<MapSource>())
    }

    /// Sets the prefix prepended to all keys.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Makes all fields without a default value required.
    #[must_use]
    pub fn required_if_no_default(mut self) -> Self {
        self.required_if_no_default = true;
        self
    }

    /// Sets a hook called for each populated field with the full key, the raw value and a flag
    /// whether the value is the default one. Fields for which a var is absent and that don't have
    /// a default value are reported with an empty value.
    #[must_use]
    pub fn on_set(mut self, hook: impl FnMut(&str, &str, bool) + 'a) -> Self {
        self.on_set = Some(Box::new(hook));
        self
    }

    /// Replaces the loader for fields with the `file` option.
    #[must_use]
    pub fn with_file_loader(mut self, loader: impl FileLoader + 'a) -> Self {
        self.file_loader = Box::new(loader);
        self
    }
}

fn is_name_char(ch: char) -> bool {
    ch == '_' || ch.is_ascii_alphanumeric()
}

/// Substitutes `${KEY}` and `$KEY` references with values from `source`. References to absent vars
/// are left as is. Substituted values are not expanded further.
pub(crate) fn expand(raw: &str, source: &dyn EnvSource) -> String {
    let mut expanded = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('$') {
        expanded.push_str(&rest[..pos]);
        let reference = &rest[pos..];
        let after_dollar = &reference[1..];

        let (name, reference_len) = if let Some(braced) = after_dollar.strip_prefix('{') {
            let Some(end) = braced.find('}') else {
                // Unterminated reference; the remaining input is kept as is
                rest = reference;
                break;
            };
            (&braced[..end], end + 3)
        } else {
            let end = after_dollar
                .find(|ch| !is_name_char(ch))
                .unwrap_or(after_dollar.len());
            (&after_dollar[..end], end + 1)
        };

        let value = (!name.is_empty()).then(|| source.get(name)).flatten();
        if let Some(value) = value {
            expanded.push_str(&value);
        } else {
            expanded.push_str(&reference[..reference_len]);
        }
        rest = &reference[reference_len..];
    }
    expanded.push_str(rest);
    expanded
}

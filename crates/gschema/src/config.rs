use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::Path;
use tracing::info;

/// Prefix of environment variables overriding file settings.
pub const ENV_PREFIX: &str = "GSCHEMA";

/// File stem looked up in the working directory when no path is given.
pub const DEFAULT_FILE: &str = "gschema";

/// Custom error type for options loading.
#[gschema_derive::schema_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Loads schema options from a file layered with environment overrides.
///
/// 1. **Base File**: `path` if given (must exist), otherwise an optional `gschema.*`
///    file in the working directory, in any format the `config` crate understands.
/// 2. **Environment Overrides**: variables prefixed with `GSCHEMA__`; nested keys use
///    double underscores (e.g. `GSCHEMA__UNKNOWN=exclude` maps to `unknown`).
///
/// # Errors
/// Returns [`ConfigError`] if an explicit file is missing or the merged settings
/// do not match `T`.
///
/// # Example
/// ```rust
/// use gschema::config::load_opts;
/// use gschema::SchemaOptions;
///
/// let options: SchemaOptions = load_opts(None::<&str>).unwrap_or_default();
/// ```
pub fn load_opts<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    load(path, None)
}

/// Like [`load_opts`], with `env` standing in for the process environment.
///
/// # Errors
/// See [`load_opts`].
pub fn load_opts_with_env<T, I>(path: Option<impl AsRef<Path>>, env: I) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
    I: IntoIterator<Item = (String, String)>,
{
    load(path, Some(env.into_iter().collect()))
}

fn load<T>(path: Option<impl AsRef<Path>>, env: Option<config::Map<String, String>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let file = match &path {
        Some(path) => {
            info!("Loading schema options from {}", path.as_ref().display());
            File::from(path.as_ref()).required(true)
        },
        None => File::with_name(DEFAULT_FILE).required(false),
    };

    let builder = Config::builder().add_source(file).add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
            .convert_case(config::Case::Snake)
            .source(env),
    );

    let options = builder
        .build()
        .context("Failed to build schema options")?
        .try_deserialize::<T>()
        .context("Failed to deserialize schema options")?;

    Ok(options)
}

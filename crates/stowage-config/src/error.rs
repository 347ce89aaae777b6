use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("TOML serialization error: {0}")]
    #[diagnostic(
        code(stowage_config::toml_serialize),
        help("Check your configuration structure for invalid values")
    )]
    TomlSerError(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    #[diagnostic(
        code(stowage_config::toml_deserialize),
        help("Check your config.toml syntax and structure")
    )]
    TomlDeError(#[from] toml::de::Error),

    #[error("Unsupported store dialect: {0}")]
    #[diagnostic(
        code(stowage_config::dialect),
        help("The only supported dialect is 'sqlite'")
    )]
    UnsupportedDialect(String),

    #[error("Invalid duration '{value}' for {key}")]
    #[diagnostic(
        code(stowage_config::duration),
        help("Use a duration like '500ms', '30s', '1m' or '1h30m'")
    )]
    InvalidDuration { key: &'static str, value: String },

    #[error("Invalid log level: {0}")]
    #[diagnostic(
        code(stowage_config::log_level),
        help("Use one of: error, warn, info, debug, trace")
    )]
    InvalidLogLevel(String),

    #[error("Store path is empty")]
    #[diagnostic(
        code(stowage_config::empty_path),
        help("Set store.path to a file path or ':memory:'")
    )]
    EmptyStorePath,

    #[error("Environment variable `{var}` not set in `{input}`")]
    #[diagnostic(code(stowage_config::env_var))]
    MissingEnvVar { var: String, input: String },

    #[error("IO error: {0}")]
    #[diagnostic(code(stowage_config::io))]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

use std::path::PathBuf;
use thiserror::Error;

/// Problems with a driver's option schema: malformed construction input or a
/// driver that cannot supply a schema at all.
///
/// Schema errors never abort a whole resolution or normalization pass — the
/// affected driver's devices are skipped and everything else proceeds.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid option type '{0}'")]
    InvalidKind(String),

    #[error("invalid range '{0}'")]
    InvalidRange(String),

    #[error("invalid value '{value}' for type '{kind}'")]
    InvalidValue { value: String, kind: &'static str },

    #[error("valid ranges are not allowed on bool option '{0}'")]
    RangeOnBool(String),

    #[error("default value '{value}' of option '{option}' is out of valid range")]
    DefaultOutOfRange { option: String, value: String },

    #[error("enum label value '{value}' of option '{option}' is out of valid range")]
    LabelOutOfRange { option: String, value: String },

    #[error("no option schema available for driver '{0}'")]
    Unavailable(String),
}

/// Errors surfaced while loading or persisting configuration sources.
#[derive(Debug, Error)]
pub enum DrircError {
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to serialize {path}: {source}")]
    Serialize {
        path: PathBuf,
        source: toml::ser::Error,
    },

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

use std::fmt;
use std::path::PathBuf;

/// A fatal or per-call failure.
///
/// `Io` and `Structural` abort a parse. `Lookup` and `ImmutableWrite` are
/// per-call failures that leave the parsed tables untouched.
#[derive(Debug, thiserror::Error)]
pub enum TnsError {
    #[error("unable to read \"{}\": {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid entry structure in alias \"{alias}\" at {}: {message}", path.join("."))]
    Structural {
        alias: String,
        /// Tree path (keys from the alias root) where the collision happened.
        path: Vec<String>,
        message: String,
    },

    #[error("no key {0} exists")]
    Lookup(String),

    #[error("not allowed to modify \"{0}\": parsed entries are read-only")]
    ImmutableWrite(String),

    #[error("invalid snapshot format: {0}")]
    RestoreFormat(String),

    #[error("invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl TnsError {
    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            TnsError::Io { .. } => "tns-io-error",
            TnsError::InvalidArgument(_) => "tns-invalid-argument",
            TnsError::Structural { .. } => "tns-structural-error",
            TnsError::Lookup(_) => "tns-lookup-error",
            TnsError::ImmutableWrite(_) => "tns-immutable-write",
            TnsError::RestoreFormat(_) => "tns-restore-format",
            TnsError::InvalidPattern(_) => "tns-invalid-pattern",
            TnsError::Json(_) => "tns-json-error",
        }
    }

    pub(crate) fn structural(alias: &str, path: &[String], message: impl Into<String>) -> Self {
        TnsError::Structural {
            alias: alias.to_string(),
            path: path.to_vec(),
            message: message.into(),
        }
    }
}

pub type Result<T, E = TnsError> = std::result::Result<T, E>;

/// A non-fatal condition reported alongside a successful parse.
#[derive(Debug, Clone, PartialEq)]
pub enum TnsWarning {
    /// The source held no parseable content. `source` is the file path, or
    /// `"<string>"` for string input.
    EmptyInput { source: String },
}

impl TnsWarning {
    pub fn code(&self) -> &'static str {
        match self {
            TnsWarning::EmptyInput { .. } => "tns-empty-input",
        }
    }
}

impl fmt::Display for TnsWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TnsWarning::EmptyInput { source } => {
                write!(f, "{} appears to be empty ({})", source, self.code())
            }
        }
    }
}

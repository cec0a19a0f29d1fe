//! Error types shared by the merge engine and the `effconf` binary.
//!
//! Every failure the engine can report is a variant of [`EffconfError`]. Empty
//! extraction inside an otherwise successful projection is not an error at the
//! materialisation boundary; callers receive an empty result instead.

use std::fmt;

use thiserror::Error;

/// Stage of the pipeline at which JSON encoding or decoding failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStage {
    /// Encoding the hardcoded baseline, or reading a base document.
    BaseEncode,
    /// Parsing a captured fixture document.
    FixtureDecode,
    /// Parsing an external candidate document.
    ExternalDecode,
    /// Decoding a merge result into the caller's target type.
    ResultDecode,
}

impl fmt::Display for DecodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BaseEncode => "base encode",
            Self::FixtureDecode => "fixture decode",
            Self::ExternalDecode => "external decode",
            Self::ResultDecode => "result decode",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EffconfError {
    #[error("requested fixture kinds not found: {}", .kinds.join(", "))]
    MissingFixtureKind { kinds: Vec<String> },
    #[error("no values found for field '{field}' in requested fixtures")]
    FieldNotFound { field: Box<str> },
    #[error("{stage} failed: {message}")]
    Decode {
        stage: DecodeStage,
        message: Box<str>,
    },
    #[error("malformed entry: {0}")]
    MalformedEntry(Box<str>),
    #[error("unknown merge mode '{0}'")]
    UnknownMode(Box<str>),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration error: {0}")]
    Config(#[from] Box<ortho_config::OrthoError>),
}

impl EffconfError {
    /// Build a [`EffconfError::Decode`] for `stage` from any displayable cause.
    pub fn decode(stage: DecodeStage, message: impl fmt::Display) -> Self {
        Self::Decode {
            stage,
            message: message.to_string().into_boxed_str(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedEntry(message.into().into_boxed_str())
    }

    /// Returns the decoding stage when this is a [`EffconfError::Decode`].
    #[must_use]
    pub fn stage(&self) -> Option<DecodeStage> {
        match self {
            Self::Decode { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Decode `value` into `T`, reporting the failing JSON path on error.
///
/// # Errors
///
/// Returns [`EffconfError::Decode`] tagged with `stage` when `value` does not
/// have the shape `T` expects.
pub fn decode_value<T>(
    value: serde_json::Value,
    stage: DecodeStage,
    context: &str,
) -> Result<T, EffconfError>
where
    T: serde::de::DeserializeOwned,
{
    serde_path_to_error::deserialize::<_, T>(value).map_err(|e| {
        let path = e.path().to_string();
        let inner = e.into_inner();
        EffconfError::decode(stage, format!("{context}: {inner} at {path}"))
    })
}

use std::path::PathBuf;

/// Result alias that carries the custom [`GhostiesError`] type.
pub type Result<T> = std::result::Result<T, GhostiesError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum GhostiesError {
    /// Free-form message for failures that have no dedicated variant.
    #[error("{0}")]
    Message(String),
    /// A caller violated a precondition of an operation.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// The configuration parsed but holds values the program cannot run with.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A file the program needs at startup does not exist.
    #[error("asset `{}` not found", .0.display())]
    MissingAsset(PathBuf),
    /// The soundtrack exists but could not be decoded.
    #[error("failed to decode `{}`: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },
    /// The audio output device could not be opened.
    #[error("audio device error: {0}")]
    Device(String),
    /// Wrapper around JSON configuration errors.
    #[error("failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl GhostiesError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for GhostiesError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for GhostiesError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_asset_names_the_path() {
        let err = GhostiesError::MissingAsset(PathBuf::from("resources/soundtrack.mp3"));
        assert!(format!("{err}").contains("resources/soundtrack.mp3"));
    }

    #[test]
    fn converts_from_strings() {
        let err: GhostiesError = "boom".into();
        assert!(matches!(err, GhostiesError::Message(ref m) if m == "boom"));
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Repository error: {calendar_id} - {message}")]
    Repository {
        calendar_id: String,
        message: String,
    },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Config file parsing failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{operation} is not supported by the {repository} repository")]
    Unsupported {
        operation: &'static str,
        repository: &'static str,
    },

    #[error("Network timeout")]
    Timeout,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for failures that originate from the calendar provider or the
    /// network path to it.
    pub const fn is_repository_error(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Json(_) | Self::Repository { .. } | Self::Timeout
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

// Error types for the API and media layers

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    /// The API answered with a non-success status.
    #[error("API request failed with status {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Failed to send generate request: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Stream error: {0}")]
    Stream(String),
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Failed to read image {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed data URL: {0}")]
    DataUrl(String),
}

//! Error handling and custom error types
//!
//! Provides unified error handling across the server, client workflow and
//! share helpers using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Failure reported by (or while talking to) the generative backend.
    /// The message is matched by substring when classifying, so it carries
    /// the raw upstream body verbatim.
    #[error("{0}")]
    Backend(String),

    #[error("Stream decoding error: {0}")]
    Stream(String),

    #[error("Base64 decoding error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Share error: {0}")]
    Share(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

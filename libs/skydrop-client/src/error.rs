//! Error types for the Skydrop client

use thiserror::Error;

/// Errors returned by [`crate::SkydropClient`]
#[derive(Error, Debug)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("authentication error: {0}")]
    Authentication(String),

    #[error("token error: {0}")]
    Token(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}

use crate::parsing::error::ParsingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LivemapError {
    #[error("Parsing error: {0}")]
    Parsing(#[from] ParsingError),
    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to download data: {0}")]
    Download(#[from] reqwest::Error),
    #[error("Failed to build train info url: {0}")]
    Url(#[from] url::ParseError),
}

pub type LResult<T> = Result<T, LivemapError>;

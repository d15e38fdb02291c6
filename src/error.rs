//! Error handling and custom error types
//!
//! Provides unified error handling across the pipeline using thiserror.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// The tag is absent, unreadable, or holds a code outside 1-8.
    #[error("Image file has no usable EXIF orientation data: {}", path.display())]
    MissingOrientationData { path: PathBuf },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Malformed RPC response: {0}")]
    Rpc(String),

    #[error("RPC fault {code}: {message}")]
    RpcFault { code: i64, message: String },

    #[error("Upload endpoint returned status {status}: {body}")]
    UploadStatus { status: u16, body: String },

    #[error("Upload timed out")]
    Timeout,

    #[error("Invariant violated: {0}")]
    Invariant(String),
}

impl Error {
    /// Whether a retry of the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Timeout => true,
            Error::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            Error::UploadStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

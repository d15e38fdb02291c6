//! Media library uploads
//!
//! Classifies processed files by extension and submits them to a WordPress
//! site through its XML-RPC `wp.uploadFile` method.

pub mod client;
pub mod mime;
pub mod mock;
pub mod xmlrpc;

pub use client::WordPressClient;
pub use mock::MockMediaClient;

use crate::models::{UploadRequest, UploadResult};
use crate::{Error, Result};
use async_trait::async_trait;
use std::path::Path;

#[async_trait]
pub trait MediaService: Send + Sync {
    async fn upload_file(&self, request: &UploadRequest) -> Result<UploadResult>;
}

/// Read a processed file and package it for upload.
pub async fn build_request(path: &Path, mime_type: &str) -> Result<UploadRequest> {
    let name = path
        .file_name()
        .ok_or_else(|| Error::Invariant(format!("Invalid upload path: {}", path.display())))?
        .to_string_lossy()
        .into_owned();
    let bits = tokio::fs::read(path).await?;

    Ok(UploadRequest {
        name,
        mime_type: mime_type.to_string(),
        bits,
    })
}

use super::MediaService;
use crate::models::{UploadRequest, UploadResult};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// In-memory media library used for dry runs and tests.
#[derive(Clone)]
pub struct MockMediaClient {
    uploads: Arc<Mutex<Vec<UploadRequest>>>,
    base_url: String,
    failing_names: Arc<Mutex<HashSet<String>>>,
    transient_failures: Arc<Mutex<usize>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockMediaClient {
    pub fn new() -> Self {
        Self {
            uploads: Arc::new(Mutex::new(Vec::new())),
            base_url: "https://mock-media.example.com/wp-content/uploads".to_string(),
            failing_names: Arc::new(Mutex::new(HashSet::new())),
            transient_failures: Arc::new(Mutex::new(0)),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Reject every upload of `name` with an RPC fault.
    pub fn with_failure_for(self, name: &str) -> Self {
        self.failing_names
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_string());
        self
    }

    /// Time out the next `count` calls before succeeding.
    pub fn with_transient_failures(self, count: usize) -> Self {
        *self
            .transient_failures
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = count;
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get_uploads(&self) -> Vec<UploadRequest> {
        self.uploads
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Default for MockMediaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaService for MockMediaClient {
    async fn upload_file(&self, request: &UploadRequest) -> Result<UploadResult> {
        *self.call_count.lock().unwrap_or_else(|e| e.into_inner()) += 1;

        {
            let mut remaining = self
                .transient_failures
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            if *remaining > 0 {
                *remaining -= 1;
                return Err(Error::Timeout);
            }
        }

        if self
            .failing_names
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&request.name)
        {
            return Err(Error::RpcFault {
                code: 500,
                message: format!("Could not write file {}", request.name),
            });
        }

        let mut uploads = self.uploads.lock().unwrap_or_else(|e| e.into_inner());
        uploads.push(request.clone());

        Ok(UploadResult {
            id: uploads.len().to_string(),
            url: format!("{}/{}", self.base_url, request.name),
            mime_type: request.mime_type.clone(),
        })
    }
}

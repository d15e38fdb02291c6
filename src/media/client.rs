use super::{xmlrpc, MediaService};
use crate::config::UploadSettings;
use crate::models::{UploadRequest, UploadResult};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

/// WordPress XML-RPC media client.
pub struct WordPressClient {
    client: Client,
    endpoint: String,
    user: String,
    password: String,
}

impl WordPressClient {
    pub fn new(settings: &UploadSettings) -> Result<Self> {
        let client = Client::builder().timeout(settings.timeout).build()?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            user: settings.user.clone(),
            password: settings.password.clone(),
        })
    }
}

fn request_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout
    } else {
        Error::Http(e)
    }
}

#[async_trait]
impl MediaService for WordPressClient {
    async fn upload_file(&self, request: &UploadRequest) -> Result<UploadResult> {
        let body = xmlrpc::encode_upload_file(&self.user, &self.password, request);
        tracing::debug!(
            name = %request.name,
            bytes = request.bits.len(),
            "Sending wp.uploadFile to {}",
            self.endpoint
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "text/xml")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send upload request: {}", e);
                request_error(e)
            })?;

        let status = response.status();
        let text = response.text().await.map_err(request_error)?;

        if !status.is_success() {
            tracing::error!("Upload endpoint error (status {}): {}", status, text);
            return Err(Error::UploadStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        xmlrpc::decode_upload_response(&text).map_err(|e| {
            tracing::error!("Failed to parse upload response: {}\nBody: {}", e, text);
            e
        })
    }
}

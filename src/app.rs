//! Pipeline orchestration: process every input, then upload the results.

use crate::config::{Config, ProcessingConfig};
use crate::image::{ImageProcessor, ImageService};
use crate::media::{self, mime, MediaService, MockMediaClient, WordPressClient};
use crate::models::{
    FileFailure, ProcessedImage, RunReport, RunState, UploadOutcome, UploadRecord, UploadRequest,
    UploadResult,
};
use crate::output;
use crate::run_log::RunLog;
use crate::{Error, Result};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::RetryIf;
use tracing::{info, warn};

/// Coordinates image processing and media uploads for one batch.
pub struct App {
    image: Box<dyn ImageService>,
    media: Option<Box<dyn MediaService>>,
    processing: ProcessingConfig,
    retries: usize,
    log: Arc<RunLog>,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub image: Box<dyn ImageService>,
    /// `None` runs in process-only mode.
    pub media: Option<Box<dyn MediaService>>,
}

impl App {
    /// Build an app from concrete service dependencies.
    pub fn with_services(
        services: AppServices,
        processing: ProcessingConfig,
        retries: usize,
        log: Arc<RunLog>,
    ) -> Self {
        Self {
            image: services.image,
            media: services.media,
            processing,
            retries,
            log,
        }
    }

    /// Construct an app from the loaded configuration.
    ///
    /// Missing or incomplete upload settings disable the upload phase.
    pub fn new(config: &Config, dry_run: bool, log: Arc<RunLog>) -> Result<Self> {
        let (media, retries): (Option<Box<dyn MediaService>>, usize) =
            match config.upload_settings() {
                Ok(settings) => {
                    log.verbose(format!("URL: {}", settings.endpoint));
                    log.verbose(format!("User: {}", settings.user));
                    let media: Box<dyn MediaService> = if dry_run {
                        info!("Dry run enabled, uploads go to an in-memory media library");
                        Box::new(MockMediaClient::new())
                    } else {
                        Box::new(WordPressClient::new(&settings)?)
                    };
                    (Some(media), settings.retries)
                }
                Err(reason) => {
                    log.info(format!("Not uploading ({}).", reason));
                    log.info("Not uploading images.");
                    (None, 0)
                }
            };

        Ok(Self::with_services(
            AppServices {
                image: Box::new(ImageProcessor::new()),
                media,
            },
            config.processing(),
            retries,
            log,
        ))
    }

    pub fn uploads_enabled(&self) -> bool {
        self.media.is_some()
    }

    /// Run the batch over `files`, placing output under the month of `date`.
    ///
    /// Only configuration and output-directory problems abort the run; every
    /// per-file problem is captured in the returned report.
    pub async fn run(&self, files: &[PathBuf], date: NaiveDate) -> Result<RunReport> {
        let dated = output::dated_dir(&self.processing.out_dir, date);
        let mut report = RunReport::new(dated.clone());

        self.log
            .verbose(format!("Image width: {}", self.processing.max_width));
        self.log
            .verbose(format!("Image output directory: {}", dated.display()));
        self.log
            .verbose(format!("Rotate image: {}", self.processing.rotate));

        let inputs = self.distinct_inputs(files, &mut report);
        self.log.info("Images to be processed:");
        for path in &inputs {
            self.log.info(format!(" - {}", path.display()));
        }

        let (output_dir, created) = output::ensure_output_dir(&self.processing.out_dir, date)
            .map_err(|e| {
                self.log.error(format!(
                    "Cannot create output directory '{}': {}",
                    dated.display(),
                    e
                ));
                e
            })?;
        if created {
            self.log.info(format!(
                "Created directory '{}' for images",
                output_dir.display()
            ));
        }

        report.state = RunState::Processing;
        let mut claimed: HashMap<OsString, PathBuf> = HashMap::new();
        for path in inputs {
            self.log
                .info(format!("processing image: {}", path.display()));
            if let Some(owner) = path.file_name().and_then(|name| claimed.get(name)) {
                let reason = format!("output name already used by '{}'", owner.display());
                self.log
                    .error(format!("Failed to process '{}': {}", path.display(), reason));
                report.failures.push(FileFailure {
                    path: path.clone(),
                    reason,
                });
                continue;
            }
            match self
                .image
                .process_image(path, &self.processing, &output_dir)
                .await
            {
                Ok(processed) => {
                    if let Some(name) = path.file_name() {
                        claimed.insert(name.to_os_string(), path.clone());
                    }
                    self.log_processed(&processed);
                    report.processed.push(processed);
                }
                Err(e) => {
                    self.log
                        .error(format!("Failed to process '{}': {}", path.display(), e));
                    report.failures.push(FileFailure {
                        path: path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if let Some(media) = &self.media {
            report.state = RunState::Uploading;
            self.log.info("Connecting to wordpress site...");
            self.log.verbose("Uploading images...");

            for processed in &report.processed {
                let outcome = self.upload_one(media.as_ref(), processed).await;
                report.uploads.push(UploadRecord {
                    path: processed.destination.clone(),
                    outcome,
                });
            }
        }

        report.state = RunState::Done;
        self.log_summary(&report);
        Ok(report)
    }

    fn distinct_inputs<'a>(
        &self,
        files: &'a [PathBuf],
        report: &mut RunReport,
    ) -> Vec<&'a PathBuf> {
        let mut seen = HashSet::new();
        let mut inputs = Vec::with_capacity(files.len());
        for path in files {
            // Unreadable paths keep their raw form and fail during processing.
            let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.clone());
            if seen.insert(key) {
                inputs.push(path);
            } else {
                self.log
                    .info(format!("Skipping duplicate input '{}'", path.display()));
                report.skipped_inputs.push(path.clone());
            }
        }
        inputs
    }

    fn log_processed(&self, processed: &ProcessedImage) {
        self.log.debug(format!(
            "Image dimensions before rotation: ({}x{})",
            processed.original_width, processed.original_height
        ));

        if let Some(orientation) = processed.orientation {
            self.log.info(format!(
                "{} orientation: ({}) {}",
                processed.source.display(),
                orientation.code(),
                orientation.label()
            ));
            if processed.rotated {
                self.log.info(format!(
                    "rotating image {} degrees",
                    orientation.degrees()
                ));
            }
        }

        self.log.debug(format!(
            "Image dimensions after rotation: ({}x{})",
            processed.rotated_width, processed.rotated_height
        ));

        if processed.resized {
            self.log.verbose(format!(
                "Resizing image to ({}x{})",
                processed.width, processed.height
            ));
        }

        self.log.verbose(format!(
            "saved updated image to {} ({}x{})",
            processed.destination.display(),
            processed.width,
            processed.height
        ));
    }

    async fn upload_one(
        &self,
        media: &dyn MediaService,
        processed: &ProcessedImage,
    ) -> UploadOutcome {
        let path = &processed.destination;

        let Some(mime_type) = mime::classify(path) else {
            let extension = path
                .extension()
                .map(|ext| format!(".{}", ext.to_string_lossy()))
                .unwrap_or_default();
            self.log
                .info(format!("Unknown image type for extension '{}'", extension));
            self.log.info(format!("Skipping '{}'", path.display()));
            return UploadOutcome::Skipped {
                reason: format!("unknown image type for extension '{}'", extension),
            };
        };

        let request = match media::build_request(path, mime_type).await {
            Ok(request) => request,
            Err(e) => return self.upload_failed(path, e),
        };

        self.log
            .info(format!("Uploading {} ({})", request.name, mime_type));

        match self.upload_with_retry(media, &request).await {
            Ok(result) => {
                self.log
                    .info(format!("[id: {}] mimetype: {}", result.id, result.mime_type));
                self.log.info(format!("    url: {}", result.url));
                UploadOutcome::Uploaded(result)
            }
            Err(e) => self.upload_failed(path, e),
        }
    }

    fn upload_failed(&self, path: &Path, e: Error) -> UploadOutcome {
        self.log
            .error(format!("Failed to upload '{}': {}", path.display(), e));
        UploadOutcome::Failed {
            reason: e.to_string(),
        }
    }

    async fn upload_with_retry(
        &self,
        media: &dyn MediaService,
        request: &UploadRequest,
    ) -> Result<UploadResult> {
        let retry_strategy = ExponentialBackoff::from_millis(2)
            .factor(250)
            .max_delay(Duration::from_secs(8))
            .take(self.retries);

        RetryIf::spawn(
            retry_strategy,
            || async move {
                media.upload_file(request).await.map_err(|e| {
                    if e.is_transient() {
                        warn!("[{}] Upload attempt failed: {}", request.name, e);
                    }
                    e
                })
            },
            |e: &Error| e.is_transient(),
        )
        .await
    }

    fn log_summary(&self, report: &RunReport) {
        let summary = format!(
            "Processed {} image(s), {} failed, {} duplicate(s) skipped",
            report.processed.len(),
            report.failures.len(),
            report.skipped_inputs.len()
        );
        self.log.info(summary);

        if self.media.is_some() {
            let summary = format!(
                "Uploaded {} image(s), {} skipped, {} failed",
                report.uploaded().count(),
                report.upload_skips(),
                report.upload_failures()
            );
            self.log.info(summary);
        }
    }
}

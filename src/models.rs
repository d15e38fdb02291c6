//! Data models and structures
//!
//! Defines the per-file records that flow through the pipeline, from the
//! decoded source image to the outcome of its upload.

use crate::image::Orientation;
use image::ImageFormat;
use std::path::PathBuf;

/// A decoded input image and the metadata read alongside it.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub format: Option<ImageFormat>,
    /// Raw EXIF orientation code, when one could be read.
    pub orientation: Option<u32>,
}

/// An image after rotation/resize, written to the output directory.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedImage {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub original_width: u32,
    pub original_height: u32,
    pub orientation: Option<Orientation>,
    pub rotated: bool,
    /// Dimensions after rotation, before resizing.
    pub rotated_width: u32,
    pub rotated_height: u32,
    pub resized: bool,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub name: String,
    pub mime_type: String,
    pub bits: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadResult {
    pub id: String,
    pub url: String,
    pub mime_type: String,
}

/// A file that could not be processed, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Uploaded(UploadResult),
    Skipped { reason: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadRecord {
    pub path: PathBuf,
    pub outcome: UploadOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    Processing,
    Uploading,
    Done,
}

/// Aggregated results of one run, in input order.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub state: RunState,
    pub output_dir: PathBuf,
    pub processed: Vec<ProcessedImage>,
    pub failures: Vec<FileFailure>,
    pub skipped_inputs: Vec<PathBuf>,
    pub uploads: Vec<UploadRecord>,
}

impl RunReport {
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            state: RunState::Init,
            output_dir,
            processed: Vec::new(),
            failures: Vec::new(),
            skipped_inputs: Vec::new(),
            uploads: Vec::new(),
        }
    }

    pub fn uploaded(&self) -> impl Iterator<Item = &UploadResult> {
        self.uploads.iter().filter_map(|record| match &record.outcome {
            UploadOutcome::Uploaded(result) => Some(result),
            _ => None,
        })
    }

    pub fn upload_skips(&self) -> usize {
        self.uploads
            .iter()
            .filter(|r| matches!(r.outcome, UploadOutcome::Skipped { .. }))
            .count()
    }

    pub fn upload_failures(&self) -> usize {
        self.uploads
            .iter()
            .filter(|r| matches!(r.outcome, UploadOutcome::Failed { .. }))
            .count()
    }
}

//! Image orientation correction and resizing
//!
//! Decodes each source image, applies the EXIF corrective rotation, scales it
//! down to the configured maximum width and writes it to the output directory.

pub mod orientation;
pub mod processor;
pub mod resize;

pub use orientation::Orientation;
pub use processor::ImageProcessor;

use crate::config::ProcessingConfig;
use crate::models::ProcessedImage;
use crate::Result;
use async_trait::async_trait;
use std::path::Path;

#[async_trait]
pub trait ImageService: Send + Sync {
    /// Process one source file into `dest_dir`, which must already exist.
    async fn process_image(
        &self,
        source: &Path,
        config: &ProcessingConfig,
        dest_dir: &Path,
    ) -> Result<ProcessedImage>;
}

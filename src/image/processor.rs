use super::orientation::{self, Orientation};
use super::{resize, ImageService};
use crate::config::ProcessingConfig;
use crate::models::{ProcessedImage, SourceImage};
use crate::{Error, Result};
use async_trait::async_trait;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Filesystem-backed image transformer.
pub struct ImageProcessor;

impl ImageProcessor {
    pub fn new() -> Self {
        Self
    }

    fn decode(path: &Path) -> Result<(SourceImage, DynamicImage)> {
        let bytes = std::fs::read(path)?;
        let reader = ImageReader::new(Cursor::new(bytes.as_slice())).with_guessed_format()?;
        let format = reader.format();
        let image = reader.decode()?;

        let source = SourceImage {
            path: path.to_path_buf(),
            width: image.width(),
            height: image.height(),
            format,
            orientation: orientation::read_orientation_code(&bytes),
        };

        Ok((source, image))
    }

    fn rotate(image: DynamicImage, degrees: i32) -> DynamicImage {
        match degrees {
            180 => image.rotate180(),
            -90 => image.rotate90(),
            -270 => image.rotate270(),
            _ => image,
        }
    }

    fn save(image: DynamicImage, destination: &Path) -> Result<()> {
        let format = ImageFormat::from_path(destination)?;
        let image = if format == ImageFormat::Jpeg && image.color().has_alpha() {
            DynamicImage::ImageRgb8(image.to_rgb8())
        } else {
            image
        };
        image.save_with_format(destination, format)?;
        Ok(())
    }

    fn process_sync(
        source_path: PathBuf,
        config: ProcessingConfig,
        dest_dir: PathBuf,
    ) -> Result<ProcessedImage> {
        let file_name = source_path.file_name().ok_or_else(|| {
            Error::Invariant(format!(
                "Source path has no file name: {}",
                source_path.display()
            ))
        })?;
        let destination = dest_dir.join(file_name);

        let (source, mut image) = Self::decode(&source_path)?;
        tracing::debug!(
            path = %source.path.display(),
            width = source.width,
            height = source.height,
            format = ?source.format,
            "Decoded source image"
        );

        let mut resolved: Option<Orientation> = None;
        let mut rotated = false;
        if config.rotate {
            resolved = orientation::resolve(&source)?;
            if let Some(orientation) = resolved.filter(|o| o.needs_rotation()) {
                image = Self::rotate(image, orientation.degrees());
                rotated = true;
            }
        }

        let (rotated_width, rotated_height) = (image.width(), image.height());
        let (target_width, target_height) =
            resize::plan(rotated_width, rotated_height, config.max_width);
        let resized = (target_width, target_height) != (rotated_width, rotated_height);
        if resized {
            image = image.resize_exact(target_width, target_height, FilterType::Lanczos3);
        }

        let (width, height) = (image.width(), image.height());
        Self::save(image, &destination)?;

        Ok(ProcessedImage {
            source: source.path,
            destination,
            original_width: source.width,
            original_height: source.height,
            orientation: resolved,
            rotated,
            rotated_width,
            rotated_height,
            resized,
            width,
            height,
        })
    }
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageService for ImageProcessor {
    async fn process_image(
        &self,
        source: &Path,
        config: &ProcessingConfig,
        dest_dir: &Path,
    ) -> Result<ProcessedImage> {
        tokio::task::spawn_blocking({
            let source = source.to_path_buf();
            let config = config.clone();
            let dest_dir = dest_dir.to_path_buf();
            move || Self::process_sync(source, config, dest_dir)
        })
        .await
        .map_err(|e| Error::Invariant(format!("Image processing task join error: {}", e)))?
    }
}

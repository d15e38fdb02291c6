use crate::models::SourceImage;
use crate::{Error, Result};
use exif::{In, Reader, Tag};
use image::ImageFormat;
use std::io::Cursor;

/// EXIF orientation values (tag 0x0112).
///
/// Only the pure rotations are corrected. Mirrored variants are recognised
/// but map to a zero-degree rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Normal,
    MirroredHorizontal,
    Rotated180,
    MirroredVertical,
    MirroredTopLeft,
    Rotated90,
    MirroredTopRight,
    Rotated270,
}

impl Orientation {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Normal),
            2 => Some(Self::MirroredHorizontal),
            3 => Some(Self::Rotated180),
            4 => Some(Self::MirroredVertical),
            5 => Some(Self::MirroredTopLeft),
            6 => Some(Self::Rotated90),
            7 => Some(Self::MirroredTopRight),
            8 => Some(Self::Rotated270),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        match self {
            Self::Normal => 1,
            Self::MirroredHorizontal => 2,
            Self::Rotated180 => 3,
            Self::MirroredVertical => 4,
            Self::MirroredTopLeft => 5,
            Self::Rotated90 => 6,
            Self::MirroredTopRight => 7,
            Self::Rotated270 => 8,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::MirroredHorizontal => "Mirrored left-to-right",
            Self::Rotated180 => "Rotated 180 degrees",
            Self::MirroredVertical => "Mirrored top-to-bottom",
            Self::MirroredTopLeft => "Mirrored along top-left diagonal",
            Self::Rotated90 => "Rotated 90 degrees",
            Self::MirroredTopRight => "Mirrored along top-right diagonal",
            Self::Rotated270 => "Rotated 270 degrees",
        }
    }

    /// Corrective rotation in degrees, counter-clockwise positive.
    pub fn degrees(self) -> i32 {
        match self {
            Self::Rotated180 => 180,
            Self::Rotated90 => -90,
            Self::Rotated270 => -270,
            _ => 0,
        }
    }

    pub fn needs_rotation(self) -> bool {
        self.degrees() != 0
    }
}

/// Formats whose orientation metadata is honoured.
pub fn carries_orientation(format: Option<ImageFormat>) -> bool {
    matches!(format, Some(ImageFormat::Jpeg))
}

/// Read the primary-IFD orientation code from an encoded image.
///
/// Returns `None` when there is no EXIF block, no orientation tag, or the
/// tag is not an unsigned integer.
pub fn read_orientation_code(bytes: &[u8]) -> Option<u32> {
    let exif = match Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => exif,
        Err(e) => {
            tracing::debug!("No readable EXIF block: {}", e);
            return None;
        }
    };

    exif.get_field(Tag::Orientation, In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
}

/// Decide the corrective orientation for a source image.
///
/// `Ok(None)` means the format does not carry orientation metadata and
/// correction is skipped.
pub fn resolve(source: &SourceImage) -> Result<Option<Orientation>> {
    if !carries_orientation(source.format) {
        return Ok(None);
    }

    let code = source
        .orientation
        .ok_or_else(|| Error::MissingOrientationData {
            path: source.path.clone(),
        })?;

    match Orientation::from_code(code) {
        Some(orientation) => Ok(Some(orientation)),
        None => {
            tracing::warn!(path = %source.path.display(), code, "Malformed EXIF orientation");
            Err(Error::MissingOrientationData {
                path: source.path.clone(),
            })
        }
    }
}

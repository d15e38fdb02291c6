//! Shared image fixtures for unit tests.

use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([200, 40, 40]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

pub fn plain_jpeg(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Jpeg)
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

/// JPEG with an APP1 EXIF segment holding a single orientation tag.
pub fn jpeg_with_orientation(width: u32, height: u32, code: u16) -> Vec<u8> {
    let jpeg = plain_jpeg(width, height);

    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II");
    tiff.extend_from_slice(&42u16.to_le_bytes());
    tiff.extend_from_slice(&8u32.to_le_bytes());
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x0112u16.to_le_bytes());
    tiff.extend_from_slice(&3u16.to_le_bytes());
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&code.to_le_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&0u32.to_le_bytes());

    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&tiff);

    let mut out = Vec::with_capacity(jpeg.len() + payload.len() + 4);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// A `wp.uploadFile` success response as WordPress formats it.
pub fn success_response(id: &str, url: &str, mime: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<methodResponse>
  <params>
<param>
  <value>
  <struct>
  <member><name>id</name><value><string>{}</string></value></member>
  <member><name>file</name><value><string>photo.jpg</string></value></member>
  <member><name>url</name><value><string>{}</string></value></member>
  <member><name>type</name><value><string>{}</string></value></member>
</struct>
  </value>
</param>
  </params>
</methodResponse>"#,
        id, url, mime
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::orientation::read_orientation_code;

    #[test]
    fn test_fixture_orientation_is_readable() {
        let bytes = jpeg_with_orientation(8, 4, 6);
        assert_eq!(read_orientation_code(&bytes), Some(6));
        assert_eq!(read_orientation_code(&plain_jpeg(8, 4)), None);
    }
}

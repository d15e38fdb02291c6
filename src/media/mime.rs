use std::path::Path;

/// MIME type for an upload, keyed on the file extension (case-insensitive).
///
/// `None` means the file type is not accepted by the upload endpoint.
pub fn classify(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use genlab_contracts::request::EncodedImage;

use crate::error::AttachmentError;

/// Reads an image file and encodes it for a JSON body.
///
/// Files above `limit_bytes` are rejected before they are read. The MIME type
/// is sniffed from the content; the extension is only trusted for image
/// formats the sniffer does not know.
pub fn encode_file(path: &Path, limit_bytes: u64) -> Result<EncodedImage, AttachmentError> {
    let unreadable = |err: std::io::Error| AttachmentError::Unreadable {
        path: path.to_path_buf(),
        message: err.to_string(),
    };
    let size = fs::metadata(path).map_err(unreadable)?.len();
    check_size(size, limit_bytes)?;
    let bytes = fs::read(path).map_err(unreadable)?;
    encode_bytes(&bytes, mime_for_path(path), limit_bytes)
}

pub fn encode_bytes(
    bytes: &[u8],
    declared_mime: Option<&str>,
    limit_bytes: u64,
) -> Result<EncodedImage, AttachmentError> {
    let size = bytes.len() as u64;
    check_size(size, limit_bytes)?;
    let mime_type = resolve_mime(bytes, declared_mime)?;
    Ok(EncodedImage {
        mime_type,
        size_bytes: size,
        data: BASE64.encode(bytes),
    })
}

fn check_size(size: u64, limit: u64) -> Result<(), AttachmentError> {
    if size > limit {
        return Err(AttachmentError::TooLarge { size, limit });
    }
    Ok(())
}

fn resolve_mime(bytes: &[u8], declared: Option<&str>) -> Result<String, AttachmentError> {
    if let Ok(format) = image::guess_format(bytes) {
        return Ok(format.to_mime_type().to_string());
    }
    let declared = declared
        .map(|value| value.trim().to_ascii_lowercase())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "application/octet-stream".to_string());
    if declared.starts_with("image/") {
        return Ok(declared);
    }
    Err(AttachmentError::InvalidType(declared))
}

fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "heic" => Some("image/heic"),
        "txt" => Some("text/plain"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}

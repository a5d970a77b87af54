use crate::error::MediaError;

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

pub fn extension_from_filename(file_name: &str) -> Option<String> {
    if let Some((_, ext)) = file_name.rsplit_once('.') {
        let trimmed = ext.trim();
        if !trimmed.is_empty() && trimmed != file_name {
            return Some(trimmed.to_lowercase());
        }
    }
    None
}

/// Precondition gate: extension allow-list, then size ceiling. Runs before
/// any decode is attempted; has no side effects. Returns the lowercased
/// extension on success.
pub fn validate_upload(payload_len: usize, file_name: &str) -> Result<String, MediaError> {
    let ext = extension_from_filename(file_name)
        .ok_or_else(|| MediaError::UnsupportedFormat(String::new()))?;
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(MediaError::UnsupportedFormat(ext));
    }
    if payload_len > MAX_UPLOAD_BYTES {
        return Err(MediaError::PayloadTooLarge {
            size: payload_len,
            limit: MAX_UPLOAD_BYTES,
        });
    }
    Ok(ext)
}

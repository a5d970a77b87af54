use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// Every self-describing inline image starts with this.
pub const INLINE_MARKER: &str = "data:image/";

/// Marker for the payloads this service produces (all variants are
/// transcoded to JPEG).
pub const JPEG_MARKER: &str = "data:image/jpeg;base64,";

pub fn encode_jpeg_inline(bytes: &[u8]) -> String {
    format!("{JPEG_MARKER}{}", STANDARD.encode(bytes))
}

pub fn is_inline(value: &str) -> bool {
    value.starts_with(INLINE_MARKER)
}

/// Older rows stored the raw base64 payload without the data-URL marker;
/// give them one. Already-marked values pass through unchanged.
pub fn ensure_marker(value: &str) -> String {
    if is_inline(value) {
        value.to_string()
    } else {
        format!("{JPEG_MARKER}{value}")
    }
}

/// Decode the base64 payload of an inline string, marked or not.
pub fn decode_payload(value: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = value
        .split_once("base64,")
        .map(|(_, payload)| payload)
        .unwrap_or(value);
    STANDARD.decode(payload.trim())
}

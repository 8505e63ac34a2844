use crate::error::MediaError;

/// Accepted content types and the extension stored files receive.
pub const ALLOWED_MIME_TYPES: &[(&str, &str)] = &[
    ("image/png", ".png"),
    ("image/jpeg", ".jpg"),
    ("image/webp", ".webp"),
    ("image/gif", ".gif"),
    ("video/mp4", ".mp4"),
    ("video/webm", ".webm"),
    ("video/ogg", ".ogv"),
];

/// Maps a declared content type to its canonical extension.
///
/// Matching is exact and case-sensitive; the bytes themselves are never
/// inspected.
pub fn extension_for(content_type: &str) -> Result<&'static str, MediaError> {
    ALLOWED_MIME_TYPES
        .iter()
        .find(|(allowed, _)| *allowed == content_type)
        .map(|(_, ext)| *ext)
        .ok_or_else(|| MediaError::UnsupportedType {
            content_type: content_type.to_string(),
        })
}

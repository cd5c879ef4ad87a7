use crate::models::MediaType;
use std::path::Path;

/// Fallback for extensions missing from [`MIME_TYPES`].
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Extension (lowercase, no dot) to MIME type.
const MIME_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("mov", "video/quicktime"),
];

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Replaces every character outside `[A-Za-z0-9.-]` with `_`.
///
/// Path separators are replaced like any other character, so the result can
/// never escape the category directory once prefixed with an id.
pub fn sanitize_filename(original_name: &str) -> String {
    original_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Builds the on-disk name `<id>_<sanitized original name>`.
pub fn storage_filename(id: &str, original_name: &str) -> String {
    format!("{}_{}", id, sanitize_filename(original_name))
}

/// Looks up the MIME type for a filename by extension. Matching ignores case.
pub fn mime_type_for(filename: &str) -> &'static str {
    let Some(ext) = Path::new(filename).extension().and_then(|e| e.to_str()) else {
        return DEFAULT_MIME_TYPE;
    };
    let ext = ext.to_ascii_lowercase();

    MIME_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
        .unwrap_or(DEFAULT_MIME_TYPE)
}

/// Sniffs the leading bytes and checks that they agree with the declared kind.
///
/// Content that `infer` does not recognize is let through; only a positive
/// detection of the wrong top-level type is rejected.
pub fn verify_declared_type(bytes: &[u8], declared: MediaType) -> Result<(), ValidationError> {
    let Some(kind) = infer::get(bytes) else {
        tracing::debug!("Unrecognized content for declared type '{}', allowing", declared);
        return Ok(());
    };

    let detected: mime::Mime = match kind.mime_type().parse() {
        Ok(m) => m,
        Err(_) => return Ok(()),
    };

    let expected = match declared {
        MediaType::Image => mime::IMAGE,
        MediaType::Video | MediaType::Reel => mime::VIDEO,
    };

    if detected.type_() == expected {
        return Ok(());
    }

    Err(ValidationError {
        code: "TYPE_MISMATCH",
        message: format!(
            "Declared type '{}' does not match detected content '{}'",
            declared,
            kind.mime_type()
        ),
    })
}

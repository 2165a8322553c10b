//! File type allow-list and storage-safe file names.

use chrono::Utc;
use uuid::Uuid;

/// Longest name [`sanitize_file_name`] returns, in bytes.
pub const MAX_FILE_NAME_LEN: usize = 255;

/// Longest base-name prefix kept in a storage name, in characters.
pub const MAX_STORAGE_BASE_LEN: usize = 50;

/// Longest suffix treated as a file extension.
const MAX_EXTENSION_LEN: usize = 10;

/// Accepted MIME types and the extensions each may carry.
const ALLOWED_TYPES: &[(&str, &[&str])] = &[
    ("application/pdf", &["pdf"]),
    ("image/jpeg", &["jpg", "jpeg"]),
    ("image/png", &["png"]),
    ("image/gif", &["gif"]),
    ("image/webp", &["webp"]),
];

/// Returns `true` if both the declared MIME type and the file extension are
/// allowed and agree with each other. Both checks ignore case.
pub fn validate_type(mime_type: &str, file_name: &str) -> bool {
    let mime = mime_type.trim().to_ascii_lowercase();
    let Some((_, ext)) = split_extension(file_name) else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();
    ALLOWED_TYPES
        .iter()
        .any(|(m, exts)| *m == mime && exts.contains(&ext.as_str()))
}

/// Replace every character outside `[A-Za-z0-9._-]` with `_`, collapse runs of
/// `_`, and cap the result at [`MAX_FILE_NAME_LEN`] bytes.
///
/// Path separators never survive, so the result cannot escape a directory.
pub fn sanitize_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len().min(MAX_FILE_NAME_LEN));
    for c in name.chars() {
        let c = if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            c
        } else {
            '_'
        };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    // Only ASCII remains, so any byte index is a char boundary.
    out.truncate(MAX_FILE_NAME_LEN);
    out
}

/// Unique storage key for an uploaded file:
/// `{base≤50}_{unix millis}_{8 hex}{.ext}`.
///
/// The caller-supplied name only contributes a sanitised prefix; the
/// timestamp and random suffix make the key unique.
pub fn generate_storage_name(original_name: &str) -> String {
    let (stem, ext) = match split_extension(original_name) {
        Some((stem, ext)) => (stem, format!(".{}", ext.to_ascii_lowercase())),
        None => (original_name, String::new()),
    };

    let mut base: String = sanitize_file_name(stem)
        .chars()
        .take(MAX_STORAGE_BASE_LEN)
        .collect();
    if base.trim_matches(|c| c == '_' || c == '.').is_empty() {
        base = "file".into();
    }

    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{base}_{}_{}{ext}",
        Utc::now().timestamp_millis(),
        &suffix[..8]
    )
}

/// Split `name` into stem and extension (without the dot).
///
/// Only a short alphanumeric suffix after the last dot counts as an extension.
fn split_extension(name: &str) -> Option<(&str, &str)> {
    let (stem, ext) = name.rsplit_once('.')?;
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.bytes().all(|b| b.is_ascii_alphanumeric())
    {
        return None;
    }
    Some((stem, ext))
}

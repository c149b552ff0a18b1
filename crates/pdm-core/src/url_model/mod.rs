//! URL modeling and filename derivation.
//!
//! Derives a safe local filename from the URL path, sanitized for Linux
//! filesystems, with one content-type correction for JPEG images.

mod path;
mod sanitize;

pub use path::filename_from_url_path;
pub use sanitize::sanitize_filename_for_linux;

use url::Url;

/// Default filename when the URL path yields nothing usable.
pub const DEFAULT_FILENAME: &str = "download.bin";

/// Derives a safe filename for saving a download.
///
/// Uses the last non-empty path segment of `url` (percent-decoded), sanitized
/// for Linux. When `content_type` is `image/jpeg` and the name has no
/// `.jpg`/`.jpeg` extension, `.jpg` is appended.
///
/// # Examples
///
/// - `https://example.com/archive.zip` → `"archive.zip"`
/// - `https://cdn.example.com/p/photo` with `image/jpeg` → `"photo.jpg"`
pub fn derive_filename(url: &Url, content_type: Option<&str>) -> String {
    let name = filename_from_url_path(url)
        .map(|raw| sanitize_filename_for_linux(&raw))
        .filter(|s| !s.is_empty() && s != "." && s != "..")
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string());

    if is_jpeg(content_type) && !has_jpeg_extension(&name) {
        format!("{}.jpg", name)
    } else {
        name
    }
}

/// True for `image/jpeg`, ignoring case and media-type parameters.
fn is_jpeg(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("image/jpeg"))
}

fn has_jpeg_extension(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg")
        }
        _ => false,
    }
}

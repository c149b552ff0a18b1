//! Filename extraction from URL path.

use percent_encoding::percent_decode_str;
use url::Url;

/// Last non-empty path segment of `url`, percent-decoded.
///
/// Returns `None` for an empty or root path, or a `.`/`..` segment.
pub fn filename_from_url_path(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let decoded = percent_decode_str(segment).decode_utf8_lossy().into_owned();
    if decoded.is_empty() || decoded == "." || decoded == ".." {
        return None;
    }
    Some(decoded)
}

//! Last path segment of a URI.

use percent_encoding::percent_decode_str;
use url::Url;

/// Last non-empty path segment of `uri`, percent-decoded.
///
/// Returns `None` for an empty or root path.
pub fn last_path_segment(uri: &Url) -> Option<String> {
    let segment = uri.path().split('/').filter(|s| !s.is_empty()).last()?;
    Some(percent_decode_str(segment).decode_utf8_lossy().into_owned())
}

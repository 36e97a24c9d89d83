//! Default script names derived from source URIs.
//!
//! Candidates come from the URI itself or, for `content://` URIs, from the
//! resolver. Each candidate is normalized (spaces to `_`, extension dropped)
//! and must be a valid identifier; the first one that passes wins.

mod identifier;
mod path;

pub use identifier::{accept_candidate, is_valid_script_name, normalize_candidate};
pub use path::last_path_segment;

use url::Url;

use crate::resolver::ContentResolver;

/// Schemes a script can be imported from.
pub const SUPPORTED_SCHEMES: [&str; 5] = ["content", "resource", "file", "http", "https"];

pub fn is_supported_scheme(scheme: &str) -> bool {
    SUPPORTED_SCHEMES.contains(&scheme)
}

/// Derives a default script name for `uri`, or `""` if none can be found.
///
/// - `file`, `resource`, `http`, `https`: the last path segment.
/// - `content`: the resolver's display name, then the file name behind an
///   opened descriptor, then the last path segment.
/// - anything else: `""`.
///
/// Resolver failures never escape; the next candidate is tried instead.
///
/// # Examples
///
/// - `file:///tmp/hello.world.groovy` → `"hello"`
/// - `content://…` displayed as `"My Script.groovy"` → `"My_Script"`
pub fn derive_name(uri: &Url, resolver: Option<&dyn ContentResolver>) -> String {
    let derived = match uri.scheme() {
        "file" | "resource" | "http" | "https" => from_path_segment(uri),
        "content" => resolver
            .and_then(|r| from_display_name(uri, r).or_else(|| from_descriptor(uri, r)))
            .or_else(|| from_path_segment(uri)),
        other => {
            tracing::debug!(scheme = other, "no name derivation for scheme");
            None
        }
    };
    derived.unwrap_or_default()
}

fn from_path_segment(uri: &Url) -> Option<String> {
    accept_candidate(last_path_segment(uri).as_deref())
}

fn from_display_name(uri: &Url, resolver: &dyn ContentResolver) -> Option<String> {
    match resolver.query_display_name(uri) {
        Ok(name) => accept_candidate(name.as_deref()),
        Err(e) => {
            tracing::debug!(%uri, "display name query failed: {}", e);
            None
        }
    }
}

fn from_descriptor(uri: &Url, resolver: &dyn ContentResolver) -> Option<String> {
    let path = match resolver.open_descriptor(uri) {
        // The descriptor is closed as soon as the path is read back.
        Ok(descriptor) => resolver.descriptor_path(&descriptor),
        Err(e) => {
            tracing::debug!(%uri, "open descriptor failed: {}", e);
            None
        }
    }?;
    let file_name = path.file_name()?.to_string_lossy();
    accept_candidate(Some(&*file_name))
}

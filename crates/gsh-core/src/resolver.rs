//! Resolver interface for `content://` and `resource://` URIs.
//!
//! Name derivation and source opening only depend on this trait. The
//! directory-backed implementation maps URIs onto files under a root dir.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("no content for {0}")]
    NotFound(String),
    #[error("cannot resolve {0}")]
    Unsupported(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Metadata and descriptor access for resolver-backed URIs.
pub trait ContentResolver {
    /// Display name of the content, if the provider knows one.
    fn query_display_name(&self, uri: &Url) -> Result<Option<String>, ResolverError>;

    /// Open a readable descriptor. Closed when the returned `File` is dropped.
    fn open_descriptor(&self, uri: &Url) -> Result<File, ResolverError>;

    /// Filesystem path behind an open descriptor, when it can be recovered.
    fn descriptor_path(&self, descriptor: &File) -> Option<PathBuf> {
        fd_path(descriptor)
    }

    /// Byte stream of the content.
    fn open_input(&self, uri: &Url) -> Result<Box<dyn Read + Send>, ResolverError> {
        Ok(Box::new(self.open_descriptor(uri)?))
    }
}

/// Path an open file refers to, read back through `/proc/self/fd`.
#[cfg(target_os = "linux")]
pub fn fd_path(file: &File) -> Option<PathBuf> {
    use std::os::fd::AsRawFd;

    std::fs::read_link(format!("/proc/self/fd/{}", file.as_raw_fd())).ok()
}

#[cfg(not(target_os = "linux"))]
pub fn fd_path(_file: &File) -> Option<PathBuf> {
    None
}

/// Resolver serving `content://<authority>/<path>` from `<root>/<authority>/<path>`
/// and `resource://<package>/<path>` from `<root>/resources/<package>/<path>`.
#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    root: PathBuf,
    display_names: HashMap<String, String>,
}

impl DirectoryResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            display_names: HashMap::new(),
        }
    }

    /// Report `name` as the display name of `uri` instead of the file name.
    pub fn with_display_name(mut self, uri: &Url, name: impl Into<String>) -> Self {
        self.display_names.insert(uri.as_str().to_string(), name.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Local file backing `uri`. Rejects other schemes and `.`/`..` segments.
    pub fn local_path(&self, uri: &Url) -> Result<PathBuf, ResolverError> {
        let unsupported = || ResolverError::Unsupported(uri.to_string());

        let base = match uri.scheme() {
            "content" => self.root.clone(),
            "resource" => self.root.join("resources"),
            _ => return Err(unsupported()),
        };
        let authority = uri.host_str().filter(|h| !h.is_empty()).ok_or_else(unsupported)?;

        let mut path = base.join(authority);
        let mut segments = 0;
        for raw in uri.path().split('/').filter(|s| !s.is_empty()) {
            let segment = percent_decode_str(raw).decode_utf8_lossy();
            if segment == "." || segment == ".." || segment.contains('/') {
                return Err(unsupported());
            }
            path.push(&*segment);
            segments += 1;
        }
        if segments == 0 {
            return Err(unsupported());
        }
        Ok(path)
    }
}

impl ContentResolver for DirectoryResolver {
    fn query_display_name(&self, uri: &Url) -> Result<Option<String>, ResolverError> {
        if let Some(name) = self.display_names.get(uri.as_str()) {
            return Ok(Some(name.clone()));
        }
        let path = self.local_path(uri)?;
        if !path.is_file() {
            return Err(ResolverError::NotFound(uri.to_string()));
        }
        Ok(path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned()))
    }

    fn open_descriptor(&self, uri: &Url) -> Result<File, ResolverError> {
        let path = self.local_path(uri)?;
        File::open(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ResolverError::NotFound(uri.to_string()),
            _ => ResolverError::Io(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn maps_content_and_resource_uris() {
        let r = DirectoryResolver::new("/srv/content");
        assert_eq!(
            r.local_path(&url("content://downloads/public/hello%20world.groovy"))
                .unwrap(),
            PathBuf::from("/srv/content/downloads/public/hello world.groovy")
        );
        assert_eq!(
            r.local_path(&url("resource://org.example/raw/init.groovy"))
                .unwrap(),
            PathBuf::from("/srv/content/resources/org.example/raw/init.groovy")
        );
    }

    #[test]
    fn rejects_traversal_and_foreign_schemes() {
        let r = DirectoryResolver::new("/srv/content");
        assert!(matches!(
            r.local_path(&url("content://downloads/a%2F..%2Fsecret")),
            Err(ResolverError::Unsupported(_))
        ));
        assert!(matches!(
            r.local_path(&url("file:///etc/passwd")),
            Err(ResolverError::Unsupported(_))
        ));
        assert!(matches!(
            r.local_path(&url("content://downloads/")),
            Err(ResolverError::Unsupported(_))
        ));
    }

    #[test]
    fn display_name_from_file_or_override() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("media")).unwrap();
        fs::write(dir.path().join("media/script.groovy"), b"1").unwrap();

        let uri = url("content://media/script.groovy");
        let r = DirectoryResolver::new(dir.path());
        assert_eq!(
            r.query_display_name(&uri).unwrap().as_deref(),
            Some("script.groovy")
        );

        let r = r.with_display_name(&uri, "Pretty Name.groovy");
        assert_eq!(
            r.query_display_name(&uri).unwrap().as_deref(),
            Some("Pretty Name.groovy")
        );
    }

    #[test]
    fn missing_content_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let r = DirectoryResolver::new(dir.path());
        let uri = url("content://media/nothing.groovy");
        assert!(matches!(
            r.query_display_name(&uri),
            Err(ResolverError::NotFound(_))
        ));
        assert!(matches!(
            r.open_descriptor(&uri),
            Err(ResolverError::NotFound(_))
        ));
    }

    #[test]
    fn open_input_reads_content() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("media")).unwrap();
        fs::write(dir.path().join("media/a.groovy"), b"println 1").unwrap();

        let r = DirectoryResolver::new(dir.path());
        let mut input = r.open_input(&url("content://media/a.groovy")).unwrap();
        let mut body = String::new();
        input.read_to_string(&mut body).unwrap();
        assert_eq!(body, "println 1");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn descriptor_path_recovers_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("media")).unwrap();
        let file_path = dir.path().join("media/real.groovy");
        fs::write(&file_path, b"1").unwrap();

        let r = DirectoryResolver::new(dir.path());
        let fd = r.open_descriptor(&url("content://media/real.groovy")).unwrap();
        assert_eq!(
            r.descriptor_path(&fd),
            Some(fs::canonicalize(&file_path).unwrap())
        );
    }
}

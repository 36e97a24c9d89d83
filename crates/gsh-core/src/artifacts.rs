//! On-disk data owned by catalogued scripts.
//!
//! Each script keeps its imported source under `<scripts_dir>/<human name>/`.
//! Compiled code and sandbox state live under the cache dir and are thrown
//! away whenever the catalogue schema changes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// File extension used for stored script sources.
pub const SOURCE_EXTENSION: &str = "groovy";

/// Cache subdirectories cleared on schema change.
const CACHE_SUBDIRS: [&str; 2] = ["code_cache", "sandbox"];

/// Prefix of staging dirs under the scripts dir. Never a valid script name.
const STAGING_PREFIX: &str = ".removing-";

static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone)]
pub struct ScriptArtifacts {
    scripts_dir: PathBuf,
    cache_dir: PathBuf,
}

impl ScriptArtifacts {
    pub fn new(scripts_dir: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            scripts_dir: scripts_dir.into(),
            cache_dir: cache_dir.into(),
        }
    }

    pub fn scripts_dir(&self) -> &Path {
        &self.scripts_dir
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Directory holding everything stored for `name`.
    pub fn script_dir(&self, name: &str) -> PathBuf {
        self.scripts_dir.join(name)
    }

    /// Path of the stored source for `name` (e.g. `hello/hello.groovy`).
    pub fn source_path(&self, name: &str) -> PathBuf {
        self.script_dir(name)
            .join(format!("{name}.{SOURCE_EXTENSION}"))
    }

    /// Write the imported source for `name`, replacing any previous copy.
    pub fn store_source(&self, name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let dir = self.script_dir(name);
        fs::create_dir_all(&dir)?;
        let path = self.source_path(name);
        fs::write(&path, bytes)?;
        tracing::debug!(path = %path.display(), len = bytes.len(), "stored script source");
        Ok(path)
    }

    /// Move the data of every script in `names` aside, so it can still be put
    /// back if the rows it belongs to end up kept.
    ///
    /// Nothing is moved on failure: directories already staged are restored
    /// and the name that could not be staged is returned with the error.
    pub fn stage_removal(&self, names: &[String]) -> Result<StagedRemoval, (String, io::Error)> {
        let mut staged = StagedRemoval {
            staging_dir: self.scripts_dir.join(format!(
                "{STAGING_PREFIX}{}-{}",
                std::process::id(),
                STAGING_SEQ.fetch_add(1, Ordering::Relaxed)
            )),
            moved: Vec::new(),
        };
        for name in names {
            if let Err(e) = staged.take(name, self.script_dir(name)) {
                staged.restore();
                return Err((name.clone(), e));
            }
        }
        Ok(staged)
    }

    /// Move the data stored for `old` so it belongs to `new`.
    pub fn rename(&self, old: &str, new: &str) -> io::Result<()> {
        let old_dir = self.script_dir(old);
        if !old_dir.exists() {
            return Ok(());
        }
        let new_dir = self.script_dir(new);
        fs::rename(&old_dir, &new_dir)?;

        let moved_source = new_dir.join(format!("{old}.{SOURCE_EXTENSION}"));
        if moved_source.exists() {
            fs::rename(&moved_source, self.source_path(new))?;
        }
        Ok(())
    }

    /// Drop compiled code and sandbox caches.
    pub fn clear_caches(&self) -> io::Result<()> {
        for sub in CACHE_SUBDIRS {
            let path = self.cache_dir.join(sub);
            match fs::remove_dir_all(&path) {
                Ok(()) => tracing::info!(path = %path.display(), "cleared cache"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

/// Script data moved aside by `ScriptArtifacts::stage_removal`.
///
/// `finish` deletes it for good; `restore` puts every directory back.
#[derive(Debug)]
#[must_use = "staged data stays aside until finished or restored"]
pub struct StagedRemoval {
    staging_dir: PathBuf,
    /// (original location, staged location)
    moved: Vec<(PathBuf, PathBuf)>,
}

impl StagedRemoval {
    fn take(&mut self, name: &str, dir: PathBuf) -> io::Result<()> {
        let meta = match fs::symlink_metadata(&dir) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };
        if !meta.is_dir() {
            return Err(io::Error::other(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
        fs::create_dir_all(&self.staging_dir)?;
        let staged = self.staging_dir.join(name);
        fs::rename(&dir, &staged)?;
        self.moved.push((dir, staged));
        Ok(())
    }

    /// Number of script directories staged.
    pub fn len(&self) -> usize {
        self.moved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moved.is_empty()
    }

    /// Put every staged directory back where it was. Failures are logged;
    /// the data then stays in the staging directory.
    pub fn restore(self) {
        for (original, staged) in self.moved.iter().rev() {
            if let Err(e) = fs::rename(staged, original) {
                tracing::error!(
                    path = %original.display(),
                    staged = %staged.display(),
                    "could not restore script data: {}",
                    e
                );
            }
        }
        remove_if_empty(&self.staging_dir);
    }

    /// Delete the staged data.
    pub fn finish(self) -> io::Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        fs::remove_dir_all(&self.staging_dir)?;
        tracing::debug!(count = self.moved.len(), "removed script data");
        Ok(())
    }
}

fn remove_if_empty(dir: &Path) {
    match fs::remove_dir(dir) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::debug!(path = %dir.display(), "staging dir kept: {}", e),
    }
}

//! Scratch copies of input clips.
//!
//! Inputs are re-muxed without their metadata (rotation tags in particular)
//! before composition. A copy that already exists is reused as-is.

use std::path::{Path, PathBuf};

use splitview_common::error::{SplitviewError, SplitviewResult};

/// Name of the scratch directory inside the target directory.
pub const SCRATCH_DIR_NAME: &str = "tmp_input_stripped_exif";

/// Marker prefixed to copies still being written.
const PARTIAL_PREFIX: &str = ".partial-";

#[derive(Debug, Clone)]
pub struct ScratchCache {
    dir: PathBuf,
}

impl ScratchCache {
    /// Open (creating if needed) the scratch directory under `target_dir`.
    pub fn open(target_dir: &Path) -> SplitviewResult<Self> {
        let dir = target_dir.join(SCRATCH_DIR_NAME);
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the scratch copy of `source` lives.
    pub fn cached_path(&self, source: &Path) -> SplitviewResult<PathBuf> {
        let name = source.file_name().ok_or_else(|| {
            SplitviewError::config(format!("{} has no file name", source.display()))
        })?;
        Ok(self.dir.join(name))
    }

    /// Return the scratch copy of `source`, producing it with `strip` when
    /// missing.
    ///
    /// `strip` writes to a temporary name that is renamed into place on
    /// success, so an interrupted run never leaves a truncated copy behind
    /// that a later run would reuse.
    pub fn ensure(
        &self,
        source: &Path,
        strip: impl FnOnce(&Path, &Path) -> SplitviewResult<()>,
    ) -> SplitviewResult<PathBuf> {
        let cached = self.cached_path(source)?;
        if cached.exists() {
            tracing::debug!(path = %cached.display(), "Reusing scratch copy");
            return Ok(cached);
        }

        let partial = self.dir.join(format!(
            "{PARTIAL_PREFIX}{}",
            cached
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        ));
        if let Err(err) = strip(source, &partial) {
            let _ = std::fs::remove_file(&partial);
            return Err(err);
        }
        std::fs::rename(&partial, &cached)?;

        tracing::info!(
            source = %source.display(),
            copy = %cached.display(),
            "Stripped input metadata"
        );
        Ok(cached)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_open_creates_scratch_dir() {
        let target = tempfile::tempdir().unwrap();
        let cache = ScratchCache::open(target.path()).unwrap();
        assert!(cache.dir().is_dir());
        assert!(cache.dir().ends_with(SCRATCH_DIR_NAME));
    }

    #[test]
    fn test_existing_copy_is_not_reprocessed() {
        let target = tempfile::tempdir().unwrap();
        let cache = ScratchCache::open(target.path()).unwrap();
        let calls = Cell::new(0);
        let strip = |src: &Path, dst: &Path| -> SplitviewResult<()> {
            calls.set(calls.get() + 1);
            std::fs::copy(src, dst)?;
            Ok(())
        };

        let source = target.path().join("a.mp4");
        std::fs::write(&source, b"frames").unwrap();

        let first = cache.ensure(&source, strip).unwrap();
        let second = cache.ensure(&source, strip).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, cache.dir().join("a.mp4"));
        assert_eq!(calls.get(), 1);
        assert_eq!(std::fs::read(&first).unwrap(), b"frames");
    }

    #[test]
    fn test_failed_strip_leaves_nothing_behind() {
        let target = tempfile::tempdir().unwrap();
        let cache = ScratchCache::open(target.path()).unwrap();
        let source = target.path().join("b.mp4");

        let err = cache
            .ensure(&source, |_, dst| {
                std::fs::write(dst, b"half")?;
                Err(SplitviewError::engine("exit status 1"))
            })
            .unwrap_err();

        assert!(matches!(err, SplitviewError::CompositionEngineFailure { .. }));
        assert_eq!(std::fs::read_dir(cache.dir()).unwrap().count(), 0);
    }
}

//! Measured input clips.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use splitview_common::error::{SplitviewError, SplitviewResult};

/// File extensions recognized as video clips (compared case-insensitively).
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mov", "m4v", "mkv", "avi", "webm", "mpg", "mpeg", "wmv", "flv",
];

/// Whether a path carries one of the recognized video extensions.
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// One input video with its intrinsic geometry and duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    /// File name, used as the stable identity of the clip.
    pub name: String,

    /// Location the clip is read from.
    pub path: PathBuf,

    /// Intrinsic width in pixels.
    pub width: u32,

    /// Intrinsic height in pixels.
    pub height: u32,

    /// Duration in seconds.
    pub duration_secs: f64,
}

impl Clip {
    /// Build a clip from probed metadata.
    ///
    /// Zero dimensions and negative or non-finite durations are reported as
    /// probe failures, since they can only come from a broken measurement.
    pub fn new(
        path: impl Into<PathBuf>,
        width: u32,
        height: u32,
        duration_secs: f64,
    ) -> SplitviewResult<Self> {
        let path = path.into();
        if width == 0 || height == 0 {
            return Err(SplitviewError::probe(
                &path,
                format!("invalid dimensions {width}x{height}"),
            ));
        }
        if !duration_secs.is_finite() || duration_secs < 0.0 {
            return Err(SplitviewError::probe(
                &path,
                format!("invalid duration {duration_secs}"),
            ));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            name,
            path,
            width,
            height,
            duration_secs,
        })
    }

    /// Text shown under the clip: the file name without its extension.
    pub fn label(&self) -> String {
        Path::new(&self.name)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

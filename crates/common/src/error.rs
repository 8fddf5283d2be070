//! Error types shared across splitview crates.

use std::path::PathBuf;

/// Top-level error type for splitview operations.
#[derive(Debug, thiserror::Error)]
pub enum SplitviewError {
    #[error("No eligible video clips found in {}", dir.display())]
    NoEligibleClips { dir: PathBuf },

    #[error("Failed to probe {}: {message}", path.display())]
    ProbeFailure { path: PathBuf, message: String },

    #[error("Composition engine failed: {message}")]
    CompositionEngineFailure { message: String },

    #[error("Font unavailable at {}: {message}", path.display())]
    FontUnavailable { path: PathBuf, message: String },

    #[error(
        "Timer overlay ({timer_width}px) is wider than clip {clip} ({clip_width}px); \
         disable timers or use clips with a wider aspect ratio"
    )]
    TimerOverlap {
        clip: String,
        clip_width: u32,
        timer_width: u32,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias using SplitviewError.
pub type SplitviewResult<T> = Result<T, SplitviewError>;

impl SplitviewError {
    pub fn no_eligible_clips(dir: impl Into<PathBuf>) -> Self {
        Self::NoEligibleClips { dir: dir.into() }
    }

    pub fn probe(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::ProbeFailure {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn engine(msg: impl Into<String>) -> Self {
        Self::CompositionEngineFailure {
            message: msg.into(),
        }
    }

    pub fn font(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::FontUnavailable {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether the failure came from an external tool (prober or engine)
    /// rather than from missing input or bad configuration.
    pub fn is_external_tool_failure(&self) -> bool {
        matches!(
            self,
            Self::ProbeFailure { .. } | Self::CompositionEngineFailure { .. }
        )
    }
}

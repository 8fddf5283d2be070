//! Composition options for a single planning run.

use serde::{Deserialize, Serialize};
use splitview_common::error::{SplitviewError, SplitviewResult};

/// How the freeze duration contributes to the total composition length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreezeAccounting {
    /// Added once after the longest clip.
    #[default]
    Once,

    /// Added once per clip while scanning for the longest one. Reproduces
    /// the length of compositions made by earlier releases.
    PerClip,
}

/// User-facing options for one composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionOptions {
    /// Playback slow-down multiplier (>= 1).
    pub slow_motion_factor: f64,

    /// Seconds the last frame is held after playback.
    pub freeze_duration_secs: f64,

    /// Draw each clip's label in a band at the bottom.
    pub insert_subtitles: bool,

    /// Overlay a timer video at the top-left corner of each clip.
    pub insert_timers: bool,

    /// Produce a silent composition.
    pub remove_audio: bool,

    pub freeze_accounting: FreezeAccounting,
}

impl Default for CompositionOptions {
    fn default() -> Self {
        Self {
            slow_motion_factor: 1.0,
            freeze_duration_secs: 2.0,
            insert_subtitles: true,
            insert_timers: false,
            remove_audio: false,
            freeze_accounting: FreezeAccounting::Once,
        }
    }
}

impl CompositionOptions {
    /// Reject values the planners cannot work with.
    pub fn validate(&self) -> SplitviewResult<()> {
        if !self.slow_motion_factor.is_finite() || self.slow_motion_factor < 1.0 {
            return Err(SplitviewError::config(format!(
                "slow-motion factor must be a finite number >= 1, got {}",
                self.slow_motion_factor
            )));
        }
        if !self.freeze_duration_secs.is_finite() || self.freeze_duration_secs < 0.0 {
            return Err(SplitviewError::config(format!(
                "freeze duration must be a finite number >= 0, got {}",
                self.freeze_duration_secs
            )));
        }
        Ok(())
    }

    /// Freeze time expressed in source time (before the global slow-down).
    pub fn freeze_in_source_time(&self) -> f64 {
        self.freeze_duration_secs / self.slow_motion_factor
    }
}

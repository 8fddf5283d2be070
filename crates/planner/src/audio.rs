//! Audio handling policy.

use serde::Serialize;

/// Strongest slow-down the audio tempo filter can follow; anything beyond
/// drops the audio track.
pub const MAX_AUDIO_RETIME_FACTOR: f64 = 2.0;

/// Why the composition is silent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DropReason {
    UserRequested,
    UnsupportedRetime { factor: f64 },
}

/// What happens to the clips' audio tracks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AudioDecision {
    /// Mix every clip's audio, retime by `retime_factor`, downmix to stereo.
    Mixed { retime_factor: f64, inputs: usize },
    Dropped(DropReason),
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserRequested => write!(f, "user requested"),
            Self::UnsupportedRetime { factor } => write!(
                f,
                "retime factor {factor} exceeds preservable range (max {MAX_AUDIO_RETIME_FACTOR})"
            ),
        }
    }
}

impl AudioDecision {
    /// Decide how audio is handled for a composition of `clip_count` clips.
    pub fn decide(slow_motion_factor: f64, remove_audio: bool, clip_count: usize) -> Self {
        if remove_audio {
            return Self::Dropped(DropReason::UserRequested);
        }
        if slow_motion_factor > MAX_AUDIO_RETIME_FACTOR {
            tracing::warn!(
                slow_motion_factor,
                max = MAX_AUDIO_RETIME_FACTOR,
                "Audio will be removed: it cannot be preserved with this slow-down factor"
            );
            return Self::Dropped(DropReason::UnsupportedRetime {
                factor: slow_motion_factor,
            });
        }
        Self::Mixed {
            retime_factor: 1.0 / slow_motion_factor,
            inputs: clip_count,
        }
    }

    pub fn is_mixed(&self) -> bool {
        matches!(self, Self::Mixed { .. })
    }

    /// User-facing warning when audio was dropped without being asked to.
    pub fn warning(&self) -> Option<String> {
        match self {
            Self::Dropped(reason @ DropReason::UnsupportedRetime { .. }) => Some(format!(
                "Audio removed from composition: {reason}. Use a slow-motion factor of \
                 {MAX_AUDIO_RETIME_FACTOR} or less to keep it."
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_audio_always_wins() {
        for factor in [1.0, 2.0, 8.0] {
            assert_eq!(
                AudioDecision::decide(factor, true, 3),
                AudioDecision::Dropped(DropReason::UserRequested)
            );
        }
        assert!(AudioDecision::decide(1.0, true, 3).warning().is_none());
    }

    #[test]
    fn test_factor_above_two_drops_with_warning() {
        let decision = AudioDecision::decide(3.0, false, 2);
        assert_eq!(
            decision,
            AudioDecision::Dropped(DropReason::UnsupportedRetime { factor: 3.0 })
        );
        assert!(!decision.is_mixed());
        let warning = decision.warning().unwrap();
        assert!(warning.contains("exceeds preservable range"));
    }

    #[test]
    fn test_factor_two_is_still_mixed() {
        assert_eq!(
            AudioDecision::decide(2.0, false, 2),
            AudioDecision::Mixed {
                retime_factor: 0.5,
                inputs: 2
            }
        );
        assert!(AudioDecision::decide(1.0, false, 1).is_mixed());
    }

    #[test]
    fn test_serialized_form_is_tagged() {
        let json = serde_json::to_value(AudioDecision::decide(4.0, false, 2)).unwrap();
        assert_eq!(json["mode"], "dropped");
        assert_eq!(json["reason"], "unsupported_retime");
    }
}

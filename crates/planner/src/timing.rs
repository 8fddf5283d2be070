//! Composition timing.

use serde::Serialize;
use splitview_clip_model::{Clip, CompositionOptions, FreezeAccounting};

/// Durations derived from the clips and options, in source time (before the
/// global slow-down is applied).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingPlan {
    /// Length of the padding generators, which also bounds the stacked output.
    pub total_duration_secs: f64,

    /// Per-clip trim applied to the timer overlays, when timers are requested.
    pub timer_trims_secs: Option<Vec<f64>>,
}

impl TimingPlan {
    pub fn plan(clips: &[Clip], options: &CompositionOptions) -> Self {
        let freeze = options.freeze_in_source_time();
        let total_duration_secs = match options.freeze_accounting {
            FreezeAccounting::Once => {
                clips
                    .iter()
                    .map(|clip| clip.duration_secs)
                    .fold(0.0, f64::max)
                    + freeze
            }
            FreezeAccounting::PerClip => clips
                .iter()
                .fold(0.0, |acc: f64, clip| acc.max(clip.duration_secs) + freeze),
        };

        // Timers are cut in source time; the whole composition is retimed later.
        let timer_trims_secs = options
            .insert_timers
            .then(|| clips.iter().map(|clip| clip.duration_secs).collect());

        tracing::debug!(
            total_duration_secs,
            accounting = ?options.freeze_accounting,
            "Composition timing planned"
        );

        Self {
            total_duration_secs,
            timer_trims_secs,
        }
    }

    /// Wall-clock length of the final output.
    pub fn output_duration_secs(&self, options: &CompositionOptions) -> f64 {
        self.total_duration_secs * options.slow_motion_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn clip(name: &str, duration: f64) -> Clip {
        Clip::new(format!("/videos/{name}"), 640, 480, duration).unwrap()
    }

    #[test]
    fn test_freeze_added_once_after_longest_clip() {
        let clips = vec![clip("a.mp4", 10.0), clip("b.mp4", 5.0)];
        let timing = TimingPlan::plan(&clips, &CompositionOptions::default());
        assert!((timing.total_duration_secs - 12.0).abs() < 1e-9);
        assert!(timing.timer_trims_secs.is_none());
    }

    #[test]
    fn test_per_clip_accounting_grows_with_every_clip() {
        let clips = vec![clip("a.mp4", 10.0), clip("b.mp4", 5.0)];
        let options = CompositionOptions {
            freeze_accounting: FreezeAccounting::PerClip,
            ..Default::default()
        };
        let timing = TimingPlan::plan(&clips, &options);
        // max(0, 10) + 2 = 12, then max(12, 5) + 2 = 14
        assert!((timing.total_duration_secs - 14.0).abs() < 1e-9);
    }

    #[test]
    fn test_slow_motion_shrinks_freeze_in_source_time() {
        let clips = vec![clip("a.mp4", 4.0)];
        let options = CompositionOptions {
            slow_motion_factor: 4.0,
            ..Default::default()
        };
        let timing = TimingPlan::plan(&clips, &options);
        assert!((timing.total_duration_secs - 4.5).abs() < 1e-9);
        assert!((timing.output_duration_secs(&options) - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_timer_trims_use_raw_durations() {
        let clips = vec![clip("a.mp4", 3.5), clip("b.mp4", 7.25)];
        let options = CompositionOptions {
            insert_timers: true,
            slow_motion_factor: 2.0,
            ..Default::default()
        };
        let timing = TimingPlan::plan(&clips, &options);
        assert_eq!(timing.timer_trims_secs, Some(vec![3.5, 7.25]));
    }

    proptest! {
        #[test]
        fn prop_per_clip_never_shorter_than_once(
            durations in prop::collection::vec(0.0f64..600.0, 1..10),
            freeze in 0.0f64..10.0,
            factor in 1.0f64..8.0,
        ) {
            let clips: Vec<Clip> = durations
                .iter()
                .enumerate()
                .map(|(i, d)| clip(&format!("{i}.mp4"), *d))
                .collect();
            let once = CompositionOptions {
                freeze_duration_secs: freeze,
                slow_motion_factor: factor,
                ..Default::default()
            };
            let per_clip = CompositionOptions {
                freeze_accounting: FreezeAccounting::PerClip,
                ..once.clone()
            };
            let a = TimingPlan::plan(&clips, &once).total_duration_secs;
            let b = TimingPlan::plan(&clips, &per_clip).total_duration_secs;
            prop_assert!(b + 1e-9 >= a);
            let longest = durations.iter().cloned().fold(0.0, f64::max);
            prop_assert!(a + 1e-9 >= longest);
        }
    }
}

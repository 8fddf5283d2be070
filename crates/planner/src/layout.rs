//! Horizontal layout of clips.
//!
//! Every clip is scaled to the height of the first clip, keeping its aspect
//! ratio, and placed left to right with a fixed black gap in between.
//! Widths and offsets stay fractional here; callers round them only when a
//! pixel coordinate is emitted.

use serde::Serialize;
use splitview_clip_model::Clip;
use splitview_common::error::{SplitviewError, SplitviewResult};

/// Placement of one clip in the composition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutEntry {
    /// Name of the clip this entry places.
    pub clip: String,

    /// Width after scaling to the shared height.
    pub scaled_width: f64,

    /// Left edge of the clip in the composition.
    pub x_offset: f64,
}

/// Placement of all clips, in left-to-right order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutPlan {
    pub entries: Vec<LayoutEntry>,

    /// Height shared by every clip (the first clip's height).
    pub final_height: u32,

    /// Gap between adjacent clips.
    pub padding_width: u32,
}

impl LayoutPlan {
    /// Lay out `clips` in the given order.
    pub fn plan(clips: &[Clip], padding_width: u32) -> SplitviewResult<Self> {
        let first = clips
            .first()
            .ok_or_else(|| SplitviewError::config("cannot lay out an empty clip list"))?;
        let final_height = first.height;

        let entries = clips
            .iter()
            .scan(0.0_f64, |next_x, clip| {
                let scaled_width = clip.width as f64 * final_height as f64 / clip.height as f64;
                let entry = LayoutEntry {
                    clip: clip.name.clone(),
                    scaled_width,
                    x_offset: *next_x,
                };
                *next_x += scaled_width + padding_width as f64;
                Some(entry)
            })
            .collect();

        Ok(Self {
            entries,
            final_height,
            padding_width,
        })
    }

    /// Number of black separators (one between each adjacent pair).
    pub fn padding_count(&self) -> usize {
        self.entries.len().saturating_sub(1)
    }

    /// Width of the whole composition.
    pub fn total_width(&self) -> f64 {
        self.entries
            .last()
            .map(|last| last.x_offset + last.scaled_width)
            .unwrap_or(0.0)
    }

    /// Horizontal center of clip `index`.
    pub fn midpoint(&self, index: usize) -> f64 {
        let entry = &self.entries[index];
        entry.x_offset + entry.scaled_width / 2.0
    }

    /// Scaled width of clip `index`, rounded to whole pixels.
    pub fn pixel_width(&self, index: usize) -> u32 {
        self.entries[index].scaled_width.round().max(1.0) as u32
    }

    /// Left edge of clip `index`, rounded to whole pixels.
    pub fn pixel_offset(&self, index: usize) -> i64 {
        self.entries[index].x_offset.round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn clip(name: &str, width: u32, height: u32) -> Clip {
        Clip::new(format!("/videos/{name}"), width, height, 1.0).unwrap()
    }

    #[test]
    fn test_two_clips_scale_to_first_height() {
        let clips = vec![clip("a.mp4", 1280, 720), clip("b.mp4", 640, 480)];
        let layout = LayoutPlan::plan(&clips, 20).unwrap();

        assert_eq!(layout.final_height, 720);
        assert_eq!(layout.entries[0].scaled_width, 1280.0);
        assert_eq!(layout.entries[1].scaled_width, 960.0);
        assert_eq!(layout.entries[0].x_offset, 0.0);
        assert_eq!(layout.entries[1].x_offset, 1300.0);
        assert_eq!(layout.total_width(), 2260.0);
        assert_eq!(layout.padding_count(), 1);
        assert_eq!(layout.midpoint(1), 1780.0);
    }

    #[test]
    fn test_single_clip_has_no_padding() {
        let layout = LayoutPlan::plan(&[clip("solo.mov", 1920, 1080)], 20).unwrap();
        assert_eq!(layout.entries.len(), 1);
        assert_eq!(layout.padding_count(), 0);
        assert_eq!(layout.total_width(), 1920.0);
    }

    #[test]
    fn test_taller_later_clip_is_downscaled() {
        let clips = vec![clip("a.mp4", 640, 360), clip("b.mp4", 1080, 1920)];
        let layout = LayoutPlan::plan(&clips, 10).unwrap();
        assert_eq!(layout.final_height, 360);
        assert!((layout.entries[1].scaled_width - 202.5).abs() < 1e-9);
        assert_eq!(layout.pixel_width(1), 203);
    }

    #[test]
    fn test_empty_clip_list_is_rejected() {
        assert!(LayoutPlan::plan(&[], 20).is_err());
    }

    fn arb_clips() -> impl Strategy<Value = Vec<Clip>> {
        prop::collection::vec((1u32..4096, 1u32..4096), 1..12).prop_map(|dims| {
            dims.into_iter()
                .enumerate()
                .map(|(i, (w, h))| clip(&format!("{i:02}.mp4"), w, h))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_heights_and_aspect_ratios_are_preserved(
            clips in arb_clips(),
            padding in 0u32..64,
        ) {
            let layout = LayoutPlan::plan(&clips, padding).unwrap();
            prop_assert_eq!(layout.final_height, clips[0].height);
            prop_assert_eq!(layout.entries.len(), clips.len());
            for (entry, clip) in layout.entries.iter().zip(&clips) {
                let planned = entry.scaled_width / layout.final_height as f64;
                prop_assert!((planned - clip.aspect_ratio()).abs() < 1e-9);
            }
        }

        #[test]
        fn prop_offsets_step_by_width_plus_padding(
            clips in arb_clips(),
            padding in 0u32..64,
        ) {
            let layout = LayoutPlan::plan(&clips, padding).unwrap();
            prop_assert_eq!(layout.entries[0].x_offset, 0.0);
            for pair in layout.entries.windows(2) {
                let step = pair[1].x_offset - pair[0].x_offset;
                prop_assert!(step > 0.0);
                prop_assert!((step - (pair[0].scaled_width + padding as f64)).abs() < 1e-6);
            }
        }
    }
}

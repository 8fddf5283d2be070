//! Whole-composition planning.

use std::path::PathBuf;

use serde::Serialize;
use splitview_clip_model::{Clip, CompositionOptions};
use splitview_common::error::{SplitviewError, SplitviewResult};

use crate::audio::AudioDecision;
use crate::emit::emit;
use crate::graph::FilterGraph;
use crate::layout::LayoutPlan;
use crate::subtitles::{LabelMeasurer, SubtitlePlan};
use crate::timing::TimingPlan;

/// Intrinsic size of the timer overlay video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimerGeometry {
    pub width: u32,
    pub height: u32,
}

impl TimerGeometry {
    /// Width of the overlay once scaled to `height`, aspect ratio kept.
    pub fn scaled_width(&self, height: u32) -> u32 {
        let width = self.width as f64 * height as f64 / self.height.max(1) as f64;
        width.round().max(1.0) as u32
    }
}

/// Installation-wide planning parameters (from configuration and assets).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanSettings {
    pub padding_width: u32,
    pub subtitle_band_fraction: f64,
    pub reference_font_size: f64,
    pub font_file: PathBuf,

    /// Probed size of the timer video; required when timers are requested.
    pub timer: Option<TimerGeometry>,
}

impl PlanSettings {
    /// Height of the subtitle band (and of timer overlays) in whole pixels.
    pub fn band_pixel_height(&self, final_height: u32) -> u32 {
        let height = (self.subtitle_band_fraction * final_height as f64 + 1e-9).floor();
        height.max(1.0) as u32
    }

    fn validate(&self) -> SplitviewResult<()> {
        if !(self.subtitle_band_fraction > 0.0 && self.subtitle_band_fraction <= 1.0) {
            return Err(SplitviewError::config(format!(
                "subtitle band fraction must be in (0, 1], got {}",
                self.subtitle_band_fraction
            )));
        }
        if !(self.reference_font_size.is_finite() && self.reference_font_size > 0.0) {
            return Err(SplitviewError::config(format!(
                "reference font size must be positive, got {}",
                self.reference_font_size
            )));
        }
        Ok(())
    }
}

/// Everything computed for one composition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositionPlan {
    pub clips: Vec<Clip>,
    pub options: CompositionOptions,
    pub layout: LayoutPlan,
    pub timing: TimingPlan,
    pub subtitles: Option<SubtitlePlan>,
    pub audio: AudioDecision,
    pub graph: FilterGraph,
}

impl CompositionPlan {
    /// Number of engine inputs the graph refers to (clips plus timer copies).
    pub fn input_count(&self) -> usize {
        self.graph.input_count()
    }

    /// Length of the encoded output, slow motion and freeze included.
    pub fn output_duration_secs(&self) -> f64 {
        self.timing.output_duration_secs(&self.options)
    }
}

/// Plan a composition of `clips` (already in left-to-right order).
///
/// `measurer` is only consulted when subtitles are requested; passing `None`
/// in that case is a configuration error.
pub fn plan_composition(
    clips: &[Clip],
    options: &CompositionOptions,
    settings: &PlanSettings,
    measurer: Option<&dyn LabelMeasurer>,
) -> SplitviewResult<CompositionPlan> {
    options.validate()?;
    settings.validate()?;

    let layout = LayoutPlan::plan(clips, settings.padding_width)?;
    let timing = TimingPlan::plan(clips, options);

    if options.insert_timers {
        check_timer_fit(&layout, settings)?;
    }

    let subtitles = if options.insert_subtitles {
        let measurer = measurer.ok_or_else(|| {
            SplitviewError::config("subtitles requested but no label measurer is available")
        })?;
        Some(SubtitlePlan::fit(
            clips,
            &layout,
            settings.subtitle_band_fraction,
            settings.reference_font_size,
            measurer,
        ))
    } else {
        None
    };

    let audio = AudioDecision::decide(
        options.slow_motion_factor,
        options.remove_audio,
        clips.len(),
    );

    let graph = emit(
        &layout,
        &timing,
        subtitles.as_ref(),
        &audio,
        options,
        settings,
    );

    tracing::info!(
        clips = clips.len(),
        final_height = layout.final_height,
        total_width = layout.total_width(),
        total_duration_secs = timing.total_duration_secs,
        font_size = subtitles.as_ref().map(|s| s.font_size),
        audio_mixed = audio.is_mixed(),
        stages = graph.stages.len(),
        "Composition plan built"
    );

    Ok(CompositionPlan {
        clips: clips.to_vec(),
        options: options.clone(),
        layout,
        timing,
        subtitles,
        audio,
        graph,
    })
}

/// Every clip must be at least as wide as its timer overlay, otherwise the
/// overlay spills onto the neighbouring clip.
fn check_timer_fit(layout: &LayoutPlan, settings: &PlanSettings) -> SplitviewResult<()> {
    let timer = settings.timer.ok_or_else(|| {
        SplitviewError::config("timers requested but the timer video could not be measured")
    })?;
    let timer_width = timer.scaled_width(settings.band_pixel_height(layout.final_height));

    match (0..layout.entries.len()).find(|&i| layout.pixel_width(i) < timer_width) {
        Some(i) => Err(SplitviewError::TimerOverlap {
            clip: layout.entries[i].clip.clone(),
            clip_width: layout.pixel_width(i),
            timer_width,
        }),
        None => Ok(()),
    }
}

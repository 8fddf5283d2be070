//! Directory-to-composition pipeline.
//!
//! ```text
//! dir/*.mp4 ──► eligible_videos ──► ScratchCache (strip metadata)
//!                                        │
//!                                        ▼
//!                               ClipInventory::measure
//!                                        │
//!                   timer video ──► plan_composition ◄── FontMeasurer
//!                                        │
//!                                        ▼
//!                          CompositingEngine::execute ──► <dir>_split_screen.mp4
//! ```

use std::path::{Path, PathBuf};

use splitview_clip_model::{Clip, CompositionOptions};
use splitview_common::config::AppConfig;
use splitview_common::error::{SplitviewError, SplitviewResult};
use splitview_planner::{
    plan_composition, CompositionPlan, LabelMeasurer, PlanSettings, TimerGeometry,
};

use crate::cache::ScratchCache;
use crate::export::{CompositingEngine, CompositionJob, ProgressCallback};
use crate::inventory::{eligible_videos, ClipInventory, MediaProber};

/// Suffix appended to the input directory stem for the target directory and
/// the output file.
pub const OUTPUT_SUFFIX: &str = "_split_screen";

/// A request to compose every clip of one directory.
#[derive(Debug, Clone)]
pub struct ComposeRequest {
    pub input_dir: PathBuf,

    /// Where the output and scratch copies go; defaults to a sibling of
    /// `input_dir`.
    pub target_dir: Option<PathBuf>,

    pub options: CompositionOptions,
}

/// Result of a successful composition.
#[derive(Debug, Clone)]
pub struct ComposeOutcome {
    pub output_path: PathBuf,
    pub plan: CompositionPlan,
}

/// `<parent>/<stem>_split_screen`
pub fn default_target_dir(input_dir: &Path) -> PathBuf {
    let parent = input_dir.parent().unwrap_or_else(|| Path::new("."));
    parent.join(format!("{}{OUTPUT_SUFFIX}", dir_stem(input_dir)))
}

/// `<stem>_split_screen.mp4`
pub fn output_file_name(input_dir: &Path) -> String {
    format!("{}{OUTPUT_SUFFIX}.mp4", dir_stem(input_dir))
}

fn dir_stem(dir: &Path) -> String {
    dir.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "videos".to_string())
}

/// Planning settings from configuration plus the measured timer geometry.
pub fn plan_settings(config: &AppConfig, timer: Option<TimerGeometry>) -> PlanSettings {
    PlanSettings {
        padding_width: config.layout.padding_width,
        subtitle_band_fraction: config.layout.subtitle_band_fraction,
        reference_font_size: config.layout.reference_font_size,
        font_file: config.assets.font.clone(),
        timer,
    }
}

/// Wires a prober and a compositing engine to the planner.
pub struct Pipeline<'a> {
    config: &'a AppConfig,
    prober: &'a dyn MediaProber,
    engine: &'a mut dyn CompositingEngine,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a AppConfig,
        prober: &'a dyn MediaProber,
        engine: &'a mut dyn CompositingEngine,
    ) -> Self {
        Self {
            config,
            prober,
            engine,
        }
    }

    /// Probe and plan the clips of `input_dir` without touching the engine.
    ///
    /// The raw files are probed; the prober reports displayed dimensions, so
    /// rotated clips plan the same geometry as their autorotated scratch copies.
    pub fn plan_directory(
        &self,
        input_dir: &Path,
        options: &CompositionOptions,
        measurer: Option<&dyn LabelMeasurer>,
    ) -> SplitviewResult<CompositionPlan> {
        let clips = ClipInventory::new(self.prober).list(input_dir)?;
        self.plan_clips(&clips, options, measurer)
    }

    fn plan_clips(
        &self,
        clips: &[Clip],
        options: &CompositionOptions,
        measurer: Option<&dyn LabelMeasurer>,
    ) -> SplitviewResult<CompositionPlan> {
        let timer = if options.insert_timers {
            Some(self.timer_geometry()?)
        } else {
            None
        };
        let settings = plan_settings(self.config, timer);
        plan_composition(clips, options, &settings, measurer)
    }

    fn timer_geometry(&self) -> SplitviewResult<TimerGeometry> {
        let path = &self.config.assets.timer_video;
        if !path.is_file() {
            return Err(SplitviewError::FileNotFound { path: path.clone() });
        }
        let media = self.prober.probe(path)?;
        Ok(TimerGeometry {
            width: media.width,
            height: media.height,
        })
    }

    /// Strip, probe, plan and encode every clip of the requested directory.
    pub fn compose(
        &mut self,
        request: &ComposeRequest,
        measurer: Option<&dyn LabelMeasurer>,
        progress: Option<ProgressCallback>,
    ) -> SplitviewResult<ComposeOutcome> {
        request.options.validate()?;
        if !self.engine.is_available() {
            return Err(SplitviewError::engine(format!(
                "{} is not available",
                self.engine.name()
            )));
        }

        let sources = eligible_videos(&request.input_dir)?;
        let target_dir = request
            .target_dir
            .clone()
            .unwrap_or_else(|| default_target_dir(&request.input_dir));
        std::fs::create_dir_all(&target_dir)?;

        tracing::info!(
            input = %request.input_dir.display(),
            target = %target_dir.display(),
            clips = sources.len(),
            engine = self.engine.name(),
            "Starting composition"
        );

        let cache = ScratchCache::open(&target_dir)?;
        let engine = &*self.engine;
        let scratch = sources
            .iter()
            .map(|source| cache.ensure(source, |src, dst| engine.strip_metadata(src, dst)))
            .collect::<SplitviewResult<Vec<_>>>()?;

        let clips = ClipInventory::new(self.prober).measure(&scratch)?;
        let plan = self.plan_clips(&clips, &request.options, measurer)?;

        let job = CompositionJob {
            timer_video: plan
                .timing
                .timer_trims_secs
                .as_ref()
                .map(|_| self.config.assets.timer_video.clone()),
            output_path: target_dir.join(output_file_name(&request.input_dir)),
            plan,
        };
        let output_path = self.engine.execute(&job, progress)?;

        Ok(ComposeOutcome {
            output_path,
            plan: job.plan,
        })
    }
}

//! Filter graph emission.
//!
//! Turns the layout, timing, subtitle and audio plans into the ordered
//! stage list of a [`FilterGraph`]. Stage order follows clip order from left
//! to right; reordering would move clips on screen.
//!
//! Input numbering: clip `i` is input `i`, its timer overlay (when enabled)
//! is input `clip_count + i`.

use splitview_clip_model::CompositionOptions;

use crate::audio::AudioDecision;
use crate::graph::{FilterGraph, Stage, StreamRef};
use crate::layout::LayoutPlan;
use crate::plan::PlanSettings;
use crate::subtitles::SubtitlePlan;
use crate::timing::TimingPlan;

/// Gap between the bottom edge and the baseline box of a label.
pub const SUBTITLE_BOTTOM_MARGIN: u32 = 10;

/// Label of the final video stream.
pub const VIDEO_OUTPUT: &str = "vout";

/// Label of the mixed audio stream.
pub const AUDIO_OUTPUT: &str = "aout";

/// Build the ordered stage list for one composition.
pub fn emit(
    layout: &LayoutPlan,
    timing: &TimingPlan,
    subtitles: Option<&SubtitlePlan>,
    audio: &AudioDecision,
    options: &CompositionOptions,
    settings: &PlanSettings,
) -> FilterGraph {
    let clip_count = layout.entries.len();
    let mut stages: Vec<Stage> = (0..clip_count)
        .map(|i| Stage::Scale {
            input: StreamRef::Video(i),
            width: layout.pixel_width(i),
            height: layout.final_height,
            output: format!("v{i}"),
        })
        .collect();

    let timers = timing
        .timer_trims_secs
        .as_ref()
        .zip(settings.timer)
        .filter(|_| options.insert_timers);

    if let Some((trims, timer)) = timers {
        let timer_height = settings.band_pixel_height(layout.final_height);
        let timer_width = timer.scaled_width(timer_height);
        for (i, trim) in trims.iter().enumerate() {
            stages.push(Stage::Scale {
                input: StreamRef::Video(clip_count + i),
                width: timer_width,
                height: timer_height,
                output: format!("timerscaled{i}"),
            });
            stages.push(Stage::Trim {
                input: StreamRef::label(format!("timerscaled{i}")),
                duration_secs: *trim,
                output: format!("timer{i}"),
            });
        }
    }

    stages.extend((0..layout.padding_count()).map(|i| Stage::Pad {
        width: layout.padding_width,
        height: layout.final_height,
        duration_secs: timing.total_duration_secs,
        output: format!("blackpad{i}"),
    }));

    let stack_inputs = (0..clip_count)
        .flat_map(|i| {
            let clip = StreamRef::label(format!("v{i}"));
            let pad = (i + 1 < clip_count).then(|| StreamRef::label(format!("blackpad{i}")));
            std::iter::once(clip).chain(pad)
        })
        .collect();
    stages.push(Stage::Stack {
        inputs: stack_inputs,
        output: "stacked".to_string(),
    });
    let mut current = "stacked".to_string();

    if let Some(subtitles) = subtitles {
        stages.push(Stage::Band {
            input: StreamRef::label(current),
            height_fraction: settings.subtitle_band_fraction,
            output: "band".to_string(),
        });
        current = "band".to_string();

        for (i, label) in subtitles.labels.iter().enumerate() {
            let output = format!("sub{i}");
            stages.push(Stage::DrawText {
                input: StreamRef::label(current),
                text: label.text.clone(),
                font_file: settings.font_file.clone(),
                font_size: subtitles.font_size,
                center_x: label.anchor_x.round() as i64,
                bottom_margin: SUBTITLE_BOTTOM_MARGIN,
                output: output.clone(),
            });
            current = output;
        }
    }

    if let Some((trims, _)) = timers {
        for i in 0..trims.len() {
            let output = format!("timed{i}");
            stages.push(Stage::Overlay {
                base: StreamRef::label(current),
                overlay: StreamRef::label(format!("timer{i}")),
                x: layout.pixel_offset(i),
                y: 0,
                output: output.clone(),
            });
            current = output;
        }
    }

    stages.push(Stage::Retime {
        input: StreamRef::label(current),
        factor: options.slow_motion_factor,
        output: VIDEO_OUTPUT.to_string(),
    });

    let audio_output = match audio {
        AudioDecision::Mixed {
            retime_factor,
            inputs,
        } => {
            stages.push(Stage::Audio {
                inputs: (0..*inputs).map(StreamRef::Audio).collect(),
                tempo: *retime_factor,
                output: AUDIO_OUTPUT.to_string(),
            });
            Some(AUDIO_OUTPUT.to_string())
        }
        AudioDecision::Dropped(_) => None,
    };

    FilterGraph {
        stages,
        video_output: VIDEO_OUTPUT.to_string(),
        audio_output,
    }
}

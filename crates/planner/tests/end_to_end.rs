use std::path::PathBuf;

use splitview_clip_model::{Clip, CompositionOptions, FreezeAccounting};
use splitview_planner::{plan_composition, AudioDecision, LabelMeasurer, PlanSettings, Stage};

/// Each char is half the font size wide; lines are one font size tall.
struct HalfEm;

impl LabelMeasurer for HalfEm {
    fn measure(&self, text: &str, font_size: f64) -> (f64, f64) {
        (text.chars().count() as f64 * font_size * 0.5, font_size)
    }
}

fn two_clips() -> Vec<Clip> {
    vec![
        Clip::new("/videos/a.mp4", 1280, 720, 10.0).unwrap(),
        Clip::new("/videos/b.mp4", 640, 480, 5.0).unwrap(),
    ]
}

fn settings() -> PlanSettings {
    PlanSettings {
        padding_width: 20,
        subtitle_band_fraction: 0.1,
        reference_font_size: 100.0,
        font_file: PathBuf::from("/fonts/Sans.ttf"),
        timer: None,
    }
}

#[test]
fn two_clip_composition_matches_expected_graph() {
    let plan = plan_composition(
        &two_clips(),
        &CompositionOptions::default(),
        &settings(),
        Some(&HalfEm),
    )
    .unwrap();

    let widths: Vec<f64> = plan.layout.entries.iter().map(|e| e.scaled_width).collect();
    let offsets: Vec<f64> = plan.layout.entries.iter().map(|e| e.x_offset).collect();
    assert_eq!(plan.layout.final_height, 720);
    assert_eq!(widths, vec![1280.0, 960.0]);
    assert_eq!(offsets, vec![0.0, 1300.0]);
    assert_eq!(plan.layout.total_width(), 2260.0);
    assert!((plan.timing.total_duration_secs - 12.0).abs() < 1e-9);
    assert_eq!(plan.subtitles.as_ref().map(|s| s.font_size), Some(72));
    assert_eq!(
        plan.audio,
        AudioDecision::Mixed {
            retime_factor: 1.0,
            inputs: 2
        }
    );

    let expected = [
        "[0:v]scale=1280:720[v0]",
        "[1:v]scale=960:720[v1]",
        "color=c=black:s=20x720:d=12.000000[blackpad0]",
        "[v0][blackpad0][v1]hstack=inputs=3[stacked]",
        "[stacked]drawbox=x=0:y=ih-h:w=iw:h=ih*0.100000:color=black@1.0:t=fill[band]",
        "[band]drawtext=fontfile=/fonts/Sans.ttf:text=a:expansion=none:fontcolor=white:fontsize=72:x=640-text_w/2:y=h-text_h-10[sub0]",
        "[sub0]drawtext=fontfile=/fonts/Sans.ttf:text=b:expansion=none:fontcolor=white:fontsize=72:x=1780-text_w/2:y=h-text_h-10[sub1]",
        "[sub1]setpts=1.000000*PTS[vout]",
        "[0:a][1:a]amix=inputs=2,atempo=1.000000[aout]",
    ]
    .join(";");
    assert_eq!(plan.graph.to_filter_complex(), expected);
}

#[test]
fn legacy_freeze_accounting_adds_freeze_per_clip() {
    let options = CompositionOptions {
        freeze_accounting: FreezeAccounting::PerClip,
        ..Default::default()
    };
    let plan = plan_composition(&two_clips(), &options, &settings(), Some(&HalfEm)).unwrap();

    assert!((plan.timing.total_duration_secs - 14.0).abs() < 1e-9);
    assert!(plan
        .graph
        .to_filter_complex()
        .contains("color=c=black:s=20x720:d=14.000000[blackpad0]"));
}

#[test]
fn slow_motion_stretches_output_and_keeps_audio_up_to_two() {
    let options = CompositionOptions {
        slow_motion_factor: 2.0,
        freeze_duration_secs: 2.0,
        ..Default::default()
    };
    let plan = plan_composition(&two_clips(), &options, &settings(), Some(&HalfEm)).unwrap();

    // Freeze is expressed in source time, so it lasts 2s after retiming.
    assert!((plan.timing.total_duration_secs - 11.0).abs() < 1e-9);
    assert!((plan.output_duration_secs() - 22.0).abs() < 1e-9);
    assert!(plan.audio.is_mixed());

    let options = CompositionOptions {
        slow_motion_factor: 2.5,
        ..options
    };
    let plan = plan_composition(&two_clips(), &options, &settings(), Some(&HalfEm)).unwrap();
    assert!(!plan.audio.is_mixed());
    assert!(plan.graph.audio_output.is_none());
}

#[test]
fn clip_order_decides_placement() {
    let mut clips = two_clips();
    clips.reverse();
    let plan = plan_composition(&clips, &CompositionOptions::default(), &settings(), Some(&HalfEm))
        .unwrap();

    // b.mp4 now sets the shared height: 480px.
    assert_eq!(plan.layout.final_height, 480);
    assert_eq!(plan.layout.pixel_width(0), 640);
    assert_eq!(plan.layout.pixel_width(1), 853);
    let labels: Vec<&str> = plan
        .graph
        .stages
        .iter()
        .filter_map(|s| match s {
            Stage::DrawText { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(labels, vec!["b", "a"]);
}

#[test]
fn planning_is_deterministic() {
    let options = CompositionOptions {
        insert_timers: true,
        slow_motion_factor: 1.5,
        ..Default::default()
    };
    let mut settings = settings();
    settings.timer = Some(splitview_planner::TimerGeometry {
        width: 320,
        height: 180,
    });

    let first = plan_composition(&two_clips(), &options, &settings, Some(&HalfEm)).unwrap();
    let second = plan_composition(&two_clips(), &options, &settings, Some(&HalfEm)).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        first.graph.to_filter_complex(),
        second.graph.to_filter_complex()
    );
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn empty_clip_list_is_rejected() {
    let err = plan_composition(&[], &CompositionOptions::default(), &settings(), Some(&HalfEm))
        .unwrap_err();
    assert!(matches!(
        err,
        splitview_common::SplitviewError::Config { .. }
    ));
}

//! Probe and plan a composition without encoding.

use std::path::PathBuf;

use splitview_clip_model::CompositionOptions;
use splitview_common::config::AppConfig;
use splitview_planner::LabelMeasurer;
use splitview_render_engine::{FfmpegBackend, FfprobeProber, Pipeline};

pub fn run(
    config: &AppConfig,
    dir: PathBuf,
    options: CompositionOptions,
    json: bool,
) -> anyhow::Result<()> {
    let measurer = super::measurer_for(config, &options)?;
    let prober = FfprobeProber::new(&config.tools.ffprobe);
    let mut backend = FfmpegBackend::new(&config.tools.ffmpeg);
    let pipeline = Pipeline::new(config, &prober, &mut backend);

    let plan = pipeline.plan_directory(
        &dir,
        &options,
        measurer.as_ref().map(|m| m as &dyn LabelMeasurer),
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    for warning in super::plan_warnings(&plan) {
        println!("[WARN] {warning}");
    }

    println!("Plan for: {}", dir.display());
    println!("  Height: {}", plan.layout.final_height);
    for (i, entry) in plan.layout.entries.iter().enumerate() {
        println!(
            "  {:>2}. {} width={} x={}",
            i + 1,
            entry.clip,
            plan.layout.pixel_width(i),
            plan.layout.pixel_offset(i)
        );
    }
    println!(
        "  Duration: {:.2}s (source {:.2}s)",
        plan.output_duration_secs(),
        plan.timing.total_duration_secs
    );
    match &plan.subtitles {
        Some(subtitles) => println!("  Subtitle font size: {}", subtitles.font_size),
        None => println!("  Subtitles: off"),
    }
    println!(
        "  Audio: {}",
        if plan.audio.is_mixed() { "mixed" } else { "dropped" }
    );

    println!("\nFilter graph ({} stages):", plan.graph.stages.len());
    for stage in &plan.graph.stages {
        println!("  {}", stage.to_filter_chain());
    }
    Ok(())
}

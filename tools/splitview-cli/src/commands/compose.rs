//! Compose a directory of clips into one video.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use splitview_clip_model::CompositionOptions;
use splitview_common::config::AppConfig;
use splitview_planner::LabelMeasurer;
use splitview_render_engine::{
    ComposeRequest, CompositionProgress, CompositionStage, FfmpegBackend, FfprobeProber, Pipeline,
    ProgressCallback,
};

pub fn run(
    config: &AppConfig,
    dir: PathBuf,
    output: Option<PathBuf>,
    options: CompositionOptions,
    open: bool,
) -> anyhow::Result<()> {
    println!("Composing clips in: {}", dir.display());

    let measurer = super::measurer_for(config, &options)?;
    let prober = FfprobeProber::new(&config.tools.ffprobe);
    let mut backend = FfmpegBackend::new(&config.tools.ffmpeg);
    let mut pipeline = Pipeline::new(config, &prober, &mut backend);

    let request = ComposeRequest {
        input_dir: dir,
        target_dir: output,
        options,
    };

    let progress_cb: ProgressCallback = Box::new(|p: CompositionProgress| {
        if p.stage == CompositionStage::Encoding {
            print!(
                "\r  Progress: {:.1}% ({:.1}s encoded, ETA: {:.0}s)  ",
                p.progress * 100.0,
                p.out_time_secs,
                p.eta_secs,
            );
            let _ = std::io::stdout().flush();
        }
    });

    let outcome = pipeline.compose(
        &request,
        measurer.as_ref().map(|m| m as &dyn LabelMeasurer),
        Some(progress_cb),
    )?;
    println!();

    let plan = &outcome.plan;
    for warning in super::plan_warnings(plan) {
        println!("[WARN] {warning}");
    }
    println!("  Clips: {}", plan.clips.len());
    println!(
        "  Size: {}x{}",
        plan.layout.total_width().round(),
        plan.layout.final_height
    );
    println!("  Duration: {:.2}s", plan.output_duration_secs());
    if let Some(subtitles) = &plan.subtitles {
        println!("  Subtitle font size: {}", subtitles.font_size);
    }
    println!("\nComposition complete: {}", outcome.output_path.display());

    if open {
        open_with_default_app(&outcome.output_path);
    }
    Ok(())
}

fn open_with_default_app(path: &Path) {
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(target_os = "windows") {
        "explorer"
    } else {
        "xdg-open"
    };

    match Command::new(opener).arg(path).spawn() {
        Ok(_) => tracing::debug!(opener, path = %path.display(), "Opened composition"),
        Err(err) => println!("[WARN] Could not open {} with {opener}: {err}", path.display()),
    }
}

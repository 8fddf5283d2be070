//! List eligible clips with probed metadata.

use std::path::PathBuf;

use splitview_common::config::AppConfig;
use splitview_render_engine::{ClipInventory, FfprobeProber};

pub fn run(config: &AppConfig, dir: PathBuf) -> anyhow::Result<()> {
    let prober = FfprobeProber::new(&config.tools.ffprobe);
    let clips = ClipInventory::new(&prober).list(&dir)?;

    println!("Clips in: {}", dir.display());
    for clip in &clips {
        println!(
            "  {} {}x{} ({:.2}s, aspect {:.3})",
            clip.name,
            clip.width,
            clip.height,
            clip.duration_secs,
            clip.aspect_ratio()
        );
    }

    let longest = clips
        .iter()
        .map(|c| c.duration_secs)
        .fold(0.0, f64::max);
    println!();
    println!("  {} clip(s), longest {:.2}s", clips.len(), longest);
    if let Some(first) = clips.first() {
        println!("  Composition height: {} (from {})", first.height, first.name);
    }
    Ok(())
}

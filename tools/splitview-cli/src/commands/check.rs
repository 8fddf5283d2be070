//! Check external tools and assets.

use std::path::Path;

use splitview_common::config::{config_file_path, AppConfig};
use splitview_render_engine::{tool_available, FontMeasurer, FfprobeProber, MediaProber};

pub fn run(config: &AppConfig, config_override: Option<&Path>) -> anyhow::Result<()> {
    println!("splitview System Check");
    println!("{}", "=".repeat(50));

    let config_path = config_override
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path);
    if config_path.exists() {
        println!("[OK] Config: {}", config_path.display());
    } else {
        println!("[OK] Config: defaults ({} not found)", config_path.display());
    }

    let mut required_ok = true;
    for (name, binary) in [
        ("ffmpeg", &config.tools.ffmpeg),
        ("ffprobe", &config.tools.ffprobe),
    ] {
        if tool_available(binary) {
            println!("[OK] {name}: {}", binary.display());
        } else {
            println!("[WARN] {name}: {} not runnable", binary.display());
            required_ok = false;
        }
    }

    match FontMeasurer::load(&config.assets.font) {
        Ok(font) => println!("[OK] Font: {}", font.path().display()),
        Err(err) => println!("[WARN] Font: {err} (use --no-subs or set assets.font)"),
    }

    let timer = &config.assets.timer_video;
    if !timer.is_file() {
        println!("[WARN] Timer video: {} not found (--timers unavailable)", timer.display());
    } else {
        match FfprobeProber::new(&config.tools.ffprobe).probe(timer) {
            Ok(media) => println!(
                "[OK] Timer video: {} ({}x{})",
                timer.display(),
                media.width,
                media.height
            ),
            Err(err) => println!("[WARN] Timer video: {err}"),
        }
    }

    println!();
    if required_ok {
        println!("All required tools are available. splitview is ready.");
    } else {
        println!("Some required tools are missing. Install ffmpeg or set tools.* in the config.");
    }
    Ok(())
}

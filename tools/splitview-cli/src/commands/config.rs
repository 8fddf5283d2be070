//! Show or initialize the configuration file.

use std::path::Path;

use splitview_common::config::{config_file_path, AppConfig};

pub fn run(
    config: &AppConfig,
    config_override: Option<&Path>,
    init: bool,
    force: bool,
) -> anyhow::Result<()> {
    let path = config_override
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path);

    if !init {
        println!("# {}", path.display());
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite it",
            path.display()
        );
    }

    let defaults = AppConfig::default();
    match config_override {
        Some(explicit) => defaults.save_to(explicit)?,
        None => defaults.save()?,
    }
    tracing::info!(path = %path.display(), "Wrote default configuration");
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_defaults_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("splitview").join("config.json");

        run(&AppConfig::default(), Some(&path), true, false).unwrap();
        let written = AppConfig::load_from(&path);
        assert_eq!(written.layout.padding_width, 20);

        let err = run(&AppConfig::default(), Some(&path), true, false).unwrap_err();
        assert!(err.to_string().contains("--force"));
        run(&AppConfig::default(), Some(&path), true, true).unwrap();
    }
}

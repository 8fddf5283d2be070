//! Clip discovery and probing.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use splitview_clip_model::{is_video_file, Clip};
use splitview_common::error::{SplitviewError, SplitviewResult};

/// Geometry and length reported by a prober.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbedMedia {
    pub width: u32,
    pub height: u32,
    pub duration_secs: f64,
}

/// Reads intrinsic metadata from a media file.
pub trait MediaProber {
    fn probe(&self, path: &Path) -> SplitviewResult<ProbedMedia>;

    /// Prober name, for logs.
    fn name(&self) -> &str;
}

/// Prober backed by the `ffprobe` executable.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    binary: PathBuf,
}

impl FfprobeProber {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl MediaProber for FfprobeProber {
    fn probe(&self, path: &Path) -> SplitviewResult<ProbedMedia> {
        let output = Command::new(&self.binary)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height,duration:stream_side_data=rotation:stream_tags=rotate:format=duration",
                "-of",
                "json",
            ])
            .arg(path)
            .output()
            .map_err(|e| {
                SplitviewError::probe(
                    path,
                    format!("failed to run {}: {e}", self.binary.display()),
                )
            })?;

        if !output.status.success() {
            return Err(SplitviewError::probe(
                path,
                format!(
                    "ffprobe exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_probe_output(path, &stdout)
    }

    fn name(&self) -> &str {
        "ffprobe"
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
    #[serde(default)]
    side_data_list: Vec<FfprobeSideData>,
    #[serde(default)]
    tags: FfprobeTags,
}

#[derive(Debug, Deserialize)]
struct FfprobeSideData {
    rotation: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeTags {
    rotate: Option<String>,
}

impl FfprobeStream {
    /// Display rotation in degrees. The display matrix wins over the legacy
    /// `rotate` tag.
    fn rotation_degrees(&self) -> f64 {
        self.side_data_list
            .iter()
            .find_map(|side_data| side_data.rotation)
            .or_else(|| {
                self.tags
                    .rotate
                    .as_deref()
                    .and_then(|r| r.trim().parse::<f64>().ok())
            })
            .unwrap_or(0.0)
    }
}

/// Whether a rotation turns the frame on its side.
fn is_quarter_turn(degrees: f64) -> bool {
    matches!((degrees.round() as i64).rem_euclid(360), 90 | 270)
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Parse ffprobe's JSON report for the first video stream.
///
/// The stream duration wins; containers that only carry a format-level
/// duration (e.g. Matroska) fall back to that. Dimensions are reported as
/// displayed: a quarter-turn rotation swaps width and height, matching the
/// autorotated scratch copy that gets encoded.
pub fn parse_probe_output(path: &Path, json: &str) -> SplitviewResult<ProbedMedia> {
    let report: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| SplitviewError::probe(path, format!("unreadable ffprobe output: {e}")))?;

    let stream = report
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| SplitviewError::probe(path, "no video stream"))?;

    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        (w, h) => {
            return Err(SplitviewError::probe(
                path,
                format!("invalid dimensions {w:?}x{h:?}"),
            ))
        }
    };

    let (width, height) = if is_quarter_turn(stream.rotation_degrees()) {
        (height, width)
    } else {
        (width, height)
    };

    let raw_duration = stream
        .duration
        .filter(|d| d != "N/A")
        .or_else(|| report.format.and_then(|f| f.duration))
        .ok_or_else(|| SplitviewError::probe(path, "no duration reported"))?;
    let duration_secs = raw_duration
        .trim()
        .parse::<f64>()
        .map_err(|_| SplitviewError::probe(path, format!("non-numeric duration {raw_duration:?}")))?;

    Ok(ProbedMedia {
        width,
        height,
        duration_secs,
    })
}

/// Recognized video files directly inside `dir`, sorted by file name.
pub fn eligible_videos(dir: &Path) -> SplitviewResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(SplitviewError::FileNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut videos = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_video_file(&path) {
            videos.push(path);
        }
    }
    videos.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    if videos.is_empty() {
        return Err(SplitviewError::no_eligible_clips(dir));
    }
    Ok(videos)
}

/// Turns files into measured [`Clip`]s.
pub struct ClipInventory<'a> {
    prober: &'a dyn MediaProber,
}

impl<'a> ClipInventory<'a> {
    pub fn new(prober: &'a dyn MediaProber) -> Self {
        Self { prober }
    }

    /// All eligible clips of `dir`, in name order.
    pub fn list(&self, dir: &Path) -> SplitviewResult<Vec<Clip>> {
        let videos = eligible_videos(dir)?;
        self.measure(&videos)
    }

    /// Probe every path, keeping the given order. The first failure aborts.
    pub fn measure(&self, paths: &[PathBuf]) -> SplitviewResult<Vec<Clip>> {
        paths
            .iter()
            .map(|path| {
                let media = self.prober.probe(path)?;
                tracing::debug!(
                    path = %path.display(),
                    width = media.width,
                    height = media.height,
                    duration_secs = media.duration_secs,
                    prober = self.prober.name(),
                    "Clip probed"
                );
                Clip::new(path, media.width, media.height, media.duration_secs)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stream_metadata() {
        let json = r#"{
            "programs": [],
            "streams": [{"width": 1280, "height": 720, "duration": "10.010000"}],
            "format": {"duration": "10.050000"}
        }"#;
        let media = parse_probe_output(Path::new("a.mp4"), json).unwrap();
        assert_eq!(media.width, 1280);
        assert_eq!(media.height, 720);
        assert!((media.duration_secs - 10.01).abs() < 1e-9);
    }

    #[test]
    fn test_parse_falls_back_to_container_duration() {
        let json = r#"{
            "streams": [{"width": 640, "height": 480}],
            "format": {"duration": "5.500000"}
        }"#;
        let media = parse_probe_output(Path::new("b.mkv"), json).unwrap();
        assert!((media.duration_secs - 5.5).abs() < 1e-9);

        let json = r#"{
            "streams": [{"width": 640, "height": 480, "duration": "N/A"}],
            "format": {"duration": "7.0"}
        }"#;
        let media = parse_probe_output(Path::new("c.webm"), json).unwrap();
        assert!((media.duration_secs - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_reports_displayed_size_of_rotated_stream() {
        let json = r#"{
            "streams": [{
                "width": 1920,
                "height": 1080,
                "duration": "3.0",
                "side_data_list": [{"side_data_type": "Display Matrix", "rotation": -90}]
            }],
            "format": {"duration": "3.0"}
        }"#;
        let media = parse_probe_output(Path::new("phone.mov"), json).unwrap();
        assert_eq!((media.width, media.height), (1080, 1920));

        let legacy_tag = r#"{
            "streams": [{"width": 1920, "height": 1080, "duration": "3.0", "tags": {"rotate": "270"}}]
        }"#;
        let media = parse_probe_output(Path::new("old.mp4"), legacy_tag).unwrap();
        assert_eq!((media.width, media.height), (1080, 1920));

        let upside_down = r#"{
            "streams": [{
                "width": 1920,
                "height": 1080,
                "duration": "3.0",
                "side_data_list": [{"rotation": 180}]
            }]
        }"#;
        let media = parse_probe_output(Path::new("flipped.mp4"), upside_down).unwrap();
        assert_eq!((media.width, media.height), (1920, 1080));
    }

    #[test]
    fn test_parse_rejects_bad_metadata() {
        let cases = [
            "not json",
            r#"{"streams": []}"#,
            r#"{"streams": [{"width": 0, "height": 480, "duration": "1.0"}]}"#,
            r#"{"streams": [{"width": 640, "height": 480, "duration": "abc"}]}"#,
            r#"{"streams": [{"width": 640, "height": 480}]}"#,
        ];
        for json in cases {
            let err = parse_probe_output(Path::new("x.mp4"), json).unwrap_err();
            assert!(
                matches!(err, SplitviewError::ProbeFailure { .. }),
                "{json}: {err}"
            );
        }
    }

    #[test]
    fn test_eligible_videos_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.MP4", "a.mov", "notes.txt", "c.webm", ".hidden"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("d.mp4")).unwrap();

        let names: Vec<String> = eligible_videos(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.mov", "b.MP4", "c.webm"]);
    }

    #[test]
    fn test_no_eligible_clips() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("readme.md"), b"").unwrap();
        let err = eligible_videos(dir.path()).unwrap_err();
        assert!(matches!(err, SplitviewError::NoEligibleClips { .. }));

        let missing = dir.path().join("missing");
        let err = eligible_videos(&missing).unwrap_err();
        assert!(matches!(err, SplitviewError::FileNotFound { .. }));
    }

    struct FixedProber;

    impl MediaProber for FixedProber {
        fn probe(&self, path: &Path) -> SplitviewResult<ProbedMedia> {
            if path.ends_with("broken.mp4") {
                return Err(SplitviewError::probe(path, "exit status 1"));
            }
            Ok(ProbedMedia {
                width: 640,
                height: 480,
                duration_secs: 3.0,
            })
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn test_inventory_probes_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["z.mp4", "m.mp4"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let clips = ClipInventory::new(&FixedProber).list(dir.path()).unwrap();
        let names: Vec<&str> = clips.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["m.mp4", "z.mp4"]);
        assert_eq!(clips[0].width, 640);
    }

    #[test]
    fn test_single_probe_failure_aborts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.mp4", "broken.mp4", "c.mp4"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let err = ClipInventory::new(&FixedProber)
            .list(dir.path())
            .unwrap_err();
        assert!(err.is_external_tool_failure());
    }
}

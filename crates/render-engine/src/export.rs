//! Composition jobs and the ffmpeg backend.

use std::ffi::OsString;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use splitview_common::error::{SplitviewError, SplitviewResult};
use splitview_planner::CompositionPlan;

/// A planned composition ready to be encoded.
#[derive(Debug, Clone)]
pub struct CompositionJob {
    /// Plan whose clips point at the files to feed the engine.
    pub plan: CompositionPlan,

    /// Timer overlay source, required when the plan has timers.
    pub timer_video: Option<PathBuf>,

    /// Output file path.
    pub output_path: PathBuf,
}

/// Progress callback for composition encoding.
pub type ProgressCallback = Box<dyn Fn(CompositionProgress) + Send>;

/// Encoding progress report.
#[derive(Debug, Clone)]
pub struct CompositionProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Output time encoded so far.
    pub out_time_secs: f64,

    /// Estimated time remaining in seconds.
    pub eta_secs: f64,

    /// Current stage.
    pub stage: CompositionStage,
}

/// Stages of an encoding run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositionStage {
    Preparing,
    Encoding,
    Finalizing,
    Complete,
}

/// Trait for compositing backends.
pub trait CompositingEngine {
    /// Encode the job; returns the output path.
    fn execute(
        &mut self,
        job: &CompositionJob,
        progress: Option<ProgressCallback>,
    ) -> SplitviewResult<PathBuf>;

    /// Re-mux `source` into `destination` without container metadata.
    fn strip_metadata(&self, source: &Path, destination: &Path) -> SplitviewResult<()>;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

/// Backend driving the `ffmpeg` executable.
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    binary: PathBuf,
}

impl FfmpegBackend {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn run_ffmpeg(
        &self,
        args: &[OsString],
        expected_duration_secs: f64,
        progress: Option<&ProgressCallback>,
    ) -> SplitviewResult<()> {
        tracing::debug!(args = ?args, "Running ffmpeg");
        let mut child = Command::new(&self.binary)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                SplitviewError::engine(format!("Failed to start {}: {e}", self.binary.display()))
            })?;

        let start = std::time::Instant::now();
        tracing::info!(
            pid = child.id(),
            args_len = args.len(),
            expected_duration_secs,
            "ffmpeg process started"
        );

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SplitviewError::engine("Failed to capture ffmpeg stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| SplitviewError::engine("Failed to capture ffmpeg stderr"))?;

        // ffmpeg blocks once the stderr pipe is full.
        let stderr_task = std::thread::spawn(move || -> String {
            let mut reader = BufReader::new(stderr);
            let mut output = String::new();
            match reader.read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        let mut reader = BufReader::new(stdout);
        let mut line = String::new();
        let mut latest = ProgressState::default();
        let mut last_progress_secs = 0.0f64;
        let mut last_progress_wall = std::time::Instant::now();
        loop {
            line.clear();
            let bytes = reader.read_line(&mut line).map_err(|e| {
                SplitviewError::engine(format!("Failed reading ffmpeg progress: {e}"))
            })?;
            if bytes == 0 {
                break;
            }

            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            latest.update(key, value);
            if key != "progress" {
                continue;
            }

            if latest.out_time_secs > last_progress_secs + 0.001 {
                last_progress_secs = latest.out_time_secs;
                last_progress_wall = std::time::Instant::now();
            }
            if let Some(cb) = progress {
                cb(progress_report(
                    &latest,
                    expected_duration_secs,
                    start.elapsed().as_secs_f64(),
                ));
            }
            if last_progress_wall.elapsed().as_secs() >= 10 {
                tracing::warn!(
                    out_time_secs = latest.out_time_secs,
                    elapsed_secs = start.elapsed().as_secs_f64(),
                    "No ffmpeg progress advancement for 10s"
                );
                last_progress_wall = std::time::Instant::now();
            }
        }

        let status = child
            .wait()
            .map_err(|e| SplitviewError::engine(format!("Failed to wait on ffmpeg: {e}")))?;
        let stderr_output = stderr_task
            .join()
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if !status.success() {
            return Err(SplitviewError::engine(format!(
                "ffmpeg failed (status {status}): {}",
                stderr_output.trim()
            )));
        }
        Ok(())
    }
}

impl CompositingEngine for FfmpegBackend {
    fn execute(
        &mut self,
        job: &CompositionJob,
        progress: Option<ProgressCallback>,
    ) -> SplitviewResult<PathBuf> {
        let started = std::time::Instant::now();
        let args = build_ffmpeg_args(job)?;

        if let Some(parent) = job.output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let debug_path = debug_report_path(&job.output_path);
        let report = debug_report(job, &args);
        if let Err(err) = std::fs::write(&debug_path, report) {
            tracing::warn!(error = %err, path = %debug_path.display(), "Failed to write ffmpeg debug report");
        } else {
            tracing::info!(path = %debug_path.display(), "Wrote ffmpeg debug report");
        }

        if let Some(cb) = &progress {
            cb(CompositionProgress {
                progress: 0.0,
                out_time_secs: 0.0,
                eta_secs: 0.0,
                stage: CompositionStage::Preparing,
            });
        }

        let expected = job.plan.output_duration_secs();
        self.run_ffmpeg(&args, expected, progress.as_ref())?;

        if let Some(cb) = &progress {
            cb(CompositionProgress {
                progress: 1.0,
                out_time_secs: expected,
                eta_secs: 0.0,
                stage: CompositionStage::Complete,
            });
        }

        tracing::info!(
            output = %job.output_path.display(),
            elapsed_secs = started.elapsed().as_secs_f64(),
            "Composition finished"
        );
        Ok(job.output_path.clone())
    }

    fn strip_metadata(&self, source: &Path, destination: &Path) -> SplitviewResult<()> {
        let output = Command::new(&self.binary)
            .args(["-y", "-hide_banner", "-loglevel", "error", "-i"])
            .arg(source)
            .args(["-map_metadata", "-1"])
            .arg(destination)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                SplitviewError::engine(format!("Failed to start {}: {e}", self.binary.display()))
            })?;

        if !output.status.success() {
            return Err(SplitviewError::engine(format!(
                "Stripping metadata from {} failed (status {}): {}",
                source.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }

    fn is_available(&self) -> bool {
        tool_available(&self.binary)
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// Whether `binary -version` runs successfully.
pub fn tool_available(binary: &Path) -> bool {
    Command::new(binary)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Full ffmpeg argument vector for a job.
///
/// Inputs are the clips in plan order followed, when timers are enabled, by
/// one copy of the timer video per clip. Paths are passed through as raw
/// OS strings.
pub fn build_ffmpeg_args(job: &CompositionJob) -> SplitviewResult<Vec<OsString>> {
    let plan = &job.plan;

    let mut inputs: Vec<&Path> = plan.clips.iter().map(|clip| clip.path.as_path()).collect();
    if plan.timing.timer_trims_secs.is_some() {
        let timer = job.timer_video.as_deref().ok_or_else(|| {
            SplitviewError::config("plan has timers but no timer video was supplied")
        })?;
        inputs.extend(plan.clips.iter().map(|_| timer));
    }
    if inputs.len() != plan.input_count() {
        return Err(SplitviewError::config(format!(
            "filter graph expects {} inputs, job supplies {}",
            plan.input_count(),
            inputs.len()
        )));
    }

    let mut args: Vec<OsString> = [
        "-y",
        "-hide_banner",
        "-loglevel",
        "error",
        "-nostats",
        "-progress",
        "pipe:1",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();

    for input in inputs {
        args.push("-i".into());
        args.push(input.into());
    }

    args.push("-filter_complex".into());
    args.push(plan.graph.to_filter_complex().into());
    args.push("-map".into());
    args.push(format!("[{}]", plan.graph.video_output).into());

    match &plan.graph.audio_output {
        Some(audio) => {
            args.push("-map".into());
            args.push(format!("[{audio}]").into());
            args.push("-ac".into());
            args.push("2".into());
        }
        None => args.push("-an".into()),
    }

    args.push("-vsync".into());
    args.push("0".into());
    args.push(job.output_path.as_os_str().to_owned());
    Ok(args)
}

/// `<output>.ffmpeg-debug.txt`
pub fn debug_report_path(output_path: &Path) -> PathBuf {
    output_path.with_extension("ffmpeg-debug.txt")
}

fn debug_report(job: &CompositionJob, args: &[OsString]) -> String {
    let plan = &job.plan;
    let clips = plan
        .clips
        .iter()
        .map(|c| {
            format!(
                "{}:{}x{}:{:.3}s",
                c.name, c.width, c.height, c.duration_secs
            )
        })
        .collect::<Vec<_>>()
        .join(",");

    format!(
        "generated_at={}\nclips={}\nfinal_height={}\ntotal_width={:.1}\ntotal_duration_secs={:.3}\noutput_duration_secs={:.3}\nslow_motion_factor={}\nfont_size={}\naudio={}\nstages={}\nfilter_len={}\nffmpeg_args={}\n",
        chrono::Utc::now().to_rfc3339(),
        clips,
        plan.layout.final_height,
        plan.layout.total_width(),
        plan.timing.total_duration_secs,
        plan.output_duration_secs(),
        plan.options.slow_motion_factor,
        plan.subtitles
            .as_ref()
            .map(|s| s.font_size.to_string())
            .unwrap_or_else(|| "none".to_string()),
        if plan.audio.is_mixed() { "mixed" } else { "dropped" },
        plan.graph.stages.len(),
        plan.graph.to_filter_complex().len(),
        args.iter()
            .map(|arg| arg.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" "),
    )
}

#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            // Despite the name, ffmpeg reports microseconds here too.
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "progress" => {
                self.complete = value == "end";
            }
            _ => {}
        }
    }
}

fn progress_report(
    state: &ProgressState,
    expected_duration_secs: f64,
    elapsed_secs: f64,
) -> CompositionProgress {
    let progress = if expected_duration_secs <= 0.0 {
        0.0
    } else {
        (state.out_time_secs / expected_duration_secs).clamp(0.0, 1.0)
    };

    let eta_secs = if progress > 0.0 {
        (elapsed_secs / progress) - elapsed_secs
    } else {
        0.0
    }
    .max(0.0);

    CompositionProgress {
        progress: if state.complete { 1.0 } else { progress },
        out_time_secs: state.out_time_secs,
        eta_secs,
        stage: if state.complete {
            CompositionStage::Finalizing
        } else {
            CompositionStage::Encoding
        },
    }
}

//! Filter graph intermediate representation.
//!
//! Planning produces an ordered list of [`Stage`]s wired together by named
//! streams. [`FilterGraph::to_filter_complex`] renders them into ffmpeg's
//! `-filter_complex` syntax; nothing else in the planner knows that syntax.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// A stream feeding a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum StreamRef {
    /// Video stream of the input file at this index.
    Video(usize),
    /// Audio stream of the input file at this index.
    Audio(usize),
    /// Output of an earlier stage.
    Label(String),
}

impl StreamRef {
    pub fn label(name: impl Into<String>) -> Self {
        Self::Label(name.into())
    }
}

impl fmt::Display for StreamRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video(index) => write!(f, "[{index}:v]"),
            Self::Audio(index) => write!(f, "[{index}:a]"),
            Self::Label(name) => write!(f, "[{name}]"),
        }
    }
}

/// One processing step of the composition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Stage {
    /// Resize a stream to exact pixel dimensions.
    Scale {
        input: StreamRef,
        width: u32,
        height: u32,
        output: String,
    },

    /// Cut a stream after `duration_secs`.
    Trim {
        input: StreamRef,
        duration_secs: f64,
        output: String,
    },

    /// Black rectangle generator placed between two clips.
    Pad {
        width: u32,
        height: u32,
        duration_secs: f64,
        output: String,
    },

    /// Horizontal join; a single input passes through unchanged.
    Stack {
        inputs: Vec<StreamRef>,
        output: String,
    },

    /// Opaque black band covering the bottom `height_fraction` of the frame.
    Band {
        input: StreamRef,
        height_fraction: f64,
        output: String,
    },

    /// Label text centered on `center_x`, `bottom_margin` above the bottom edge.
    DrawText {
        input: StreamRef,
        text: String,
        font_file: PathBuf,
        font_size: u32,
        center_x: i64,
        bottom_margin: u32,
        output: String,
    },

    /// Place `overlay` on top of `base` with its top-left corner at (x, y).
    Overlay {
        base: StreamRef,
        overlay: StreamRef,
        x: i64,
        y: i64,
        output: String,
    },

    /// Stretch presentation time by `factor` (slow motion for factor > 1).
    Retime {
        input: StreamRef,
        factor: f64,
        output: String,
    },

    /// Mix audio inputs and change their tempo.
    Audio {
        inputs: Vec<StreamRef>,
        tempo: f64,
        output: String,
    },
}

impl Stage {
    fn inputs(&self) -> Vec<&StreamRef> {
        match self {
            Self::Scale { input, .. }
            | Self::Trim { input, .. }
            | Self::Band { input, .. }
            | Self::DrawText { input, .. }
            | Self::Retime { input, .. } => vec![input],
            Self::Overlay { base, overlay, .. } => vec![base, overlay],
            Self::Stack { inputs, .. } | Self::Audio { inputs, .. } => inputs.iter().collect(),
            Self::Pad { .. } => Vec::new(),
        }
    }

    /// Render this stage as one ffmpeg filter chain.
    pub fn to_filter_chain(&self) -> String {
        match self {
            Self::Scale {
                input,
                width,
                height,
                output,
            } => format!("{input}scale={width}:{height}[{output}]"),
            Self::Trim {
                input,
                duration_secs,
                output,
            } => format!("{input}trim=duration={duration_secs:.6}[{output}]"),
            Self::Pad {
                width,
                height,
                duration_secs,
                output,
            } => format!("color=c=black:s={width}x{height}:d={duration_secs:.6}[{output}]"),
            Self::Stack { inputs, output } => {
                let joined: String = inputs.iter().map(ToString::to_string).collect();
                if inputs.len() == 1 {
                    format!("{joined}null[{output}]")
                } else {
                    format!("{joined}hstack=inputs={}[{output}]", inputs.len())
                }
            }
            Self::Band {
                input,
                height_fraction,
                output,
            } => format!(
                "{input}drawbox=x=0:y=ih-h:w=iw:h=ih*{height_fraction:.6}:color=black@1.0:t=fill[{output}]"
            ),
            Self::DrawText {
                input,
                text,
                font_file,
                font_size,
                center_x,
                bottom_margin,
                output,
            } => format!(
                "{input}drawtext=fontfile={font}:text={text}:expansion=none:fontcolor=white:fontsize={font_size}:x={center_x}-text_w/2:y=h-text_h-{bottom_margin}[{output}]",
                font = escape_filter_value(&font_file.to_string_lossy()),
                text = escape_filter_value(text),
            ),
            Self::Overlay {
                base,
                overlay,
                x,
                y,
                output,
            } => format!("{base}{overlay}overlay=x={x}:y={y}[{output}]"),
            Self::Retime {
                input,
                factor,
                output,
            } => format!("{input}setpts={factor:.6}*PTS[{output}]"),
            Self::Audio {
                inputs,
                tempo,
                output,
            } => {
                let joined: String = inputs.iter().map(ToString::to_string).collect();
                format!(
                    "{joined}amix=inputs={},atempo={tempo:.6}[{output}]",
                    inputs.len()
                )
            }
        }
    }
}

/// Ordered stages plus the labels the encoder should map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterGraph {
    pub stages: Vec<Stage>,
    pub video_output: String,
    pub audio_output: Option<String>,
}

impl FilterGraph {
    /// Render the graph as an ffmpeg `-filter_complex` argument.
    pub fn to_filter_complex(&self) -> String {
        self.stages
            .iter()
            .map(Stage::to_filter_chain)
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Number of input files the graph reads: one past the highest
    /// `[i:v]`/`[i:a]` index it refers to.
    pub fn input_count(&self) -> usize {
        self.stages
            .iter()
            .flat_map(Stage::inputs)
            .filter_map(|stream| match stream {
                StreamRef::Video(index) | StreamRef::Audio(index) => Some(index + 1),
                StreamRef::Label(_) => None,
            })
            .max()
            .unwrap_or(0)
    }
}

/// Escape a filter option value so it survives both parsing levels of
/// ffmpeg's filter graph syntax as one literal token.
///
/// The option parser splits on `:` and treats `\` and `'` specially; spaces
/// are escaped so leading and trailing ones are kept. The graph parser then
/// additionally splits on `[],;`.
pub fn escape_filter_value(value: &str) -> String {
    let option_level = backslash_escape(value, &['\\', '\'', ':', ' ']);
    backslash_escape(&option_level, &['\\', '\'', '[', ']', ',', ';'])
}

fn backslash_escape(value: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if special.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

//! Splitview Planner
//!
//! Turns a list of measured clips into everything the compositing engine
//! needs to place them side by side:
//! - **Layout:** Shared height, aspect-preserving widths, x-offsets with padding
//! - **Timing:** Total composition length and per-clip timer trims
//! - **Subtitles:** One font size that fits every clip's label band
//! - **Audio:** Mix and retime, or drop when the slow-down is too strong
//! - **Filter Graph:** Ordered stages plus a serializer for ffmpeg syntax
//!
//! This crate does no I/O and spawns no processes.
//! Text measurement is injected through [`LabelMeasurer`].

pub mod audio;
pub mod emit;
pub mod graph;
pub mod layout;
pub mod plan;
pub mod subtitles;
pub mod timing;

pub use audio::{AudioDecision, DropReason};
pub use graph::{FilterGraph, Stage, StreamRef};
pub use layout::LayoutPlan;
pub use plan::{plan_composition, CompositionPlan, PlanSettings, TimerGeometry};
pub use subtitles::{LabelMeasurer, SubtitlePlan};
pub use timing::TimingPlan;

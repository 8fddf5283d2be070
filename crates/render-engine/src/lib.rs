//! Splitview Render Engine
//!
//! Everything that touches the filesystem or spawns a process:
//! clip discovery and probing, the metadata-stripped scratch cache, label
//! measurement with a real font, and the ffmpeg compositing backend.
//!
//! # Pipeline Architecture
//!
//! ```text
//! input dir ──► inventory ──► cache ──► inventory (probe copies)
//!                                              │
//!                      fonts ──► planner ◄─────┘
//!                                   │
//!                                   ▼
//!                          export (ffmpeg) ──► output.mp4
//!                                           └► output.ffmpeg-debug.txt
//! ```

pub mod cache;
pub mod export;
pub mod fonts;
pub mod inventory;
pub mod pipeline;

pub use cache::ScratchCache;
pub use export::*;
pub use fonts::FontMeasurer;
pub use inventory::{eligible_videos, ClipInventory, FfprobeProber, MediaProber, ProbedMedia};
pub use pipeline::{ComposeOutcome, ComposeRequest, Pipeline};

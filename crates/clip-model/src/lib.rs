//! Splitview Clip Model
//!
//! Defines the data contracts consumed by the planners:
//! - **Clips:** Input videos with their measured geometry and duration
//! - **Options:** Per-run composition settings (slow motion, freeze, overlays, audio)
//!
//! Every value here is immutable once created; planners only read them.

pub mod clip;
pub mod options;

pub use clip::*;
pub use options::*;

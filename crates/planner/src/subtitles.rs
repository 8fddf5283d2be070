//! Subtitle font fitting.
//!
//! Each clip gets its label drawn in a band at the bottom of the
//! composition. All labels share one font size: the largest size at which
//! every label fits both its clip's width and the band's height.
//!
//! Text extents scale linearly with font size, so a single measurement at a
//! reference size is enough to derive the fitting size of each label.

use serde::Serialize;
use splitview_clip_model::Clip;

use crate::layout::LayoutPlan;

/// Upper bound for the shared font size. Also used when no label constrains
/// the size (all labels empty).
pub const MAX_FONT_SIZE: u32 = 1000;

/// Relative slack applied before flooring, so a ratio that is mathematically
/// an integer does not round down to the previous one.
const FIT_TOLERANCE: f64 = 1e-9;

/// Measures rendered text with a fixed typeface.
pub trait LabelMeasurer {
    /// Width and height of `text` drawn at `font_size`.
    fn measure(&self, text: &str, font_size: f64) -> (f64, f64);
}

/// A label anchored under one clip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClipLabel {
    pub clip: String,

    /// Text as displayed (not escaped).
    pub text: String,

    /// Horizontal center of the label: the clip's layout midpoint.
    pub anchor_x: f64,

    /// Largest size at which this label alone fits, `None` when the label
    /// imposes no limit.
    pub fitting_size: Option<u32>,

    /// The label is wider or taller than its space even at size 1.
    pub overflows: bool,
}

/// Shared subtitle parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubtitlePlan {
    pub font_size: u32,

    /// Height of the band reserved at the bottom of the composition.
    pub band_height: f64,

    pub labels: Vec<ClipLabel>,
}

impl SubtitlePlan {
    /// Fit one shared font size for all clip labels.
    pub fn fit(
        clips: &[Clip],
        layout: &LayoutPlan,
        band_fraction: f64,
        reference_size: f64,
        measurer: &dyn LabelMeasurer,
    ) -> Self {
        let band_height = band_fraction * layout.final_height as f64;

        let labels: Vec<ClipLabel> = clips
            .iter()
            .zip(&layout.entries)
            .enumerate()
            .map(|(index, (clip, entry))| {
                let text = clip.label();
                let reference = measurer.measure(&text, reference_size);
                let raw = fitting_size(reference_size, reference, entry.scaled_width, band_height);
                let overflows = raw.is_some_and(|size| size < 1.0);
                if overflows {
                    tracing::warn!(
                        clip = %clip.name,
                        "Label does not fit its clip even at font size 1"
                    );
                }
                ClipLabel {
                    clip: clip.name.clone(),
                    text,
                    anchor_x: layout.midpoint(index),
                    fitting_size: raw.map(|size| size.clamp(1.0, MAX_FONT_SIZE as f64) as u32),
                    overflows,
                }
            })
            .collect();

        let font_size = labels
            .iter()
            .filter_map(|label| label.fitting_size)
            .fold(MAX_FONT_SIZE, u32::min);

        tracing::debug!(
            font_size,
            band_height,
            labels = labels.len(),
            "Subtitle font size fitted"
        );

        Self {
            font_size,
            band_height,
            labels,
        }
    }
}

/// Largest integer size at which a label measuring `reference` at
/// `reference_size` fits inside `allowed_width` x `allowed_height`. Not
/// clamped: below 1 means the label never fits.
fn fitting_size(
    reference_size: f64,
    (reference_width, reference_height): (f64, f64),
    allowed_width: f64,
    allowed_height: f64,
) -> Option<f64> {
    let ratios = [
        (allowed_width, reference_width),
        (allowed_height, reference_height),
    ];
    let ratio = ratios
        .iter()
        .filter(|(_, measured)| *measured > 0.0)
        .map(|(allowed, measured)| allowed / measured)
        .reduce(f64::min)?;

    Some((reference_size * ratio * (1.0 + FIT_TOLERANCE)).floor())
}

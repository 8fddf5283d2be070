//! Label measurement with a TrueType/OpenType font.
//!
//! Extents are taken in font units and converted with `size / units_per_em`,
//! the same em-based sizing the text-drawing filter applies to `fontsize`.
//! Measuring at any size is therefore exactly linear in that size.

use std::path::{Path, PathBuf};

use rusttype::{Font, Scale};
use splitview_common::error::{SplitviewError, SplitviewResult};
use splitview_planner::LabelMeasurer;

/// Measures labels with the same font file the text-drawing filter uses.
pub struct FontMeasurer {
    font: Font<'static>,
    path: PathBuf,
    /// Scale at which rusttype reports metrics unchanged, in font units.
    unit_scale: Scale,
    units_per_em: f64,
    /// Ascent minus descent, in font units.
    line_height_units: f64,
}

impl FontMeasurer {
    pub fn load(path: &Path) -> SplitviewResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| SplitviewError::font(path, e.to_string()))?;
        let font = Font::try_from_vec(bytes)
            .ok_or_else(|| SplitviewError::font(path, "not a valid TrueType/OpenType font"))?;

        let units_per_em = f64::from(font.units_per_em());
        let v_metrics = font.v_metrics_unscaled();
        let line_height = v_metrics.ascent - v_metrics.descent;
        if units_per_em <= 0.0 || line_height <= 0.0 {
            return Err(SplitviewError::font(path, "font has no usable vertical metrics"));
        }

        tracing::debug!(
            path = %path.display(),
            glyphs = font.glyph_count(),
            units_per_em,
            "Font loaded"
        );
        Ok(Self {
            font,
            path: path.to_path_buf(),
            // rusttype scales by `scale / (ascent - descent)`, which is 1.0 here.
            unit_scale: Scale::uniform(line_height),
            units_per_em,
            line_height_units: f64::from(line_height),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Advance of `text` including pair kerning, in font units.
    fn advance_units(&self, text: &str) -> f64 {
        let mut previous = None;
        let mut advance = 0.0;
        for glyph in self.font.glyphs_for(text.chars()) {
            let id = glyph.id();
            if let Some(prev) = previous {
                advance += f64::from(self.font.pair_kerning(self.unit_scale, prev, id));
            }
            advance += f64::from(glyph.scaled(self.unit_scale).h_metrics().advance_width);
            previous = Some(id);
        }
        advance
    }
}

impl LabelMeasurer for FontMeasurer {
    fn measure(&self, text: &str, font_size: f64) -> (f64, f64) {
        if text.is_empty() {
            return (0.0, 0.0);
        }

        let per_unit = font_size / self.units_per_em;
        let width = self.advance_units(text) * per_unit;
        let height = self.line_height_units * per_unit;
        (width.max(0.0), height.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use splitview_clip_model::Clip;
    use splitview_planner::{LayoutPlan, SubtitlePlan};

    fn dejavu() -> FontMeasurer {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSans.ttf");
        FontMeasurer::load(&path).unwrap()
    }

    #[test]
    fn test_missing_font_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.ttf");
        let err = FontMeasurer::load(&missing).err().unwrap();
        assert!(matches!(err, SplitviewError::FontUnavailable { .. }));
    }

    #[test]
    fn test_garbage_font_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.ttf");
        std::fs::write(&path, b"definitely not a font").unwrap();
        let err = FontMeasurer::load(&path).err().unwrap();
        assert!(matches!(err, SplitviewError::FontUnavailable { .. }));
        assert!(err.to_string().contains("bad.ttf"));
    }

    #[test]
    fn test_line_height_follows_em_size() {
        // DejaVu Sans: 2048 units per em, ascender 1901, descender -483.
        let font = dejavu();
        let (_, height) = font.measure("a", 2048.0);
        assert_eq!(height, 2384.0);
        assert_eq!(font.measure("", 100.0), (0.0, 0.0));
    }

    #[test]
    fn test_extents_scale_linearly() {
        let font = dejavu();
        let (w100, h100) = font.measure("heat 1 lane 4", 100.0);
        assert!(w100 > 0.0 && h100 > 0.0);

        for factor in [0.25, 0.37, 1.23, 2.0, 4.0] {
            let (w, h) = font.measure("heat 1 lane 4", 100.0 * factor);
            assert!((w - w100 * factor).abs() <= w100 * 1e-12, "width at x{factor}");
            assert!((h - h100 * factor).abs() <= h100 * 1e-12, "height at x{factor}");
        }
    }

    #[test]
    fn test_longer_text_is_wider() {
        let font = dejavu();
        let (short, _) = font.measure("lane", 100.0);
        let (long, _) = font.measure("lane lane", 100.0);
        assert!(long > short * 2.0);
    }

    #[test]
    fn test_fitted_size_ignores_reference_size() {
        let font = dejavu();
        let clips = vec![
            Clip::new("/videos/a.mp4", 1280, 720, 1.0).unwrap(),
            Clip::new("/videos/b.mp4", 640, 480, 1.0).unwrap(),
        ];
        let layout = LayoutPlan::plan(&clips, 20).unwrap();

        // Band is 72px; line height is 2384/2048 em, so 72 * 2048 / 2384 = 61.85.
        for reference in [25.0, 37.0, 50.0, 100.0, 123.0, 200.0, 400.0] {
            let plan = SubtitlePlan::fit(&clips, &layout, 0.1, reference, &font);
            assert_eq!(plan.font_size, 61, "reference size {reference}");
        }

        let narrow = vec![
            Clip::new("/videos/wide.mp4", 1920, 1080, 1.0).unwrap(),
            Clip::new("/videos/a much longer clip name.mp4", 480, 1080, 1.0).unwrap(),
        ];
        let layout = LayoutPlan::plan(&narrow, 20).unwrap();
        let base = SubtitlePlan::fit(&narrow, &layout, 0.1, 100.0, &font).font_size;
        for reference in [10.0, 37.0, 123.0, 333.0, 1000.0] {
            let plan = SubtitlePlan::fit(&narrow, &layout, 0.1, reference, &font);
            assert_eq!(plan.font_size, base, "reference size {reference}");
        }
    }
}

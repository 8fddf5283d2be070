pub mod check;
pub mod compose;
pub mod config;
pub mod info;
pub mod plan;

use splitview_clip_model::CompositionOptions;
use splitview_common::config::AppConfig;
use splitview_common::error::SplitviewResult;
use splitview_planner::CompositionPlan;
use splitview_render_engine::FontMeasurer;

/// Load the label font when the options ask for subtitles.
pub(crate) fn measurer_for(
    config: &AppConfig,
    options: &CompositionOptions,
) -> SplitviewResult<Option<FontMeasurer>> {
    if options.insert_subtitles {
        FontMeasurer::load(&config.assets.font).map(Some)
    } else {
        Ok(None)
    }
}

/// `[WARN]` lines for everything the plan had to give up on.
pub(crate) fn plan_warnings(plan: &CompositionPlan) -> Vec<String> {
    let mut warnings: Vec<String> = plan.audio.warning().into_iter().collect();
    if let Some(subtitles) = &plan.subtitles {
        warnings.extend(
            subtitles
                .labels
                .iter()
                .filter(|label| label.overflows)
                .map(|label| {
                    format!(
                        "Label of {} does not fit its clip even at font size 1",
                        label.clip
                    )
                }),
        );
    }
    warnings
}

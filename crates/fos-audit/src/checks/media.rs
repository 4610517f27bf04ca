//! Autoplaying audio

use crate::check::{CheckContext, Evaluation};
use crate::matcher::MatchContext;
use crate::preload::{media_metadata, media_source};
use crate::registry::Registry;
use serde_json::json;

const DEFAULT_ALLOWED_DURATION: f64 = 3.0;

pub(super) fn register(registry: &mut Registry) {
    registry
        .add_evaluate("no-autoplay-audio", no_autoplay_audio)
        .add_matches("media-has-source", |cx: &MatchContext<'_>| media_source(cx.tree, cx.node).is_some());
}

/// Options: `allowedDuration` in seconds. Short clips pass; longer ones
/// pass only when the user gets controls to stop them.
fn no_autoplay_audio(cx: &mut CheckContext<'_>) -> anyhow::Result<Evaluation> {
    let allowed = cx.option::<f64>("allowedDuration").unwrap_or(DEFAULT_ALLOWED_DURATION);
    let Some(metadata) = media_metadata(cx.tree(), cx.node()) else {
        tracing::debug!("No media metadata for {:?}", cx.node());
        return Ok(Evaluation::incomplete());
    };
    let node = cx.vnode();
    let playable = (metadata.duration - metadata.start).max(0.0);
    if playable <= allowed && !node.has_attr("loop") {
        return Ok(true.into());
    }
    if node.has_attr("controls") {
        return Ok(true.into());
    }
    cx.data(json!({ "duration": playable, "allowedDuration": allowed }));
    Ok(false.into())
}

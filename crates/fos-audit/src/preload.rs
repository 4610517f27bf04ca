//! Media preloading
//!
//! Rules about autoplaying media need each clip's duration. The host loads
//! it through a [`MediaProvider`]; results are stored on the node's cache
//! so evaluators can read them synchronously.

use crate::{AuditError, Result};
use fos_vdom::{VNodeId, VirtualTree};
use serde::{Deserialize, Serialize};
use smol::future::{self, BoxedLocal};
use smol::Timer;
use std::rc::Rc;
use std::time::{Duration, Instant};

const METADATA_KEY: &str = "media:metadata";

/// What the host knows about a media resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaMetadata {
    /// Seconds; infinite for live streams
    pub duration: f64,
    /// Playback start offset in seconds (`#t=` media fragment)
    #[serde(default)]
    pub start: f64,
}

/// Loads media metadata on behalf of the engine
pub trait MediaProvider {
    fn metadata(&self, src: &str) -> BoxedLocal<anyhow::Result<MediaMetadata>>;
}

/// URL a media element plays: its `src`, or the first `<source src>`
pub fn media_source(tree: &VirtualTree, id: VNodeId) -> Option<String> {
    let node = tree.get(id)?;
    if let Some(src) = node.attr("src").map(str::trim).filter(|s| !s.is_empty()) {
        return Some(src.to_string());
    }
    tree.element_children(id)
        .filter(|child| tree[*child].node_name() == "source")
        .find_map(|child| tree[child].attr("src").map(str::trim).filter(|s| !s.is_empty()))
        .map(str::to_string)
}

/// Metadata loaded for a media element, if any
pub fn media_metadata(tree: &VirtualTree, id: VNodeId) -> Option<Rc<MediaMetadata>> {
    tree.get(id)?.cache().get::<MediaMetadata>(METADATA_KEY).flatten()
}

fn is_media(tree: &VirtualTree, id: VNodeId) -> bool {
    matches!(tree[id].node_name(), "audio" | "video")
}

/// Load metadata for every media element of the tree, one at a time, until
/// `timeout` runs out. Elements that fail or are not reached keep no
/// metadata; returns how many were loaded.
pub async fn preload_media(tree: &VirtualTree, provider: &dyn MediaProvider, timeout: Duration) -> usize {
    let started = Instant::now();
    let media: Vec<VNodeId> = tree.nodes().map(|n| n.id()).filter(|id| is_media(tree, *id)).collect();
    let mut loaded = 0;

    for id in media {
        let Some(src) = media_source(tree, id) else {
            continue;
        };
        let remaining = timeout.saturating_sub(started.elapsed());
        let deadline = async move {
            Timer::after(remaining).await;
            Err(anyhow::Error::new(AuditError::Timeout {
                what: "media preload".to_string(),
                after_ms: timeout.as_millis() as u64,
            }))
        };
        match future::or(provider.metadata(&src), deadline).await {
            Ok(metadata) => {
                if let Err(e) = store(tree, id, metadata) {
                    tracing::warn!("Could not store metadata of {}: {}", src, e);
                    continue;
                }
                loaded += 1;
            }
            Err(e) if e.downcast_ref::<AuditError>().is_some_and(|e| matches!(e, AuditError::Timeout { .. })) => {
                tracing::warn!("{}; continuing without media metadata", e);
                break;
            }
            Err(e) => tracing::warn!("Could not load metadata of {}: {}", src, e),
        }
    }
    tracing::debug!("Preloaded metadata of {} media elements", loaded);
    loaded
}

fn store(tree: &VirtualTree, id: VNodeId, metadata: MediaMetadata) -> Result<()> {
    tree[id].cache().set(METADATA_KEY, Some(metadata))?;
    Ok(())
}

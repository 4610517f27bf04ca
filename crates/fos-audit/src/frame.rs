//! Cross-frame messaging
//!
//! Frames the composed tree cannot enter (other origins, documents loaded
//! elsewhere) run their part of an audit on their own side. The initiator
//! sends each one a [`FrameRequest`] through a [`FrameMessenger`] and gets
//! back a [`PartialResult`]. Both travel as JSON so any host channel can
//! carry them; [`ChannelMessenger`] is an in-process channel for hosts
//! that keep every document in one process.

use crate::config::RunOptions;
use crate::context::{ContextSpec, FrameContext};
use crate::engine::Engine;
use crate::reporter::Environment;
use crate::result::{NodeRef, RuleResult};
use crate::{AuditError, Result};
use fos_dom::Page;
use serde::{Deserialize, Serialize};
use smol::channel::{self, Receiver, Sender};
use smol::future::BoxedLocal;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

/// A frame as seen from the document embedding it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialFrame {
    /// The frame element, in the embedding document
    pub node: NodeRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    /// Scope inside the frame's document
    pub context: ContextSpec,
}

impl From<&FrameContext> for PartialFrame {
    fn from(frame: &FrameContext) -> Self {
        Self {
            node: frame.node.clone(),
            src: frame.src.clone(),
            context: frame.context.clone(),
        }
    }
}

/// Request for one frame's partial result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameRequest {
    pub frame: PartialFrame,
    pub options: RunOptions,
}

/// One document's contribution to a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialResult {
    /// Frames of this document that need their own partial result
    #[serde(default)]
    pub frames: Vec<PartialFrame>,
    pub results: Vec<RuleResult>,
    /// Only present on the initiator's partial
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
}

/// Host channel into frames
pub trait FrameMessenger {
    fn request(&self, request: FrameRequest) -> BoxedLocal<anyhow::Result<PartialResult>>;
}

struct FrameEnvelope {
    payload: String,
    reply: Sender<std::result::Result<String, String>>,
}

/// In-process messenger routing requests by frame `src`
#[derive(Default)]
pub struct ChannelMessenger {
    routes: RefCell<HashMap<String, Sender<FrameEnvelope>>>,
}

impl fmt::Debug for ChannelMessenger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let routes = self.routes.borrow();
        let mut srcs: Vec<&String> = routes.keys().collect();
        srcs.sort();
        f.debug_struct("ChannelMessenger").field("routes", &srcs).finish()
    }
}

impl ChannelMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a route for frames loading `src`. Requests queue until the
    /// responder serves them.
    pub fn connect(&self, src: &str) -> FrameResponder {
        let (sender, receiver) = channel::unbounded();
        if self.routes.borrow_mut().insert(src.to_string(), sender).is_some() {
            tracing::debug!("Replaced frame route {}", src);
        }
        FrameResponder {
            src: src.to_string(),
            receiver,
        }
    }

    pub fn disconnect(&self, src: &str) {
        self.routes.borrow_mut().remove(src);
    }
}

fn unreachable(frame: &str, reason: impl Into<String>) -> anyhow::Error {
    anyhow::Error::new(AuditError::FrameUnreachable {
        frame: frame.to_string(),
        reason: reason.into(),
    })
}

impl FrameMessenger for ChannelMessenger {
    fn request(&self, request: FrameRequest) -> BoxedLocal<anyhow::Result<PartialResult>> {
        let src = request.frame.src.clone().unwrap_or_default();
        let route = self.routes.borrow().get(&src).cloned();
        Box::pin(async move {
            let Some(route) = route else {
                return Err(unreachable(&src, "no route"));
            };
            let payload = serde_json::to_string(&request)?;
            let (reply, replies) = channel::bounded(1);
            route
                .send(FrameEnvelope { payload, reply })
                .await
                .map_err(|_| unreachable(&src, "frame closed"))?;
            match replies.recv().await.map_err(|_| unreachable(&src, "no reply"))? {
                Ok(json) => Ok(serde_json::from_str(&json)?),
                Err(message) => Err(unreachable(&src, message)),
            }
        })
    }
}

/// Frame side of a [`ChannelMessenger`] route
#[derive(Debug)]
pub struct FrameResponder {
    src: String,
    receiver: Receiver<FrameEnvelope>,
}

impl FrameResponder {
    pub fn src(&self) -> &str {
        &self.src
    }

    /// Answer the next request with a partial run over `page`. Returns
    /// `false` once the route is closed.
    pub async fn serve_next(&self, engine: &Engine, page: &Page) -> Result<bool> {
        let Ok(envelope) = self.receiver.recv().await else {
            return Ok(false);
        };
        let reply = match serde_json::from_str::<FrameRequest>(&envelope.payload) {
            Ok(request) => engine
                .partial(page, &request.frame.context, &request.options, false)
                .await
                .and_then(|partial| Ok(serde_json::to_string(&partial)?))
                .map_err(|e| e.to_string()),
            Err(e) => Err(format!("malformed frame request: {e}")),
        };
        if let Err(message) = &reply {
            tracing::warn!("Frame {} could not run: {}", self.src, message);
        }
        if envelope.reply.send(reply).await.is_err() {
            tracing::debug!("Requester of frame {} went away", self.src);
        }
        Ok(true)
    }

    /// Serve requests until the route closes; returns how many were served
    pub async fn serve(&self, engine: &Engine, page: &Page) -> Result<usize> {
        let mut served = 0;
        while self.serve_next(engine, page).await? {
            served += 1;
        }
        Ok(served)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fos_vdom::TargetPart;
    use serde_json::json;

    fn request(src: &str) -> FrameRequest {
        FrameRequest {
            frame: PartialFrame {
                node: NodeRef {
                    html: format!(r#"<iframe src="{src}">"#),
                    target: vec![TargetPart::Selector("iframe".to_string())],
                    ancestry: None,
                    node_indexes: vec![3],
                    element: None,
                },
                src: Some(src.to_string()),
                context: ContextSpec::document(),
            },
            options: RunOptions::default(),
        }
    }

    #[test]
    fn test_request_round_trips_as_json() {
        let value = serde_json::to_value(request("https://a.test/")).unwrap();
        assert_eq!(value["frame"]["src"], json!("https://a.test/"));
        assert_eq!(value["frame"]["node"]["nodeIndexes"], json!([3]));
        let back: FrameRequest = serde_json::from_value(value).unwrap();
        assert_eq!(back, request("https://a.test/"));
    }

    #[test]
    fn test_unknown_route_is_unreachable() {
        let messenger = ChannelMessenger::new();
        let err = smol::block_on(messenger.request(request("https://nowhere.test/"))).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AuditError>(),
            Some(AuditError::FrameUnreachable { .. })
        ));
    }

    #[test]
    fn test_closed_route_is_unreachable() {
        let messenger = ChannelMessenger::new();
        let responder = messenger.connect("https://a.test/");
        drop(responder);
        let err = smol::block_on(messenger.request(request("https://a.test/"))).unwrap_err();
        assert!(err.to_string().contains("unreachable"));
    }
}

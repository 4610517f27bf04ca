//! fOS Audit
//!
//! Accessibility rule engine. Rules and checks are declared as JSON packs
//! and bound to native handlers by id; an [`Engine`] session runs them over
//! the composed tree of a page, merges results from frames it cannot read
//! directly and hands the merged results to a reporter.
//!
//! # Example
//! ```rust,ignore
//! use fos_audit::{ContextSpec, Engine, RunOptions};
//!
//! let engine = Engine::new(Default::default())?;
//! let report = engine.run_blocking(&page, &ContextSpec::document(), &RunOptions::default())?;
//! println!("{} violations", report["violations"].as_array().map_or(0, Vec::len));
//! ```

mod aggregate;
mod audit;
mod check;
pub mod checks;
mod config;
mod context;
mod engine;
mod frame;
mod locale;
mod matcher;
mod pack;
mod plugin;
mod preload;
mod registry;
mod reporter;
mod result;
mod rule;
mod template;

pub use aggregate::{aggregate_result, finalize_rule, AggregatedResults};
pub use audit::{Audit, RuleInfo};
pub use check::{CheckContext, Evaluation, Outcome};
pub use config::{
    Branding, CheckToggle, Config, ConfigureSpec, Preload, ResultType, RuleToggle, RunOnly, RunOnlyKind,
    RunOptions, Viewport,
};
pub use context::{Context, ContextSpec, FrameContext, FramePath};
pub use engine::Engine;
pub use frame::{ChannelMessenger, FrameMessenger, FrameRequest, FrameResponder, PartialFrame, PartialResult};
pub use locale::{CheckLocale, FailureSummary, Locale, RuleLocale};
pub use matcher::{MatchContext, MatchExpression, ValueMatcher};
pub use pack::{CheckMessages, CheckMetadata, CheckRef, CheckSpec, Impact, MatchSpec, Message, RuleMetadata, RuleSpec};
pub use plugin::{PluginCommand, PluginDescriptor, PluginError, PluginRegistry};
pub use preload::{media_metadata, media_source, preload_media, MediaMetadata, MediaProvider};
pub use registry::{After, Evaluate, Matches, Registry};
pub use reporter::{
    Environment, RelatedNode, Report, ReportCheck, ReportContext, ReportNode, ReportRule, ReporterFn, Reporters,
    TestEngine, TestEnvironment, TestRunner,
};
pub use result::{CheckResult, NodeRef, NodeResult, RuleResult, TestResult};
pub use template::render_message;

use fos_vdom::{CacheError, VdomError};
use thiserror::Error;

/// Engine version reported in results
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name reported in results
pub const ENGINE_NAME: &str = "fos-audit";

/// Audit errors
#[derive(Debug, Error)]
pub enum AuditError {
    /// Caller input the engine cannot use (bad option, selector, locale or cache key)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A frame that could not be reached; never fatal to a run
    #[error("Frame {frame} unreachable: {reason}")]
    FrameUnreachable { frame: String, reason: String },

    #[error("Check {check} failed: {message}")]
    CheckEvaluation { check: String, message: String },

    #[error("{what} timed out after {after_ms}ms")]
    Timeout { what: String, after_ms: u64 },

    /// Malformed rule or check registration
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error(transparent)]
    Vdom(#[from] VdomError),

    #[error(transparent)]
    Css(#[from] fos_css::CssError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<CacheError> for AuditError {
    fn from(err: CacheError) -> Self {
        AuditError::InvalidArgument(err.to_string())
    }
}

/// Result alias for audit operations
pub type Result<T> = std::result::Result<T, AuditError>;

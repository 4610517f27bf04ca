//! Engine session
//!
//! One [`Engine`] owns the registered rules, reporters and plugins of a
//! host. A run builds the composed tree of the page, evaluates the
//! selected rules, asks unreachable frames for their partial results and
//! merges everything into one report.

use crate::aggregate::{aggregate_result, AggregatedResults};
use crate::audit::{Audit, RuleInfo};
use crate::config::{Config, ConfigureSpec, RunOptions};
use crate::context::{Context, ContextSpec};
use crate::frame::{FrameMessenger, FrameRequest, PartialFrame, PartialResult};
use crate::plugin::{PluginDescriptor, PluginRegistry};
use crate::preload::{preload_media, MediaProvider};
use crate::registry::Registry;
use crate::reporter::{Environment, ReportContext, Reporters};
use crate::result::{NodeRef, RuleResult};
use crate::rule::RunScope;
use crate::{AuditError, Result};
use fos_dom::Page;
use fos_vdom::{SerialNode, TreeBuilder, VirtualTree};
use serde_json::Value;
use smol::future;
use smol::Timer;
use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::rc::Rc;

/// Audit session
pub struct Engine {
    config: Config,
    registry: Registry,
    audit: Audit,
    reporters: Reporters,
    plugins: PluginRegistry,
    messenger: Option<Rc<dyn FrameMessenger>>,
    media: Option<Rc<dyn MediaProvider>>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("rules", &self.audit.rule_ids().count())
            .field("reporters", &self.reporters)
            .field("plugins", &self.plugins.len())
            .field("messenger", &self.messenger.is_some())
            .field("media", &self.media.is_some())
            .finish()
    }
}

impl Engine {
    /// Session with the built-in rules, checks and reporters
    pub fn new(config: Config) -> Result<Self> {
        let registry = Registry::builtin();
        let (audit, reporters) = Self::fresh(&config, &registry)?;
        Ok(Self {
            config,
            registry,
            audit,
            reporters,
            plugins: PluginRegistry::new(),
            messenger: None,
            media: None,
        })
    }

    fn fresh(config: &Config, registry: &Registry) -> Result<(Audit, Reporters)> {
        let mut audit = Audit::new(registry.clone(), config.branding.clone())?;
        let mut reporters = Reporters::new();
        if !reporters.set_default(&config.reporter) {
            return Err(AuditError::Configuration(format!("unknown reporter {}", config.reporter)));
        }
        if let Some(locale) = &config.locale {
            audit.apply_locale(locale);
        }
        Ok((audit, reporters))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn audit(&self) -> &Audit {
        &self.audit
    }

    /// Apply declarative changes: branding, default reporter, checks, rules
    /// and locale, in that order
    pub fn configure(&mut self, spec: &ConfigureSpec) -> Result<()> {
        if let Some(branding) = &spec.branding {
            self.audit.set_branding(branding.clone());
        }
        if let Some(reporter) = &spec.reporter {
            if !self.reporters.set_default(reporter) {
                return Err(AuditError::Configuration(format!("unknown reporter {reporter}")));
            }
        }
        for check in &spec.checks {
            self.audit.add_check(check)?;
        }
        for rule in &spec.rules {
            self.audit.add_rule(rule)?;
        }
        if spec.disable_other_rules {
            let keep: BTreeSet<String> = spec
                .rules
                .iter()
                .filter_map(|r| r.get("id").and_then(Value::as_str))
                .map(str::to_string)
                .collect();
            self.audit.disable_other_rules(&keep);
        }
        if let Some(locale) = &spec.locale {
            self.audit.apply_locale(locale);
        }
        Ok(())
    }

    /// Add native handlers. They survive [`Engine::reset`].
    pub fn register_handlers<F>(&mut self, register: F)
    where
        F: Fn(&mut Registry),
    {
        register(&mut self.registry);
        register(self.audit.registry_mut());
    }

    /// Restore the built-in rules, checks, reporters and locale
    pub fn reset(&mut self) -> Result<()> {
        let (audit, reporters) = Self::fresh(&self.config, &self.registry)?;
        self.audit = audit;
        self.reporters = reporters;
        tracing::debug!("Engine reset");
        Ok(())
    }

    /// Run plugin cleanups, then reset. Every cleanup runs; the first
    /// failure is returned.
    pub fn teardown(&mut self) -> Result<()> {
        let mut errors = self.plugins.cleanup_all();
        self.reset()?;
        match errors.drain(..).next() {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    pub fn get_rules(&self, tags: &[&str]) -> Vec<RuleInfo> {
        self.audit.get_rules(tags)
    }

    pub fn add_reporter<F>(&mut self, name: &str, reporter: F, is_default: bool)
    where
        F: Fn(&[RuleResult], &ReportContext<'_>) -> anyhow::Result<Value> + 'static,
    {
        self.reporters.add(name, Rc::new(reporter), is_default);
    }

    pub fn register_plugin(&mut self, plugin: PluginDescriptor) -> Result<()> {
        Ok(self.plugins.register(plugin)?)
    }

    pub fn run_plugin_command(&self, plugin: &str, command: &str, input: Value) -> Result<Value> {
        Ok(self.plugins.run(plugin, command, input)?)
    }

    pub fn set_frame_messenger(&mut self, messenger: Rc<dyn FrameMessenger>) {
        self.messenger = Some(messenger);
    }

    pub fn set_media_provider(&mut self, provider: Rc<dyn MediaProvider>) {
        self.media = Some(provider);
    }

    /// Audit a page and report. Frames that fail or time out contribute no
    /// results; only bad options or context fail the run.
    pub async fn run(&self, page: &Page, context: &ContextSpec, options: &RunOptions) -> Result<Value> {
        tracing::info!("Audit run started");
        let top = self.run_partial(page, context, options).await?;

        let mut pending: Vec<PartialFrame> = top.frames.iter().rev().cloned().collect();
        let mut partials = vec![Some(top)];
        while let Some(frame) = pending.pop() {
            let partial = self.request_frame(frame, options).await;
            if let Some(partial) = &partial {
                pending.extend(partial.frames.iter().rev().cloned());
            }
            partials.push(partial);
        }

        let report = self.finish_run(partials, options)?;
        tracing::info!("Audit run finished");
        Ok(report)
    }

    pub fn run_blocking(&self, page: &Page, context: &ContextSpec, options: &RunOptions) -> Result<Value> {
        smol::block_on(self.run(page, context, options))
    }

    /// This document's share of a run started here
    pub async fn run_partial(&self, page: &Page, context: &ContextSpec, options: &RunOptions) -> Result<PartialResult> {
        self.partial(page, context, options, true).await
    }

    pub(crate) async fn partial(
        &self,
        page: &Page,
        spec: &ContextSpec,
        options: &RunOptions,
        initiator: bool,
    ) -> Result<PartialResult> {
        self.audit.validate_options(options)?;
        let tree = TreeBuilder::new(page).with_iframes(options.iframes).build(page.top())?;
        let context = Context::resolve(&tree, spec, options.iframes)?;

        if options.preload.media() && self.audit.needs_preload(&context, options) {
            match &self.media {
                Some(media) => {
                    let timeout = options.preload.timeout().unwrap_or_else(|| self.config.preload_timeout());
                    preload_media(&tree, media.as_ref(), timeout).await;
                }
                None => tracing::debug!("No media provider, media rules run without metadata"),
            }
        }

        let scope = RunScope {
            tree: &tree,
            context: &context,
            options,
            initiator,
            check_timeout: self.config.check_timeout(),
        };
        let results = self.audit.run(&scope).await;
        let environment = initiator.then(|| {
            let url = page.document(page.top()).map(|d| d.url()).unwrap_or_default();
            Environment::capture(url, &self.config.runner_name, self.config.viewport)
        });
        Ok(PartialResult {
            frames: context.frames.iter().map(PartialFrame::from).collect(),
            results,
            environment,
        })
    }

    async fn request_frame(&self, frame: PartialFrame, options: &RunOptions) -> Option<PartialResult> {
        let label = frame.src.clone().unwrap_or_else(|| frame.node.html.clone());
        let Some(messenger) = &self.messenger else {
            tracing::warn!("No frame messenger, frame {} contributes no results", label);
            return None;
        };
        let wait = options.frame_wait(&self.config);
        let what = format!("frame {label}");
        let deadline = async move {
            Timer::after(wait).await;
            Err(anyhow::Error::new(AuditError::Timeout {
                what,
                after_ms: wait.as_millis() as u64,
            }))
        };
        let request = FrameRequest {
            frame,
            options: options.clone(),
        };
        match future::or(messenger.request(request), deadline).await {
            Ok(partial) => Some(partial),
            Err(e) => {
                tracing::warn!("Frame {} contributes no results: {}", label, e);
                None
            }
        }
    }

    /// Merge partial results, given in depth-first frame order with `None`
    /// for frames that gave nothing, and report.
    pub fn finish_run(&self, partials: Vec<Option<PartialResult>>, options: &RunOptions) -> Result<Value> {
        self.audit.validate_options(options)?;
        let environment = partials
            .iter()
            .flatten()
            .find_map(|p| p.environment.clone())
            .unwrap_or_else(|| Environment::capture("", &self.config.runner_name, self.config.viewport));

        // Frame element of each upcoming partial, already prefixed with its
        // own embedding frames
        let mut frames: VecDeque<NodeRef> = VecDeque::new();
        let mut merged: Vec<RuleResult> = Vec::new();
        for (position, partial) in partials.into_iter().enumerate() {
            let frame = if position == 0 { None } else { frames.pop_front() };
            let Some(partial) = partial else {
                continue;
            };

            for child in partial.frames.iter().rev() {
                let mut node = child.node.clone();
                if let Some(frame) = &frame {
                    node.prefix(frame);
                }
                frames.push_front(node);
            }

            for mut result in partial.results {
                if let Some(frame) = &frame {
                    for node in &mut result.nodes {
                        node.node.prefix(frame);
                        for check in node.checks_mut() {
                            for related in &mut check.related_nodes {
                                related.prefix(frame);
                            }
                        }
                    }
                }
                match merged.iter_mut().find(|r| r.id == result.id) {
                    Some(existing) => {
                        existing.nodes.append(&mut result.nodes);
                        if existing.error.is_none() {
                            existing.error = result.error;
                        }
                    }
                    None => merged.push(result),
                }
            }
        }
        for rule in &mut merged {
            rule.nodes.sort_by(|a, b| a.node.node_indexes.cmp(&b.node.node_indexes));
        }

        let results = self.audit.after(merged, options)?;
        let reporter = self
            .reporters
            .get(options.reporter.as_deref())
            .ok_or_else(|| AuditError::Configuration("no reporter registered".to_string()))?;
        let cx = ReportContext {
            audit: &self.audit,
            environment: &environment,
            options,
        };
        reporter(&results, &cx).map_err(|e| AuditError::InvalidArgument(format!("reporter failed: {e}")))
    }

    /// Evaluate one rule against a serialized node tree, hidden nodes
    /// included, and split the outcome by category
    pub fn run_virtual_rule(&self, rule_id: &str, node: &SerialNode, options: &RunOptions) -> Result<AggregatedResults> {
        if self.audit.rule_spec(rule_id).is_none() {
            return Err(AuditError::InvalidArgument(format!("unknown rule {rule_id:?}")));
        }
        let tree = VirtualTree::from_serial(node)?;
        let context = Context::whole(&tree);
        let scope = RunScope {
            tree: &tree,
            context: &context,
            options,
            initiator: true,
            check_timeout: self.config.check_timeout(),
        };
        let result = smol::block_on(self.audit.run_virtual_rule(rule_id, &scope))?;
        let results = self.audit.after(vec![result], options)?;
        Ok(aggregate_result(&results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::Locale;
    use crate::result::TestResult;
    use serde_json::json;

    fn engine() -> Engine {
        Engine::new(Config::default()).unwrap()
    }

    #[test]
    fn test_new_with_unknown_reporter() {
        let config = Config {
            reporter: "nope".to_string(),
            ..Config::default()
        };
        assert!(matches!(Engine::new(config), Err(AuditError::Configuration(_))));
    }

    #[test]
    fn test_virtual_rule_image_without_alt() {
        let results = engine()
            .run_virtual_rule("image-alt", &SerialNode::element("img"), &RunOptions::default())
            .unwrap();
        assert_eq!(results.violations.len(), 1);
        assert!(results.passes.is_empty());
        assert!(results.incomplete.is_empty());
    }

    #[test]
    fn test_virtual_rule_unknown() {
        let result = engine().run_virtual_rule("nope", &SerialNode::element("img"), &RunOptions::default());
        assert!(matches!(result, Err(AuditError::InvalidArgument(_))));
    }

    #[test]
    fn test_configure_and_reset() {
        let mut engine = engine();
        let spec = ConfigureSpec::from_json(
            r#"{"rules": [{"id": "image-alt", "tags": ["custom"]}], "disableOtherRules": true}"#,
        )
        .unwrap();
        engine.configure(&spec).unwrap();
        assert!(!engine.audit().rule_spec("button-name").unwrap().enabled);
        assert_eq!(engine.audit().rule_spec("image-alt").unwrap().tags, vec!["custom"]);

        engine.reset().unwrap();
        assert!(engine.audit().rule_spec("button-name").unwrap().enabled);
    }

    #[test]
    fn test_config_locale_survives_reset() {
        let locale = Locale::from_json(r#"{"rules": {"image-alt": {"help": "Alt bitte"}}}"#).unwrap();
        let mut engine = Engine::new(Config {
            locale: Some(locale),
            ..Config::default()
        })
        .unwrap();
        engine.reset().unwrap();
        assert_eq!(engine.audit().rule_spec("image-alt").unwrap().metadata.help, "Alt bitte");
    }

    #[test]
    fn test_finish_run_prefixes_frame_results() {
        let engine = engine();
        let tree = VirtualTree::from_serial(&SerialNode::element("img")).unwrap();
        let img = tree.root().unwrap();
        let frame_node = NodeRef {
            html: "<iframe>".to_string(),
            target: vec![fos_vdom::TargetPart::Selector("#frame".to_string())],
            ancestry: None,
            node_indexes: vec![2],
            element: None,
        };
        let mut rule = RuleResult::new("image-alt");
        let mut node = crate::result::NodeResult::new(NodeRef::of(&tree, img));
        node.any.push(crate::result::CheckResult::new("has-alt", Some(false)));
        rule.nodes.push(node);

        let top = PartialResult {
            frames: vec![PartialFrame {
                node: frame_node,
                src: None,
                context: ContextSpec::document(),
            }],
            results: vec![RuleResult::new("image-alt")],
            environment: None,
        };
        let inner = PartialResult {
            frames: Vec::new(),
            results: vec![rule],
            environment: None,
        };
        let options = RunOptions::default().with_reporter("raw");
        let raw = engine.finish_run(vec![Some(top), Some(inner)], &options).unwrap();
        assert_eq!(raw[0]["result"], json!(TestResult::Failed));
        let target = raw[0]["nodes"][0]["node"]["target"].as_array().unwrap();
        assert_eq!(target.len(), 2);
        assert_eq!(target[0], json!("#frame"));
        assert_eq!(raw[0]["nodes"][0]["node"]["nodeIndexes"], json!([2, 0]));
    }

    #[test]
    fn test_plugins_and_teardown() {
        let mut engine = engine();
        engine
            .register_plugin(PluginDescriptor::new("echo").command("say", |input| Ok(input)))
            .unwrap();
        assert_eq!(engine.run_plugin_command("echo", "say", json!(1)).unwrap(), json!(1));
        engine.teardown().unwrap();
        assert!(matches!(
            engine.run_plugin_command("echo", "say", json!(1)),
            Err(AuditError::Plugin(_))
        ));
    }
}

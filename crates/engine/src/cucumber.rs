//! The feature file engine.

use crate::r#trait::{ExecutionRequest, TestEngine};
use crate::Result;
use cuke_core::{Configuration, EngineDescriptor, NodeKind, TestSource, UniqueId};
use cuke_discovery::{
    features_override, DeduplicatingReporter, DiscoveryListener, DiscoveryRequest,
    DiscoverySelectorResolver, FeatureParser, FeaturesPropertyResolver, ForwardingReporter,
    PlainFeatureParser,
};
use cuke_execution::{ExecutionRun, ExecutionStrategy, RunSummary};
use std::sync::Arc;
use tracing::info;

/// Id of this engine.
pub const ENGINE_ID: &str = "cucumber";

/// Discovers Gherkin features and runs their scenarios.
pub struct CucumberEngine {
    parser: Box<dyn FeatureParser>,
}

impl CucumberEngine {
    /// Create an engine using the built-in parser.
    pub fn new() -> Self {
        Self::with_parser(PlainFeatureParser::new())
    }

    /// Create an engine using `parser`.
    pub fn with_parser(parser: impl FeatureParser + 'static) -> Self {
        Self {
            parser: Box::new(parser),
        }
    }
}

impl Default for CucumberEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEngine for CucumberEngine {
    fn id(&self) -> &str {
        ENGINE_ID
    }

    fn discover(
        &self,
        request: &DiscoveryRequest,
        unique_id: UniqueId,
        listener: &mut dyn DiscoveryListener,
    ) -> Result<EngineDescriptor> {
        // Marks trees built from the override rather than from selectors.
        let source = features_override(&request.configuration)
            .map(|_| TestSource::Class(std::any::type_name::<Self>().to_string()));

        let mut engine = EngineDescriptor::new(
            unique_id.clone(),
            "Cucumber",
            Arc::clone(&request.configuration),
            source,
        );

        let mut reporter = DeduplicatingReporter::new(ForwardingReporter::new(listener, unique_id));
        FeaturesPropertyResolver::new(DiscoverySelectorResolver::new(self.parser.as_ref()))
            .resolve_selectors(request, &mut engine, &mut reporter)?;

        info!(
            "Discovered {} feature(s) with {} scenario(s), {} issue(s) reported",
            engine.tree().count(NodeKind::Feature),
            engine.tree().count(NodeKind::Scenario),
            reporter.forwarded()
        );
        Ok(engine)
    }

    fn select_executor(&self, configuration: &Configuration) -> Result<ExecutionStrategy> {
        Ok(ExecutionStrategy::select(configuration)?)
    }

    fn execute(&self, request: ExecutionRequest<'_>) -> Result<RunSummary> {
        let configuration = Arc::clone(request.configuration());
        let strategy = self.select_executor(&configuration)?;

        let mut run = ExecutionRun::new();
        run.select(self.create_execution_context(configuration, strategy, request.cancellation))?;
        Ok(run.execute(request.root.tree(), request.runner, request.listener)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineError;
    use cuke_core::{
        Node, Severity, FEATURES_PROPERTY_NAME, FILTER_NAME_PROPERTY_NAME,
        PARALLEL_EXECUTION_ENABLED_PROPERTY_NAME,
    };
    use cuke_discovery::{Classpath, CollectingListener, DiscoverySelector};
    use cuke_execution::{
        CancellationToken, ExecutionContext, ExecutionError, ExecutionEvent, ExecutorKind,
        RecordingListener,
    };
    use std::fs;
    use std::sync::Mutex;
    use tempfile::{tempdir, TempDir};

    const CHECKOUT: &str = "\
Feature: Checkout

  Scenario: A
    Given an empty cart

  Scenario: B
    Given a full cart

  Scenario: C
    Given a cart with a coupon
";

    fn fixture() -> TempDir {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("shop")).unwrap();
        fs::write(dir.path().join("shop/checkout.feature"), CHECKOUT).unwrap();
        fs::write(
            dir.path().join("shop/search.feature"),
            "Feature: Search\n  Scenario: by name\n  Scenario: by tag\n",
        )
        .unwrap();
        dir
    }

    fn request(dir: &TempDir, pairs: &[(&str, &str)]) -> DiscoveryRequest {
        DiscoveryRequest::new(Arc::new(Configuration::from_pairs(pairs.iter().copied())))
            .with_classpath(Classpath::new([dir.path()]))
    }

    fn discover(request: &DiscoveryRequest) -> (EngineDescriptor, CollectingListener) {
        let mut listener = CollectingListener::new();
        let engine = CucumberEngine::new()
            .discover(request, UniqueId::for_engine(ENGINE_ID), &mut listener)
            .unwrap();
        (engine, listener)
    }

    fn feature_names(engine: &EngineDescriptor) -> Vec<String> {
        engine
            .children()
            .iter()
            .map(|&i| engine.tree().node(i).display_name.clone())
            .collect()
    }

    fn scenario_recorder(
        names: &Mutex<Vec<String>>,
    ) -> impl Fn(&Node, &ExecutionContext) -> anyhow::Result<()> + Send + Sync + '_ {
        move |node: &Node, _: &ExecutionContext| -> anyhow::Result<()> {
            if node.kind == NodeKind::Scenario {
                names.lock().unwrap().push(node.display_name.clone());
            }
            Ok(())
        }
    }

    #[test]
    fn test_override_short_circuits_selectors() {
        let dir = fixture();
        let request = request(&dir, &[(FEATURES_PROPERTY_NAME, "classpath:shop/search.feature")])
            .with_selector(DiscoverySelector::classpath_resource("shop/checkout.feature"))
            .with_selector(DiscoverySelector::classpath_resource("shop/missing.feature"));

        let (engine, listener) = discover(&request);
        assert_eq!(feature_names(&engine), vec!["Search"]);
        assert!(listener.issues.is_empty());
        assert!(matches!(
            engine.source(),
            Some(TestSource::Class(name)) if name.ends_with("CucumberEngine")
        ));
    }

    #[test]
    fn test_override_matching_nothing_warns() {
        let dir = fixture();
        let request = request(&dir, &[(FEATURES_PROPERTY_NAME, "classpath:nowhere")]);

        let (engine, listener) = discover(&request);
        assert!(engine.tree().is_empty());
        assert!(engine.source().is_some());
        assert_eq!(listener.with_severity(Severity::Warning).len(), 1);
    }

    #[test]
    fn test_no_override_and_no_selectors() {
        let dir = fixture();
        let (engine, listener) = discover(&request(&dir, &[]));
        assert!(engine.tree().is_empty());
        assert!(engine.source().is_none());
        assert!(listener.issues.is_empty());
    }

    #[test]
    fn test_same_selector_twice_yields_one_subtree() {
        let dir = fixture();
        let selector = DiscoverySelector::Package("shop".to_string());
        let (engine, _) = discover(
            &request(&dir, &[])
                .with_selector(selector.clone())
                .with_selector(selector),
        );
        assert_eq!(feature_names(&engine), vec!["Checkout", "Search"]);
        assert_eq!(engine.tree().count(NodeKind::Scenario), 5);
    }

    #[test]
    fn test_duplicate_issue_forwarded_once() {
        let dir = fixture();
        let selector = DiscoverySelector::classpath_resource("shop/missing.feature");
        let (_, listener) = discover(
            &request(&dir, &[])
                .with_selector(selector.clone())
                .with_selector(selector),
        );
        assert_eq!(listener.issues.len(), 1);
        assert_eq!(listener.issues[0].severity, Severity::Error);
        assert_eq!(listener.issues[0].unique_id, Some(UniqueId::for_engine(ENGINE_ID)));
    }

    #[test]
    fn test_invalid_name_filter_is_fatal() {
        let dir = fixture();
        let mut listener = CollectingListener::new();
        let result = CucumberEngine::new().discover(
            &request(&dir, &[(FILTER_NAME_PROPERTY_NAME, "(unclosed")])
                .with_selector(DiscoverySelector::Package("shop".to_string())),
            UniqueId::for_engine(ENGINE_ID),
            &mut listener,
        );
        assert!(matches!(result, Err(EngineError::Discovery(_))));
    }

    #[test]
    fn test_sequential_run_in_order() {
        let dir = fixture();
        let request = request(&dir, &[(PARALLEL_EXECUTION_ENABLED_PROPERTY_NAME, "false")])
            .with_selector(DiscoverySelector::classpath_resource("shop/checkout.feature"));
        let (root, _) = discover(&request);

        let engine = CucumberEngine::new();
        let names = Mutex::new(Vec::new());
        let runner = scenario_recorder(&names);
        let listener = RecordingListener::new();
        let summary = engine
            .execute(ExecutionRequest::new(&root, &listener, &runner))
            .unwrap();

        assert_eq!(summary.executor, ExecutorKind::Sequential);
        assert_eq!(summary.tally.succeeded, 3);
        assert_eq!(*names.lock().unwrap(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_parallel_run_completes_all() {
        let dir = fixture();
        let request = request(
            &dir,
            &[
                (PARALLEL_EXECUTION_ENABLED_PROPERTY_NAME, "true"),
                ("cucumber.execution.parallel.config.strategy", "fixed"),
                ("cucumber.execution.parallel.config.fixed.parallelism", "2"),
            ],
        )
        .with_selector(DiscoverySelector::Package("shop".to_string()));
        let (root, _) = discover(&request);

        let engine = CucumberEngine::new();
        let names = Mutex::new(Vec::new());
        let runner = scenario_recorder(&names);
        let listener = RecordingListener::new();
        let summary = engine
            .execute(ExecutionRequest::new(&root, &listener, &runner))
            .unwrap();

        assert_eq!(summary.executor, ExecutorKind::Parallel);
        assert_eq!(summary.tally.succeeded, 5);
        let mut names = names.lock().unwrap().clone();
        names.sort();
        assert_eq!(names, vec!["A", "B", "C", "by name", "by tag"]);
    }

    #[test]
    fn test_invalid_executor_configuration_is_fatal() {
        let dir = fixture();
        let (root, _) = discover(&request(
            &dir,
            &[
                (PARALLEL_EXECUTION_ENABLED_PROPERTY_NAME, "true"),
                ("cucumber.execution.parallel.config.strategy", "adaptive"),
            ],
        ));
        let listener = RecordingListener::new();
        let runner = |_: &Node, _: &ExecutionContext| -> anyhow::Result<()> { Ok(()) };
        let result = CucumberEngine::new().execute(ExecutionRequest::new(&root, &listener, &runner));
        assert!(matches!(
            result,
            Err(EngineError::Execution(ExecutionError::Config(_)))
        ));
    }

    #[test]
    fn test_nodes_see_discovery_configuration() {
        let dir = fixture();
        let request = request(&dir, &[(PARALLEL_EXECUTION_ENABLED_PROPERTY_NAME, "true")])
            .with_selector(DiscoverySelector::Package("shop".to_string()));
        let (root, _) = discover(&request);
        assert!(Arc::ptr_eq(root.configuration(), &request.configuration));

        let expected = Arc::clone(&request.configuration);
        let runner = move |_: &Node, ctx: &ExecutionContext| -> anyhow::Result<()> {
            assert!(Arc::ptr_eq(ctx.configuration(), &expected));
            Ok(())
        };
        let listener = RecordingListener::new();
        let summary = CucumberEngine::new()
            .execute(ExecutionRequest::new(&root, &listener, &runner))
            .unwrap();
        assert_eq!(summary.tally.succeeded, 5);
        assert_eq!(summary.tally.failed, 0);
    }

    #[test]
    fn test_cancel_after_first_scenario() {
        let dir = fixture();
        let request = request(&dir, &[])
            .with_selector(DiscoverySelector::classpath_resource("shop/checkout.feature"));
        let (root, _) = discover(&request);

        let cancellation = CancellationToken::new();
        let token = cancellation.clone();
        let runner = move |node: &Node, _: &ExecutionContext| -> anyhow::Result<()> {
            if node.display_name == "A" {
                token.cancel();
            }
            Ok(())
        };
        let listener = RecordingListener::new();
        let summary = CucumberEngine::new()
            .execute(ExecutionRequest::new(&root, &listener, &runner).with_cancellation(cancellation))
            .unwrap();

        let started: Vec<String> = listener
            .started()
            .iter()
            .filter_map(|id| root.tree().find(id))
            .map(|i| root.tree().node(i).display_name.clone())
            .collect();
        assert_eq!(started, vec!["Cucumber", "Checkout", "A"]);
        assert_eq!(summary.tally.succeeded, 1);
        assert_eq!(summary.tally.skipped, 2);
        assert!(listener
            .events()
            .iter()
            .any(|e| matches!(e, ExecutionEvent::Skipped(_, reason) if reason == "execution cancelled")));
    }
}

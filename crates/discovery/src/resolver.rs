//! Selector resolution - turns discovery inputs into descriptor subtrees.

use crate::filter::{unmatched_lines, FeatureFilter};
use crate::parser::FeatureParser;
use crate::reporter::IssueReporter;
use crate::resource::{
    classpath_name, is_feature_file, scan_features, Classpath, FeatureLocation, FeatureResource,
    ResourceLocation,
};
use crate::selector::{DiscoveryRequest, DiscoverySelector};
use crate::DiscoveryError;
use cuke_core::{
    DiscoveryIssue, EngineDescriptor, FilePosition, TestSource, UniqueId, FEATURE_SEGMENT,
    SCENARIO_SEGMENT,
};
use std::path::Path;
use tracing::debug;

/// Resolves each selector with a kind-specific strategy.
///
/// A bad selector only loses its own subtree; it is reported and resolution
/// carries on with the next one.
pub struct DiscoverySelectorResolver<'p> {
    parser: &'p dyn FeatureParser,
}

impl<'p> DiscoverySelectorResolver<'p> {
    /// Create a resolver parsing features with `parser`.
    pub fn new(parser: &'p dyn FeatureParser) -> Self {
        Self { parser }
    }

    /// Resolve every selector of `request` into `engine`.
    pub fn resolve_selectors(
        &self,
        request: &DiscoveryRequest,
        engine: &mut EngineDescriptor,
        reporter: &mut dyn IssueReporter,
    ) -> Result<(), DiscoveryError> {
        let filter = FeatureFilter::from_configuration(&request.configuration)?;
        let mut resolution = Resolution {
            parser: self.parser,
            classpath: &request.classpath,
            filter: &filter,
            engine,
            reporter,
        };

        for selector in &request.selectors {
            debug!("Resolving {} selector: {:?}", selector.kind(), selector);
            resolution.resolve_selector(selector);
        }
        Ok(())
    }

    /// Resolve explicit `locations` into `engine`, bypassing selectors.
    pub fn resolve_locations(
        &self,
        locations: &[FeatureLocation],
        request: &DiscoveryRequest,
        engine: &mut EngineDescriptor,
        reporter: &mut dyn IssueReporter,
    ) -> Result<(), DiscoveryError> {
        let filter = FeatureFilter::from_configuration(&request.configuration)?;
        let mut resolution = Resolution {
            parser: self.parser,
            classpath: &request.classpath,
            filter: &filter,
            engine,
            reporter,
        };

        for location in locations {
            debug!("Resolving location: {}", location.location);
            resolution.resolve_location(&location.location, &location.lines);
        }
        Ok(())
    }
}

struct Resolution<'a, 'r> {
    parser: &'a dyn FeatureParser,
    classpath: &'a Classpath,
    filter: &'a FeatureFilter,
    engine: &'a mut EngineDescriptor,
    reporter: &'a mut (dyn IssueReporter + 'r),
}

impl Resolution<'_, '_> {
    fn resolve_selector(&mut self, selector: &DiscoverySelector) {
        match selector {
            DiscoverySelector::ClasspathRoot(root) => self.resolve_classpath_root(root),
            DiscoverySelector::ClasspathResource { name, position } => {
                let lines = lines_of(position);
                self.resolve_classpath_name(name, &lines);
            }
            DiscoverySelector::Package(package) => {
                self.resolve_classpath_name(&package.replace('.', "/"), &[]);
            }
            DiscoverySelector::File { path, position } => {
                if path.is_dir() {
                    self.report(
                        DiscoveryIssue::error(format!("'{}' is not a file", path.display()))
                            .with_source(file_source(path)),
                    );
                } else {
                    self.resolve_path(path, &lines_of(position));
                }
            }
            DiscoverySelector::Directory(path) => {
                if path.is_file() {
                    self.report(
                        DiscoveryIssue::error(format!("'{}' is not a directory", path.display()))
                            .with_source(file_source(path)),
                    );
                } else {
                    self.resolve_path(path, &[]);
                }
            }
            DiscoverySelector::UniqueId(raw) => self.resolve_unique_id(raw),
            DiscoverySelector::Uri(uri) => match ResourceLocation::from_uri(uri) {
                Ok(location) => self.resolve_location(&location, &[]),
                Err(message) => self.report(
                    DiscoveryIssue::error(message).with_source(TestSource::Uri(uri.clone())),
                ),
            },
        }
    }

    fn resolve_location(&mut self, location: &ResourceLocation, lines: &[usize]) {
        match location {
            ResourceLocation::Classpath(name) => self.resolve_classpath_name(name, lines),
            ResourceLocation::Path(path) => self.resolve_path(path, lines),
        }
    }

    fn resolve_classpath_root(&mut self, root: &Path) {
        if !root.is_dir() {
            self.report(
                DiscoveryIssue::error(format!(
                    "Classpath root '{}' is not a directory",
                    root.display()
                ))
                .with_source(file_source(root)),
            );
            return;
        }
        self.resolve_classpath_directory(root, root);
    }

    /// A `.feature` name is a single resource; anything else is a package.
    fn resolve_classpath_name(&mut self, name: &str, lines: &[usize]) {
        let classpath = self.classpath;

        if !is_feature_file(Path::new(name)) {
            let directories = classpath.find_directory(name);
            if directories.is_empty() {
                debug!("No classpath root contains '{}'", name);
            }
            for (root, directory) in directories {
                self.resolve_classpath_directory(root, &directory);
            }
            return;
        }

        let source = TestSource::ClasspathResource {
            name: name.to_string(),
            position: None,
        };
        match classpath.find_resource(name).as_slice() {
            [] => self.report(
                DiscoveryIssue::error(format!("Classpath resource '{}' not found", name))
                    .with_source(source),
            ),
            [(root, path), rest @ ..] => {
                if !rest.is_empty() {
                    self.report(
                        DiscoveryIssue::warning(format!(
                            "Classpath resource '{}' is ambiguous: found under {} roots, using '{}'",
                            name,
                            rest.len() + 1,
                            root.display()
                        ))
                        .with_source(source),
                    );
                }
                self.resolve_resource(FeatureResource::classpath(name, path.clone()), lines);
            }
        }
    }

    fn resolve_classpath_directory(&mut self, root: &Path, directory: &Path) {
        let (files, errors) = scan_features(directory);
        for error in errors {
            self.report_scan_error(error);
        }
        for file in files {
            match classpath_name(root, &file) {
                Some(name) => self.resolve_resource(FeatureResource::classpath(&name, file), &[]),
                None => debug!("'{}' is outside '{}'", file.display(), root.display()),
            }
        }
    }

    fn resolve_path(&mut self, path: &Path, lines: &[usize]) {
        if !path.exists() {
            self.report(
                DiscoveryIssue::error(format!("'{}' does not exist", path.display()))
                    .with_source(file_source(path)),
            );
            return;
        }

        if path.is_dir() {
            let (files, errors) = scan_features(path);
            for error in errors {
                self.report_scan_error(error);
            }
            for file in files {
                self.resolve_resource(FeatureResource::file(&file), &[]);
            }
        } else if is_feature_file(path) {
            self.resolve_resource(FeatureResource::file(path), lines);
        } else {
            debug!("Ignoring '{}': not a feature file", path.display());
        }
    }

    fn resolve_unique_id(&mut self, raw: &str) {
        let unique_id: UniqueId = match raw.parse() {
            Ok(id) => id,
            Err(e) => {
                self.report(DiscoveryIssue::error(format!("Invalid unique id '{}': {}", raw, e)));
                return;
            }
        };

        if !unique_id.has_prefix(self.engine.unique_id()) {
            debug!("Unique id '{}' belongs to another engine", unique_id);
            return;
        }
        let Some(feature) = unique_id.find(FEATURE_SEGMENT) else {
            debug!("Unique id '{}' does not name a feature", unique_id);
            return;
        };

        let location = match ResourceLocation::from_uri(&feature.value) {
            Ok(location) => location,
            Err(message) => {
                self.report(
                    DiscoveryIssue::error(format!("Invalid unique id '{}': {}", raw, message))
                        .with_unique_id(unique_id.clone()),
                );
                return;
            }
        };

        let lines = match unique_id.find(SCENARIO_SEGMENT) {
            None => Vec::new(),
            Some(scenario) => match scenario.value.parse::<usize>() {
                Ok(line) => vec![line],
                Err(_) => {
                    self.report(
                        DiscoveryIssue::error(format!(
                            "Invalid unique id '{}': scenario '{}' is not a line number",
                            raw, scenario.value
                        ))
                        .with_unique_id(unique_id.clone()),
                    );
                    return;
                }
            },
        };

        self.resolve_location(&location, &lines);
    }

    fn resolve_resource(&mut self, resource: FeatureResource, lines: &[usize]) {
        let feature_id = self
            .engine
            .unique_id()
            .append(FEATURE_SEGMENT, resource.uri.as_str());

        let text = match std::fs::read_to_string(&resource.path) {
            Ok(text) => text,
            Err(e) => {
                self.report(
                    DiscoveryIssue::error(format!(
                        "Could not read feature file '{}': {}",
                        resource.uri, e
                    ))
                    .with_source(resource.source.clone())
                    .with_unique_id(feature_id),
                );
                return;
            }
        };

        let feature = match self.parser.parse(&resource.uri, &text) {
            Ok(Some(feature)) => feature,
            Ok(None) => {
                debug!("'{}' declares no feature", resource.uri);
                return;
            }
            Err(e) => {
                self.report(
                    DiscoveryIssue::error(format!(
                        "Could not parse feature file '{}': {}",
                        resource.uri, e.message
                    ))
                    .with_source(resource.source.at(FilePosition::line(e.line)))
                    .with_unique_id(feature_id),
                );
                return;
            }
        };

        for line in unmatched_lines(&feature, lines) {
            self.report(
                DiscoveryIssue::warning(format!(
                    "No scenario at line {} of '{}'",
                    line, resource.uri
                ))
                .with_source(resource.source.at(FilePosition::line(line)))
                .with_unique_id(feature_id.clone()),
            );
        }

        let engine_id = self.engine.unique_id().clone();
        match self.filter.feature_spec(&engine_id, &resource, &feature, lines) {
            Some(spec) => {
                let index = self.engine.add_child(spec);
                debug!(
                    "Attached '{}' with {} scenario(s)",
                    resource.uri,
                    self.engine.tree().node(index).children().len()
                );
            }
            None => debug!("No scenario of '{}' was selected", resource.uri),
        }
    }

    fn report_scan_error(&mut self, error: walkdir::Error) {
        let mut issue = DiscoveryIssue::warning(format!("Could not scan for features: {}", error));
        if let Some(path) = error.path() {
            issue = issue.with_source(file_source(path));
        }
        self.report(issue);
    }

    fn report(&mut self, issue: DiscoveryIssue) {
        self.reporter.report(issue);
    }
}

fn lines_of(position: &Option<FilePosition>) -> Vec<usize> {
    position.iter().map(|p| p.line).collect()
}

fn file_source(path: &Path) -> TestSource {
    TestSource::File {
        path: path.to_path_buf(),
        position: None,
    }
}

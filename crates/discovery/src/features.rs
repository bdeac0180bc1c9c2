//! The `cucumber.features` override.
//!
//! When the property is set, its locations replace whatever selectors the
//! host sent along.

use crate::reporter::IssueReporter;
use crate::resolver::DiscoverySelectorResolver;
use crate::resource::FeatureLocation;
use crate::selector::DiscoveryRequest;
use crate::DiscoveryError;
use cuke_core::{Configuration, DiscoveryIssue, EngineDescriptor, NodeKind, FEATURES_PROPERTY_NAME};
use tracing::{info, warn};

/// The override value, when present and not blank.
pub fn features_override(configuration: &Configuration) -> Option<&str> {
    configuration.get_non_blank(FEATURES_PROPERTY_NAME)
}

/// Resolves the override when set, the request's selectors otherwise.
pub struct FeaturesPropertyResolver<'p> {
    delegate: DiscoverySelectorResolver<'p>,
}

impl<'p> FeaturesPropertyResolver<'p> {
    /// Wrap the selector resolver.
    pub fn new(delegate: DiscoverySelectorResolver<'p>) -> Self {
        Self { delegate }
    }

    /// Populate `engine` from `request`.
    pub fn resolve_selectors(
        &self,
        request: &DiscoveryRequest,
        engine: &mut EngineDescriptor,
        reporter: &mut dyn IssueReporter,
    ) -> Result<(), DiscoveryError> {
        let Some(features) = features_override(&request.configuration) else {
            return self.delegate.resolve_selectors(request, engine, reporter);
        };

        if !request.selectors.is_empty() {
            warn!(
                "Discovering tests using the {} property. Other discovery selectors are ignored!",
                FEATURES_PROPERTY_NAME
            );
        }

        let mut locations = Vec::new();
        for entry in features.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            match FeatureLocation::parse(entry) {
                Ok(location) => locations.push(location),
                Err(message) => reporter.report(DiscoveryIssue::error(format!(
                    "Invalid entry in {}: {}",
                    FEATURES_PROPERTY_NAME, message
                ))),
            }
        }

        self.delegate
            .resolve_locations(&locations, request, engine, reporter)?;

        let features_found = engine.tree().count(NodeKind::Feature);
        if features_found == 0 {
            reporter.report(DiscoveryIssue::warning(format!(
                "{} = '{}' did not select any scenario",
                FEATURES_PROPERTY_NAME, features
            )));
        } else {
            info!(
                "Resolved {} feature(s) from {}",
                features_found, FEATURES_PROPERTY_NAME
            );
        }
        Ok(())
    }
}

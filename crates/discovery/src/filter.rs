//! Narrowing parsed features down to the selected scenarios.

use crate::parser::ParsedFeature;
use crate::resource::FeatureResource;
use crate::DiscoveryError;
use cuke_core::{
    Configuration, FilePosition, NodeKind, NodeSpec, UniqueId, FEATURE_SEGMENT,
    FILTER_NAME_PROPERTY_NAME, SCENARIO_SEGMENT,
};
use regex::Regex;

/// Scenario filters read from configuration.
#[derive(Debug, Clone, Default)]
pub struct FeatureFilter {
    name_pattern: Option<Regex>,
}

impl FeatureFilter {
    /// Read filters from `configuration`.
    pub fn from_configuration(configuration: &Configuration) -> Result<Self, DiscoveryError> {
        let name_pattern = configuration
            .get_non_blank(FILTER_NAME_PROPERTY_NAME)
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| DiscoveryError::InvalidNameFilter {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .transpose()?;
        Ok(Self { name_pattern })
    }

    /// Build the subtree for `feature`, keeping scenarios on `lines` (all when
    /// empty) whose names pass the name filter.
    ///
    /// Returns `None` when no scenario survives.
    pub fn feature_spec(
        &self,
        engine_id: &UniqueId,
        resource: &FeatureResource,
        feature: &ParsedFeature,
        lines: &[usize],
    ) -> Option<NodeSpec> {
        let whole_feature = lines.is_empty() || lines.contains(&feature.line);
        let feature_id = engine_id.append(FEATURE_SEGMENT, resource.uri.as_str());
        let display_name = if feature.name.is_empty() {
            resource.uri.clone()
        } else {
            feature.name.clone()
        };

        let mut spec = NodeSpec::new(feature_id.clone(), display_name, NodeKind::Feature)
            .with_source(resource.source.at(FilePosition::line(feature.line)));

        for scenario in &feature.scenarios {
            if !whole_feature && !lines.contains(&scenario.line) {
                continue;
            }
            if let Some(pattern) = &self.name_pattern {
                if !pattern.is_match(&scenario.name) {
                    continue;
                }
            }
            spec = spec.with_child(
                NodeSpec::new(
                    feature_id.append(SCENARIO_SEGMENT, scenario.line.to_string()),
                    scenario.display_name(),
                    NodeKind::Scenario,
                )
                .with_source(resource.source.at(FilePosition::line(scenario.line))),
            );
        }

        if spec.children.is_empty() {
            None
        } else {
            Some(spec)
        }
    }
}

/// Lines in `lines` that match neither the feature nor any of its scenarios.
pub fn unmatched_lines(feature: &ParsedFeature, lines: &[usize]) -> Vec<usize> {
    lines
        .iter()
        .copied()
        .filter(|&line| line != feature.line && !feature.scenarios.iter().any(|s| s.line == line))
        .collect()
}

//! Discovery layer - selectors, resolution and issue reporting.

#![warn(missing_docs)]

pub mod selector;
pub mod resource;
pub mod parser;
pub mod filter;
pub mod reporter;
pub mod resolver;
pub mod features;

pub use selector::{DiscoveryRequest, DiscoverySelector};
pub use resource::{Classpath, FeatureLocation, FeatureResource, ResourceLocation};
pub use parser::{FeatureParser, ParseError, ParsedFeature, ParsedScenario, PlainFeatureParser};
pub use filter::FeatureFilter;
pub use reporter::{
    CollectingListener, DeduplicatingReporter, DiscoveryListener, ForwardingReporter, IssueReporter,
};
pub use resolver::DiscoverySelectorResolver;
pub use features::{features_override, FeaturesPropertyResolver};

/// Errors that abort a discovery pass.
///
/// Problems with individual selectors are reported as issues instead.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// The scenario name filter is not a valid regular expression
    #[error("invalid {} pattern '{pattern}': {source}", cuke_core::FILTER_NAME_PROPERTY_NAME)]
    InvalidNameFilter {
        /// The rejected pattern
        pattern: String,
        /// Why it was rejected
        #[source]
        source: regex::Error,
    },
}

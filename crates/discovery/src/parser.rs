//! Feature file parsing contract.
//!
//! Full Gherkin parsing belongs to the host. [`PlainFeatureParser`] only
//! recognises the keywords needed to lay out the descriptor tree.

/// A parsed feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFeature {
    /// Feature name, may be empty
    pub name: String,
    /// Line of the `Feature:` keyword
    pub line: usize,
    /// Scenarios in declaration order
    pub scenarios: Vec<ParsedScenario>,
}

/// A parsed scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedScenario {
    /// Keyword the scenario was declared with
    pub keyword: String,
    /// Scenario name, may be empty
    pub name: String,
    /// Line of the keyword
    pub line: usize,
}

impl ParsedScenario {
    /// Name shown to users; falls back to the keyword and line.
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            format!("{} (line {})", self.keyword, self.line)
        } else {
            self.name.clone()
        }
    }
}

/// Error raised for malformed feature files.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    /// Offending line
    pub line: usize,
    /// What is wrong with it
    pub message: String,
}

/// Turns feature file text into a [`ParsedFeature`].
pub trait FeatureParser: Send + Sync {
    /// Parse `text` read from `uri`.
    ///
    /// Returns `Ok(None)` for files without any feature, e.g. empty files.
    fn parse(&self, uri: &str, text: &str) -> Result<Option<ParsedFeature>, ParseError>;
}

const FEATURE_KEYWORD: &str = "Feature:";
const SCENARIO_KEYWORDS: &[&str] = &[
    "Scenario Outline:",
    "Scenario Template:",
    "Scenario:",
    "Example:",
];

/// Keyword-level parser for the English Gherkin dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainFeatureParser;

impl PlainFeatureParser {
    /// Create a parser.
    pub fn new() -> Self {
        Self
    }
}

impl FeatureParser for PlainFeatureParser {
    fn parse(&self, _uri: &str, text: &str) -> Result<Option<ParsedFeature>, ParseError> {
        let mut feature: Option<ParsedFeature> = None;

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            if let Some(name) = trimmed.strip_prefix(FEATURE_KEYWORD) {
                if feature.is_some() {
                    return Err(ParseError {
                        line,
                        message: "a file may declare only one feature".to_string(),
                    });
                }
                feature = Some(ParsedFeature {
                    name: name.trim().to_string(),
                    line,
                    scenarios: Vec::new(),
                });
                continue;
            }

            let Some((keyword, name)) = SCENARIO_KEYWORDS
                .iter()
                .find_map(|k| trimmed.strip_prefix(k).map(|rest| (*k, rest)))
            else {
                // Steps, tags, descriptions and tables are not our concern.
                continue;
            };

            let Some(feature) = feature.as_mut() else {
                return Err(ParseError {
                    line,
                    message: format!("'{}' before 'Feature:'", keyword),
                });
            };
            feature.scenarios.push(ParsedScenario {
                keyword: keyword.trim_end_matches(':').to_string(),
                name: name.trim().to_string(),
                line,
            });
        }

        Ok(feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feature_and_scenarios() {
        let text = "\
# language: en
@smoke
Feature: Belly

  Scenario: a few cukes
    Given I have 42 cukes in my belly

  Rule: eating
    Scenario Outline: eating <n>
      Given I eat <n>
      Examples:
        | n |
        | 1 |
    Example:
";
        let feature = PlainFeatureParser::new().parse("a.feature", text).unwrap().unwrap();
        assert_eq!(feature.name, "Belly");
        assert_eq!(feature.line, 3);

        let lines: Vec<_> = feature.scenarios.iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![5, 9, 14]);
        assert_eq!(feature.scenarios[1].keyword, "Scenario Outline");
        assert_eq!(feature.scenarios[2].display_name(), "Example (line 14)");
    }

    #[test]
    fn test_empty_file_has_no_feature() {
        let parsed = PlainFeatureParser::new().parse("a.feature", "\n# comment only\n").unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn test_scenario_before_feature_is_error() {
        let err = PlainFeatureParser::new()
            .parse("a.feature", "Scenario: orphan\nFeature: late")
            .unwrap_err();
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_second_feature_is_error() {
        let err = PlainFeatureParser::new()
            .parse("a.feature", "Feature: one\nFeature: two")
            .unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.to_string().starts_with("line 2:"));
    }
}

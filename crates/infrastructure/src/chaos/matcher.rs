//! Glob-style endpoint matching for chaos scenarios.

use regex::Regex;

use super::ChaosError;

/// Compiled set of endpoint patterns
///
/// `*` matches any sequence of characters; every other character is matched
/// literally. A matcher with no patterns matches nothing.
#[derive(Debug, Clone)]
pub struct EndpointMatcher {
    patterns: Vec<String>,
    compiled: Vec<Regex>,
}

impl EndpointMatcher {
    /// Compile a list of patterns
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ChaosError> {
        let mut compiled = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let expr = format!("^{}$", regex::escape(pattern).replace(r"\*", ".*"));
            let re = Regex::new(&expr).map_err(|e| ChaosError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
            compiled.push(re);
        }

        Ok(Self {
            patterns: patterns.iter().map(|p| p.as_ref().to_string()).collect(),
            compiled,
        })
    }

    /// Check whether any pattern matches the endpoint
    pub fn matches(&self, endpoint: &str) -> bool {
        self.compiled.iter().any(|re| re.is_match(endpoint))
    }

    /// The source patterns
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

//! Recording filters
//!
//! Every configured filter must accept a recording for it to be stored.

use std::fmt;

use domain::Recording;

use super::RecordingError;
use crate::config::RecordingFilterConfig;

/// Predicate over a captured recording
pub trait Filter: Send + Sync + fmt::Debug + fmt::Display {
    /// Whether the recording should be kept
    fn apply(&self, recording: &Recording) -> bool;
}

/// Keeps recordings whose method is in the list (case-insensitive)
#[derive(Debug, Clone)]
pub struct MethodFilter {
    methods: Vec<String>,
    negate: bool,
}

impl MethodFilter {
    pub fn new(methods: Vec<String>, negate: bool) -> Self {
        Self { methods, negate }
    }
}

impl Filter for MethodFilter {
    fn apply(&self, recording: &Recording) -> bool {
        let method = recording.method();
        let found = self.methods.iter().any(|m| m.eq_ignore_ascii_case(method));
        found != self.negate
    }
}

impl fmt::Display for MethodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "method({})", self.methods.join(","))?;
        if self.negate {
            f.write_str(" negated")?;
        }
        Ok(())
    }
}

/// Keeps recordings whose URI matches any pattern
///
/// `*` alone matches everything. A pattern with exactly one `*` matches URIs
/// starting with the part before it and ending with the part after it. Any
/// other pattern is a plain substring test.
#[derive(Debug, Clone)]
pub struct EndpointFilter {
    patterns: Vec<String>,
    negate: bool,
}

impl EndpointFilter {
    pub fn new(patterns: Vec<String>, negate: bool) -> Self {
        Self { patterns, negate }
    }

    fn pattern_matches(pattern: &str, uri: &str) -> bool {
        if pattern == "*" {
            return true;
        }
        if pattern.matches('*').count() == 1 {
            if let Some((prefix, suffix)) = pattern.split_once('*') {
                return uri.starts_with(prefix) && uri.ends_with(suffix);
            }
        }
        uri.contains(pattern)
    }
}

impl Filter for EndpointFilter {
    fn apply(&self, recording: &Recording) -> bool {
        let uri = recording.uri();
        let found = self
            .patterns
            .iter()
            .any(|p| Self::pattern_matches(p, uri));
        found != self.negate
    }
}

impl fmt::Display for EndpointFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "endpoint({})", self.patterns.join(","))?;
        if self.negate {
            f.write_str(" negated")?;
        }
        Ok(())
    }
}

/// Keeps recordings whose response status is in the list
#[derive(Debug, Clone)]
pub struct StatusFilter {
    codes: Vec<u16>,
    negate: bool,
}

impl StatusFilter {
    pub fn new(codes: Vec<u16>, negate: bool) -> Self {
        Self { codes, negate }
    }
}

impl Filter for StatusFilter {
    fn apply(&self, recording: &Recording) -> bool {
        self.codes.contains(&recording.status()) != self.negate
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<String> = self.codes.iter().map(ToString::to_string).collect();
        write!(f, "status({})", codes.join(","))?;
        if self.negate {
            f.write_str(" negated")?;
        }
        Ok(())
    }
}

/// Build one filter from its configuration
pub fn build_filter(config: &RecordingFilterConfig) -> Result<Box<dyn Filter>, RecordingError> {
    match config.filter_type.to_ascii_lowercase().as_str() {
        "method" => Ok(Box::new(MethodFilter::new(
            config.values.clone(),
            config.negate,
        ))),
        "endpoint" => Ok(Box::new(EndpointFilter::new(
            config.values.clone(),
            config.negate,
        ))),
        "status" => {
            let codes = config
                .values
                .iter()
                .map(|v| {
                    v.trim().parse::<u16>().map_err(|_| {
                        RecordingError::InvalidFilter(format!("invalid status code '{v}'"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Box::new(StatusFilter::new(codes, config.negate)))
        },
        other => Err(RecordingError::InvalidFilter(format!(
            "unknown filter type '{other}'"
        ))),
    }
}

/// Build the whole filter chain, failing on the first invalid definition
pub fn build_filters(
    configs: &[RecordingFilterConfig],
) -> Result<Vec<Box<dyn Filter>>, RecordingError> {
    configs.iter().map(build_filter).collect()
}

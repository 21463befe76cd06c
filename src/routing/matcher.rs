//! Path template matching.
//!
//! # Responsibilities
//! - Parse `{name}` templates into literal and placeholder segments
//! - Match a request path segment by segment
//! - Extract placeholder values by position
//!
//! # Design Decisions
//! - Literal segments are case-sensitive
//! - A placeholder matches exactly one non-empty segment
//! - Trailing slashes are significant (`/backends/` is not `/backends`)
//! - Placeholder values are percent-decoded; a value that does not decode to
//!   UTF-8 fails the match. `expand` encodes them again
//! - No regex to guarantee O(n) matching

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Placeholder values extracted from a matched path, keyed by placeholder name.
pub type PathParams = BTreeMap<String, String>;

/// Reasons a path template is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern `{0}` must start with `/`")]
    MissingLeadingSlash(String),

    #[error("pattern `{0}` contains an empty segment")]
    EmptySegment(String),

    #[error("pattern `{pattern}` has a malformed segment `{segment}`")]
    MalformedSegment { pattern: String, segment: String },

    #[error("pattern `{pattern}` repeats placeholder `{name}`")]
    RepeatedPlaceholder { pattern: String, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A compiled path template such as `/backends/{backend}/machines`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a template.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let parts = split_path(pattern)
            .ok_or_else(|| PatternError::MissingLeadingSlash(pattern.to_string()))?;

        let mut segments = Vec::with_capacity(parts.len());
        for part in parts {
            if part.is_empty() {
                return Err(PatternError::EmptySegment(pattern.to_string()));
            }
            let segment = match part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                Some(name) if is_identifier(name) => {
                    let repeated = segments
                        .iter()
                        .any(|s| matches!(s, Segment::Placeholder(existing) if existing == name));
                    if repeated {
                        return Err(PatternError::RepeatedPlaceholder {
                            pattern: pattern.to_string(),
                            name: name.to_string(),
                        });
                    }
                    Segment::Placeholder(name.to_string())
                }
                None if !part.contains(['{', '}']) => Segment::Literal(part.to_string()),
                _ => {
                    return Err(PatternError::MalformedSegment {
                        pattern: pattern.to_string(),
                        segment: part.to_string(),
                    })
                }
            };
            segments.push(segment);
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    /// The template as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Placeholder names in path order.
    pub fn placeholders(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Placeholder(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Number of literal segments; higher is more specific.
    pub fn specificity(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count()
    }

    /// Match a request path, returning the decoded placeholder values on success.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let parts = split_path(path)?;
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = PathParams::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Placeholder(name) if !part.is_empty() => {
                    let value = urlencoding::decode(part).ok()?;
                    params.insert(name.clone(), value.into_owned());
                }
                _ => return None,
            }
        }
        Some(params)
    }

    /// Substitute placeholder values into the template.
    ///
    /// Returns `None` if a placeholder has no value.
    pub fn expand(&self, params: &PathParams) -> Option<String> {
        if self.segments.is_empty() {
            return Some("/".to_string());
        }
        let mut path = String::new();
        for segment in &self.segments {
            path.push('/');
            match segment {
                Segment::Literal(literal) => path.push_str(literal),
                Segment::Placeholder(name) => path.push_str(&urlencoding::encode(params.get(name)?)),
            }
        }
        Some(path)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Split an absolute path into its segments. `/` has no segments.
///
/// Returns `None` for paths that do not start with `/`.
pub fn split_path(path: &str) -> Option<Vec<&str>> {
    let rest = path.strip_prefix('/')?;
    if rest.is_empty() {
        return Some(Vec::new());
    }
    Some(rest.split('/').collect())
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_match() {
        let pattern = PathPattern::parse("/backends/{backend}/machines/{machine}").unwrap();
        assert_eq!(pattern.placeholders(), vec!["backend", "machine"]);
        assert_eq!(pattern.specificity(), 2);

        let params = pattern.matches("/backends/aws1/machines/i-123").unwrap();
        assert_eq!(params.get("backend").map(String::as_str), Some("aws1"));
        assert_eq!(params.get("machine").map(String::as_str), Some("i-123"));

        assert!(pattern.matches("/backends/aws1/machines").is_none());
        assert!(pattern.matches("/backends/aws1/images/i-123").is_none());
        assert!(pattern.matches("/backends//machines/i-123").is_none());
    }

    #[test]
    fn test_root_pattern() {
        let pattern = PathPattern::parse("/").unwrap();
        assert_eq!(pattern.matches("/"), Some(PathParams::new()));
        assert!(pattern.matches("/backends").is_none());
        assert!(pattern.matches("").is_none());
    }

    #[test]
    fn test_literals_are_case_sensitive_and_trailing_slash_matters() {
        let pattern = PathPattern::parse("/backends").unwrap();
        assert!(pattern.matches("/backends").is_some());
        assert!(pattern.matches("/Backends").is_none());
        assert!(pattern.matches("/backends/").is_none());
    }

    #[test]
    fn test_invalid_patterns() {
        assert_eq!(
            PathPattern::parse("backends"),
            Err(PatternError::MissingLeadingSlash("backends".into()))
        );
        assert!(matches!(
            PathPattern::parse("/backends//machines"),
            Err(PatternError::EmptySegment(_))
        ));
        assert!(matches!(
            PathPattern::parse("/backends/{back end}"),
            Err(PatternError::MalformedSegment { .. })
        ));
        assert!(matches!(
            PathPattern::parse("/backends/x{backend}"),
            Err(PatternError::MalformedSegment { .. })
        ));
        assert!(matches!(
            PathPattern::parse("/{a}/{a}"),
            Err(PatternError::RepeatedPlaceholder { .. })
        ));
    }

    #[test]
    fn test_expand() {
        let pattern = PathPattern::parse("/backends/{backend}/images/{image}/metadata").unwrap();
        let mut params = PathParams::new();
        params.insert("backend".into(), "rs1".into());
        assert!(pattern.expand(&params).is_none());

        params.insert("image".into(), "ubuntu".into());
        assert_eq!(
            pattern.expand(&params).as_deref(),
            Some("/backends/rs1/images/ubuntu/metadata")
        );
        assert_eq!(PathPattern::parse("/").unwrap().expand(&params).as_deref(), Some("/"));
    }

    #[test]
    fn test_placeholder_values_are_decoded() {
        let pattern = PathPattern::parse("/backends/{backend}/sizes").unwrap();

        let params = pattern.matches("/backends/caf%C3%A9/sizes").unwrap();
        assert_eq!(params.get("backend").map(String::as_str), Some("café"));

        let params = pattern.matches("/backends/a%2Fb/sizes").unwrap();
        assert_eq!(params.get("backend").map(String::as_str), Some("a/b"));

        assert!(pattern.matches("/backends/%FF/sizes").is_none());
    }

    #[test]
    fn test_expand_encodes_values() {
        let pattern = PathPattern::parse("/backends/{backend}/sizes").unwrap();
        let mut params = PathParams::new();
        params.insert("backend".into(), "café a/b".into());

        let path = pattern.expand(&params).unwrap();
        assert_eq!(path, "/backends/caf%C3%A9%20a%2Fb/sizes");
        assert_eq!(pattern.matches(&path), Some(params));
    }
}

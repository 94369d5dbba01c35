//! Route pattern compilation and matching.
//!
//! A pattern is a `/`-delimited list of segments. A segment written exactly as
//! `{name}` captures one non-empty path segment under `name`, every other
//! segment must be equal to the request path segment at the same position.
//!
//! # Example
//! ```
//! use micro_dispatch::pattern::PathPattern;
//!
//! let pattern = PathPattern::compile("/hello/{name}").unwrap();
//! let vars = pattern.matches("/hello/world").unwrap();
//! assert_eq!(vars.get("name"), Some("world"));
//!
//! assert!(pattern.matches("/hello/world/again").is_none());
//! ```

use crate::PathVars;
use thiserror::Error;

/// One compiled segment of a [`PathPattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Variable(String),
}

/// A route pattern compiled into its segments.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PatternError {
    #[error("empty variable name in pattern '{pattern}'")]
    EmptyVariable { pattern: String },

    #[error("variable '{name}' appears more than once in pattern '{pattern}'")]
    DuplicateVariable { pattern: String, name: String },
}

impl PathPattern {
    /// Compiles `pattern`, failing on an empty or repeated variable name.
    pub fn compile(pattern: impl Into<String>) -> Result<Self, PatternError> {
        let raw = pattern.into();
        let mut segments = Vec::new();

        for part in raw.split('/') {
            let segment = match part.strip_prefix('{').and_then(|rest| rest.strip_suffix('}')) {
                Some("") => return Err(PatternError::EmptyVariable { pattern: raw.clone() }),
                Some(name) => {
                    let duplicated = segments.iter().any(|s| matches!(s, Segment::Variable(n) if n == name));
                    if duplicated {
                        return Err(PatternError::DuplicateVariable { pattern: raw.clone(), name: name.to_owned() });
                    }
                    Segment::Variable(name.to_owned())
                }
                None => Segment::Literal(part.to_owned()),
            };
            segments.push(segment);
        }

        Ok(Self { raw, segments })
    }

    /// The pattern text this was compiled from.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of the variable segments, in pattern order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Variable(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Matches `path` against this pattern.
    ///
    /// The path must have exactly as many segments as the pattern. Returns the
    /// captured variables, unconverted, or `None` when the path does not match.
    pub fn matches<'a>(&'a self, path: &'a str) -> Option<PathVars<'a>> {
        let mut vars = PathVars::empty();
        let mut parts = path.split('/');

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(text) => {
                    if text != part {
                        return None;
                    }
                }
                Segment::Variable(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    vars.push(name, part);
                }
            }
        }

        if parts.next().is_some() {
            return None;
        }

        Some(vars)
    }

    /// Returns true when both patterns match exactly the same set of paths,
    /// ignoring how their variables are named.
    pub fn same_shape(&self, other: &PathPattern) -> bool {
        self.segments.len() == other.segments.len()
            && self.segments.iter().zip(&other.segments).all(|pair| match pair {
                (Segment::Literal(a), Segment::Literal(b)) => a == b,
                (Segment::Variable(_), Segment::Variable(_)) => true,
                _ => false,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::{PathPattern, PatternError, Segment};

    #[test]
    fn test_compile_segments() {
        let pattern = PathPattern::compile("/a/{x}/b/{y}").unwrap();
        assert_eq!(
            pattern.segments(),
            &[
                Segment::Literal("".into()),
                Segment::Literal("a".into()),
                Segment::Variable("x".into()),
                Segment::Literal("b".into()),
                Segment::Variable("y".into()),
            ]
        );
        assert_eq!(pattern.variables().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(pattern.as_str(), "/a/{x}/b/{y}");
    }

    #[test]
    fn test_compile_rejects_empty_variable() {
        let err = PathPattern::compile("/a/{}").unwrap_err();
        assert_eq!(err, PatternError::EmptyVariable { pattern: "/a/{}".into() });
    }

    #[test]
    fn test_compile_rejects_duplicate_variable() {
        let err = PathPattern::compile("/{id}/x/{id}").unwrap_err();
        assert_eq!(err, PatternError::DuplicateVariable { pattern: "/{id}/x/{id}".into(), name: "id".into() });
    }

    #[test]
    fn test_partial_braces_are_literal() {
        let pattern = PathPattern::compile("/{a/b}/c{d}").unwrap();
        assert_eq!(pattern.variables().count(), 0);
        assert!(pattern.matches("/{a/b}/c{d}").is_some());
    }

    #[test]
    fn test_match_hello_name() {
        let pattern = PathPattern::compile("/hello/{name}").unwrap();
        let vars = pattern.matches("/hello/world").unwrap();
        assert_eq!(vars.len(), 1);
        assert_eq!(vars.get("name"), Some("world"));
    }

    #[test]
    fn test_segment_count_mismatch() {
        let pattern = PathPattern::compile("/a/{x}/b/{y}").unwrap();
        assert!(pattern.matches("/a/1/b").is_none());
        assert!(pattern.matches("/a/1/b/2/3").is_none());

        let vars = pattern.matches("/a/1/b/2").unwrap();
        assert_eq!(vars.get("x"), Some("1"));
        assert_eq!(vars.get("y"), Some("2"));
    }

    #[test]
    fn test_literal_is_case_sensitive() {
        let pattern = PathPattern::compile("/Users/{id}").unwrap();
        assert!(pattern.matches("/users/1").is_none());
        assert!(pattern.matches("/Users/1").is_some());
    }

    #[test]
    fn test_variable_needs_non_empty_segment() {
        let pattern = PathPattern::compile("/hello/{name}").unwrap();
        assert!(pattern.matches("/hello/").is_none());
    }

    #[test]
    fn test_trailing_slash_is_distinct() {
        let with_slash = PathPattern::compile("/users/").unwrap();
        let without = PathPattern::compile("/users").unwrap();

        assert!(with_slash.matches("/users/").is_some());
        assert!(with_slash.matches("/users").is_none());
        assert!(without.matches("/users").is_some());
        assert!(without.matches("/users/").is_none());
        assert!(!with_slash.same_shape(&without));
    }

    #[test]
    fn test_captured_values_are_raw() {
        let pattern = PathPattern::compile("/{a}/{b}").unwrap();
        let vars = pattern.matches("/%20x/007").unwrap();
        assert_eq!(vars.get("a"), Some("%20x"));
        assert_eq!(vars.get("b"), Some("007"));
    }

    #[test]
    fn test_same_shape_ignores_variable_names() {
        let a = PathPattern::compile("/users/{id}").unwrap();
        let b = PathPattern::compile("/users/{name}").unwrap();
        let c = PathPattern::compile("/users/me").unwrap();
        assert!(a.same_shape(&b));
        assert!(!a.same_shape(&c));
    }
}

//! Path pattern matching and interpolation.

use regex::Regex;
use std::collections::HashMap;

use crate::error::{Result, RouterError};

/// A segment in a path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A literal string segment.
    Literal(String),
    /// A dynamic segment (e.g., `:id`).
    Param(String),
}

/// A compiled path pattern for matching pathnames.
///
/// Pattern syntax uses `:name` for dynamic segments:
/// - `posts` - literal path
/// - `posts/:id` - path with one parameter
/// - `:user/status/:id` - multiple parameters
#[derive(Debug, Clone)]
pub struct PathPattern {
    /// The original pattern string.
    pattern: String,
    /// Parsed segments.
    segments: Vec<PathSegment>,
    /// Compiled regex for matching.
    regex: Regex,
    /// Parameter names in positional order.
    param_names: Vec<String>,
}

impl PathPattern {
    /// Compiles a path pattern string.
    ///
    /// # Example
    ///
    /// ```
    /// use alder_router::PathPattern;
    ///
    /// let pattern = PathPattern::new("/application/:user/status/:id");
    /// let params = pattern.match_path("/application/1/status/2").unwrap();
    /// assert_eq!(params.get("user").map(String::as_str), Some("1"));
    /// assert_eq!(params.get("id").map(String::as_str), Some("2"));
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the generated regex is invalid, which cannot happen for
    /// patterns built from escaped literals and `[^/]+` groups.
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        let mut segments = Vec::new();
        let mut param_names = Vec::new();
        let mut regex_str = String::from("^");

        for part in pattern.split('/').filter(|s| !s.is_empty()) {
            regex_str.push('/');

            if let Some(name) = part.strip_prefix(':') {
                segments.push(PathSegment::Param(name.to_string()));
                param_names.push(name.to_string());
                regex_str.push_str("([^/]+)");
            } else {
                segments.push(PathSegment::Literal(part.to_string()));
                regex_str.push_str(&regex::escape(part));
            }
        }

        // An all-empty pattern ("/") matches the bare root.
        if segments.is_empty() {
            regex_str.push('/');
        }

        regex_str.push_str("/?$");

        let regex = Regex::new(&regex_str).expect("invalid path pattern regex");

        Self {
            pattern: pattern.to_string(),
            segments,
            regex,
            param_names,
        }
    }

    /// Returns the original pattern string.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the dynamic segment names in positional order.
    #[must_use]
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Matches a pathname against the pattern, extracting dynamic segments.
    ///
    /// Trailing slashes are insignificant: `/a/b` and `/a/b/` match the same
    /// pattern. Returns `None` if the pathname does not match.
    #[must_use]
    pub fn match_path(&self, pathname: &str) -> Option<HashMap<String, String>> {
        let normalized = normalize(pathname);
        let captures = self.regex.captures(&normalized)?;

        let mut params = HashMap::new();
        for (i, name) in self.param_names.iter().enumerate() {
            if let Some(value) = captures.get(i + 1) {
                params.insert(name.clone(), value.as_str().to_string());
            }
        }
        Some(params)
    }

    /// Interpolates params into the pattern for reverse URL generation.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::MissingParam`] if a dynamic segment has no
    /// corresponding value in `params`; `route` names the route being
    /// generated for diagnostics.
    pub fn interpolate(&self, route: &str, params: &HashMap<String, String>) -> Result<String> {
        let mut parts = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            match segment {
                PathSegment::Literal(s) => parts.push(s.clone()),
                PathSegment::Param(name) => {
                    let value =
                        params
                            .get(name)
                            .ok_or_else(|| RouterError::MissingParam {
                                route: route.to_string(),
                                param: name.clone(),
                            })?;
                    parts.push(value.clone());
                }
            }
        }
        Ok(format!("/{}", parts.join("/")))
    }
}

/// Normalizes a pathname: ensures a leading slash and strips trailing ones.
#[must_use]
pub fn normalize(pathname: &str) -> String {
    let trimmed = pathname.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_match() {
        let pattern = PathPattern::new("application/messages");
        assert!(pattern.match_path("/application/messages").is_some());
        assert!(pattern.match_path("/application/notifications").is_none());
    }

    #[test]
    fn test_param_extraction() {
        let pattern = PathPattern::new("application/:user/status/:id");
        let params = pattern.match_path("/application/KidkArolis/status/42").unwrap();
        assert_eq!(params.get("user").map(String::as_str), Some("KidkArolis"));
        assert_eq!(params.get("id").map(String::as_str), Some("42"));
        assert_eq!(pattern.param_names(), ["user", "id"]);
    }

    #[test]
    fn test_trailing_slash_insensitive() {
        let pattern = PathPattern::new("application/messages");
        assert!(pattern.match_path("/application/messages/").is_some());
        assert!(pattern.match_path("application/messages").is_some());
    }

    #[test]
    fn test_root_pattern() {
        let pattern = PathPattern::new("");
        assert!(pattern.match_path("/").is_some());
        assert!(pattern.match_path("/foo").is_none());
    }

    #[test]
    fn test_interpolate() {
        let pattern = PathPattern::new("application/:user/status/:id");
        let params: HashMap<String, String> = [("user", "foo"), ("id", "1")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(
            pattern.interpolate("status", &params).unwrap(),
            "/application/foo/status/1"
        );
    }

    #[test]
    fn test_interpolate_missing_param() {
        let pattern = PathPattern::new(":user/status/:id");
        let err = pattern.interpolate("status", &HashMap::new()).unwrap_err();
        assert_eq!(
            err,
            RouterError::MissingParam {
                route: "status".into(),
                param: "user".into(),
            }
        );
    }
}

//! Path patterns with `:param` segments.

use std::collections::HashMap;
use std::fmt;

/// Path parameters bound by a match.
pub type Params = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    /// Trailing `*`: matches any remainder, including nothing.
    Rest,
}

/// A parsed route path such as `/folders/:id/documents`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Self {
        let segments = split(pattern)
            .map(|s| {
                if s == "*" {
                    Segment::Rest
                } else if let Some(name) = s.strip_prefix(':') {
                    Segment::Param(name.to_string())
                } else {
                    Segment::Literal(s.to_string())
                }
            })
            .collect();

        Self {
            raw: format!("/{}", split(pattern).collect::<Vec<_>>().join("/")),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match a request path, binding `:param` segments (percent-decoded).
    pub fn matches(&self, path: &str) -> Option<Params> {
        let parts: Vec<&str> = split(path).collect();
        let mut params = Params::new();

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Rest => return Some(params),
                Segment::Literal(literal) => {
                    if parts.get(i) != Some(&literal.as_str()) {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let value = parts.get(i)?;
                    let decoded = urlencoding::decode(value)
                        .map(|s| s.into_owned())
                        .unwrap_or_else(|_| value.to_string());
                    params.insert(name.clone(), decoded);
                }
            }
        }

        (parts.len() == self.segments.len()).then_some(params)
    }

    /// The last literal segment, used to infer a shorthand's model.
    pub fn last_literal(&self) -> Option<&str> {
        self.segments.iter().rev().find_map(|s| match s {
            Segment::Literal(l) => Some(l.as_str()),
            _ => None,
        })
    }

    /// Whether the pattern ends in a `:param` segment.
    pub fn ends_with_param(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Param(_)))
    }

    /// Name of the trailing `:param`, if any.
    pub fn trailing_param(&self) -> Option<&str> {
        match self.segments.last() {
            Some(Segment::Param(name)) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_only_matches_identical_path() {
        let pattern = PathPattern::parse("/documents");

        assert!(pattern.matches("/documents").is_some());
        assert!(pattern.matches("/documents/").is_some());
        assert!(pattern.matches("/document").is_none());
        assert!(pattern.matches("/documents/1").is_none());
    }

    #[test]
    fn test_params_bind_single_segments() {
        let pattern = PathPattern::parse("/folders/:folder_id/documents/:id");

        let params = pattern.matches("/folders/3/documents/7").unwrap();
        assert_eq!(params["folder_id"], "3");
        assert_eq!(params["id"], "7");
        assert!(pattern.matches("/folders/3/documents").is_none());
    }

    #[test]
    fn test_params_are_percent_decoded() {
        let pattern = PathPattern::parse("/tags/:name");

        let params = pattern.matches("/tags/hello%20world").unwrap();
        assert_eq!(params["name"], "hello world");
    }

    #[test]
    fn test_rest_matches_remainder() {
        let pattern = PathPattern::parse("/assets/*");

        assert!(pattern.matches("/assets").is_some());
        assert!(pattern.matches("/assets/img/logo.png").is_some());
        assert!(pattern.matches("/other").is_none());
    }

    #[test]
    fn test_shape_helpers() {
        let pattern = PathPattern::parse("documents/:id");

        assert_eq!(pattern.as_str(), "/documents/:id");
        assert_eq!(pattern.last_literal(), Some("documents"));
        assert!(pattern.ends_with_param());
        assert_eq!(pattern.trailing_param(), Some("id"));
    }
}

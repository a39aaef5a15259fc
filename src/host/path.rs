use regex::Regex;
use std::collections::HashMap;

/// Host path pattern compiled to a regex.
///
/// Syntax: `/users/:id/posts/:postId`. A `*` segment matches the rest of the
/// path and is captured under the name `"0"` (then `"1"`, ...). Matching is
/// case-insensitive and tolerates one trailing slash.
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    regex: Regex,
    param_names: Vec<String>,
}

impl PathPattern {
    /// Pattern matching the whole path.
    pub fn exact(path: &str) -> Result<Self, regex::Error> {
        Self::compile(path, false)
    }

    /// Pattern matching `path` and anything below it on a segment boundary.
    pub fn prefix(path: &str) -> Result<Self, regex::Error> {
        Self::compile(path, true)
    }

    fn compile(path: &str, prefix: bool) -> Result<Self, regex::Error> {
        let mut pattern = String::with_capacity(path.len() + 16);
        pattern.push_str("(?i)^");
        let mut param_names = Vec::with_capacity(path.matches(':').count());
        let mut wildcards = 0usize;

        for segment in path.split('/') {
            if segment.is_empty() {
                continue;
            }
            if let Some(name) = segment.strip_prefix(':') {
                pattern.push_str("/([^/]+)");
                param_names.push(name.to_string());
            } else if segment == "*" {
                pattern.push_str("/(.*)");
                param_names.push(wildcards.to_string());
                wildcards += 1;
            } else {
                pattern.push('/');
                pattern.push_str(&regex::escape(segment));
            }
        }

        if prefix {
            pattern.push_str("(?:/.*)?$");
        } else {
            pattern.push_str("/?$");
        }

        Ok(Self {
            source: path.to_string(),
            regex: Regex::new(&pattern)?,
            param_names,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Match `path`, returning percent-decoded captures by name.
    pub fn captures(&self, path: &str) -> Option<HashMap<String, String>> {
        let captures = self.regex.captures(path)?;
        let mut params = HashMap::with_capacity(self.param_names.len());
        for (i, name) in self.param_names.iter().enumerate() {
            if let Some(val) = captures.get(i + 1) {
                let decoded = urlencoding::decode(val.as_str())
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| val.as_str().to_string());
                params.insert(name.clone(), decoded);
            }
        }
        Some(params)
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

#[cfg(test)]
mod tests {
    use super::PathPattern;

    #[test]
    fn test_root_path() {
        let p = PathPattern::exact("/").unwrap();
        assert!(p.is_match("/"));
        assert!(!p.is_match("/x"));
        assert!(p.param_names().is_empty());
    }

    #[test]
    fn test_parameterized_path() {
        let p = PathPattern::exact("/users/:id/posts/:postId").unwrap();
        let params = p.captures("/users/7/posts/a%20b").unwrap();
        assert_eq!(params["id"], "7");
        assert_eq!(params["postId"], "a b");
        assert_eq!(p.param_names(), ["id", "postId"]);
    }

    #[test]
    fn test_literal_segments_are_escaped() {
        let p = PathPattern::exact("/swagger.json").unwrap();
        assert!(p.is_match("/swagger.json"));
        assert!(!p.is_match("/swaggerxjson"));
    }

    #[test]
    fn test_trailing_slash_and_case() {
        let p = PathPattern::exact("/abc").unwrap();
        assert!(p.is_match("/abc/"));
        assert!(p.is_match("/ABC"));
        assert!(!p.is_match("/abc/d"));
    }

    #[test]
    fn test_prefix_respects_segment_boundary() {
        let p = PathPattern::prefix("/api").unwrap();
        assert!(p.is_match("/api"));
        assert!(p.is_match("/api/users/1"));
        assert!(!p.is_match("/apis"));
        assert!(PathPattern::prefix("/").unwrap().is_match("/anything"));
    }

    #[test]
    fn test_wildcard_capture() {
        let p = PathPattern::exact("/files/*").unwrap();
        let params = p.captures("/files/a/b.txt").unwrap();
        assert_eq!(params["0"], "a/b.txt");
    }
}

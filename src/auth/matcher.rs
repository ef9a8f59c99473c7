//! Request matchers used to decide which URLs bypass authentication.
//!
//! Patterns use Ant-style wildcards:
//!
//! - `?` matches one character inside a path segment
//! - `*` matches zero or more characters inside a path segment
//! - `**` matches any number of whole segments; `/api/**` also matches `/api`
//!
//! Matchers compose with [`RequestMatcher::Or`] and [`RequestMatcher::Negated`].

use std::fmt;

use actix_web::http::Method;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Characters that are literal in a pattern but special in a regex.
    static ref REGEX_META: Regex = Regex::new(r"[.+()|\[\]{}^$\\]").unwrap();
}

/// Raised when a pattern cannot be compiled. Surfaces at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternError {
    pub pattern: String,
    pub reason: &'static str,
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid path pattern {:?}: {}", self.pattern, self.reason)
    }
}

impl std::error::Error for PatternError {}

/// One Ant-style path pattern, optionally restricted to a single HTTP method.
#[derive(Debug, Clone)]
pub struct AntMatcher {
    pattern: String,
    method: Option<Method>,
    regex: Regex,
}

impl AntMatcher {
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        let error = |reason| PatternError {
            pattern: pattern.to_string(),
            reason,
        };
        if !pattern.starts_with('/') {
            return Err(error("must start with '/'"));
        }
        if pattern.contains("***") {
            return Err(error("'***' is not a valid wildcard"));
        }

        let mut regex = String::from("^");
        let segments = pattern.split('/').skip(1);
        for segment in segments {
            if segment == "**" {
                // Zero or more whole segments, including the separator in front of them.
                regex.push_str("(?:/.*)?");
                continue;
            }
            if segment.contains("**") {
                return Err(error("'**' must be a whole path segment"));
            }
            regex.push('/');
            let escaped = REGEX_META.replace_all(segment, r"\$0");
            regex.push_str(&escaped.replace('*', "[^/]*").replace('?', "[^/]"));
        }
        regex.push('$');

        let regex = Regex::new(&regex).map_err(|_| error("does not compile"))?;
        Ok(Self {
            pattern: pattern.to_string(),
            method: None,
            regex,
        })
    }

    /// Restricts the matcher to one HTTP method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, method: &Method, path: &str) -> bool {
        self.method.as_ref().map_or(true, |m| m == method) && self.regex.is_match(path)
    }
}

/// A composable request predicate over method and path.
#[derive(Debug, Clone)]
pub enum RequestMatcher {
    Ant(AntMatcher),
    /// Matches when the inner matcher does not.
    Negated(Box<RequestMatcher>),
    /// Matches when any inner matcher does. An empty list never matches.
    Or(Vec<RequestMatcher>),
}

impl RequestMatcher {
    pub fn ant(pattern: &str) -> Result<Self, PatternError> {
        Ok(RequestMatcher::Ant(AntMatcher::new(pattern)?))
    }

    pub fn ant_with_method(pattern: &str, method: Method) -> Result<Self, PatternError> {
        Ok(RequestMatcher::Ant(AntMatcher::new(pattern)?.with_method(method)))
    }

    pub fn negate(self) -> Self {
        RequestMatcher::Negated(Box::new(self))
    }

    pub fn matches(&self, method: &Method, path: &str) -> bool {
        match self {
            RequestMatcher::Ant(ant) => ant.matches(method, path),
            RequestMatcher::Negated(inner) => !inner.matches(method, path),
            RequestMatcher::Or(matchers) => matchers.iter().any(|m| m.matches(method, path)),
        }
    }
}

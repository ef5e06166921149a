//! Path matchers.
//!
//! A [`PathMatcher`] decides whether a request path belongs to a route. Each
//! variant answers two questions: does the whole path match
//! ([`PathMatcher::match_path`]), and does a leading portion match, leaving a
//! tail for a nested router ([`PathMatcher::prefix_match`]).
//!
//! Matchers compare against the percent-decoded path. The decoded form of a
//! configured literal is computed once at construction; request paths decode
//! lazily on first use.

use crate::error::PatternError;
use crate::params::RouteParams;
use crate::path::{UriPath, percent_decode};
use crate::pattern::CompiledPattern;
use crate::routed::{MatchResult, PrefixMatchResult, RoutedPath};

/// A matcher for request paths.
#[derive(Debug, Clone)]
pub enum PathMatcher {
    /// Accepts exactly one path.
    Exact(ExactMatcher),
    /// Accepts a path subtree under a literal prefix.
    Prefix(PrefixMatcher),
    /// Accepts paths matching a compiled pattern.
    Pattern(PatternMatcher),
    /// Accepts every path.
    Any,
}

impl PathMatcher {
    /// Builds the right matcher for `pattern`.
    ///
    /// An empty pattern becomes an exact match on `/`. A literal pattern
    /// ending in `/*` becomes a prefix matcher for the part before the `*`.
    /// Any other pattern free of `{`, `[`, `*` and `\` is a plain exact
    /// matcher. Everything else is compiled.
    pub fn create(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Ok(Self::exact("/"));
        }
        if let Some(head) = pattern.strip_suffix("/*") {
            if is_literal(head) {
                return Ok(Self::prefix(head));
            }
        }
        if is_literal(pattern) {
            return Ok(Self::exact(pattern));
        }
        Ok(Self::Pattern(PatternMatcher {
            compiled: CompiledPattern::new(pattern)?,
        }))
    }

    /// A matcher accepting exactly `path`.
    ///
    /// The configured path is percent-decoded here, once.
    pub fn exact(path: &str) -> Self {
        Self::Exact(ExactMatcher {
            path: decode_configured(path),
        })
    }

    /// A matcher accepting `prefix` and everything under it.
    ///
    /// The configured prefix is percent-decoded here and stripped of
    /// trailing slashes, so `/static/` and `/static` configure the same
    /// matcher.
    pub fn prefix(prefix: &str) -> Self {
        let mut prefix = decode_configured(prefix);
        while prefix.len() > 1 && prefix.ends_with('/') {
            prefix.pop();
        }
        Self::Prefix(PrefixMatcher { prefix })
    }

    /// A matcher accepting every path.
    pub const fn any() -> Self {
        Self::Any
    }

    /// Matches the whole of `path`.
    pub fn match_path(&self, path: &UriPath) -> MatchResult {
        match self {
            Self::Exact(m) => m.match_path(path),
            Self::Prefix(m) => m.match_path(path),
            Self::Pattern(m) => m.match_path(path),
            Self::Any => MatchResult::accepted(RoutedPath::new(path.clone(), RouteParams::empty())),
        }
    }

    /// Matches a leading portion of `path`, splitting off the rest.
    ///
    /// The catch-all matcher accepts without consuming anything: the matched
    /// head is `/` and the whole path is left unmatched.
    pub fn prefix_match(&self, path: &UriPath) -> PrefixMatchResult {
        match self {
            Self::Exact(m) => m.prefix_match(path),
            Self::Prefix(m) => m.prefix_match(path),
            Self::Pattern(m) => m.prefix_match(path),
            Self::Any => PrefixMatchResult::accepted(
                RoutedPath::new(UriPath::from_decoded("/"), RouteParams::empty()),
                path.clone(),
            ),
        }
    }
}

fn is_literal(pattern: &str) -> bool {
    !pattern
        .bytes()
        .any(|b| matches!(b, b'{' | b'[' | b'*' | b'\\'))
}

fn decode_configured(path: &str) -> String {
    if path.is_empty() {
        "/".to_owned()
    } else {
        percent_decode(path)
    }
}

/// Matcher for one literal path.
#[derive(Debug, Clone)]
pub struct ExactMatcher {
    /// Decoded configured path.
    path: String,
}

impl ExactMatcher {
    fn match_path(&self, path: &UriPath) -> MatchResult {
        // raw comparison first, it usually settles the question without
        // forcing the request path to decode
        if path.raw_path() == self.path || path.path() == self.path {
            MatchResult::accepted(RoutedPath::new(path.clone(), RouteParams::empty()))
        } else {
            MatchResult::not_accepted()
        }
    }

    fn prefix_match(&self, path: &UriPath) -> PrefixMatchResult {
        match split_on_segment(path, &self.path) {
            Some(split) => split,
            None => PrefixMatchResult::not_accepted(),
        }
    }
}

/// Matcher for a literal path prefix.
#[derive(Debug, Clone)]
pub struct PrefixMatcher {
    /// Decoded configured prefix, without a trailing slash unless root.
    prefix: String,
}

impl PrefixMatcher {
    fn match_path(&self, path: &UriPath) -> MatchResult {
        if accepts_subtree(path.path(), &self.prefix) {
            MatchResult::accepted(RoutedPath::new(path.clone(), RouteParams::empty()))
        } else {
            MatchResult::not_accepted()
        }
    }

    fn prefix_match(&self, path: &UriPath) -> PrefixMatchResult {
        match split_on_segment(path, &self.prefix) {
            Some(split) => split,
            None => PrefixMatchResult::not_accepted(),
        }
    }
}

/// Matcher backed by a compiled pattern.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    compiled: CompiledPattern,
}

impl PatternMatcher {
    /// The pattern this matcher was compiled from.
    pub fn pattern(&self) -> &str {
        self.compiled.pattern()
    }

    fn match_path(&self, path: &UriPath) -> MatchResult {
        match self.compiled.match_full(path.path()) {
            Some(params) => MatchResult::accepted(RoutedPath::new(path.clone(), params)),
            None => MatchResult::not_accepted(),
        }
    }

    fn prefix_match(&self, path: &UriPath) -> PrefixMatchResult {
        let decoded = path.path();
        match self.compiled.match_prefix(decoded) {
            Some((params, end)) => {
                let matched = RoutedPath::new(UriPath::from_decoded(&decoded[..end]), params);
                let unmatched = if decoded[end..].is_empty() {
                    UriPath::from_decoded("/")
                } else {
                    UriPath::from_decoded(&decoded[end..])
                };
                PrefixMatchResult::accepted(matched, unmatched)
            }
            None => PrefixMatchResult::not_accepted(),
        }
    }
}

/// True when `path` equals `prefix` or continues it on a segment boundary.
///
/// `/test` does not belong to the `/te` subtree; prefix matching never
/// splits a segment.
fn accepts_subtree(path: &str, prefix: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Splits `path` into the literal `prefix` head and the remaining tail.
fn split_on_segment(path: &UriPath, prefix: &str) -> Option<PrefixMatchResult> {
    if prefix == "/" {
        // the root prefix accepts everything and consumes nothing beyond it
        return Some(PrefixMatchResult::accepted(
            RoutedPath::new(UriPath::from_decoded("/"), RouteParams::empty()),
            path.clone(),
        ));
    }
    let rest = path.path().strip_prefix(prefix)?;
    if rest.is_empty() {
        Some(PrefixMatchResult::accepted(
            RoutedPath::new(UriPath::from_decoded(prefix), RouteParams::empty()),
            UriPath::from_decoded("/"),
        ))
    } else if rest.starts_with('/') {
        Some(PrefixMatchResult::accepted(
            RoutedPath::new(UriPath::from_decoded(prefix), RouteParams::empty()),
            UriPath::from_decoded(rest),
        ))
    } else {
        None
    }
}

//! Results produced by path matchers.

use crate::params::RouteParams;
use crate::path::UriPath;

/// The path a matcher accepted together with the parameters it resolved.
#[derive(Debug, Clone)]
pub struct RoutedPath {
    path: UriPath,
    params: RouteParams,
}

impl RoutedPath {
    pub(crate) fn new(path: UriPath, params: RouteParams) -> Self {
        Self { path, params }
    }

    pub fn path(&self) -> &UriPath {
        &self.path
    }

    pub fn params(&self) -> &RouteParams {
        &self.params
    }

    pub(crate) fn with_params(self, params: RouteParams) -> Self {
        Self { params, ..self }
    }
}

/// Outcome of matching a whole path against a matcher.
#[derive(Debug, Clone)]
pub struct MatchResult {
    routed: Option<RoutedPath>,
}

impl MatchResult {
    pub(crate) fn accepted(routed: RoutedPath) -> Self {
        Self { routed: Some(routed) }
    }

    pub(crate) const fn not_accepted() -> Self {
        Self { routed: None }
    }

    pub fn is_accepted(&self) -> bool {
        self.routed.is_some()
    }

    pub fn routed_path(&self) -> Option<&RoutedPath> {
        self.routed.as_ref()
    }

    pub fn into_routed_path(self) -> Option<RoutedPath> {
        self.routed
    }
}

/// Outcome of matching a leading portion of a path against a matcher.
///
/// On acceptance the path splits into the matched head, carrying any
/// resolved parameters, and the unmatched tail left for a nested router. The
/// tail is `/` when the matcher consumed the whole path; it always starts
/// with `/`, since prefix matching never stops mid-segment.
#[derive(Debug, Clone)]
pub struct PrefixMatchResult {
    split: Option<(RoutedPath, UriPath)>,
}

impl PrefixMatchResult {
    pub(crate) fn accepted(matched: RoutedPath, unmatched: UriPath) -> Self {
        Self { split: Some((matched, unmatched)) }
    }

    pub(crate) const fn not_accepted() -> Self {
        Self { split: None }
    }

    pub fn is_accepted(&self) -> bool {
        self.split.is_some()
    }

    /// The accepted head of the path.
    pub fn matched_path(&self) -> Option<&RoutedPath> {
        self.split.as_ref().map(|(matched, _)| matched)
    }

    /// The tail left over for further routing.
    pub fn unmatched_path(&self) -> Option<&UriPath> {
        self.split.as_ref().map(|(_, unmatched)| unmatched)
    }

    pub(crate) fn into_split(self) -> Option<(RoutedPath, UriPath)> {
        self.split
    }
}

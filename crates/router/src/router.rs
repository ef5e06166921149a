//! Route table with nested routing.

use tracing::{debug, trace};

use crate::error::PatternError;
use crate::matcher::PathMatcher;
use crate::params::RouteParams;
use crate::path::UriPath;
use crate::routed::RoutedPath;

/// An ordered route table resolving paths to values of type `T`.
///
/// Routes are tried in registration order and the first accepting matcher
/// wins. A route either holds a value or mounts a nested router; for a
/// mount, the matcher consumes a leading portion of the path and the nested
/// router resolves the rest. Parameters resolved along the way are merged,
/// the innermost value winning on duplicate names.
#[derive(Debug)]
pub struct Router<T> {
    routes: Vec<Route<T>>,
}

#[derive(Debug)]
struct Route<T> {
    matcher: PathMatcher,
    endpoint: Endpoint<T>,
}

#[derive(Debug)]
enum Endpoint<T> {
    Value(T),
    Nested(Router<T>),
}

impl<T> Router<T> {
    pub fn builder() -> RouterBuilder<T> {
        RouterBuilder { routes: Vec::new() }
    }

    /// Resolves a raw request path to the first route accepting it.
    pub fn at(&self, path: &str) -> Option<Routed<'_, T>> {
        let path = UriPath::new(path);
        let routed = self.resolve(&path, &RouteParams::empty());
        if routed.is_none() {
            debug!(path = %path, "no route accepted the path");
        }
        routed
    }

    fn resolve(&self, path: &UriPath, inherited: &RouteParams) -> Option<Routed<'_, T>> {
        for route in &self.routes {
            match &route.endpoint {
                Endpoint::Value(value) => {
                    if let Some(routed) = route.matcher.match_path(path).into_routed_path() {
                        trace!(path = %path, "route accepted");
                        let params = inherited.merged_with(routed.params());
                        return Some(Routed {
                            value,
                            path: routed.with_params(params),
                        });
                    }
                }
                Endpoint::Nested(nested) => {
                    if let Some((matched, unmatched)) =
                        route.matcher.prefix_match(path).into_split()
                    {
                        let params = inherited.merged_with(matched.params());
                        if let Some(found) = nested.resolve(&unmatched, &params) {
                            return Some(found);
                        }
                        // nothing matched below this mount, try later routes
                    }
                }
            }
        }
        None
    }
}

/// A resolved route: the registered value and the path view that reached it.
#[derive(Debug)]
pub struct Routed<'router, T> {
    value: &'router T,
    path: RoutedPath,
}

impl<T> Routed<'_, T> {
    pub fn value(&self) -> &T {
        self.value
    }

    /// The path as seen by the router that held the route, relative to any
    /// mounts above it, with all parameters merged in.
    pub fn path(&self) -> &RoutedPath {
        &self.path
    }
}

/// Builder assembling a [`Router`] route by route.
#[derive(Debug)]
pub struct RouterBuilder<T> {
    routes: Vec<Route<T>>,
}

impl<T> RouterBuilder<T> {
    /// Registers `value` under `pattern`.
    ///
    /// Patterns are classified as in [`PathMatcher::create`].
    pub fn route(self, pattern: &str, value: T) -> Result<Self, PatternError> {
        Ok(self.route_with(PathMatcher::create(pattern)?, value))
    }

    /// Registers `value` under a prebuilt matcher.
    pub fn route_with(mut self, matcher: PathMatcher, value: T) -> Self {
        self.routes.push(Route {
            matcher,
            endpoint: Endpoint::Value(value),
        });
        self
    }

    /// Mounts a nested router under `pattern`.
    ///
    /// The pattern consumes a leading portion of the path; the nested router
    /// sees only the remainder.
    pub fn mount(mut self, pattern: &str, router: Router<T>) -> Result<Self, PatternError> {
        self.routes.push(Route {
            matcher: PathMatcher::create(pattern)?,
            endpoint: Endpoint::Nested(router),
        });
        Ok(self)
    }

    /// Registers a catch-all value tried after every prior route.
    pub fn fallback(self, value: T) -> Self {
        self.route_with(PathMatcher::any(), value)
    }

    pub fn build(self) -> Router<T> {
        Router { routes: self.routes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_in_registration_order() {
        let router = Router::builder()
            .route("/users/{id}", "by-id")
            .unwrap()
            .route("/users/me", "me")
            .unwrap()
            .build();

        // the pattern was registered first, so it shadows the literal
        assert_eq!(router.at("/users/me").unwrap().value(), &"by-id");
        assert_eq!(router.at("/users/7").unwrap().value(), &"by-id");
    }

    #[test]
    fn unmatched_path_resolves_to_none() {
        let router = Router::builder().route("/a", 1).unwrap().build();
        assert!(router.at("/b").is_none());
        assert!(router.at("/a/b").is_none());
    }

    #[test]
    fn nested_router_sees_the_remainder() {
        let api = Router::builder().route("/users/{id}", "user").unwrap().build();
        let router = Router::builder().mount("/api", api).unwrap().build();

        let routed = router.at("/api/users/7").unwrap();
        assert_eq!(routed.value(), &"user");
        assert_eq!(routed.path().path().path(), "/users/7");
        assert_eq!(routed.path().params().get("id"), Some("7"));
    }

    #[test]
    fn parameters_merge_across_mounts() {
        let files = Router::builder()
            .route("/files/{+path}", "file")
            .unwrap()
            .build();
        let router = Router::builder()
            .mount("/tenants/{tenant}", files)
            .unwrap()
            .build();

        let routed = router.at("/tenants/acme/files/a/b.txt").unwrap();
        let params = routed.path().params();
        assert_eq!(params.get("tenant"), Some("acme"));
        assert_eq!(params.get("path"), Some("a/b.txt"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn innermost_parameter_shadows_outer() {
        let inner = Router::builder().route("/y/{id}", "leaf").unwrap().build();
        let router = Router::builder().mount("/x/{id}", inner).unwrap().build();

        let routed = router.at("/x/1/y/2").unwrap();
        assert_eq!(routed.path().params().get("id"), Some("2"));
        assert_eq!(routed.path().params().len(), 2);
    }

    #[test]
    fn later_routes_are_tried_when_a_mount_misses() {
        let api = Router::builder().route("/users", "users").unwrap().build();
        let router = Router::builder()
            .mount("/api", api)
            .unwrap()
            .route("/api/health", "health")
            .unwrap()
            .build();

        assert_eq!(router.at("/api/users").unwrap().value(), &"users");
        assert_eq!(router.at("/api/health").unwrap().value(), &"health");
    }

    #[test]
    fn fallback_catches_everything_after_routes() {
        let router = Router::builder()
            .route("/a", "a")
            .unwrap()
            .fallback("fallback")
            .build();

        assert_eq!(router.at("/a").unwrap().value(), &"a");
        assert_eq!(router.at("/nope").unwrap().value(), &"fallback");
    }

    #[test]
    fn empty_request_path_is_routed_as_root() {
        let router = Router::builder().route("/", "root").unwrap().build();
        assert_eq!(router.at("").unwrap().value(), &"root");
        assert_eq!(router.at("/").unwrap().value(), &"root");
    }

    #[test]
    fn encoded_request_paths_match_decoded_routes() {
        let router = Router::builder().route("/a b", "spaced").unwrap().build();
        let routed = router.at("/a%20b").unwrap();
        assert_eq!(routed.value(), &"spaced");
        assert_eq!(routed.path().path().raw_path(), "/a%20b");
        assert_eq!(routed.path().path().path(), "/a b");
    }

    #[test]
    fn prefix_route_accepts_its_subtree() {
        let router = Router::builder().route("/static/*", "asset").unwrap().build();
        assert_eq!(router.at("/static/js/app.js").unwrap().value(), &"asset");
        assert_eq!(router.at("/static").unwrap().value(), &"asset");
        assert!(router.at("/staticx").is_none());
    }
}

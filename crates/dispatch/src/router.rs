//! The route table.
//!
//! Routes are tried in registration order and the first pattern matching the
//! path wins, so a literal route meant to shadow a variable one (`/users/me`
//! before `/users/{id}`) must be registered first. Registering two patterns of
//! the same shape (`/users/{id}` and `/users/{name}`) is rejected when the
//! router is built, since the second one could never be reached.

use crate::pattern::{PathPattern, PatternError};
use crate::resource::{ResourceFactory, boxed_factory};
use crate::{PathVars, Resource};
use std::fmt;
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Error, Debug)]
pub enum RouteError {
    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error("pattern '{pattern}' collides with already registered pattern '{existing}'")]
    Collision { pattern: String, existing: String },
}

/// An immutable route table, shared by every dispatch.
pub struct Router {
    routes: Vec<Route>,
}

struct Route {
    pattern: PathPattern,
    factory: ResourceFactory,
}

/// A resolved route: the factory to instantiate plus the variables bound from the path.
pub struct RouteMatch<'a> {
    route: &'a Route,
    vars: PathVars<'a>,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Registers `pattern` directly on this router.
    ///
    /// Fails if the pattern does not compile or has the same shape as an
    /// already registered one.
    pub fn try_route<F, R>(&mut self, pattern: &str, factory: F) -> Result<(), RouteError>
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: Resource,
    {
        self.insert(pattern, boxed_factory(factory))
    }

    fn insert(&mut self, pattern: &str, factory: ResourceFactory) -> Result<(), RouteError> {
        let pattern = PathPattern::compile(pattern)?;

        if let Some(existing) = self.routes.iter().find(|route| route.pattern.same_shape(&pattern)) {
            return Err(RouteError::Collision {
                pattern: pattern.as_str().to_owned(),
                existing: existing.pattern.as_str().to_owned(),
            });
        }

        debug!(pattern = pattern.as_str(), "route registered");
        self.routes.push(Route { pattern, factory });
        Ok(())
    }

    /// Resolves `path` to the first registered route matching it.
    ///
    /// Returns `None` when no pattern matches.
    pub fn at<'a>(&'a self, path: &'a str) -> Option<RouteMatch<'a>> {
        let matched = self
            .routes
            .iter()
            .find_map(|route| route.pattern.matches(path).map(|vars| RouteMatch { route, vars }));

        if matched.is_none() {
            trace!(path, "no route matched");
        }
        matched
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// The registered patterns, in registration order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|route| route.pattern.as_str())
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.patterns()).finish()
    }
}

impl fmt::Debug for RouteMatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch").field("pattern", &self.route.pattern.as_str()).field("vars", &self.vars).finish()
    }
}

impl<'a> RouteMatch<'a> {
    /// Creates a fresh resource for this request.
    pub fn create(&self) -> Box<dyn Resource> {
        (self.route.factory)()
    }

    pub fn pattern(&self) -> &'a str {
        self.route.pattern.as_str()
    }

    pub fn vars(&self) -> &PathVars<'a> {
        &self.vars
    }

    pub fn into_vars(self) -> PathVars<'a> {
        self.vars
    }
}

/// Collects routes in registration order; [`build`](RouterBuilder::build)
/// validates them all.
pub struct RouterBuilder {
    data: Vec<(String, ResourceFactory)>,
}

impl RouterBuilder {
    fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn route<F, R>(mut self, pattern: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: Resource,
    {
        self.data.push((pattern.into(), boxed_factory(factory)));
        self
    }

    /// Builds the router, failing on the first pattern that does not compile
    /// or collides with an earlier one.
    pub fn build(self) -> Result<Router, RouteError> {
        let mut router = Router { routes: Vec::with_capacity(self.data.len()) };
        for (pattern, factory) in self.data {
            router.insert(&pattern, factory)?;
        }
        Ok(router)
    }
}

impl fmt::Debug for RouterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.data.iter().map(|(pattern, _)| pattern)).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{RouteError, Router};
    use crate::pattern::PatternError;
    use crate::{Resource, resource};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Noop;
    impl Resource for Noop {}

    fn router() -> Router {
        Router::builder()
            .route("/", resource::<Noop>())
            .route("/hello/{name}", resource::<Noop>())
            .route("/users/me", resource::<Noop>())
            .route("/users/{id}", resource::<Noop>())
            .route("/a/{x}/b/{y}", resource::<Noop>())
            .build()
            .unwrap()
    }

    #[test]
    fn test_route_hello() {
        let router = router();
        let matched = router.at("/hello/world").unwrap();

        assert_eq!(matched.pattern(), "/hello/{name}");
        assert_eq!(matched.vars().len(), 1);
        assert_eq!(matched.vars().get("name"), Some("world"));
    }

    #[test]
    fn test_route_root() {
        let router = router();
        let matched = router.at("/").unwrap();
        assert_eq!(matched.pattern(), "/");
        assert!(matched.vars().is_empty());
    }

    #[test]
    fn test_segment_count_mismatch_is_not_found() {
        let router = router();
        assert!(router.at("/a/1/b").is_none());
        assert!(router.at("/hello").is_none());
        assert!(router.at("/hello/world/").is_none());
        assert!(router.at("/missing").is_none());
    }

    #[test]
    fn test_first_registered_wins_on_overlap() {
        let router = router();

        let matched = router.at("/users/me").unwrap();
        assert_eq!(matched.pattern(), "/users/me");
        assert!(matched.vars().is_empty());

        let matched = router.at("/users/42").unwrap();
        assert_eq!(matched.pattern(), "/users/{id}");
        assert_eq!(matched.vars().get("id"), Some("42"));
    }

    #[test]
    fn test_registration_order_decides_overlap() {
        let router =
            Router::builder().route("/users/{id}", resource::<Noop>()).route("/users/me", resource::<Noop>()).build().unwrap();

        let matched = router.at("/users/me").unwrap();
        assert_eq!(matched.pattern(), "/users/{id}");
        assert_eq!(matched.into_vars().get("id"), Some("me"));
    }

    #[test]
    fn test_same_shape_is_rejected() {
        let err = Router::builder()
            .route("/users/{id}", resource::<Noop>())
            .route("/users/{name}", resource::<Noop>())
            .build()
            .unwrap_err();

        match err {
            RouteError::Collision { pattern, existing } => {
                assert_eq!(pattern, "/users/{name}");
                assert_eq!(existing, "/users/{id}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_identical_literal_is_rejected() {
        let mut router = Router::builder().build().unwrap();
        router.try_route("/health", resource::<Noop>()).unwrap();
        assert!(matches!(router.try_route("/health", resource::<Noop>()), Err(RouteError::Collision { .. })));
        assert_eq!(router.len(), 1);
    }

    #[test]
    fn test_trailing_slash_is_a_distinct_route() {
        let mut router = Router::builder().build().unwrap();
        router.try_route("/users", resource::<Noop>()).unwrap();
        router.try_route("/users/", resource::<Noop>()).unwrap();

        assert_eq!(router.at("/users").unwrap().pattern(), "/users");
        assert_eq!(router.at("/users/").unwrap().pattern(), "/users/");
        assert_eq!(router.patterns().collect::<Vec<_>>(), vec!["/users", "/users/"]);
    }

    #[test]
    fn test_bad_pattern_fails_build() {
        let err = Router::builder().route("/x/{}", resource::<Noop>()).build().unwrap_err();
        assert!(matches!(err, RouteError::Pattern(PatternError::EmptyVariable { .. })));
    }

    #[test]
    fn test_factory_creates_fresh_resource() {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&created);
        let router = Router::builder()
            .route("/count", move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Noop
            })
            .build()
            .unwrap();

        let matched = router.at("/count").unwrap();
        let _first = matched.create();
        let _second = matched.create();
        assert_eq!(created.load(Ordering::SeqCst), 2);
    }
}

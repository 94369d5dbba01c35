//! Request information visible to resources and interceptors.
//!
//! This module contains:
//! - `RequestContext`: the request head plus the variables bound from its path
//! - `PathVars`: variable name to raw value pairs captured by route matching

use http::request::Parts;
use http::{HeaderMap, Method, Uri, Version};

/// The request head together with the path variables of the matched route.
///
/// The lifetime ties the context to the request head and to the router the
/// variables were matched against; neither is copied.
#[derive(Debug)]
pub struct RequestContext<'a> {
    head: &'a Parts,
    path_vars: PathVars<'a>,
}

impl<'a> RequestContext<'a> {
    pub fn new(head: &'a Parts, path_vars: PathVars<'a>) -> Self {
        Self { head, path_vars }
    }

    /// Returns the HTTP method of the request
    pub fn method(&self) -> &Method {
        &self.head.method
    }

    /// Returns the URI of the request
    pub fn uri(&self) -> &Uri {
        &self.head.uri
    }

    /// Returns the HTTP version of the request
    pub fn version(&self) -> Version {
        self.head.version
    }

    /// Returns the HTTP headers of the request
    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    /// Returns the variables bound from the request path
    pub fn path_vars(&self) -> &PathVars<'a> {
        &self.path_vars
    }
}

/// Variables captured from a request path, in pattern order.
///
/// Values are the raw path segments; conversion happens when they are bound
/// into resource fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathVars<'a> {
    inner: Vec<(&'a str, &'a str)>,
}

impl<'a> PathVars<'a> {
    /// Creates an empty set of variables
    #[inline]
    pub fn empty() -> Self {
        Self { inner: Vec::new() }
    }

    pub(crate) fn push(&mut self, name: &'a str, value: &'a str) {
        self.inner.push((name, value));
    }

    /// Returns true if no variable was captured
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Gets the raw value captured for `name`
    pub fn get(&self, name: impl AsRef<str>) -> Option<&'a str> {
        let name = name.as_ref();
        self.inner.iter().find(|(n, _)| *n == name).map(|(_, value)| *value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> + '_ {
        self.inner.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::{PathVars, RequestContext};
    use http::{Method, Request};

    #[test]
    fn test_path_vars() {
        let mut vars = PathVars::empty();
        assert!(vars.is_empty());

        vars.push("name", "foo");
        vars.push("id", "10");

        assert_eq!(vars.len(), 2);
        assert_eq!(vars.get("name"), Some("foo"));
        assert_eq!(vars.get(String::from("id")), Some("10"));
        assert_eq!(vars.get("missing"), None);
        assert_eq!(vars.iter().collect::<Vec<_>>(), vec![("name", "foo"), ("id", "10")]);
    }

    #[test]
    fn test_request_context() {
        let (head, ()) = Request::builder()
            .method(Method::PUT)
            .uri("/users/7?verbose=1")
            .header(http::header::ACCEPT, "application/json")
            .body(())
            .unwrap()
            .into_parts();

        let mut vars = PathVars::empty();
        vars.push("id", "7");
        let ctx = RequestContext::new(&head, vars);

        assert_eq!(ctx.method(), Method::PUT);
        assert_eq!(ctx.uri().path(), "/users/7");
        assert_eq!(ctx.headers()[http::header::ACCEPT], "application/json");
        assert_eq!(ctx.path_vars().get("id"), Some("7"));
    }
}

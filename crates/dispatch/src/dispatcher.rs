//! The dispatch loop: route, bind, intercept, invoke, respond.
//!
//! A [`Dispatcher`] is immutable once built and can be shared between tasks,
//! each [`serve`](Dispatcher::serve) call works on its own resource instance
//! and its own interceptor chain.

use crate::binder::bind_path_vars;
use crate::body::{DEFAULT_BODY_LIMIT, RequestBody, ResponseBody};
use crate::error::{BoxError, DispatchError, panic_message};
use crate::exchange::error_response;
use crate::resource::{ResourceFactory, VerbError, boxed_factory, invoke_verb};
use crate::router::Router;
use crate::{Exchange, PathVars, RequestContext, Resource};
use bytes::Bytes;
use futures::FutureExt;
use http::request::Parts;
use http::{Request, Response, StatusCode};
use http_body::Body as HttpBody;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, trace};

/// Receives every reportable failure of a dispatch.
pub type ErrorSink = Arc<dyn Fn(&DispatchError) + Send + Sync>;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("router must be set")]
    MissingRouter,
}

pub struct DispatcherBuilder {
    router: Option<Router>,
    fallback: Option<ResourceFactory>,
    error_sink: Option<ErrorSink>,
    body_limit: usize,
}

impl DispatcherBuilder {
    fn new() -> Self {
        Self { router: None, fallback: None, error_sink: None, body_limit: DEFAULT_BODY_LIMIT }
    }

    pub fn router(mut self, router: Router) -> Self {
        self.router = Some(router);
        self
    }

    /// Sets the callback receiving reportable failures. Without one they are only logged.
    pub fn error_sink<F>(mut self, sink: F) -> Self
    where
        F: Fn(&DispatchError) + Send + Sync + 'static,
    {
        self.error_sink = Some(Arc::new(sink));
        self
    }

    /// Maximum number of request body bytes a resource may read.
    pub fn body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Serves paths no route matches with resources from `factory`, instead of `404 Not Found`.
    pub fn fallback<F, R>(mut self, factory: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: Resource,
    {
        self.fallback = Some(boxed_factory(factory));
        self
    }

    pub fn build(self) -> Result<Dispatcher, BuildError> {
        let router = self.router.ok_or(BuildError::MissingRouter)?;
        let error_sink: ErrorSink = match self.error_sink {
            Some(sink) => sink,
            None => Arc::new(|_: &DispatchError| {}),
        };
        Ok(Dispatcher { router, fallback: self.fallback, error_sink, body_limit: self.body_limit })
    }
}

impl fmt::Debug for DispatcherBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherBuilder")
            .field("router", &self.router)
            .field("fallback", &self.fallback.is_some())
            .field("body_limit", &self.body_limit)
            .finish_non_exhaustive()
    }
}

pub struct Dispatcher {
    router: Router,
    fallback: Option<ResourceFactory>,
    error_sink: ErrorSink,
    body_limit: usize,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Dispatches one request and always produces a response.
    ///
    /// Failures are turned into error responses; a panic anywhere in the
    /// dispatch ends this request with `500 Internal Server Error` and leaves
    /// the dispatcher usable for the next one.
    pub async fn serve<B>(&self, request: Request<B>) -> Response<ResponseBody>
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let (head, body) = request.into_parts();
        let body = RequestBody::new(body, self.body_limit);

        match AssertUnwindSafe(self.dispatch(head, body)).catch_unwind().await {
            Ok(response) => response,
            Err(payload) => {
                let e = DispatchError::Crashed(panic_message(payload.as_ref()));
                error!(cause = %e, "dispatch panicked");
                (self.error_sink)(&e);
                error_response(e.status())
            }
        }
    }

    async fn dispatch(&self, head: Parts, body: RequestBody) -> Response<ResponseBody> {
        let path = head.uri.path();

        let (mut resource, vars) = match self.router.at(path) {
            Some(matched) => {
                trace!(path, pattern = matched.pattern(), "route matched");
                (matched.create(), matched.into_vars())
            }
            None => match &self.fallback {
                Some(fallback) => {
                    trace!(path, "no route matched, using fallback");
                    (fallback(), PathVars::empty())
                }
                None => {
                    debug!(path, "no route matched");
                    return error_response(StatusCode::NOT_FOUND);
                }
            },
        };

        let mut exchange = Exchange::new(RequestContext::new(&head, vars), body, &self.error_sink);

        if let Err(e) = bind_path_vars(resource.as_mut(), exchange.request().path_vars()) {
            exchange.fail(e.into());
            return exchange.into_response();
        }

        let mut chain = resource.interceptors();
        match chain.before(resource.as_mut(), &mut exchange).await {
            Ok(()) => {
                if let Err(e) = invoke(resource.as_mut(), &mut exchange).await {
                    exchange.fail(e);
                }
            }
            Err(e) => exchange.fail(e.into()),
        }
        chain.after(resource.as_mut(), &mut exchange).await;

        exchange.into_response()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("router", &self.router)
            .field("fallback", &self.fallback.is_some())
            .field("body_limit", &self.body_limit)
            .finish_non_exhaustive()
    }
}

/// Runs the verb, turning every way it can end early into a [`DispatchError`].
async fn invoke(resource: &mut dyn Resource, exchange: &mut Exchange<'_>) -> Result<(), DispatchError> {
    let method = exchange.request().method().clone();

    match AssertUnwindSafe(invoke_verb(resource, exchange)).catch_unwind().await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(VerbError::NotImplemented)) => Err(DispatchError::MethodNotImplemented(method)),
        Ok(Err(VerbError::Fault(source))) => Err(DispatchError::VerbFault { source }),
        Err(payload) => Err(DispatchError::Panic(panic_message(payload.as_ref()))),
    }
}

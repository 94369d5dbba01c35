use crate::binder::Field;
use crate::error::BoxError;
use crate::interceptor::Interceptors;
use crate::Exchange;
use async_trait::async_trait;
use std::error::Error;
use std::fmt;

/// Outcome of a verb method that did not complete.
pub enum VerbError {
    /// The resource does not handle this verb.
    NotImplemented,
    Fault(BoxError),
}

impl VerbError {
    pub fn fault<E: Into<BoxError>>(e: E) -> Self {
        Self::Fault(e.into())
    }
}

/// Lets verbs use `?` on any error type.
impl<E> From<E> for VerbError
where
    E: Error + Send + Sync + 'static,
{
    fn from(e: E) -> Self {
        Self::Fault(Box::new(e))
    }
}

impl fmt::Debug for VerbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotImplemented => f.write_str("NotImplemented"),
            Self::Fault(e) => f.debug_tuple("Fault").field(e).finish(),
        }
    }
}

impl fmt::Display for VerbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotImplemented => f.write_str("verb not implemented"),
            Self::Fault(e) => fmt::Display::fmt(e, f),
        }
    }
}

pub type VerbResult = Result<(), VerbError>;

/// A handler object, created fresh for every request by its route's factory.
///
/// A resource declares its bindable fields through [`fields`](Resource::fields),
/// the interceptors wrapping its verbs through
/// [`interceptors`](Resource::interceptors), and implements one method per verb
/// it supports. Verbs left at their default answer `405 Method Not Allowed`.
#[async_trait]
pub trait Resource: Send + 'static {
    /// The field descriptor table, see [`binder`](crate::binder).
    fn fields(&mut self) -> Vec<Field<'_>> {
        Vec::new()
    }

    /// The chain wrapping the verb of this request, in entry order.
    fn interceptors(&self) -> Interceptors {
        Interceptors::empty()
    }

    async fn get(&mut self, _exchange: &mut Exchange<'_>) -> VerbResult {
        Err(VerbError::NotImplemented)
    }

    async fn post(&mut self, _exchange: &mut Exchange<'_>) -> VerbResult {
        Err(VerbError::NotImplemented)
    }

    async fn put(&mut self, _exchange: &mut Exchange<'_>) -> VerbResult {
        Err(VerbError::NotImplemented)
    }

    async fn delete(&mut self, _exchange: &mut Exchange<'_>) -> VerbResult {
        Err(VerbError::NotImplemented)
    }

    async fn patch(&mut self, _exchange: &mut Exchange<'_>) -> VerbResult {
        Err(VerbError::NotImplemented)
    }

    async fn head(&mut self, _exchange: &mut Exchange<'_>) -> VerbResult {
        Err(VerbError::NotImplemented)
    }

    async fn options(&mut self, _exchange: &mut Exchange<'_>) -> VerbResult {
        Err(VerbError::NotImplemented)
    }
}

/// Calls the verb method matching the request method.
pub(crate) async fn invoke_verb(resource: &mut dyn Resource, exchange: &mut Exchange<'_>) -> VerbResult {
    let method = exchange.request().method().clone();
    match method.as_str() {
        "GET" => resource.get(exchange).await,
        "POST" => resource.post(exchange).await,
        "PUT" => resource.put(exchange).await,
        "DELETE" => resource.delete(exchange).await,
        "PATCH" => resource.patch(exchange).await,
        "HEAD" => resource.head(exchange).await,
        "OPTIONS" => resource.options(exchange).await,
        _ => Err(VerbError::NotImplemented),
    }
}

/// A factory for resources, the value stored by each route.
pub type ResourceFactory = Box<dyn Fn() -> Box<dyn Resource> + Send + Sync>;

/// A factory creating `R::default()` for each request.
///
/// # Example
/// ```
/// use micro_dispatch::{resource, Resource, Router};
///
/// #[derive(Default)]
/// struct Health;
/// impl Resource for Health {}
///
/// let router = Router::builder().route("/health", resource::<Health>()).build().unwrap();
/// assert!(router.at("/health").is_some());
/// ```
pub fn resource<R: Resource + Default>() -> impl Fn() -> R + Send + Sync + 'static {
    R::default
}

pub(crate) fn boxed_factory<F, R>(factory: F) -> ResourceFactory
where
    F: Fn() -> R + Send + Sync + 'static,
    R: Resource,
{
    Box::new(move || Box::new(factory()))
}

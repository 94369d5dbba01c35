//! Interceptor chains wrapped around a resource's verb.
//!
//! For a chain `I1 .. In` one dispatch runs:
//!
//! 1. `I1.before .. In.before`, in order, stopping at the first error
//! 2. the verb, only if every `before` succeeded
//! 3. `after` of every interceptor whose `before` ran, in reverse order
//!
//! So the interceptor entered first always exits last, even when a `before`
//! fails or panics, the verb is missing, or the verb faults.

mod json;
mod timing;

pub use json::JsonCodec;
pub use timing::TimingInterceptor;

use crate::error::{InterceptError, panic_message};
use crate::{Exchange, Resource};
use async_trait::async_trait;
use futures::FutureExt;
use std::fmt;
use std::panic::AssertUnwindSafe;

/// A before/after wrapper around verb execution.
///
/// Instances are created per request, so they may keep request-local state
/// between `before` and `after`.
#[async_trait]
pub trait Interceptor: Send {
    /// Runs before the verb. An error stops the chain and skips the verb.
    async fn before(&mut self, _resource: &mut dyn Resource, _exchange: &mut Exchange<'_>) -> Result<(), InterceptError> {
        Ok(())
    }

    /// Runs after the verb, or after a failure, if `before` was called.
    ///
    /// Errors found here are recorded with [`Exchange::fail`] or
    /// [`Exchange::report`].
    async fn after(&mut self, _resource: &mut dyn Resource, _exchange: &mut Exchange<'_>) {}
}

/// An ordered chain of interceptors for one request.
pub struct Interceptors {
    inner: Vec<Box<dyn Interceptor>>,
    entered: usize,
}

impl Interceptors {
    pub fn builder() -> InterceptorsBuilder {
        InterceptorsBuilder::new()
    }

    pub fn empty() -> Self {
        Self { inner: Vec::new(), entered: 0 }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Runs the before phase, stopping at the first failing interceptor.
    ///
    /// The failing interceptor counts as entered: its `after` still runs.
    pub(crate) async fn before(
        &mut self,
        resource: &mut dyn Resource,
        exchange: &mut Exchange<'_>,
    ) -> Result<(), InterceptError> {
        while self.entered < self.inner.len() {
            let interceptor = &mut self.inner[self.entered];
            self.entered += 1;
            match AssertUnwindSafe(interceptor.before(resource, exchange)).catch_unwind().await {
                Ok(result) => result?,
                Err(payload) => return Err(InterceptError::Panic(panic_message(payload.as_ref()))),
            }
        }
        Ok(())
    }

    /// Runs the after phase for entered interceptors, last entered first.
    ///
    /// A panicking `after` fails the exchange; the interceptors entered
    /// before it still run.
    pub(crate) async fn after(mut self, resource: &mut dyn Resource, exchange: &mut Exchange<'_>) {
        self.inner.truncate(self.entered);
        for interceptor in self.inner.iter_mut().rev() {
            if let Err(payload) = AssertUnwindSafe(interceptor.after(resource, exchange)).catch_unwind().await {
                exchange.fail(InterceptError::Panic(panic_message(payload.as_ref())).into());
            }
        }
    }
}

impl fmt::Debug for Interceptors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptors").field("len", &self.inner.len()).field("entered", &self.entered).finish()
    }
}

pub struct InterceptorsBuilder {
    inner: Vec<Box<dyn Interceptor>>,
}

impl InterceptorsBuilder {
    fn new() -> Self {
        Self { inner: vec![] }
    }

    /// Appends `interceptor`; it is entered after every interceptor already added.
    pub fn add_last<I: Interceptor + 'static>(mut self, interceptor: I) -> Self {
        self.inner.push(Box::new(interceptor));
        self
    }

    /// Prepends `interceptor`; it is entered before every interceptor already added.
    pub fn add_first<I: Interceptor + 'static>(mut self, interceptor: I) -> Self {
        self.inner.insert(0, Box::new(interceptor));
        self
    }

    pub fn build(self) -> Interceptors {
        Interceptors { inner: self.inner, entered: 0 }
    }
}

impl fmt::Debug for InterceptorsBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorsBuilder").field("len", &self.inner.len()).finish()
    }
}

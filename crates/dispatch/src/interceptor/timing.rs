use crate::error::InterceptError;
use crate::interceptor::Interceptor;
use crate::{Exchange, Resource};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

/// Logs how long the wrapped part of the chain took, together with the final status.
///
/// Put it first in the chain to time the whole dispatch.
#[derive(Debug, Default)]
pub struct TimingInterceptor {
    started: Option<Instant>,
    elapsed: Option<Duration>,
}

impl TimingInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// The measured duration, once `after` has run.
    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed
    }
}

#[async_trait]
impl Interceptor for TimingInterceptor {
    async fn before(&mut self, _resource: &mut dyn Resource, _exchange: &mut Exchange<'_>) -> Result<(), InterceptError> {
        self.started = Some(Instant::now());
        Ok(())
    }

    async fn after(&mut self, _resource: &mut dyn Resource, exchange: &mut Exchange<'_>) {
        let Some(started) = self.started.take() else {
            return;
        };

        let elapsed = started.elapsed();
        self.elapsed = Some(elapsed);

        let request = exchange.request();
        info!(
            method = %request.method(),
            path = request.uri().path(),
            status = exchange.status().as_u16(),
            elapsed = ?elapsed,
            "request finished"
        );
    }
}

use crate::binder::BindError;
use crate::body::BodyError;
use http::{Method, StatusCode};
use std::any::Any;
use std::error::Error;
use thiserror::Error;

pub type BoxError = Box<dyn Error + Send + Sync>;

/// A failure returned from [`Interceptor::before`](crate::interceptor::Interceptor::before).
///
/// The first one returned stops the before phase of the chain.
#[derive(Error, Debug)]
pub enum InterceptError {
    #[error("failed to decode request field '{field}': {source}")]
    Decode { field: &'static str, source: serde_json::Error },

    #[error(transparent)]
    Body(#[from] BodyError),

    #[error("request rejected with {status}: {reason}")]
    Rejected { status: StatusCode, reason: String },

    #[error("interceptor failed: {source}")]
    Other { source: BoxError },

    #[error("interceptor panicked: {0}")]
    Panic(String),
}

impl InterceptError {
    /// Refuses the request with `status`, e.g. `401 Unauthorized` from an auth check.
    pub fn rejected<S: ToString>(status: StatusCode, reason: S) -> Self {
        Self::Rejected { status, reason: reason.to_string() }
    }

    pub fn other<E: Into<BoxError>>(e: E) -> Self {
        Self::Other { source: e.into() }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Decode { .. } => StatusCode::BAD_REQUEST,
            Self::Body(BodyError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Body(_) => StatusCode::BAD_REQUEST,
            Self::Rejected { status, .. } => *status,
            Self::Other { .. } | Self::Panic(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Every failure the dispatcher can end a request with.
///
/// Values of this type are what the configured error sink receives.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error(transparent)]
    Bind(#[from] BindError),

    #[error(transparent)]
    Intercept(#[from] InterceptError),

    #[error("method {0} is not implemented")]
    MethodNotImplemented(Method),

    #[error("failed to encode response field '{field}': {source}")]
    Encode { field: &'static str, source: serde_json::Error },

    #[error("verb handler failed: {source}")]
    VerbFault { source: BoxError },

    #[error("verb handler panicked: {0}")]
    Panic(String),

    /// A panic outside the verb and the interceptor chain, e.g. in a route factory.
    #[error("dispatch panicked: {0}")]
    Crashed(String),
}

impl DispatchError {
    /// The status written to the client for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Bind(_) => StatusCode::BAD_REQUEST,
            Self::Intercept(e) => e.status(),
            Self::MethodNotImplemented(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::Encode { .. } | Self::VerbFault { .. } | Self::Panic(_) | Self::Crashed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether this failure goes to the error sink. Expected per-request
    /// conditions do not.
    pub fn is_reported(&self) -> bool {
        !matches!(self, Self::MethodNotImplemented(_))
    }
}

/// Renders a panic payload caught with `catch_unwind`.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

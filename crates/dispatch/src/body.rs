use crate::error::BoxError;
use bytes::Bytes;
use http_body::Body as HttpBody;
use http_body::{Frame, SizeHint};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use std::convert::Infallible;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;

/// Default upper bound for a buffered request body: 2 MiB.
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum BodyError {
    #[error("request body exceeds the limit of {limit} bytes")]
    TooLarge { limit: usize },

    #[error("failed to read request body: {source}")]
    Read { source: BoxError },

    #[error("request body is unavailable after a failed read")]
    Unavailable,
}

/// The request body, read lazily and buffered on first access.
///
/// Several interceptors may ask for the bytes; only the first call reads from
/// the transport.
pub struct RequestBody {
    state: State,
    limit: usize,
}

enum State {
    /// Not read yet, already wrapped in the size limit.
    Pending(UnsyncBoxBody<Bytes, BoxError>),
    Buffered(Bytes),
    Failed,
}

impl RequestBody {
    pub(crate) fn new<B>(body: B, limit: usize) -> Self
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        Self { state: State::Pending(Limited::new(body, limit).boxed_unsync()), limit }
    }

    pub fn empty() -> Self {
        Self { state: State::Buffered(Bytes::new()), limit: DEFAULT_BODY_LIMIT }
    }

    /// Returns the whole body, reading it from the transport if needed.
    pub async fn bytes(&mut self) -> Result<Bytes, BodyError> {
        let body = match std::mem::replace(&mut self.state, State::Failed) {
            State::Buffered(bytes) => {
                self.state = State::Buffered(bytes.clone());
                return Ok(bytes);
            }
            State::Failed => return Err(BodyError::Unavailable),
            State::Pending(body) => body,
        };

        let collected = body.collect().await.map_err(|e| {
            if e.is::<LengthLimitError>() {
                BodyError::TooLarge { limit: self.limit }
            } else {
                BodyError::Read { source: e }
            }
        })?;

        let bytes = collected.to_bytes();
        self.state = State::Buffered(bytes.clone());
        Ok(bytes)
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            State::Pending(_) => "pending",
            State::Buffered(_) => "buffered",
            State::Failed => "failed",
        };
        f.debug_struct("RequestBody").field("state", &state).field("limit", &self.limit).finish()
    }
}

/// The body of a response produced by the dispatcher.
#[derive(Debug)]
pub struct ResponseBody {
    inner: Option<Bytes>,
}

impl ResponseBody {
    pub fn empty() -> Self {
        Self { inner: None }
    }

    pub fn once(bytes: Bytes) -> Self {
        if bytes.is_empty() { Self::empty() } else { Self { inner: Some(bytes) } }
    }
}

impl From<Bytes> for ResponseBody {
    fn from(bytes: Bytes) -> Self {
        Self::once(bytes)
    }
}

impl From<String> for ResponseBody {
    fn from(value: String) -> Self {
        Self::once(Bytes::from(value))
    }
}

impl From<&'static str> for ResponseBody {
    fn from(value: &'static str) -> Self {
        Self::once(Bytes::from_static(value.as_bytes()))
    }
}

impl HttpBody for ResponseBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        Poll::Ready(self.get_mut().inner.take().map(|bytes| Ok(Frame::data(bytes))))
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_none()
    }

    fn size_hint(&self) -> SizeHint {
        match &self.inner {
            None => SizeHint::with_exact(0),
            Some(bytes) => SizeHint::with_exact(bytes.len() as u64),
        }
    }
}

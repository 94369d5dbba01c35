use crate::body::{BodyError, RequestBody, ResponseBody};
use crate::dispatcher::ErrorSink;
use crate::error::DispatchError;
use crate::RequestContext;
use bytes::{Bytes, BytesMut};
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Response, StatusCode};
use std::fmt;
use tracing::{debug, error, warn};

/// Per-request state shared by the interceptors and the verb of one dispatch.
///
/// It gives access to the request head, the bound path variables, the request
/// body, and the response under construction. Once a terminal failure is
/// recorded, the response is replaced by an error response for that failure.
pub struct Exchange<'a> {
    request: RequestContext<'a>,
    body: RequestBody,
    status: StatusCode,
    headers: HeaderMap,
    payload: BytesMut,
    failure: Option<DispatchError>,
    sink: &'a ErrorSink,
}

impl<'a> Exchange<'a> {
    pub(crate) fn new(request: RequestContext<'a>, body: RequestBody, sink: &'a ErrorSink) -> Self {
        Self {
            request,
            body,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            payload: BytesMut::new(),
            failure: None,
            sink,
        }
    }

    pub fn request(&self) -> &RequestContext<'a> {
        &self.request
    }

    /// Reads and buffers the whole request body.
    pub async fn body_bytes(&mut self) -> Result<Bytes, BodyError> {
        self.body.bytes().await
    }

    /// The status the response will carry, taking a recorded failure into account.
    pub fn status(&self) -> StatusCode {
        self.failure.as_ref().map_or(self.status, DispatchError::status)
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Appends `data` to the response body.
    pub fn write(&mut self, data: &[u8]) {
        self.payload.extend_from_slice(data);
    }

    /// The terminal failure of this dispatch, if any.
    pub fn failure(&self) -> Option<&DispatchError> {
        self.failure.as_ref()
    }

    /// Hands `error` to the configured error sink without changing the response.
    pub fn report(&self, error: &DispatchError) {
        (self.sink)(error);
    }

    /// Records `error` as the terminal failure of this dispatch.
    ///
    /// Reportable errors go to the error sink. The first recorded failure
    /// decides the response status. The body written so far is dropped, headers
    /// other than the content headers are kept.
    pub fn fail(&mut self, error: DispatchError) {
        let status = error.status();
        if status.is_server_error() {
            error!(cause = %error, %status, "dispatch failed");
        } else if error.is_reported() {
            warn!(cause = %error, %status, "request failed");
        } else {
            debug!(cause = %error, %status, "request not handled");
        }

        if error.is_reported() {
            self.report(&error);
        }
        if self.failure.is_none() {
            self.failure = Some(error);
        }
    }

    pub(crate) fn into_response(self) -> Response<ResponseBody> {
        match self.failure {
            Some(failure) => {
                let mut response = error_response(failure.status());
                for (name, value) in &self.headers {
                    if *name != CONTENT_TYPE && *name != CONTENT_LENGTH {
                        response.headers_mut().append(name, value.clone());
                    }
                }
                response
            }
            None => {
                let mut response = Response::new(ResponseBody::once(self.payload.freeze()));
                *response.status_mut() = self.status;
                *response.headers_mut() = self.headers;
                response
            }
        }
    }
}

impl fmt::Debug for Exchange<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exchange")
            .field("request", &self.request)
            .field("status", &self.status)
            .field("failure", &self.failure)
            .finish_non_exhaustive()
    }
}

/// A plain text response carrying only the canonical reason of `status`.
pub(crate) fn error_response(status: StatusCode) -> Response<ResponseBody> {
    let reason = status.canonical_reason().unwrap_or("Unknown Error");
    let mut response = Response::new(ResponseBody::from(reason));
    *response.status_mut() = status;
    response.headers_mut().insert(CONTENT_TYPE, mime_header(&mime::TEXT_PLAIN_UTF_8));
    response
}

pub(crate) fn mime_header(mime: &mime::Mime) -> HeaderValue {
    // mime renders to visible ASCII only
    HeaderValue::from_str(mime.as_ref()).unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"))
}

#![allow(dead_code, reason = "every test binary uses its own subset of the helpers")]

use bytes::Bytes;
use http::{Method, Request, Response};
use http_body_util::{BodyExt, Empty, Full};
use micro_dispatch::{DispatchError, Dispatcher, DispatcherBuilder, ResponseBody};
use std::sync::{Arc, Mutex};

/// Everything the error sink received, rendered with `Display`.
pub type Reported = Arc<Mutex<Vec<String>>>;

pub fn with_recording_sink(builder: DispatcherBuilder) -> (Dispatcher, Reported) {
    let reported = Reported::default();
    let log = Arc::clone(&reported);
    let dispatcher =
        builder.error_sink(move |e: &DispatchError| log.lock().unwrap().push(e.to_string())).build().unwrap();
    (dispatcher, reported)
}

pub fn empty(method: Method, uri: &str) -> Request<Empty<Bytes>> {
    Request::builder().method(method).uri(uri).body(Empty::new()).unwrap()
}

pub fn with_body(method: Method, uri: &str, body: &'static str) -> Request<Full<Bytes>> {
    Request::builder().method(method).uri(uri).body(Full::new(Bytes::from_static(body.as_bytes()))).unwrap()
}

pub async fn text(response: Response<ResponseBody>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

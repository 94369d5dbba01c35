//! Dispatches a few in-memory requests and prints the responses.
//!
//! Logs at debug level, so route registration and dispatch failures show up too.

use async_trait::async_trait;
use bytes::Bytes;
use http::{Method, Request};
use http_body_util::{BodyExt, Full};
use micro_dispatch::binder::Field;
use micro_dispatch::{
    DispatchError, Dispatcher, Exchange, Interceptors, JsonCodec, Methods, Resource, Router, TimingInterceptor,
    VerbResult, resource,
};
use serde::{Deserialize, Serialize};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Default)]
struct Hello {
    name: String,
}

#[async_trait]
impl Resource for Hello {
    fn fields(&mut self) -> Vec<Field<'_>> {
        vec![Field::path("name", "name", &mut self.name)]
    }

    fn interceptors(&self) -> Interceptors {
        Interceptors::builder().add_first(TimingInterceptor::new()).build()
    }

    async fn get(&mut self, exchange: &mut Exchange<'_>) -> VerbResult {
        exchange.write(format!("hello {}\r\n", self.name).as_bytes());
        Ok(())
    }
}

#[derive(Deserialize, Default)]
struct Greeting {
    to: String,
}

#[derive(Serialize, Default)]
struct Reply {
    message: String,
    length: usize,
}

#[derive(Default)]
struct Greeter {
    greeting: Greeting,
    reply: Reply,
}

#[async_trait]
impl Resource for Greeter {
    fn fields(&mut self) -> Vec<Field<'_>> {
        vec![
            Field::request("greeting", Methods::POST, &mut self.greeting),
            Field::response("reply", Methods::POST, &self.reply),
        ]
    }

    fn interceptors(&self) -> Interceptors {
        Interceptors::builder().add_last(TimingInterceptor::new()).add_last(JsonCodec).build()
    }

    async fn post(&mut self, _exchange: &mut Exchange<'_>) -> VerbResult {
        let message = format!("greetings, {}", self.greeting.to);
        self.reply = Reply { length: message.len(), message };
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let router = Router::builder()
        .route("/hello/{name}", resource::<Hello>())
        .route("/greet", resource::<Greeter>())
        .build()
        .expect("routes are valid");

    let dispatcher = Dispatcher::builder()
        .router(router)
        .error_sink(|e: &DispatchError| error!(cause = %e, "reported"))
        .build()
        .expect("router is set");

    let requests = [
        (Method::GET, "/hello/world", ""),
        (Method::POST, "/greet", r#"{"to":"everyone"}"#),
        (Method::POST, "/greet", r#"{"to":1}"#),
        (Method::DELETE, "/hello/world", ""),
        (Method::GET, "/nowhere", ""),
    ];

    for (method, uri, body) in requests {
        let request = Request::builder()
            .method(method.clone())
            .uri(uri)
            .body(Full::new(Bytes::from_static(body.as_bytes())))
            .expect("request is valid");

        let response = dispatcher.serve(request).await;
        let status = response.status();
        let body = response.into_body().collect().await.expect("response body is infallible").to_bytes();
        info!(%method, uri, %status, body = %String::from_utf8_lossy(&body), "served");
    }
}

//! The request dispatch core of a micro web framework.
//!
//! A request travels through the crate like this:
//!
//! 1. the [`Router`] resolves its path to the first registered pattern that
//!    matches, capturing the `{variables}` of the pattern
//! 2. the route's factory creates a fresh [`Resource`] for the request
//! 3. the [`binder`] assigns the captured variables to the resource's path fields
//! 4. the resource's [`Interceptors`] run their before phase
//! 5. the verb method matching the request method runs
//! 6. the interceptors run their after phase, in reverse order
//! 7. the [`Exchange`] is turned into the response
//!
//! Every failure along the way becomes an error response with a status
//! derived from [`DispatchError::status`], and unexpected ones are handed to
//! the error sink configured on the [`Dispatcher`].
//!
//! # Example
//!
//! ```
//! use async_trait::async_trait;
//! use http::{Request, StatusCode};
//! use http_body_util::{BodyExt, Empty};
//! use bytes::Bytes;
//! use micro_dispatch::binder::Field;
//! use micro_dispatch::{Dispatcher, Exchange, Resource, Router, VerbResult, resource};
//!
//! #[derive(Default)]
//! struct Hello {
//!     name: String,
//! }
//!
//! #[async_trait]
//! impl Resource for Hello {
//!     fn fields(&mut self) -> Vec<Field<'_>> {
//!         vec![Field::path("name", "name", &mut self.name)]
//!     }
//!
//!     async fn get(&mut self, exchange: &mut Exchange<'_>) -> VerbResult {
//!         exchange.write(format!("hello {}", self.name).as_bytes());
//!         Ok(())
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let router = Router::builder().route("/hello/{name}", resource::<Hello>()).build().unwrap();
//! let dispatcher = Dispatcher::builder().router(router).build().unwrap();
//!
//! let request = Request::get("/hello/world").body(Empty::<Bytes>::new()).unwrap();
//! let response = dispatcher.serve(request).await;
//!
//! assert_eq!(response.status(), StatusCode::OK);
//! assert_eq!(response.into_body().collect().await.unwrap().to_bytes(), "hello world");
//! # }
//! ```

mod body;
mod dispatcher;
mod error;
mod exchange;
mod methods;
mod request;
mod resource;

pub mod binder;
pub mod interceptor;
pub mod pattern;
pub mod router;

pub use binder::BindError;
pub use binder::Field;
pub use body::BodyError;
pub use body::DEFAULT_BODY_LIMIT;
pub use body::RequestBody;
pub use body::ResponseBody;
pub use dispatcher::BuildError;
pub use dispatcher::Dispatcher;
pub use dispatcher::DispatcherBuilder;
pub use dispatcher::ErrorSink;
pub use error::BoxError;
pub use error::DispatchError;
pub use error::InterceptError;
pub use exchange::Exchange;
pub use interceptor::Interceptor;
pub use interceptor::Interceptors;
pub use interceptor::JsonCodec;
pub use interceptor::TimingInterceptor;
pub use methods::Methods;
pub use methods::ParseMethodsError;
pub use request::PathVars;
pub use request::RequestContext;
pub use resource::Resource;
pub use resource::ResourceFactory;
pub use resource::VerbError;
pub use resource::VerbResult;
pub use resource::resource;
pub use router::RouteError;
pub use router::RouteMatch;
pub use router::Router;

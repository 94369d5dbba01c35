//! Declarative field binding for resources.
//!
//! A resource lists its bindable fields through [`Resource::fields`], one
//! [`Field`] descriptor per field:
//!
//! - [`Field::path`] binds a path variable, converted to the field's type
//! - [`Field::request`] marks a field decoded from the request body for some verbs
//! - [`Field::response`] marks a field encoded into the response body for some verbs
//!
//! Path binding happens here, in [`bind_path_vars`]. Payload fields are only
//! described; a codec interceptor such as [`JsonCodec`](crate::interceptor::JsonCodec)
//! asks [`payload_fields`] which ones apply and does the decoding or encoding.
//!
//! # Example
//! ```
//! use micro_dispatch::binder::Field;
//! use micro_dispatch::{Methods, Resource};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Deserialize, Default)]
//! struct NewComment {
//!     text: String,
//! }
//!
//! #[derive(Serialize, Default)]
//! struct Comment {
//!     id: u64,
//!     text: String,
//! }
//!
//! #[derive(Default)]
//! struct CommentResource {
//!     post_id: u64,
//!     input: NewComment,
//!     output: Comment,
//! }
//!
//! impl Resource for CommentResource {
//!     fn fields(&mut self) -> Vec<Field<'_>> {
//!         vec![
//!             Field::path("post_id", "post", &mut self.post_id),
//!             Field::request("input", Methods::POST, &mut self.input),
//!             Field::response("output", Methods::GET | Methods::POST, &self.output),
//!         ]
//!     }
//! }
//! ```

use crate::error::BoxError;
use crate::{Methods, PathVars, Resource};
use http::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use thiserror::Error;

/// A path variable could not be converted to the type of its field.
#[derive(Error, Debug)]
#[error("cannot bind '{value}' to field '{field}': {source}")]
pub struct BindError {
    field: &'static str,
    value: String,
    source: BoxError,
}

impl BindError {
    pub fn new<V: ToString, E: Into<BoxError>>(field: &'static str, value: V, source: E) -> Self {
        Self { field, value: value.to_string(), source: source.into() }
    }

    /// Name of the field that failed to bind
    pub fn field(&self) -> &'static str {
        self.field
    }

    /// The raw path segment that could not be converted
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// A field that can receive a raw path segment.
pub trait PathValue: Send {
    fn assign(&mut self, raw: &str) -> Result<(), BoxError>;
}

/// impl [`PathValue`] for the `FromStr` types a path segment can hold
macro_rules! impl_path_value ({ $($ty:ty)* } => {
    $(
    impl PathValue for $ty {
        #[inline]
        fn assign(&mut self, raw: &str) -> Result<(), BoxError> {
            *self = raw.parse::<$ty>()?;
            Ok(())
        }
    }
    )*
});

impl_path_value! { String bool char }
impl_path_value! { i8 i16 i32 i64 i128 isize }
impl_path_value! { u8 u16 u32 u64 u128 usize }
impl_path_value! { f32 f64 }

impl<T: PathValue + Default> PathValue for Option<T> {
    fn assign(&mut self, raw: &str) -> Result<(), BoxError> {
        let mut value = T::default();
        value.assign(raw)?;
        *self = Some(value);
        Ok(())
    }
}

/// A field that can be filled from a JSON request body.
pub trait DecodeSlot: Send {
    fn decode_json(&mut self, body: &[u8]) -> Result<(), serde_json::Error>;
}

impl<T: DeserializeOwned + Send> DecodeSlot for T {
    fn decode_json(&mut self, body: &[u8]) -> Result<(), serde_json::Error> {
        *self = serde_json::from_slice(body)?;
        Ok(())
    }
}

/// A field that can be written as a JSON response body.
pub trait EncodeSlot: Sync {
    fn encode_json(&self) -> Result<Vec<u8>, serde_json::Error>;
}

impl<T: Serialize + Sync> EncodeSlot for T {
    fn encode_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Which body a payload field belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Request,
    Response,
}

/// One entry of a resource's field descriptor table.
pub struct Field<'a> {
    name: &'static str,
    kind: Kind<'a>,
}

enum Kind<'a> {
    Path { var: &'static str, slot: &'a mut dyn PathValue },
    Request { methods: Methods, slot: &'a mut dyn DecodeSlot },
    Response { methods: Methods, slot: &'a dyn EncodeSlot },
}

impl<'a> Field<'a> {
    /// `name` receives the path variable `var`.
    pub fn path(name: &'static str, var: &'static str, slot: &'a mut dyn PathValue) -> Self {
        Self { name, kind: Kind::Path { var, slot } }
    }

    /// `name` is decoded from the request body for `methods`.
    pub fn request(name: &'static str, methods: Methods, slot: &'a mut dyn DecodeSlot) -> Self {
        Self { name, kind: Kind::Request { methods, slot } }
    }

    /// `name` is encoded into the response body for `methods`.
    pub fn response(name: &'static str, methods: Methods, slot: &'a dyn EncodeSlot) -> Self {
        Self { name, kind: Kind::Response { methods, slot } }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The path variable this field is bound to, if it is a path field.
    pub fn path_var(&self) -> Option<&'static str> {
        match &self.kind {
            Kind::Path { var, .. } => Some(*var),
            _ => None,
        }
    }

    /// Returns true if this is a payload field for `direction` tagged with `method`.
    pub fn applies_to(&self, method: &Method, direction: Direction) -> bool {
        match (&self.kind, direction) {
            (Kind::Request { methods, .. }, Direction::Request) => methods.contains(method),
            (Kind::Response { methods, .. }, Direction::Response) => methods.contains(method),
            _ => false,
        }
    }

    /// Decodes `body` into a request field. Other fields are left untouched.
    pub fn decode_json(&mut self, body: &[u8]) -> Result<(), serde_json::Error> {
        match &mut self.kind {
            Kind::Request { slot, .. } => (**slot).decode_json(body),
            _ => Ok(()),
        }
    }

    /// Encodes a response field, `None` for every other kind of field.
    pub fn encode_json(&self) -> Option<Result<Vec<u8>, serde_json::Error>> {
        match &self.kind {
            Kind::Response { slot, .. } => Some((**slot).encode_json()),
            _ => None,
        }
    }
}

impl fmt::Debug for Field<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Field");
        out.field("name", &self.name);
        match &self.kind {
            Kind::Path { var, .. } => out.field("path", var),
            Kind::Request { methods, .. } => out.field("request", methods),
            Kind::Response { methods, .. } => out.field("response", methods),
        };
        out.finish()
    }
}

/// Assigns the path variables of the matched route to the resource's path fields.
///
/// A field whose variable is absent keeps its current value.
pub fn bind_path_vars(resource: &mut dyn Resource, vars: &PathVars<'_>) -> Result<(), BindError> {
    for field in resource.fields() {
        let Kind::Path { var, slot } = field.kind else {
            continue;
        };

        if let Some(raw) = vars.get(var) {
            slot.assign(raw).map_err(|source| BindError::new(field.name, raw, source))?;
        }
    }
    Ok(())
}

/// Returns the resource's payload fields for `direction` that apply to `method`,
/// in declaration order.
pub fn payload_fields<'a>(resource: &'a mut dyn Resource, method: &Method, direction: Direction) -> Vec<Field<'a>> {
    resource.fields().into_iter().filter(|field| field.applies_to(method, direction)).collect()
}

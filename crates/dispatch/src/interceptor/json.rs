use crate::binder::{Direction, payload_fields};
use crate::error::{DispatchError, InterceptError};
use crate::exchange::mime_header;
use crate::interceptor::Interceptor;
use crate::{Exchange, Resource};
use async_trait::async_trait;
use tracing::trace;

/// Decodes request payload fields from a JSON body before the verb runs, and
/// encodes response payload fields as the JSON body after it.
///
/// Fields are picked by their payload tags for the request method. A single
/// response field is written as one JSON document; several response fields
/// are written in declaration order, one document per line. Nothing is
/// encoded once the dispatch has failed.
#[derive(Debug, Default, Copy, Clone)]
pub struct JsonCodec;

#[async_trait]
impl Interceptor for JsonCodec {
    async fn before(&mut self, resource: &mut dyn Resource, exchange: &mut Exchange<'_>) -> Result<(), InterceptError> {
        let method = exchange.request().method().clone();
        if payload_fields(resource, &method, Direction::Request).is_empty() {
            return Ok(());
        }

        let body = exchange.body_bytes().await?;
        for mut field in payload_fields(resource, &method, Direction::Request) {
            trace!(field = field.name(), len = body.len(), "decoding request field");
            field.decode_json(&body).map_err(|source| InterceptError::Decode { field: field.name(), source })?;
        }
        Ok(())
    }

    async fn after(&mut self, resource: &mut dyn Resource, exchange: &mut Exchange<'_>) {
        if exchange.failure().is_some() {
            return;
        }

        let method = exchange.request().method().clone();
        let fields = payload_fields(resource, &method, Direction::Response);
        let separated = fields.len() > 1;

        let mut encoded = Vec::new();
        for field in &fields {
            let Some(result) = field.encode_json() else {
                continue;
            };
            match result {
                Ok(bytes) => {
                    encoded.extend_from_slice(&bytes);
                    if separated {
                        encoded.push(b'\n');
                    }
                }
                Err(source) => {
                    exchange.fail(DispatchError::Encode { field: field.name(), source });
                    return;
                }
            }
        }

        if !fields.is_empty() {
            exchange.headers_mut().insert(http::header::CONTENT_TYPE, mime_header(&mime::APPLICATION_JSON));
            exchange.write(&encoded);
        }
    }
}

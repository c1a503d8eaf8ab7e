use crate::request::{BodyView, InspectBody, Payload};
use http::{HeaderMap, Response, StatusCode};
use std::convert::Infallible;

/// Read-only view of a (possibly partial) response
#[derive(Debug, Clone, Copy)]
pub struct ResponseDescriptor<'a> {
    /// Status code, absent when the call failed before a status was received
    pub status: Option<StatusCode>,
    pub headers: &'a HeaderMap,
    pub body: BodyView<'a>,
}

impl<'a> ResponseDescriptor<'a> {
    #[must_use]
    pub fn from_response<B: InspectBody>(response: &'a Response<B>) -> Self {
        Self {
            status: Some(response.status()),
            headers: response.headers(),
            body: response.body().inspect(),
        }
    }

    /// `Content-Type` header value, if present and valid UTF-8
    ///
    /// `HeaderMap` normalizes names, so the lookup is case-insensitive.
    #[must_use]
    pub fn content_type(&self) -> Option<&'a str> {
        self.headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }
}

/// Non-2xx response surfaced by the HTTP client as an error
#[derive(Debug, Clone, thiserror::Error)]
#[error("HTTP {status}")]
pub struct FailedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Payload,
}

impl FailedResponse {
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Payload::Empty,
        }
    }

    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Payload) -> Self {
        self.body = body;
        self
    }

    #[must_use]
    pub fn descriptor(&self) -> ResponseDescriptor<'_> {
        ResponseDescriptor {
            status: Some(self.status),
            headers: &self.headers,
            body: self.body.inspect(),
        }
    }
}

/// Failure events that may carry a partial response.
///
/// Transport failures return `None`; errors wrapping an HTTP error response
/// expose it so its status, headers and size can still be reported.
pub trait CallFailure {
    fn partial_response(&self) -> Option<ResponseDescriptor<'_>> {
        None
    }
}

impl CallFailure for FailedResponse {
    fn partial_response(&self) -> Option<ResponseDescriptor<'_>> {
        Some(self.descriptor())
    }
}

impl CallFailure for tower::BoxError {
    fn partial_response(&self) -> Option<ResponseDescriptor<'_>> {
        self.downcast_ref::<FailedResponse>()
            .map(FailedResponse::descriptor)
    }
}

impl CallFailure for std::io::Error {}

impl CallFailure for Infallible {}

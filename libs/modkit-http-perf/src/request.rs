use crate::error::PerfError;
use crate::method::HttpMethod;
use bytes::Bytes;
use http::{HeaderMap, Method, Request, Uri};
use serde_json::{Map, Value};

/// Borrowed classification of a request or response body.
///
/// Only `Empty`, `Text`, `Record` and `Sequence` bodies take part in size
/// estimation; `Opaque` bodies (raw bytes, streams) make the estimate unknown.
#[derive(Debug, Clone, Copy)]
pub enum BodyView<'a> {
    Empty,
    Text(&'a str),
    Record(&'a Map<String, Value>),
    Sequence(&'a [Value]),
    Opaque,
}

/// Body types that can describe their content for size estimation
pub trait InspectBody {
    fn inspect(&self) -> BodyView<'_>;
}

impl InspectBody for () {
    fn inspect(&self) -> BodyView<'_> {
        BodyView::Empty
    }
}

impl InspectBody for String {
    fn inspect(&self) -> BodyView<'_> {
        BodyView::Text(self)
    }
}

impl InspectBody for &'static str {
    fn inspect(&self) -> BodyView<'_> {
        BodyView::Text(self)
    }
}

impl InspectBody for Value {
    fn inspect(&self) -> BodyView<'_> {
        match self {
            Value::Null => BodyView::Empty,
            Value::String(text) => BodyView::Text(text),
            Value::Object(map) => BodyView::Record(map),
            Value::Array(items) => BodyView::Sequence(items),
            Value::Bool(_) | Value::Number(_) => BodyView::Opaque,
        }
    }
}

impl InspectBody for Bytes {
    fn inspect(&self) -> BodyView<'_> {
        BodyView::Opaque
    }
}

impl InspectBody for Vec<u8> {
    fn inspect(&self) -> BodyView<'_> {
        BodyView::Opaque
    }
}

impl InspectBody for http_body_util::Empty<Bytes> {
    fn inspect(&self) -> BodyView<'_> {
        BodyView::Empty
    }
}

impl InspectBody for http_body_util::Full<Bytes> {
    fn inspect(&self) -> BodyView<'_> {
        BodyView::Opaque
    }
}

impl<E> InspectBody for http_body_util::combinators::BoxBody<Bytes, E> {
    fn inspect(&self) -> BodyView<'_> {
        BodyView::Opaque
    }
}

impl<E> InspectBody for http_body_util::combinators::UnsyncBoxBody<Bytes, E> {
    fn inspect(&self) -> BodyView<'_> {
        BodyView::Opaque
    }
}

/// Owned body for callers that keep request/response content in memory
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Payload {
    /// No body
    #[default]
    Empty,
    /// Plain text
    Text(String),
    /// Structured JSON content
    Json(Value),
    /// Raw bytes (never estimated)
    Binary(Bytes),
}

impl InspectBody for Payload {
    fn inspect(&self) -> BodyView<'_> {
        match self {
            Payload::Empty => BodyView::Empty,
            Payload::Text(text) => BodyView::Text(text),
            Payload::Json(value) => value.inspect(),
            Payload::Binary(_) => BodyView::Opaque,
        }
    }
}

/// Read-only view of an outgoing request used by size estimators
#[derive(Debug, Clone, Copy)]
pub struct RequestDescriptor<'a> {
    pub method: &'a Method,
    pub uri: &'a Uri,
    pub headers: &'a HeaderMap,
    pub body: BodyView<'a>,
}

impl<'a> RequestDescriptor<'a> {
    #[must_use]
    pub fn from_request<B: InspectBody>(request: &'a Request<B>) -> Self {
        Self {
            method: request.method(),
            uri: request.uri(),
            headers: request.headers(),
            body: request.body().inspect(),
        }
    }

    /// Method as reported to the backend, `None` when not instrumented
    #[must_use]
    pub fn perf_method(&self) -> Option<HttpMethod> {
        HttpMethod::from_http(self.method)
    }

    /// Normalized metric URL, see [`normalize_url`]
    ///
    /// # Errors
    /// Returns [`PerfError::UnreportableUrl`] for URLs without scheme or host.
    pub fn url(&self) -> Result<String, PerfError> {
        normalize_url(self.uri)
    }
}

/// Reduce a request URI to `scheme://host[:port]/path`.
///
/// Query string, fragment and userinfo are dropped so that the metric URL
/// never carries credentials or per-call parameters.
///
/// # Errors
/// Returns [`PerfError::UnreportableUrl`] when the URI is relative.
pub fn normalize_url(uri: &Uri) -> Result<String, PerfError> {
    let unreportable = |reason| PerfError::UnreportableUrl {
        url: uri.to_string(),
        reason,
    };
    let scheme = uri.scheme_str().ok_or_else(|| unreportable("missing scheme"))?;
    let host = uri.host().ok_or_else(|| unreportable("missing host"))?;

    let mut url = format!("{scheme}://{host}");
    if let Some(port) = uri.port_u16() {
        url.push(':');
        url.push_str(&port.to_string());
    }
    url.push_str(uri.path());
    Ok(url)
}

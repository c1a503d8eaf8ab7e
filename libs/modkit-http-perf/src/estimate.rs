//! Best-effort payload size estimation.
//!
//! Sizes are the length of a canonical JSON rendering of the headers and the
//! body, not the number of bytes on the wire: compression, chunked framing,
//! header casing and HTTP/2 header compression are all ignored. Bodies that
//! are not text or structured data yield `None`.

use crate::request::{BodyView, RequestDescriptor};
use crate::response::ResponseDescriptor;
use http::HeaderMap;
use serde::ser::{Error as _, SerializeMap, Serializer};
use serde::Serialize;
use std::io;

/// Estimator for outgoing request payload sizes
pub trait RequestSizeEstimator: Send + Sync {
    fn estimate(&self, request: &RequestDescriptor<'_>) -> Option<u64>;
}

impl<F> RequestSizeEstimator for F
where
    F: Fn(&RequestDescriptor<'_>) -> Option<u64> + Send + Sync,
{
    fn estimate(&self, request: &RequestDescriptor<'_>) -> Option<u64> {
        self(request)
    }
}

/// Estimator for response payload sizes
pub trait ResponseSizeEstimator: Send + Sync {
    fn estimate(&self, response: &ResponseDescriptor<'_>) -> Option<u64>;
}

impl<F> ResponseSizeEstimator for F
where
    F: Fn(&ResponseDescriptor<'_>) -> Option<u64> + Send + Sync,
{
    fn estimate(&self, response: &ResponseDescriptor<'_>) -> Option<u64> {
        self(response)
    }
}

/// Default request estimator: JSON length of headers plus body
#[must_use]
pub fn estimate_request_size(request: &RequestDescriptor<'_>) -> Option<u64> {
    let headers = headers_len(request.headers)?;
    let body = body_len(request.body)?;
    Some(headers.saturating_add(body))
}

/// Default response estimator: JSON length of body plus headers
#[must_use]
pub fn estimate_response_size(response: &ResponseDescriptor<'_>) -> Option<u64> {
    let body = body_len(response.body)?;
    let headers = headers_len(response.headers)?;
    Some(body.saturating_add(headers))
}

fn body_len(body: BodyView<'_>) -> Option<u64> {
    match body {
        BodyView::Empty => Some(0),
        BodyView::Text(text) => json_len(text),
        BodyView::Record(map) => json_len(map),
        BodyView::Sequence(items) => json_len(items),
        BodyView::Opaque => None,
    }
}

fn headers_len(headers: &HeaderMap) -> Option<u64> {
    json_len(&JsonHeaders(headers))
}

fn json_len<T: Serialize + ?Sized>(value: &T) -> Option<u64> {
    let mut counter = ByteCounter(0);
    match serde_json::to_writer(&mut counter, value) {
        Ok(()) => Some(counter.0),
        Err(err) => {
            tracing::trace!(
                target: "modkit_http_perf::estimate",
                error = %err,
                "payload not serializable, size unknown"
            );
            None
        }
    }
}

/// Headers rendered as `{"name": ["value", ...]}`.
struct JsonHeaders<'a>(&'a HeaderMap);

impl Serialize for JsonHeaders<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.keys_len()))?;
        for name in self.0.keys() {
            let values = self
                .0
                .get_all(name)
                .iter()
                .map(|value| value.to_str().map_err(S::Error::custom))
                .collect::<Result<Vec<_>, _>>()?;
            map.serialize_entry(name.as_str(), &values)?;
        }
        map.end()
    }
}

/// `io::Write` sink that only counts bytes
struct ByteCounter(u64);

impl io::Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let len = u64::try_from(buf.len()).unwrap_or(u64::MAX);
        self.0 = self.0.saturating_add(len);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

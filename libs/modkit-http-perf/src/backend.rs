//! Telemetry backend contract.
//!
//! The interceptor only ever creates, starts, annotates and stops metrics;
//! batching and upload belong to the backend behind these traits.

use crate::error::BackendError;
use crate::method::HttpMethod;
use std::time::Instant;

/// Factory for HTTP metrics (the performance SDK entry point)
pub trait PerfBackend: Send + Sync + 'static {
    /// Metric handle type produced by this backend
    type Metric: HttpMetric;

    /// Create a new, not yet started, metric for `url` and `method`
    ///
    /// # Errors
    /// Returns the backend's error when the metric cannot be created.
    fn new_http_metric(&self, url: &str, method: HttpMethod) -> Result<Self::Metric, BackendError>;
}

/// A single in-flight HTTP metric.
///
/// [`HttpMetric::stop`] consumes the handle: a stopped metric cannot be
/// stopped twice or annotated afterwards.
#[allow(clippy::missing_errors_doc)]
pub trait HttpMetric: Send + Sync + 'static {
    fn start(&mut self) -> Result<(), BackendError>;

    fn set_request_payload_size(&mut self, bytes: u64) -> Result<(), BackendError>;

    fn set_response_payload_size(&mut self, bytes: u64) -> Result<(), BackendError>;

    fn set_response_content_type(&mut self, content_type: &str) -> Result<(), BackendError>;

    fn set_http_response_code(&mut self, code: u16) -> Result<(), BackendError>;

    fn stop(self) -> Result<(), BackendError>;
}

/// Backend that records nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBackend;

/// Metric handle of [`NoopBackend`]
#[derive(Debug, Clone, Copy)]
pub struct NoopMetric;

impl PerfBackend for NoopBackend {
    type Metric = NoopMetric;

    fn new_http_metric(
        &self,
        _url: &str,
        _method: HttpMethod,
    ) -> Result<Self::Metric, BackendError> {
        Ok(NoopMetric)
    }
}

impl HttpMetric for NoopMetric {
    fn start(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    fn set_request_payload_size(&mut self, _bytes: u64) -> Result<(), BackendError> {
        Ok(())
    }

    fn set_response_payload_size(&mut self, _bytes: u64) -> Result<(), BackendError> {
        Ok(())
    }

    fn set_response_content_type(&mut self, _content_type: &str) -> Result<(), BackendError> {
        Ok(())
    }

    fn set_http_response_code(&mut self, _code: u16) -> Result<(), BackendError> {
        Ok(())
    }

    fn stop(self) -> Result<(), BackendError> {
        Ok(())
    }
}

/// Logging-based backend (for debugging)
///
/// Emits one `debug` event per stopped metric with all recorded attributes
/// and the elapsed time since `start`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingBackend;

/// Metric handle of [`LoggingBackend`]
#[derive(Debug, Clone)]
pub struct LoggedMetric {
    url: String,
    method: HttpMethod,
    started_at: Option<Instant>,
    request_payload_size: Option<u64>,
    response_payload_size: Option<u64>,
    response_content_type: Option<String>,
    http_response_code: Option<u16>,
}

impl PerfBackend for LoggingBackend {
    type Metric = LoggedMetric;

    fn new_http_metric(&self, url: &str, method: HttpMethod) -> Result<Self::Metric, BackendError> {
        Ok(LoggedMetric {
            url: url.to_owned(),
            method,
            started_at: None,
            request_payload_size: None,
            response_payload_size: None,
            response_content_type: None,
            http_response_code: None,
        })
    }
}

impl HttpMetric for LoggedMetric {
    fn start(&mut self) -> Result<(), BackendError> {
        self.started_at = Some(Instant::now());
        Ok(())
    }

    fn set_request_payload_size(&mut self, bytes: u64) -> Result<(), BackendError> {
        self.request_payload_size = Some(bytes);
        Ok(())
    }

    fn set_response_payload_size(&mut self, bytes: u64) -> Result<(), BackendError> {
        self.response_payload_size = Some(bytes);
        Ok(())
    }

    fn set_response_content_type(&mut self, content_type: &str) -> Result<(), BackendError> {
        self.response_content_type = Some(content_type.to_owned());
        Ok(())
    }

    fn set_http_response_code(&mut self, code: u16) -> Result<(), BackendError> {
        self.http_response_code = Some(code);
        Ok(())
    }

    fn stop(self) -> Result<(), BackendError> {
        let elapsed_ms = self
            .started_at
            .map(|at| u64::try_from(at.elapsed().as_millis()).unwrap_or(u64::MAX));
        tracing::debug!(
            target: "modkit_http_perf::metric",
            url = %self.url,
            method = %self.method,
            elapsed_ms = ?elapsed_ms,
            request_payload_size = ?self.request_payload_size,
            response_payload_size = ?self.response_payload_size,
            response_content_type = ?self.response_content_type,
            http_response_code = ?self.http_response_code,
            "HTTP metric recorded"
        );
        Ok(())
    }
}

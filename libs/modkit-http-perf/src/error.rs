use std::any::Any;
use thiserror::Error;

/// Error type produced by telemetry backends.
///
/// Kept as a boxed trait object so SDK-specific errors survive as
/// [`std::error::Error::source`] of [`PerfError::Backend`].
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// Backend operation that failed, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum BackendOp {
    /// Creating a new HTTP metric
    Create,
    /// Starting the metric timer
    Start,
    /// Setting the request payload size
    RequestPayloadSize,
    /// Setting the response payload size
    ResponsePayloadSize,
    /// Setting the response content type
    ResponseContentType,
    /// Setting the HTTP response code
    ResponseCode,
    /// Stopping the metric
    Stop,
}

impl BackendOp {
    /// Short name used in logs
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BackendOp::Create => "create",
            BackendOp::Start => "start",
            BackendOp::RequestPayloadSize => "set_request_payload_size",
            BackendOp::ResponsePayloadSize => "set_response_payload_size",
            BackendOp::ResponseContentType => "set_response_content_type",
            BackendOp::ResponseCode => "set_http_response_code",
            BackendOp::Stop => "stop",
        }
    }
}

impl std::fmt::Display for BackendOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Instrumentation failures.
///
/// These never reach the caller of the instrumented HTTP call: every hook
/// collapses them into [`HookOutcome::Ignored`](crate::HookOutcome::Ignored).
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PerfError {
    /// The request extensions carry no correlation key
    #[error("correlation key missing from request extensions")]
    MissingKey,

    /// The request URL cannot be turned into a reportable metric URL
    #[error("URL '{url}' cannot be reported: {reason}")]
    UnreportableUrl {
        /// The offending URL
        url: String,
        /// What is missing from it
        reason: &'static str,
    },

    /// A telemetry backend call failed
    #[error("telemetry backend failed to {op}: {source}")]
    Backend {
        /// The failed operation
        op: BackendOp,
        /// The backend's own error
        #[source]
        source: BackendError,
    },

    /// A custom key strategy rejected the request
    #[error("key strategy failed: {0}")]
    KeyStrategy(String),

    /// Pluggable code (estimator, key strategy or backend) panicked inside a hook
    #[error("{hook} panicked: {message}")]
    Panicked {
        /// The hook that caught the panic
        hook: &'static str,
        /// The panic payload, when it is a string
        message: String,
    },
}

impl PerfError {
    pub(crate) fn backend(op: BackendOp) -> impl FnOnce(BackendError) -> Self {
        move |source| PerfError::Backend { op, source }
    }

    pub(crate) fn panicked(hook: &'static str, payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_owned()
        } else {
            "non-string panic payload".to_owned()
        };
        PerfError::Panicked { hook, message }
    }
}

use crate::backend::{HttpMetric, PerfBackend};
use crate::builder::MetricInterceptorBuilder;
use crate::error::{BackendOp, PerfError};
use crate::estimate::{RequestSizeEstimator, ResponseSizeEstimator};
use crate::key::KeyStrategy;
use crate::method::HttpMethod;
use crate::request::{InspectBody, RequestDescriptor, normalize_url};
use crate::response::ResponseDescriptor;
use crate::store::MeasurementStore;
use http::{Extensions, Request};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Why a hook left a call uninstrumented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Instrumentation is turned off in [`PerfConfig`](crate::PerfConfig)
    Disabled,
    /// The request method is outside the reportable set
    UnmappedMethod,
    /// No open metric for this call (never opened, or already closed)
    NotTracked,
}

/// Result of running one hook.
///
/// Hooks never fail from the caller's point of view: instrumentation errors,
/// including panics raised by a backend, key strategy or estimator, are
/// logged and reported here as [`HookOutcome::Ignored`].
#[derive(Debug)]
pub enum HookOutcome {
    /// The hook did its work
    Applied,
    /// The hook intentionally did nothing
    Skipped(SkipReason),
    /// The hook failed and the failure was swallowed
    Ignored(PerfError),
}

impl HookOutcome {
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, HookOutcome::Applied)
    }
}

/// Opens an HTTP metric when a request is sent and closes it exactly once
/// when the call completes.
///
/// The three hooks may run concurrently for any number of calls. Open
/// metrics live in a [`MeasurementStore`] owned by this instance; share the
/// interceptor through `Arc` (as [`PerfLayer`](crate::PerfLayer) does).
///
/// # Lifecycle
///
/// ```text
/// PENDING --on_request--> OPEN --on_response / on_error--> CLOSED
///    \--(setup failed)--> ABANDONED
/// ```
///
/// A call whose future is dropped before either completion hook runs keeps
/// its metric open; [`MetricInterceptor::in_flight`] exposes that count.
pub struct MetricInterceptor<P: PerfBackend> {
    pub(crate) backend: P,
    pub(crate) store: MeasurementStore<P::Metric>,
    pub(crate) keys: Arc<dyn KeyStrategy>,
    pub(crate) request_size: Arc<dyn RequestSizeEstimator>,
    pub(crate) response_size: Arc<dyn ResponseSizeEstimator>,
    pub(crate) enabled: bool,
}

impl<P: PerfBackend> MetricInterceptor<P> {
    /// Create an interceptor with default configuration
    #[must_use]
    pub fn new(backend: P) -> Self {
        MetricInterceptorBuilder::new(backend).build()
    }

    #[must_use]
    pub fn builder(backend: P) -> MetricInterceptorBuilder<P> {
        MetricInterceptorBuilder::new(backend)
    }

    /// Number of metrics opened and not yet closed
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.store.len()
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Pre-send hook: open, start and store a metric for `request`.
    ///
    /// Stamps the correlation key into `request.extensions_mut()`; the same
    /// extensions must be handed to [`on_response`](Self::on_response) or
    /// [`on_error`](Self::on_error) when the call completes.
    pub fn on_request<B: InspectBody>(&self, request: &mut Request<B>) -> HookOutcome {
        if !self.enabled {
            return HookOutcome::Skipped(SkipReason::Disabled);
        }
        settle("on_request", guarded("on_request", || self.open(request)))
    }

    /// Success hook: close the call's metric with the response attributes
    #[allow(clippy::must_use_candidate)]
    pub fn on_response(
        &self,
        extensions: &Extensions,
        response: &ResponseDescriptor<'_>,
    ) -> HookOutcome {
        if !self.enabled {
            return HookOutcome::Skipped(SkipReason::Disabled);
        }
        settle(
            "on_response",
            guarded("on_response", || self.close(extensions, Some(response))),
        )
    }

    /// Failure hook: close the call's metric.
    ///
    /// A partial response (an HTTP error status surfaced as an error) is
    /// reported like a regular response; without one the metric is only
    /// stopped.
    #[allow(clippy::must_use_candidate)]
    pub fn on_error(
        &self,
        extensions: &Extensions,
        partial: Option<&ResponseDescriptor<'_>>,
    ) -> HookOutcome {
        if !self.enabled {
            return HookOutcome::Skipped(SkipReason::Disabled);
        }
        settle(
            "on_error",
            guarded("on_error", || self.close(extensions, partial)),
        )
    }

    fn open<B: InspectBody>(&self, request: &mut Request<B>) -> Result<HookOutcome, PerfError> {
        let Some(method) = HttpMethod::from_http(request.method()) else {
            return Ok(HookOutcome::Skipped(SkipReason::UnmappedMethod));
        };
        let url = normalize_url(request.uri())?;

        let mut metric = self
            .backend
            .new_http_metric(&url, method)
            .map_err(PerfError::backend(BackendOp::Create))?;
        let key = self.keys.stamp(request.extensions_mut())?;
        metric
            .start()
            .map_err(PerfError::backend(BackendOp::Start))?;

        // A started metric is stored even if the size attribute fails, so
        // that the completion hook still stops it.
        let sized = match self
            .request_size
            .estimate(&RequestDescriptor::from_request(request))
        {
            Some(bytes) => metric
                .set_request_payload_size(bytes)
                .map_err(PerfError::backend(BackendOp::RequestPayloadSize)),
            None => Ok(()),
        };

        if self.store.open(key, metric).is_some() {
            tracing::debug!(
                target: "modkit_http_perf",
                %key,
                %url,
                "correlation key collision, dropping the displaced metric"
            );
        }

        sized.map(|()| HookOutcome::Applied)
    }

    fn close(
        &self,
        extensions: &Extensions,
        response: Option<&ResponseDescriptor<'_>>,
    ) -> Result<HookOutcome, PerfError> {
        let key = match self.keys.extract(extensions) {
            Ok(key) => key,
            Err(PerfError::MissingKey) => return Ok(HookOutcome::Skipped(SkipReason::NotTracked)),
            Err(err) => return Err(err),
        };
        let Some(mut metric) = self.store.take(key) else {
            return Ok(HookOutcome::Skipped(SkipReason::NotTracked));
        };

        // The metric is out of the store now; stop it even if an attribute
        // write fails so it is reported exactly once.
        let annotated = response.map_or(Ok(()), |response| self.annotate(&mut metric, response));
        let stopped = metric.stop().map_err(PerfError::backend(BackendOp::Stop));

        annotated.and(stopped).map(|()| HookOutcome::Applied)
    }

    fn annotate(
        &self,
        metric: &mut P::Metric,
        response: &ResponseDescriptor<'_>,
    ) -> Result<(), PerfError> {
        if let Some(bytes) = self.response_size.estimate(response) {
            metric
                .set_response_payload_size(bytes)
                .map_err(PerfError::backend(BackendOp::ResponsePayloadSize))?;
        }
        if let Some(content_type) = response.content_type() {
            metric
                .set_response_content_type(content_type)
                .map_err(PerfError::backend(BackendOp::ResponseContentType))?;
        }
        if let Some(status) = response.status {
            metric
                .set_http_response_code(status.as_u16())
                .map_err(PerfError::backend(BackendOp::ResponseCode))?;
        }
        Ok(())
    }
}

impl<P: PerfBackend> std::fmt::Debug for MetricInterceptor<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricInterceptor")
            .field("enabled", &self.enabled)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

/// Run a hook body, turning a panic from pluggable code into an error.
///
/// A panic in `close` happens after the metric left the store, so nothing
/// stays behind for a later hook; the metric is dropped unstopped.
fn guarded<F>(hook: &'static str, body: F) -> Result<HookOutcome, PerfError>
where
    F: FnOnce() -> Result<HookOutcome, PerfError>,
{
    catch_unwind(AssertUnwindSafe(body))
        .unwrap_or_else(|payload| Err(PerfError::panicked(hook, payload.as_ref())))
}

/// Collapse a hook result into its outcome, logging swallowed failures.
fn settle(hook: &'static str, result: Result<HookOutcome, PerfError>) -> HookOutcome {
    match result {
        Ok(HookOutcome::Skipped(reason)) => {
            tracing::trace!(target: "modkit_http_perf", hook, ?reason, "HTTP metric skipped");
            HookOutcome::Skipped(reason)
        }
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::debug!(
                target: "modkit_http_perf",
                hook,
                error = %err,
                "HTTP metric instrumentation failed, ignoring"
            );
            HookOutcome::Ignored(err)
        }
    }
}

use crate::backend::PerfBackend;
use crate::interceptor::MetricInterceptor;
use crate::request::InspectBody;
use crate::response::{CallFailure, ResponseDescriptor};
use http::{Request, Response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Tower layer that records an HTTP performance metric for every request
///
/// Drives the [`MetricInterceptor`] hooks around the inner service:
/// - `on_request` before the request is handed to the inner service;
/// - `on_response` when the inner service returns a response (any status);
/// - `on_error` when it returns an error, passing the error's partial
///   response if it has one (see [`CallFailure`]).
///
/// Instrumentation never changes the request outcome: the inner service's
/// result is returned untouched.
pub struct PerfLayer<P: PerfBackend> {
    interceptor: Arc<MetricInterceptor<P>>,
}

impl<P: PerfBackend> PerfLayer<P> {
    /// Create a layer sharing `interceptor` across all wrapped services
    #[must_use]
    pub fn new(interceptor: Arc<MetricInterceptor<P>>) -> Self {
        Self { interceptor }
    }

    #[must_use]
    pub fn interceptor(&self) -> &Arc<MetricInterceptor<P>> {
        &self.interceptor
    }
}

impl<P: PerfBackend> Clone for PerfLayer<P> {
    fn clone(&self) -> Self {
        Self {
            interceptor: Arc::clone(&self.interceptor),
        }
    }
}

impl<S, P: PerfBackend> Layer<S> for PerfLayer<P> {
    type Service = PerfService<S, P>;

    fn layer(&self, inner: S) -> Self::Service {
        PerfService {
            inner,
            interceptor: Arc::clone(&self.interceptor),
        }
    }
}

/// Service that wraps requests with HTTP performance metrics
pub struct PerfService<S, P: PerfBackend> {
    inner: S,
    interceptor: Arc<MetricInterceptor<P>>,
}

impl<S: Clone, P: PerfBackend> Clone for PerfService<S, P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            interceptor: Arc::clone(&self.interceptor),
        }
    }
}

impl<S, P, ReqBody, ResBody> Service<Request<ReqBody>> for PerfService<S, P>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: CallFailure + Send + 'static,
    P: PerfBackend,
    ReqBody: InspectBody + Send + 'static,
    ResBody: InspectBody + Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let interceptor = Arc::clone(&self.interceptor);
        interceptor.on_request(&mut req);

        // The inner service consumes the request; keep its extensions so the
        // completion hooks can recover the correlation key.
        let extensions = req.extensions().clone();

        // Swap so we call the instance that was poll_ready'd, leaving a fresh clone
        // for the next poll_ready cycle. This satisfies the Tower Service contract.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let result = inner.call(req).await;

            match &result {
                Ok(response) => {
                    interceptor
                        .on_response(&extensions, &ResponseDescriptor::from_response(response));
                }
                Err(err) => {
                    interceptor.on_error(&extensions, err.partial_response().as_ref());
                }
            }

            result
        })
    }
}

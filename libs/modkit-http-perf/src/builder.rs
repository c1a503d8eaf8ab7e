use crate::backend::PerfBackend;
use crate::config::{KeyStrategyKind, PerfConfig};
use crate::estimate::{
    RequestSizeEstimator, ResponseSizeEstimator, estimate_request_size, estimate_response_size,
};
use crate::interceptor::MetricInterceptor;
use crate::key::{KeyStrategy, RandomKeyStrategy, SequentialKeyStrategy};
use crate::layers::PerfLayer;
use crate::request::RequestDescriptor;
use crate::response::ResponseDescriptor;
use crate::store::MeasurementStore;
use std::sync::Arc;

/// Builder for [`MetricInterceptor`].
///
/// The key strategy and both size estimators are the override points; all of
/// them default to the behavior documented on [`RandomKeyStrategy`],
/// [`estimate_request_size`] and [`estimate_response_size`].
pub struct MetricInterceptorBuilder<P> {
    backend: P,
    config: PerfConfig,
    key_strategy: Option<Arc<dyn KeyStrategy>>,
    request_size: Arc<dyn RequestSizeEstimator>,
    response_size: Arc<dyn ResponseSizeEstimator>,
}

impl<P: PerfBackend> MetricInterceptorBuilder<P> {
    /// Create a builder with default configuration
    #[must_use]
    pub fn new(backend: P) -> Self {
        Self {
            backend,
            config: PerfConfig::default(),
            key_strategy: None,
            request_size: Arc::new(estimate_request_size),
            response_size: Arc::new(estimate_response_size),
        }
    }

    /// Apply a deserialized configuration
    ///
    /// A strategy set with [`key_strategy`](Self::key_strategy) takes
    /// precedence over `config.key_strategy`.
    #[must_use]
    pub fn with_config(mut self, config: PerfConfig) -> Self {
        self.config = config;
        self
    }

    /// Turn instrumentation on or off
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    /// Use a custom correlation key strategy
    #[must_use]
    pub fn key_strategy(mut self, strategy: impl KeyStrategy + 'static) -> Self {
        self.key_strategy = Some(Arc::new(strategy));
        self
    }

    /// Replace the request payload size estimator
    #[must_use]
    pub fn request_size_estimator<F>(mut self, estimator: F) -> Self
    where
        F: Fn(&RequestDescriptor<'_>) -> Option<u64> + Send + Sync + 'static,
    {
        self.request_size = Arc::new(estimator);
        self
    }

    /// Replace the response payload size estimator
    #[must_use]
    pub fn response_size_estimator<F>(mut self, estimator: F) -> Self
    where
        F: Fn(&ResponseDescriptor<'_>) -> Option<u64> + Send + Sync + 'static,
    {
        self.response_size = Arc::new(estimator);
        self
    }

    #[must_use]
    pub fn build(self) -> MetricInterceptor<P> {
        let keys: Arc<dyn KeyStrategy> = match self.key_strategy {
            Some(custom) => custom,
            None => match self.config.key_strategy {
                KeyStrategyKind::Random => Arc::new(RandomKeyStrategy),
                KeyStrategyKind::Sequential => Arc::new(SequentialKeyStrategy::new()),
            },
        };

        if !self.config.enabled {
            tracing::info!(
                target: "modkit_http_perf",
                "HTTP performance metrics disabled by configuration"
            );
        }

        MetricInterceptor {
            backend: self.backend,
            store: MeasurementStore::new(),
            keys,
            request_size: self.request_size,
            response_size: self.response_size,
            enabled: self.config.enabled,
        }
    }

    /// Build the interceptor and wrap it in a [`PerfLayer`]
    #[must_use]
    pub fn into_layer(self) -> PerfLayer<P> {
        PerfLayer::new(Arc::new(self.build()))
    }
}

impl<P> std::fmt::Debug for MetricInterceptorBuilder<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricInterceptorBuilder")
            .field("config", &self.config)
            .field("custom_key_strategy", &self.key_strategy.is_some())
            .finish_non_exhaustive()
    }
}

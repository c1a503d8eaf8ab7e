#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! HTTP performance metrics for `ModKit` HTTP clients
//!
//! This crate correlates outbound HTTP calls with performance metrics of a
//! telemetry backend:
//! - A metric is opened and started before the request leaves the process
//! - Method, normalized URL and an estimated request size are attached
//! - The metric is closed **exactly once** on success or failure, with status
//!   code, content type and an estimated response size
//! - Instrumentation is fail-open: errors are logged, never returned
//!
//! # Correlation
//!
//! The pre-send hook stamps a [`CorrelationKey`] into the request's
//! `http::Extensions` and stores the open metric under it. The completion
//! hooks read the key back and atomically take the metric out of the store,
//! so racing success/failure paths cannot stop a metric twice.
//!
//! The default [`RandomKeyStrategy`] draws a random 32-bit tag; concurrent
//! calls may collide with very low probability. Use
//! [`SequentialKeyStrategy`] when collisions are not acceptable.
//!
//! # Payload sizes
//!
//! Sizes are estimated from a JSON rendering of headers and body and are
//! approximations, not wire bytes. Bodies that are not text or structured
//! data are reported without a size.
//!
//! # Example
//!
//! ```ignore
//! use modkit_http_perf::{LoggingBackend, MetricInterceptor, SequentialKeyStrategy};
//! use tower::ServiceBuilder;
//!
//! let layer = MetricInterceptor::builder(LoggingBackend)
//!     .key_strategy(SequentialKeyStrategy::new())
//!     .into_layer();
//!
//! let service = ServiceBuilder::new().layer(layer).service(http_client);
//! ```

mod backend;
mod builder;
mod config;
mod error;
mod estimate;
mod interceptor;
mod key;
mod layers;
mod method;
mod request;
mod response;
mod store;

pub use backend::{HttpMetric, LoggedMetric, LoggingBackend, NoopBackend, NoopMetric, PerfBackend};
pub use builder::MetricInterceptorBuilder;
pub use config::{KeyStrategyKind, PerfConfig};
pub use error::{BackendError, BackendOp, PerfError};
pub use estimate::{
    RequestSizeEstimator, ResponseSizeEstimator, estimate_request_size, estimate_response_size,
};
pub use interceptor::{HookOutcome, MetricInterceptor, SkipReason};
pub use key::{
    CorrelationKey, FnKeyStrategy, KeyStrategy, RandomKeyStrategy, SequentialKeyStrategy,
};
pub use layers::{PerfLayer, PerfService};
pub use method::HttpMethod;
pub use request::{BodyView, InspectBody, Payload, RequestDescriptor, normalize_url};
pub use response::{CallFailure, FailedResponse, ResponseDescriptor};
pub use store::MeasurementStore;

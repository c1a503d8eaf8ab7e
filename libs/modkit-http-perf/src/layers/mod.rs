//! Tower layers for HTTP client middleware
//!
//! ## Available Layers
//!
//! - [`PerfLayer`] - Records an HTTP performance metric for every outbound request

mod perf;

pub use perf::{PerfLayer, PerfService};

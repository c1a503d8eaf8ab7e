use serde::Deserialize;

/// Built-in correlation key strategies selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStrategyKind {
    /// Random 32-bit tag per request (may collide between concurrent calls)
    #[default]
    Random,
    /// Monotonic counter, never collides while fewer than 2^64 calls are made
    Sequential,
}

/// Interceptor configuration
///
/// Estimators and custom key strategies are code, not data; set them on
/// [`MetricInterceptorBuilder`](crate::MetricInterceptorBuilder).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PerfConfig {
    /// Record metrics at all (default: true)
    ///
    /// When disabled every hook returns without touching the request or the
    /// backend.
    pub enabled: bool,

    /// Key strategy used unless the builder overrides it (default: random)
    pub key_strategy: KeyStrategyKind,
}

impl Default for PerfConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            key_strategy: KeyStrategyKind::Random,
        }
    }
}

impl PerfConfig {
    /// Configuration with instrumentation turned off
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

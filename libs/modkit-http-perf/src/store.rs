use crate::key::CorrelationKey;
use dashmap::DashMap;

/// In-flight metrics keyed by correlation key.
///
/// A key is present exactly while its metric is open. The only way to get a
/// metric out is [`MeasurementStore::take`], which removes it atomically, so
/// two completion paths racing for the same key cannot both obtain it.
pub struct MeasurementStore<M> {
    inner: DashMap<CorrelationKey, M>,
}

impl<M> MeasurementStore<M> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }

    /// Insert an open metric, replacing any entry already stored under `key`.
    ///
    /// The displaced metric, if any, is returned so the caller can decide
    /// what to do with it; it is no longer tracked.
    pub fn open(&self, key: CorrelationKey, metric: M) -> Option<M> {
        self.inner.insert(key, metric)
    }

    /// Remove and return the metric stored under `key`
    pub fn take(&self, key: CorrelationKey) -> Option<M> {
        self.inner.remove(&key).map(|(_, metric)| metric)
    }

    /// Number of open metrics
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<M> Default for MeasurementStore<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> std::fmt::Debug for MeasurementStore<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeasurementStore")
            .field("in_flight", &self.inner.len())
            .finish()
    }
}

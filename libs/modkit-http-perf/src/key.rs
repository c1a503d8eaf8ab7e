//! Correlation keys linking a request's pre-send step to its completion.
//!
//! A [`KeyStrategy`] stamps a key into the request's `http::Extensions` when
//! the request is sent and reads the same key back when the call completes.
//! Keys only need to be unique among requests that are in flight at the same
//! time.

use crate::error::PerfError;
use http::Extensions;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque key correlating a request with its open metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CorrelationKey(u64);

impl CorrelationKey {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Reserved extension slot holding the stamped key.
///
/// The type is private, so user extensions can never collide with it.
#[derive(Debug, Clone, Copy)]
struct StampedKey(CorrelationKey);

fn write_stamp(extensions: &mut Extensions, key: CorrelationKey) -> CorrelationKey {
    extensions.insert(StampedKey(key));
    key
}

fn read_stamp(extensions: &Extensions) -> Result<CorrelationKey, PerfError> {
    extensions
        .get::<StampedKey>()
        .map(|stamp| stamp.0)
        .ok_or(PerfError::MissingKey)
}

/// Strategy for stamping and recovering correlation keys
pub trait KeyStrategy: Send + Sync {
    /// Generate a key for a new request and record it in `extensions`
    ///
    /// # Errors
    /// Returns an error when no key can be produced for this request; the
    /// request is then sent uninstrumented.
    fn stamp(&self, extensions: &mut Extensions) -> Result<CorrelationKey, PerfError>;

    /// Recover the key stamped by [`KeyStrategy::stamp`]
    ///
    /// # Errors
    /// Returns [`PerfError::MissingKey`] when the request was never stamped.
    fn extract(&self, extensions: &Extensions) -> Result<CorrelationKey, PerfError>;
}

/// Default strategy: a uniformly random 32-bit tag per request.
///
/// Two concurrent requests may draw the same tag. The later one then
/// replaces the earlier one's metric, which is dropped without being
/// reported. Use [`SequentialKeyStrategy`] when that is not acceptable.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomKeyStrategy;

impl KeyStrategy for RandomKeyStrategy {
    fn stamp(&self, extensions: &mut Extensions) -> Result<CorrelationKey, PerfError> {
        let tag: u32 = rand::rng().random();
        Ok(write_stamp(extensions, CorrelationKey(u64::from(tag))))
    }

    fn extract(&self, extensions: &Extensions) -> Result<CorrelationKey, PerfError> {
        read_stamp(extensions)
    }
}

/// Injective strategy backed by a monotonically increasing counter
#[derive(Debug, Default)]
pub struct SequentialKeyStrategy {
    next: AtomicU64,
}

impl SequentialKeyStrategy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyStrategy for SequentialKeyStrategy {
    fn stamp(&self, extensions: &mut Extensions) -> Result<CorrelationKey, PerfError> {
        let raw = self.next.fetch_add(1, Ordering::Relaxed);
        Ok(write_stamp(extensions, CorrelationKey(raw)))
    }

    fn extract(&self, extensions: &Extensions) -> Result<CorrelationKey, PerfError> {
        read_stamp(extensions)
    }
}

/// Strategy built from a pair of closures.
///
/// Useful when the host pipeline already places a unique call identifier in
/// the request extensions: `stamp` can derive the key from it and `extract`
/// can read it back without writing anything.
pub struct FnKeyStrategy<S, E> {
    stamp: S,
    extract: E,
}

impl<S, E> FnKeyStrategy<S, E>
where
    S: Fn(&mut Extensions) -> Result<CorrelationKey, PerfError> + Send + Sync,
    E: Fn(&Extensions) -> Result<CorrelationKey, PerfError> + Send + Sync,
{
    #[must_use]
    pub fn new(stamp: S, extract: E) -> Self {
        Self { stamp, extract }
    }
}

impl<S, E> KeyStrategy for FnKeyStrategy<S, E>
where
    S: Fn(&mut Extensions) -> Result<CorrelationKey, PerfError> + Send + Sync,
    E: Fn(&Extensions) -> Result<CorrelationKey, PerfError> + Send + Sync,
{
    fn stamp(&self, extensions: &mut Extensions) -> Result<CorrelationKey, PerfError> {
        (self.stamp)(extensions)
    }

    fn extract(&self, extensions: &Extensions) -> Result<CorrelationKey, PerfError> {
        (self.extract)(extensions)
    }
}

impl<S, E> std::fmt::Debug for FnKeyStrategy<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnKeyStrategy").finish_non_exhaustive()
    }
}

//! Streaming median engine.
//!
//! Three variants share one dual-heap layout: the unbounded [`MedianFinder`],
//! the lazy-deletion [`SlidingWindowMedian`] and the eagerly-evicting
//! [`BoundedMedianFinder`]. All of them implement [`StreamingMedian`].

pub mod bounded;
pub mod config;
pub mod error;
mod halves;
pub mod indexed_heap;
mod macros;
pub mod medianfinder;
pub mod observation;
pub mod shared;
pub mod sliding;

#[cfg(test)]
mod proptests;
#[cfg(test)]
mod test_util;

#[doc(hidden)]
pub use tracing;

pub use bounded::BoundedMedianFinder;
pub use config::{Engine, EngineConfig, EngineMode};
pub use error::{ConfigError, MedianError};
pub use medianfinder::MedianFinder;
pub use observation::Observation;
pub use shared::SharedMedian;
pub use sliding::SlidingWindowMedian;

/// Operations every median variant supports.
pub trait StreamingMedian<T: Observation> {
    /// Adds one observation. Never fails.
    fn insert(&mut self, value: T);

    /// Median of the live set, or [`MedianError::EmptyStructure`] when nothing is live.
    ///
    /// Takes `&mut self` because the lazy variant purges tombstoned roots before reading.
    fn median(&mut self) -> Result<f64, MedianError>;

    /// Number of logically live observations.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Verifies the ordering and balance invariants of the two halves.
    fn check_invariants(&self) -> Result<(), MedianError>;
}

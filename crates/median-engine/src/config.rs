use std::fmt::{Display, Formatter};
use std::num::NonZeroUsize;

use serde::Deserialize;

use crate::bounded::BoundedMedianFinder;
use crate::error::{ConfigError, MedianError};
use crate::medianfinder::MedianFinder;
use crate::observation::Observation;
use crate::sliding::SlidingWindowMedian;
use crate::StreamingMedian;

const ENV_PREFIX: &str = "MEDIAN_";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineMode {
    /// Every observation stays live.
    #[default]
    Unbounded,
    /// Lazy-deletion window over the latest `width` observations.
    Sliding,
    /// Eager-eviction window holding at most `width` observations.
    Bounded,
}

impl Display for EngineMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineMode::Unbounded => write!(f, "unbounded"),
            EngineMode::Sliding => write!(f, "sliding"),
            EngineMode::Bounded => write!(f, "bounded"),
        }
    }
}

/**
Engine selection, read from `MEDIAN_MODE` and `MEDIAN_WIDTH`.

A `.env` file in the working directory is loaded first when present.
*/
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub mode: EngineMode,
    pub width: Option<usize>,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(error) = dotenv::dotenv() {
            tracing::debug!(%error, "No .env file loaded");
        }
        let config = envy::prefixed(ENV_PREFIX).from_env::<EngineConfig>()?;
        tracing::info! {
            mode = %config.mode,
            width = ?config.width,
            "Loaded median engine configuration"
        }
        Ok(config)
    }

    /// Same keys as [`EngineConfig::from_env`], read from `pairs` instead of the
    /// process environment.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::prefixed(ENV_PREFIX).from_iter::<_, EngineConfig>(pairs)?)
    }

    pub fn build<T: Observation>(&self) -> Result<Engine<T>, ConfigError> {
        let engine = match self.mode {
            EngineMode::Unbounded => Engine::Unbounded(MedianFinder::new()),
            EngineMode::Sliding => Engine::Sliding(SlidingWindowMedian::new(self.window_width()?)),
            EngineMode::Bounded => Engine::Bounded(BoundedMedianFinder::new(self.window_width()?)),
        };
        Ok(engine)
    }

    fn window_width(&self) -> Result<NonZeroUsize, ConfigError> {
        let width = self.width.ok_or(ConfigError::MissingWidth(self.mode))?;
        NonZeroUsize::new(width).ok_or(ConfigError::ZeroWidth)
    }
}

/// A median engine picked at runtime.
#[derive(Debug, Clone)]
pub enum Engine<T: Observation> {
    Unbounded(MedianFinder<T>),
    Sliding(SlidingWindowMedian<T>),
    Bounded(BoundedMedianFinder<T>),
}

impl<T: Observation> Engine<T> {
    pub fn mode(&self) -> EngineMode {
        match self {
            Engine::Unbounded(_) => EngineMode::Unbounded,
            Engine::Sliding(_) => EngineMode::Sliding,
            Engine::Bounded(_) => EngineMode::Bounded,
        }
    }
}

impl<T: Observation> StreamingMedian<T> for Engine<T> {
    fn insert(&mut self, value: T) {
        match self {
            Engine::Unbounded(finder) => finder.insert(value),
            Engine::Sliding(window) => window.insert(value),
            Engine::Bounded(finder) => finder.insert(value),
        }
    }

    fn median(&mut self) -> Result<f64, MedianError> {
        match self {
            Engine::Unbounded(finder) => finder.median(),
            Engine::Sliding(window) => window.median(),
            Engine::Bounded(finder) => finder.median(),
        }
    }

    fn len(&self) -> usize {
        match self {
            Engine::Unbounded(finder) => finder.len(),
            Engine::Sliding(window) => window.len(),
            Engine::Bounded(finder) => finder.len(),
        }
    }

    fn check_invariants(&self) -> Result<(), MedianError> {
        match self {
            Engine::Unbounded(finder) => finder.check_invariants(),
            Engine::Sliding(window) => window.check_invariants(),
            Engine::Bounded(finder) => finder.check_invariants(),
        }
    }
}

impl<T: Observation> Extend<T> for Engine<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            StreamingMedian::insert(self, value);
        }
    }
}

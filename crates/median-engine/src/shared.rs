use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::MedianError;
use crate::halves;
use crate::observation::Observation;
use crate::StreamingMedian;

/**
A median engine that can be handed to several threads.

The whole engine sits behind one lock: inserts and evictions both move
entries between the two halves, so the halves cannot be locked separately.
*/
#[derive(Debug)]
pub struct SharedMedian<T, E> {
    engine: Arc<Mutex<E>>,
    _value: PhantomData<fn(T)>,
}

impl<T, E> Clone for SharedMedian<T, E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            _value: PhantomData,
        }
    }
}

impl<T: Observation, E: StreamingMedian<T>> SharedMedian<T, E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            _value: PhantomData,
        }
    }

    pub fn insert(&self, value: T) {
        self.lock().insert(value);
    }

    pub fn median(&self) -> Result<f64, MedianError> {
        self.lock().median()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Runs `f` with the lock held, for several operations that must not interleave.
    pub fn with<R>(&self, f: impl FnOnce(&mut E) -> R) -> R {
        f(&mut self.lock())
    }

    /// A poisoned lock means an update panicked halfway, leaving the halves unusable.
    fn lock(&self) -> MutexGuard<'_, E> {
        self.engine
            .lock()
            .unwrap_or_else(|_| {
                halves::invariant_violation(
                    "engine lock poisoned by an interrupted update".to_string(),
                )
            })
    }
}

impl<T: Observation, E: StreamingMedian<T> + Default> Default for SharedMedian<T, E> {
    fn default() -> Self {
        Self::new(E::default())
    }
}

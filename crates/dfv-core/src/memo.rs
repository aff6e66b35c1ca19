//! Pull-based memoization with version keys.
//!
//! Every [`Source`] carries a version drawn from one process-wide counter, so
//! a version number never repeats across sources or resets. A [`Memo`]
//! remembers the versions of the sources it was computed from and recomputes
//! lazily on the first read after any of them changes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

fn next_version() -> u64 {
    NEXT_VERSION.fetch_add(1, Ordering::Relaxed)
}

/// A mutable input to derived computations.
#[derive(Debug)]
pub struct Source<T> {
    value: T,
    version: u64,
}

impl<T> Source<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            version: next_version(),
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Replace the value and bump the version.
    pub fn set(&mut self, value: T) {
        self.value = value;
        self.version = next_version();
    }

    /// Mutate in place and bump the version.
    pub fn update<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = f(&mut self.value);
        self.version = next_version();
        result
    }
}

impl<T: Default> Default for Source<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[derive(Debug)]
struct Entry<T> {
    deps: Vec<u64>,
    value: T,
}

/// A cached derived value keyed by the versions of its inputs.
#[derive(Debug)]
pub struct Memo<T> {
    entry: Mutex<Option<Entry<T>>>,
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self {
            entry: Mutex::new(None),
        }
    }
}

impl<T: Clone> Memo<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value if `deps` match, otherwise compute and cache it.
    ///
    /// A failed computation is not cached.
    pub fn get_or_try_compute<E>(
        &self,
        deps: &[u64],
        compute: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E> {
        let mut entry = self.entry.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = entry.as_ref().filter(|cached| cached.deps == deps) {
            return Ok(cached.value.clone());
        }
        let value = compute()?;
        *entry = Some(Entry {
            deps: deps.to_vec(),
            value: value.clone(),
        });
        Ok(value)
    }

    /// Drop the cached value.
    pub fn invalidate(&self) {
        *self.entry.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// True when a value is cached for exactly these dependency versions.
    pub fn is_fresh(&self, deps: &[u64]) -> bool {
        self.entry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|cached| cached.deps == deps)
    }
}

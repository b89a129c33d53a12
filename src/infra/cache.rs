//! In-process memo of solver answers, keyed by endpoints and closed passages.
//!
//! Scenario comparison solves the same origin/destination pairs under the
//! baseline and the active scenario for every product, so repeated queries
//! are common within one run. Nothing is persisted.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex, MutexGuard,
    },
};

use tracing::{debug, trace};

use crate::domain::{Coordinates, GeometryError, GeometrySolver, RestrictionSet, SolverPath};

type CacheKey = ((u64, u64), (u64, u64), RestrictionSet);
type CachedAnswer = Result<Option<SolverPath>, GeometryError>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Wraps any [`GeometrySolver`] and replays earlier answers, errors included.
///
/// Panics from the inner solver are not cached; they propagate to the caller
/// and the next identical query tries again.
pub struct CachedSolver<S> {
    inner: S,
    entries: Mutex<HashMap<CacheKey, CachedAnswer>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<S: GeometrySolver> CachedSolver<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            entries: Mutex::new(HashMap::new()),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.lock().len(),
        }
    }

    pub fn clear(&self) {
        let mut entries = self.lock();
        debug!(dropped = entries.len(), "route cache cleared");
        entries.clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, CachedAnswer>> {
        // A poisoned map only means a writer panicked mid-insert; entries are
        // whole values so the map is still consistent.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<S: GeometrySolver> GeometrySolver for CachedSolver<S> {
    fn solve(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        restrictions: &RestrictionSet,
    ) -> Result<Option<SolverPath>, GeometryError> {
        let key = (origin.key(), destination.key(), restrictions.clone());

        if let Some(answer) = self.lock().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(%origin, %destination, "route cache hit");
            return answer.clone();
        }

        // Solve without holding the lock; concurrent misses on one key both
        // compute and the last insert wins with an identical answer.
        let answer = self.inner.solve(origin, destination, restrictions);
        self.misses.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(key, answer.clone());
        answer
    }
}

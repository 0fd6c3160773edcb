//! Resolved role cache.
//!
//! The cache maps role codes to fully merged roles. It is owned by a role
//! repository instance; there is no process-wide cache.
//!
//! Entries live in a *generation*. Invalidation publishes a fresh, empty
//! generation with a single atomic pointer swap, so readers never observe a
//! half-cleared map. A lookup that started before an invalidation keeps
//! writing into the generation it loaded, which is already superseded, so its
//! result is dropped instead of resurrecting stale data.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use dashmap::DashMap;

use crate::model::Role;

// =============================================================================
// Cache Generation
// =============================================================================

/// One generation of cached roles.
pub struct CacheGeneration<R: Role> {
    id: u64,
    entries: DashMap<String, Arc<R>>,
}

impl<R: Role> CacheGeneration<R> {
    fn new(id: u64) -> Self {
        Self {
            id,
            entries: DashMap::new(),
        }
    }

    /// Generation number, incremented on every invalidation.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the cached role for `code`.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<Arc<R>> {
        self.entries.get(code).map(|entry| Arc::clone(entry.value()))
    }

    /// Stores a resolved role. Concurrent resolutions of the same code may
    /// both insert; the last write wins and both values are equivalent.
    pub fn insert(&self, code: impl Into<String>, role: Arc<R>) {
        self.entries.insert(code.into(), role);
    }

    /// Number of cached roles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Role Cache
// =============================================================================

/// Cache of resolved roles keyed by role code.
pub struct RoleCache<R: Role> {
    current: ArcSwap<CacheGeneration<R>>,
    next_generation: AtomicU64,
    enabled: bool,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<R: Role> RoleCache<R> {
    /// Creates an enabled, empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::with_enabled(true)
    }

    /// Creates a cache that never stores anything.
    #[must_use]
    pub fn disabled() -> Self {
        Self::with_enabled(false)
    }

    fn with_enabled(enabled: bool) -> Self {
        Self {
            current: ArcSwap::from_pointee(CacheGeneration::new(0)),
            next_generation: AtomicU64::new(1),
            enabled,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns `true` if the cache stores resolved roles.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Loads the current generation.
    ///
    /// Callers resolving a miss should insert into the generation they
    /// loaded before resolving, not into a freshly loaded one.
    #[must_use]
    pub fn generation(&self) -> Arc<CacheGeneration<R>> {
        self.current.load_full()
    }

    /// Looks a role up in `generation`, recording a hit or a miss.
    #[must_use]
    pub fn lookup(&self, generation: &CacheGeneration<R>, code: &str) -> Option<Arc<R>> {
        if !self.enabled {
            return None;
        }
        match generation.get(code) {
            Some(role) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(role)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Stores a resolved role in `generation` if caching is enabled.
    pub fn store(&self, generation: &CacheGeneration<R>, code: &str, role: Arc<R>) {
        if self.enabled {
            generation.insert(code, role);
        }
    }

    /// Drops every cached role.
    pub fn invalidate(&self) {
        let id = self.next_generation.fetch_add(1, Ordering::SeqCst);
        let previous = self.current.swap(Arc::new(CacheGeneration::new(id)));
        tracing::info!(
            generation = id,
            dropped = previous.len(),
            "Role cache invalidated"
        );
    }

    /// Get cache statistics.
    #[must_use]
    pub fn stats(&self) -> RoleCacheStats {
        let generation = self.current.load();
        RoleCacheStats {
            enabled: self.enabled,
            entries: generation.len(),
            generation: generation.id(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl<R: Role> Default for RoleCache<R> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Cache Statistics
// =============================================================================

/// Statistics about the role cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleCacheStats {
    /// Whether caching is enabled.
    pub enabled: bool,

    /// Number of roles in the current generation.
    pub entries: usize,

    /// Current generation number.
    pub generation: u64,

    /// Lookups answered from the cache.
    pub hits: u64,

    /// Lookups that had to resolve the role.
    pub misses: u64,
}

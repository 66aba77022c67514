//! Blob handle registry
//!
//! Issues short-lived `blob:openmesh/<uuid>` URLs that resolve to an
//! in-memory copy of a payload. Every issue allocates a new handle.
//! Handles are dropped on explicit release, or the least recently used one
//! is evicted once the registry holds `capacity` live handles.

use crate::config::HANDLE_SCHEME;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// A dereferenceable reference to blob bytes held by a `HandleRegistry`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobHandle {
    url: String,
    size: usize,
}

impl BlobHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

#[derive(Default)]
struct Entries {
    data: HashMap<String, Arc<[u8]>>,
    /// Least recently issued or resolved first
    order: VecDeque<String>,
}

/// Process-local registry of live blob handles
pub struct HandleRegistry {
    capacity: usize,
    entries: Mutex<Entries>,
}

impl HandleRegistry {
    /// Create a registry holding at most `capacity` live handles (minimum 1)
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(Entries::default()),
        }
    }

    /// Register a payload and return a fresh handle for it
    pub fn issue(&self, data: Vec<u8>) -> BlobHandle {
        let url = format!("{}{}", HANDLE_SCHEME, Uuid::new_v4());
        let size = data.len();

        let mut entries = self.lock();

        while entries.data.len() >= self.capacity {
            let Some(oldest) = entries.order.pop_front() else {
                break;
            };
            entries.data.remove(&oldest);
            tracing::debug!("Evicted blob handle: {}", oldest);
        }

        entries.data.insert(url.clone(), Arc::from(data));
        entries.order.push_back(url.clone());

        tracing::debug!("Issued blob handle: {} ({} bytes)", url, size);

        BlobHandle { url, size }
    }

    /// Bytes behind a live handle, `None` once released or evicted.
    /// Resolving marks the handle as most recently used.
    pub fn resolve(&self, url: &str) -> Option<Arc<[u8]>> {
        let mut entries = self.lock();
        let data = entries.data.get(url).cloned()?;

        if let Some(pos) = entries.order.iter().position(|issued| issued == url) {
            if let Some(touched) = entries.order.remove(pos) {
                entries.order.push_back(touched);
            }
        }

        Some(data)
    }

    /// Release a handle. Returns false if it was not live.
    pub fn release(&self, url: &str) -> bool {
        let mut entries = self.lock();

        if entries.data.remove(url).is_none() {
            return false;
        }
        entries.order.retain(|issued| issued != url);

        tracing::debug!("Released blob handle: {}", url);
        true
    }

    /// Number of live handles
    pub fn live_count(&self) -> usize {
        self.lock().data.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        // Entries stay consistent across a panic in another holder
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_resolve() {
        let registry = HandleRegistry::new(4);

        let handle = registry.issue(vec![1, 2, 3]);
        assert!(handle.url().starts_with(HANDLE_SCHEME));
        assert_eq!(handle.size(), 3);

        let bytes = registry.resolve(handle.url()).unwrap();
        assert_eq!(&bytes[..], &[1, 2, 3]);
    }

    #[test]
    fn test_each_issue_is_a_new_handle() {
        let registry = HandleRegistry::new(4);

        let first = registry.issue(vec![7]);
        let second = registry.issue(vec![7]);

        assert_ne!(first.url(), second.url());
        assert_eq!(registry.live_count(), 2);
    }

    #[test]
    fn test_release() {
        let registry = HandleRegistry::new(4);
        let handle = registry.issue(vec![1]);

        assert!(registry.release(handle.url()));
        assert!(registry.resolve(handle.url()).is_none());
        assert!(!registry.release(handle.url()));
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let registry = HandleRegistry::new(2);

        let a = registry.issue(vec![1]);
        let b = registry.issue(vec![2]);
        let c = registry.issue(vec![3]);

        assert_eq!(registry.live_count(), 2);
        assert!(registry.resolve(a.url()).is_none());
        assert!(registry.resolve(b.url()).is_some());
        assert!(registry.resolve(c.url()).is_some());
    }

    #[test]
    fn test_resolve_keeps_handle_alive() {
        let registry = HandleRegistry::new(2);

        let a = registry.issue(vec![1]);
        let b = registry.issue(vec![2]);
        assert!(registry.resolve(a.url()).is_some());
        let c = registry.issue(vec![3]);

        assert!(registry.resolve(a.url()).is_some());
        assert!(registry.resolve(b.url()).is_none());
        assert!(registry.resolve(c.url()).is_some());
    }

    #[test]
    fn test_release_then_issue_does_not_evict() {
        let registry = HandleRegistry::new(2);

        let a = registry.issue(vec![1]);
        let b = registry.issue(vec![2]);
        registry.release(a.url());
        let c = registry.issue(vec![3]);

        assert!(registry.resolve(b.url()).is_some());
        assert!(registry.resolve(c.url()).is_some());
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let registry = HandleRegistry::new(0);
        assert_eq!(registry.capacity(), 1);

        let handle = registry.issue(vec![9]);
        assert!(registry.resolve(handle.url()).is_some());
    }
}

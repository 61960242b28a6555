//! Advisory per-key locks for commit-time serialization.
//!
//! Two concurrent batches touching the same natural key would race on
//! read-modify-write updates. Commit therefore acquires one async mutex
//! per touched key, always in sorted key order, which makes the
//! acquisition deadlock-free.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OwnedMutexGuard;

/// Registry of named advisory locks. Lock entries are created lazily and
/// kept for the registry's lifetime; the key space is bounded by the
/// entity population.
#[derive(Default)]
pub struct KeyLockRegistry {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Acquire guards for every key, in sorted order. Keys are
    /// deduplicated; guards release on drop.
    pub async fn acquire(&self, keys: &[String]) -> Vec<OwnedMutexGuard<()>> {
        let mut sorted: Vec<&String> = keys.iter().collect();
        sorted.sort();
        sorted.dedup();

        let mut guards = Vec::with_capacity(sorted.len());
        for key in sorted {
            let lock = self.entry(key);
            guards.push(lock.lock_owned().await);
        }
        guards
    }
}

// ── Tests ────────────────────────────────────────────────────────────

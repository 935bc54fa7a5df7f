//! Live-node accounting, enabled with the `audit` cargo feature.
//!
//! Every node constructed while the feature is on is entered into a
//! process-global table together with its construction site; dropping the
//! node removes the entry. [`checkpoint`] reports the nodes that exceed an
//! expected-live threshold, which makes leak hunts in tests mechanical.

use std::collections::BTreeMap;
use std::panic::Location;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

static SERIAL: AtomicU64 = AtomicU64::new(1);

fn registry() -> &'static Mutex<BTreeMap<u64, &'static Location<'static>>> {
    static REGISTRY: OnceLock<Mutex<BTreeMap<u64, &'static Location<'static>>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(BTreeMap::new()))
}

/// One live node's registry entry. Owned by the node; registration happens
/// on construction and clone, removal on drop.
#[derive(Debug)]
pub struct Registration {
    serial: u64,
}

impl Registration {
    #[track_caller]
    pub fn new() -> Self {
        let serial = SERIAL.fetch_add(1, Ordering::Relaxed);
        registry()
            .lock()
            .expect("audit registry poisoned")
            .insert(serial, Location::caller());
        Registration { serial }
    }
}

impl Clone for Registration {
    #[track_caller]
    fn clone(&self) -> Self {
        Registration::new()
    }
}

impl Default for Registration {
    #[track_caller]
    fn default() -> Self {
        Registration::new()
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        registry()
            .lock()
            .expect("audit registry poisoned")
            .remove(&self.serial);
    }
}

/// Number of nodes currently alive.
pub fn live_nodes() -> usize {
    registry().lock().expect("audit registry poisoned").len()
}

/// Describe every live node beyond `expected_live`, oldest first.
pub fn checkpoint(expected_live: usize) -> Vec<String> {
    let registry = registry().lock().expect("audit registry poisoned");
    registry
        .iter()
        .skip(expected_live)
        .map(|(serial, location)| format!("node #{serial} constructed at {location}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_names_excess_nodes() {
        let extra = Registration::new();
        let needle = format!("node #{}", extra.serial);

        assert!(checkpoint(0).iter().any(|entry| entry.contains(&needle)));

        drop(extra);

        assert!(!checkpoint(0).iter().any(|entry| entry.contains(&needle)));
    }
}

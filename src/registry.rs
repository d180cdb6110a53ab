//! Per-sender estimator registry.
//!
//! [`IdentityRegistry`] is the single-threaded map owned by the monitor loop.
//! [`SharedRegistry`] is the variant for several concurrent frame sources:
//! the map sits behind a lock and each sender's state has its own mutex, so
//! different senders update in parallel while one sender's updates stay
//! serialised.
//!
//! Entries are created on first sighting and live for the whole session.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, RwLock};

use tracing::info;

use crate::config::DetectorConfig;
use crate::estimator::ClockState;
use crate::types::CanId;

/// Map from sender identifier to its [`ClockState`].
#[derive(Debug, Clone)]
pub struct IdentityRegistry {
    config: DetectorConfig,
    states: HashMap<CanId, ClockState>,
}

impl IdentityRegistry {
    /// Create an empty registry; new states use `config`
    pub fn new(config: DetectorConfig) -> Self {
        Self { config, states: HashMap::new() }
    }

    /// Return the state bound to `id`, creating it on first use.
    pub fn resolve(&mut self, id: CanId) -> &mut ClockState {
        match self.states.entry(id) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                info!(can_id = %id, "New sender observed");
                entry.insert(ClockState::new(&self.config))
            }
        }
    }

    /// State for `id` if it has been seen
    pub fn get(&self, id: CanId) -> Option<&ClockState> {
        self.states.get(&id)
    }

    /// Number of distinct senders seen
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether no sender has been seen yet
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Iterate over all known senders
    pub fn iter(&self) -> impl Iterator<Item = (&CanId, &ClockState)> {
        self.states.iter()
    }

    /// Parameters used for new states
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }
}

/// Concurrency-safe registry for multi-source ingestion.
#[derive(Debug, Clone)]
pub struct SharedRegistry {
    config: DetectorConfig,
    states: Arc<RwLock<HashMap<CanId, Arc<Mutex<ClockState>>>>>,
}

impl SharedRegistry {
    /// Create an empty shared registry
    pub fn new(config: DetectorConfig) -> Self {
        Self { config, states: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Return the state handle bound to `id`, creating it on first use.
    ///
    /// Lock the returned mutex for the whole timestamp update to keep one
    /// sender's updates in arrival order.
    pub fn resolve(&self, id: CanId) -> Arc<Mutex<ClockState>> {
        {
            let states = self.states.read().unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(state) = states.get(&id) {
                return Arc::clone(state);
            }
        }

        let mut states = self.states.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        let state = states.entry(id).or_insert_with(|| {
            info!(can_id = %id, "New sender observed");
            Arc::new(Mutex::new(ClockState::new(&self.config)))
        });
        Arc::clone(state)
    }

    /// Number of distinct senders seen
    pub fn len(&self) -> usize {
        self.states.read().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    /// Whether no sender has been seen yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

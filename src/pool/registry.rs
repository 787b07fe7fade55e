//! Named pool registry
//!
//! Finds or creates pools by name and prewarms them from a list of
//! configured entries. A bad entry is logged and skipped; the rest of the
//! list is still processed.

use super::{Factory, InstancePool, PoolStats};
use crate::infrastructure::config::PoolEntry;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Result of setting up one configured entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupOutcome {
    /// Pool prewarmed; `members` is its size afterwards
    Prewarmed { members: usize },
    /// Entry skipped, pool left as it was
    Skipped { reason: String },
}

/// Per-entry outcomes of `PoolRegistry::setup`, in entry order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupReport {
    pub entries: Vec<(String, SetupOutcome)>,
}

impl SetupReport {
    pub fn prewarmed(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, outcome)| matches!(outcome, SetupOutcome::Prewarmed { .. }))
            .count()
    }

    /// Names of skipped entries
    pub fn skipped(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, outcome)| matches!(outcome, SetupOutcome::Skipped { .. }))
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Pools of one instance type, keyed by name
pub struct PoolRegistry<T> {
    pools: RwLock<BTreeMap<String, Arc<InstancePool<T>>>>,
}

impl<T: 'static> PoolRegistry<T> {
    pub fn new() -> Self {
        Self {
            pools: RwLock::new(BTreeMap::new()),
        }
    }

    /// Find the pool called `name`, creating an empty one if missing
    pub fn ensure(&self, name: &str) -> Arc<InstancePool<T>> {
        if let Some(pool) = self.pools.read().get(name) {
            debug!(target: "registry", pool = name, "found existing pool");
            return Arc::clone(pool);
        }

        let mut pools = self.pools.write();
        // Another caller may have created it between the two locks
        if let Some(pool) = pools.get(name) {
            return Arc::clone(pool);
        }
        let pool = Arc::new(InstancePool::new().named(name));
        pools.insert(name.to_string(), Arc::clone(&pool));
        info!(target: "registry", pool = name, "created pool");
        pool
    }

    pub fn get(&self, name: &str) -> Option<Arc<InstancePool<T>>> {
        self.pools.read().get(name).cloned()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        self.pools.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.pools.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.read().is_empty()
    }

    /// Ensure and prewarm one pool per entry
    ///
    /// `factory_for` resolves the factory for an entry name. Entries it
    /// cannot resolve are skipped and no pool is created for them.
    pub fn setup<R>(&self, entries: &[PoolEntry], factory_for: R) -> SetupReport
    where
        R: Fn(&str) -> Option<Factory<T>>,
    {
        let mut report = SetupReport::default();

        for entry in entries {
            let Some(factory) = factory_for(&entry.name) else {
                error!(target: "registry", pool = %entry.name, "no factory for pool, cannot create it");
                report.entries.push((
                    entry.name.clone(),
                    SetupOutcome::Skipped {
                        reason: "no factory".to_string(),
                    },
                ));
                continue;
            };

            let pool = self.ensure(&entry.name);
            let outcome = match pool.prewarm_with(Some(factory), entry.prewarm) {
                Ok(members) => SetupOutcome::Prewarmed { members },
                Err(e) => SetupOutcome::Skipped {
                    reason: e.to_string(),
                },
            };
            report.entries.push((entry.name.clone(), outcome));
        }

        info!(
            target: "registry",
            prewarmed = report.prewarmed(),
            skipped = report.skipped().len(),
            "pool setup complete"
        );
        report
    }

    /// Stats for every pool, sorted by name
    pub fn stats(&self) -> Vec<PoolStats> {
        self.pools.read().values().map(|pool| pool.stats()).collect()
    }
}

impl<T: 'static> Default for PoolRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

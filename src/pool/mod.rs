//! Instance pooling with prewarm, overflow growth and adoption
//!
//! A pool owns every instance it has ever created or adopted. Instances are
//! handed out by `acquire` and handed back by `release`; nothing is ever
//! destroyed, so the member count only grows.
//!
//! Acquisition order is insertion order: the earliest-created inactive
//! member is always handed out first. The free set is kept ordered by
//! position so this holds without scanning every member.

pub mod instance;
pub mod registry;

pub use instance::Instance;
pub use registry::{PoolRegistry, SetupOutcome, SetupReport};

use crate::infrastructure::metrics::{MetricsSnapshot, PoolMetrics};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Factory producing one new instance per call
pub type Factory<T> = Box<dyn Fn() -> T + Send + Sync>;

/// Pool operation errors
///
/// Both are local and recoverable. The pool stays usable after either.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// No factory installed when an instance had to be created
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No instance given to `release`
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// What `release` did with the instance it was given
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// Tracked active member, now inactive
    Released,
    /// Tracked member that was already inactive; nothing changed
    AlreadyInactive,
    /// Untracked instance, now a tracked inactive member
    Adopted,
}

/// Point-in-time view of a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub name: String,
    pub members: usize,
    pub active: usize,
    pub inactive: usize,
    pub has_factory: bool,
    pub metrics: MetricsSnapshot,
}

struct PoolState<T> {
    factory: Option<Factory<T>>,
    /// Every member, in insertion order
    members: Vec<Instance<T>>,
    /// Positions of inactive members
    free: BTreeSet<usize>,
    /// Identity key -> position in `members`
    index: HashMap<usize, usize>,
}

impl<T> PoolState<T> {
    fn new(factory: Option<Factory<T>>) -> Self {
        Self {
            factory,
            members: Vec::new(),
            free: BTreeSet::new(),
            index: HashMap::new(),
        }
    }

    /// Append a member and return its position. Caller decides its state.
    fn track(&mut self, instance: Instance<T>) -> usize {
        let position = self.members.len();
        self.index.insert(instance.key(), position);
        self.members.push(instance);
        position
    }

    /// Append freshly created members as inactive
    fn extend_inactive(&mut self, created: Vec<Instance<T>>) {
        self.members.reserve(created.len());
        for instance in created {
            let position = self.track(instance);
            self.free.insert(position);
        }
    }
}

fn create_members<T>(factory: &dyn Fn() -> T, count: usize) -> Vec<Instance<T>> {
    (0..count).map(|_| Instance::new(factory())).collect()
}

/// Pool of reusable instances of one type
///
/// # Example
/// ```
/// use instance_pool::InstancePool;
///
/// let pool = InstancePool::with_capacity(4, || vec![0u8; 1024]);
///
/// // Reuses a prewarmed member
/// let buf = pool.acquire().unwrap();
/// assert_eq!(pool.active_count(), 1);
///
/// // Hand it back for the next caller
/// pool.release(buf).unwrap();
/// assert_eq!(pool.active_count(), 0);
/// ```
pub struct InstancePool<T> {
    name: String,
    state: Mutex<PoolState<T>>,
    metrics: PoolMetrics,
}

impl<T> InstancePool<T> {
    /// Create an empty pool with no factory
    ///
    /// `acquire` fails until a factory is installed or members are donated
    /// through `release`.
    pub fn new() -> Self {
        Self {
            name: "pool".to_string(),
            state: Mutex::new(PoolState::new(None)),
            metrics: PoolMetrics::new(),
        }
    }

    /// Create an empty pool that grows with `factory`
    pub fn with_factory<F>(factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let pool = Self::new();
        pool.set_factory(factory);
        pool
    }

    /// Create a pool and prewarm it with `capacity` inactive members
    pub fn with_capacity<F>(capacity: usize, factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let pool = Self::new();
        pool.install_and_prewarm(factory, capacity);
        pool
    }

    /// Set the label used in log events and stats
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Install (or replace) the factory used for prewarm and overflow growth
    pub fn set_factory<F>(&self, factory: F)
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.state.lock().factory = Some(Box::new(factory));
    }

    pub fn has_factory(&self) -> bool {
        self.state.lock().factory.is_some()
    }

    /// Install `factory` and create `count` inactive members with it
    ///
    /// Calling this twice appends twice. A missing factory is a
    /// configuration error and leaves the pool untouched, including any
    /// factory installed earlier.
    ///
    /// # Returns
    /// Member count after prewarming
    pub fn prewarm_with<F>(&self, factory: Option<F>, count: usize) -> Result<usize, PoolError>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let Some(factory) = factory else {
            self.metrics.record_configuration_error();
            error!(target: "pool", pool = %self.name, "factory is missing, cannot prewarm");
            return Err(PoolError::Configuration(format!(
                "pool '{}': factory is missing, cannot prewarm",
                self.name
            )));
        };

        Ok(self.install_and_prewarm(factory, count))
    }

    fn install_and_prewarm<F>(&self, factory: F, count: usize) -> usize
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let created = create_members(&factory, count);

        let mut state = self.state.lock();
        state.factory = Some(Box::new(factory));
        state.extend_inactive(created);
        self.metrics.record_prewarm(count);

        info!(target: "pool", pool = %self.name, count, members = state.members.len(), "prewarmed pool");
        state.members.len()
    }

    /// Create `count` inactive members with the installed factory
    ///
    /// # Returns
    /// Member count after prewarming
    pub fn prewarm(&self, count: usize) -> Result<usize, PoolError> {
        let mut state = self.state.lock();
        let Some(factory) = state.factory.as_ref() else {
            self.metrics.record_configuration_error();
            error!(target: "pool", pool = %self.name, "no factory installed, cannot prewarm");
            return Err(PoolError::Configuration(format!(
                "pool '{}': no factory installed, cannot prewarm",
                self.name
            )));
        };

        let created = create_members(&**factory, count);
        state.extend_inactive(created);
        self.metrics.record_prewarm(count);

        info!(target: "pool", pool = %self.name, count, members = state.members.len(), "prewarmed pool");
        Ok(state.members.len())
    }

    /// Hand out the earliest inactive member, or grow by one
    ///
    /// # Returns
    /// - `Ok(instance)` - member now marked active
    /// - `Err(PoolError::Configuration)` - every member is active and there
    ///   is no factory to create another
    pub fn acquire(&self) -> Result<Instance<T>, PoolError> {
        let mut state = self.state.lock();

        if let Some(position) = state.free.pop_first() {
            self.metrics.record_reuse();
            return Ok(state.members[position].clone());
        }

        let Some(factory) = state.factory.as_ref() else {
            self.metrics.record_configuration_error();
            error!(target: "pool", pool = %self.name, "no inactive member and no factory, cannot get instance");
            return Err(PoolError::Configuration(format!(
                "pool '{}': no inactive member and no factory",
                self.name
            )));
        };

        let instance = Instance::new(factory());
        state.track(instance.clone());
        self.metrics.record_overflow();

        warn!(
            target: "pool",
            pool = %self.name,
            members = state.members.len(),
            "all members active, created a new one"
        );
        Ok(instance)
    }

    /// Hand an instance back to the pool
    ///
    /// Accepts `Instance<T>` or `Option<Instance<T>>`. A tracked member is
    /// marked inactive (again, harmlessly, if it already was). An instance
    /// this pool never produced is adopted as a new inactive member.
    ///
    /// # Returns
    /// - `Ok(outcome)` - what happened to the instance
    /// - `Err(PoolError::InvalidArgument)` - no instance was given; nothing
    ///   changed
    pub fn release(
        &self,
        instance: impl Into<Option<Instance<T>>>,
    ) -> Result<ReleaseOutcome, PoolError> {
        let Some(instance) = instance.into() else {
            self.metrics.record_rejected_return();
            warn!(target: "pool", pool = %self.name, "tried to return a missing instance");
            return Err(PoolError::InvalidArgument(format!(
                "pool '{}': no instance to return",
                self.name
            )));
        };

        let mut state = self.state.lock();
        match state.index.get(&instance.key()).copied() {
            Some(position) => {
                if state.free.insert(position) {
                    self.metrics.record_return();
                    Ok(ReleaseOutcome::Released)
                } else {
                    self.metrics.record_double_return();
                    debug!(target: "pool", pool = %self.name, position, "member already inactive");
                    Ok(ReleaseOutcome::AlreadyInactive)
                }
            }
            None => {
                let position = state.track(instance);
                state.free.insert(position);
                self.metrics.record_adoption();

                warn!(
                    target: "pool",
                    pool = %self.name,
                    members = state.members.len(),
                    "returned instance was not from this pool, adopted it"
                );
                Ok(ReleaseOutcome::Adopted)
            }
        }
    }

    /// Total number of members (active and inactive)
    pub fn len(&self) -> usize {
        self.state.lock().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().members.is_empty()
    }

    pub fn active_count(&self) -> usize {
        let state = self.state.lock();
        state.members.len() - state.free.len()
    }

    pub fn inactive_count(&self) -> usize {
        self.state.lock().free.len()
    }

    /// Check whether `instance` is tracked by this pool
    pub fn contains(&self, instance: &Instance<T>) -> bool {
        self.state.lock().index.contains_key(&instance.key())
    }

    /// `Some(true)` if tracked and handed out, `None` if untracked
    pub fn is_active(&self, instance: &Instance<T>) -> Option<bool> {
        let state = self.state.lock();
        let position = *state.index.get(&instance.key())?;
        Some(!state.free.contains(&position))
    }

    /// Handles to every member, in insertion order
    pub fn members(&self) -> Vec<Instance<T>> {
        self.state.lock().members.clone()
    }

    pub fn metrics(&self) -> &PoolMetrics {
        &self.metrics
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.state.lock();
        PoolStats {
            name: self.name.clone(),
            members: state.members.len(),
            active: state.members.len() - state.free.len(),
            inactive: state.free.len(),
            has_factory: state.factory.is_some(),
            metrics: self.metrics.snapshot(),
        }
    }
}

impl<T> Default for InstancePool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for InstancePool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("InstancePool")
            .field("name", &self.name)
            .field("members", &state.members.len())
            .field("inactive", &state.free.len())
            .field("has_factory", &state.factory.is_some())
            .finish()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Acquire,
        /// Release the outstanding instance at this index (mod outstanding)
        Release(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![Just(Op::Acquire), any::<usize>().prop_map(Op::Release)]
    }

    proptest! {
        #[test]
        fn balanced_round_trip(prewarm in 0usize..8, ops in prop::collection::vec(op(), 0..64)) {
            let pool = InstancePool::with_capacity(prewarm, || 0u32);
            let mut outstanding: Vec<Instance<u32>> = Vec::new();
            let mut high_water = 0;

            for op in ops {
                match op {
                    Op::Acquire => {
                        outstanding.push(pool.acquire().unwrap());
                        high_water = high_water.max(outstanding.len());
                    }
                    Op::Release(i) if !outstanding.is_empty() => {
                        let instance = outstanding.swap_remove(i % outstanding.len());
                        prop_assert_eq!(pool.release(instance), Ok(ReleaseOutcome::Released));
                    }
                    Op::Release(_) => {}
                }
                prop_assert_eq!(pool.active_count(), outstanding.len());
            }

            for instance in outstanding.drain(..) {
                pool.release(instance).unwrap();
            }

            prop_assert_eq!(pool.active_count(), 0);
            prop_assert_eq!(pool.len(), prewarm.max(high_water));
        }

        #[test]
        fn outstanding_instances_are_distinct(prewarm in 0usize..8, gets in 1usize..32) {
            let pool = InstancePool::with_capacity(prewarm, || 0u8);
            let held: Vec<_> = (0..gets).map(|_| pool.acquire().unwrap()).collect();

            for (i, a) in held.iter().enumerate() {
                for b in &held[i + 1..] {
                    prop_assert!(!a.ptr_eq(b));
                }
            }
            prop_assert_eq!(pool.len(), prewarm.max(gets));
        }
    }
}

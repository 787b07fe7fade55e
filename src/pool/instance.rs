//! Shared handle to a pool member
//!
//! Pool membership is decided by handle identity, never by value equality.
//! Two handles are the same member only if they point at the same allocation.

use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::sync::Arc;

/// Cloneable handle to one pooled instance
///
/// The pool keeps its own handle to every member for its whole lifetime,
/// so a member's identity is never reused while the pool is alive. The
/// value sits behind a lock; the caller holding a checked-out member
/// mutates it through `lock`.
pub struct Instance<T> {
    inner: Arc<Mutex<T>>,
}

impl<T> Instance<T> {
    /// Wrap a value constructed outside any pool
    ///
    /// Returning such an instance to a pool adopts it.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(value)),
        }
    }

    /// Lock the value for reading or writing
    #[inline]
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock()
    }

    /// Run `f` with mutable access to the value
    #[inline]
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Identity key (address of the shared allocation)
    #[inline]
    pub(crate) fn key(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }

    /// Check whether two handles refer to the same member
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Clone for Instance<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> From<T> for Instance<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Instance<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Instance");
        s.field("key", &format_args!("{:#x}", self.key()));
        match self.inner.try_lock() {
            Some(value) => s.field("value", &*value),
            None => s.field("value", &format_args!("<locked>")),
        };
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_shares_identity() {
        let a = Instance::new(7u32);
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_equal_values_are_distinct_members() {
        let a = Instance::new(7u32);
        let b = Instance::new(7u32);
        assert_eq!(*a.lock(), *b.lock());
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn test_mutation_visible_through_clone() {
        let a = Instance::new(vec![0u8; 4]);
        let b = a.clone();

        a.lock().fill(42);
        assert_eq!(*b.lock(), vec![42u8; 4]);

        let len = b.with(|buf| {
            buf.push(1);
            buf.len()
        });
        assert_eq!(len, 5);
        assert_eq!(a.lock()[4], 1);
    }

    #[test]
    fn test_debug_while_locked() {
        let a = Instance::new(3u8);
        let _guard = a.lock();
        assert!(format!("{:?}", a).contains("<locked>"));
    }
}

//! Mutex-guarded value shared between threads.
//!
//! A `GuardedCell` couples a value with the lock that protects it, so the
//! value can only be reached while the lock is held. Access comes in two
//! shapes:
//!
//! - scoped: [`GuardedCell::lock`] returns a guard that releases on drop, and
//!   [`GuardedCell::with`] runs a closure inside one critical section. Use
//!   these whenever a read decides a write.
//! - convenience: [`GuardedCell::get`], [`GuardedCell::set`] and
//!   [`GuardedCell::replace`] each take and release the lock internally.
//!   `get` followed by `set` is two critical sections, not one.
//!
//! Locking the same cell twice from one thread is a programmer error and
//! deadlocks or aborts; it is never reported as a recoverable condition.

use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub struct GuardedCell<T> {
    value: Mutex<T>,
}

impl<T> GuardedCell<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Mutex::new(value),
        }
    }

    /// Acquire exclusive access. The lock is released when the guard drops,
    /// including while unwinding.
    ///
    /// A panic in another thread's critical section poisons the mutex; the
    /// poison is ignored here because writers only ever store whole values.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the value and return its result.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.lock();
        f(&mut guard)
    }

    /// Store `value`, dropping the previous one.
    pub fn set(&self, value: T) {
        *self.lock() = value;
    }

    /// Store `value` and return the previous one.
    pub fn replace(&self, value: T) -> T {
        std::mem::replace(&mut *self.lock(), value)
    }

    /// Consume the cell and return the value.
    pub fn into_inner(self) -> T {
        self.value
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> GuardedCell<T> {
    /// Copy of the current value.
    pub fn get(&self) -> T {
        self.lock().clone()
    }
}

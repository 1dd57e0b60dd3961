//! Shared/exclusive lock with writer reentrancy.
//!
//! Any number of readers may hold the lock at once as long as no writer is
//! active. The write side is exclusive, except that the thread currently
//! holding it may take further read or write access without blocking on
//! itself. Code running under the write lock can therefore call read-only
//! operations that lock internally.
//!
//! There is no fairness policy and no timeout. Waiters are woken all at once
//! and race for the lock, so a steady stream of readers can starve a waiting
//! writer indefinitely.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use tracing::error;

use crate::error::LockError;

#[derive(Debug, Default)]
struct LockState {
    readers: usize,
    writers: usize,
    active_writer: Option<ThreadId>,
}

impl LockState {
    fn is_active_writer(&self, id: ThreadId) -> bool {
        self.active_writer == Some(id)
    }
}

#[derive(Debug, Default)]
pub struct SharedExclusiveLock {
    state: Mutex<LockState>,
    changed: Condvar,
}

impl SharedExclusiveLock {
    pub fn new() -> Self {
        Self::default()
    }

    // The state mutex is never held while foreign code runs, so a poisoned
    // guard still holds consistent counters.
    fn state(&self) -> MutexGuard<'_, LockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(&self, guard: MutexGuard<'a, LockState>) -> MutexGuard<'a, LockState> {
        self.changed
            .wait(guard)
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks while another thread holds the write side.
    pub fn acquire_read(&self) {
        let me = thread::current().id();
        let mut state = self.state();
        while state.writers > 0 && !state.is_active_writer(me) {
            state = self.wait(state);
        }
        state.readers += 1;
    }

    pub fn release_read(&self) -> Result<(), LockError> {
        let mut state = self.state();
        if state.readers == 0 {
            return Err(LockError::State("readers"));
        }
        state.readers -= 1;
        if state.readers == 0 {
            self.changed.notify_all();
        }
        Ok(())
    }

    /// Blocks while any reader or another writer is active. The active writer
    /// re-enters without blocking.
    pub fn acquire_write(&self) {
        let me = thread::current().id();
        let mut state = self.state();
        while (state.readers > 0 || state.writers > 0) && !state.is_active_writer(me) {
            state = self.wait(state);
        }
        state.writers += 1;
        state.active_writer = Some(me);
    }

    pub fn release_write(&self) -> Result<(), LockError> {
        let mut state = self.state();
        if state.writers == 0 {
            return Err(LockError::State("writers"));
        }
        if !state.is_active_writer(thread::current().id()) {
            return Err(LockError::Ownership);
        }
        state.writers -= 1;
        if state.writers == 0 {
            state.active_writer = None;
            self.changed.notify_all();
        }
        Ok(())
    }

    /// Acquires the read side and releases it when the guard is dropped.
    pub fn read(&self) -> ReadGuard<'_> {
        self.acquire_read();
        ReadGuard { lock: self }
    }

    /// Acquires the write side and releases it when the guard is dropped.
    pub fn write(&self) -> WriteGuard<'_> {
        self.acquire_write();
        WriteGuard {
            lock: self,
            _not_send: std::marker::PhantomData,
        }
    }

    pub fn readers(&self) -> usize {
        self.state().readers
    }

    pub fn writers(&self) -> usize {
        self.state().writers
    }

    pub fn is_active_writer(&self) -> bool {
        self.state().is_active_writer(thread::current().id())
    }
}

#[must_use = "the read lock is released as soon as the guard is dropped"]
pub struct ReadGuard<'a> {
    lock: &'a SharedExclusiveLock,
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.lock.release_read() {
            error!("failed to release read lock: {e}");
        }
    }
}

/// Not `Send`: the write side must be released by the thread that took it.
#[must_use = "the write lock is released as soon as the guard is dropped"]
pub struct WriteGuard<'a> {
    lock: &'a SharedExclusiveLock,
    _not_send: std::marker::PhantomData<*const ()>,
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.lock.release_write() {
            error!("failed to release write lock: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_track_nested_acquisition() {
        let lock = SharedExclusiveLock::new();
        lock.acquire_write();
        lock.acquire_write();
        lock.acquire_read();
        assert_eq!(lock.writers(), 2);
        assert_eq!(lock.readers(), 1);
        assert!(lock.is_active_writer());

        lock.release_read().unwrap();
        lock.release_write().unwrap();
        assert!(lock.is_active_writer());
        lock.release_write().unwrap();
        assert!(!lock.is_active_writer());
        assert_eq!(lock.writers(), 0);
    }

    #[test]
    fn test_release_without_hold_is_state_error() {
        let lock = SharedExclusiveLock::new();
        assert_eq!(lock.release_read(), Err(LockError::State("readers")));
        assert_eq!(lock.release_write(), Err(LockError::State("writers")));
    }

    #[test]
    fn test_guards_release_on_drop() {
        let lock = SharedExclusiveLock::new();
        {
            let _a = lock.read();
            let _b = lock.read();
            assert_eq!(lock.readers(), 2);
        }
        assert_eq!(lock.readers(), 0);
        {
            let _w = lock.write();
            let _r = lock.read();
            assert_eq!(lock.writers(), 1);
        }
        assert_eq!(lock.writers(), 0);
        assert_eq!(lock.readers(), 0);
    }
}

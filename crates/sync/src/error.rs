use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LockError {
    /// An unlock was requested on a side of the lock that is not held.
    #[error("lock state error: no {0} to unlock")]
    State(&'static str),
    /// The write side was released by a thread that does not hold it.
    #[error("ownership error: write lock released by a thread that is not the active writer")]
    Ownership,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("worker pool has been shut down")]
    ShutDown,
    #[error("worker pool has no running workers")]
    NoWorkers,
}

pub mod error;
pub mod lock;
pub mod pool;

pub use error::{LockError, PoolError};
pub use lock::{ReadGuard, SharedExclusiveLock, WriteGuard};
pub use pool::{DEFAULT_WORKERS, Task, WorkerPool};

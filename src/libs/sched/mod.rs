//! Process-local scheduling: the round's work list, the thread pool that
//! drains it, and the collection its results land in.
//!
//! # Core Components
//!
//! * [`TaskStorage`] - chunked dispenser of one round's tasks, leader only.
//! * [`TaskPool`] - fetch thread plus executors around a bounded FIFO queue.
//! * [`Processed`] - thread-safe collection of results.
//! * [`TaskSource`] / [`TaskRunner`] - how a pool gets work and what it does with it.
//!
//! Nothing here knows about the transport; round-level wiring lives in
//! [`crate::libs::round`].

mod pool;
mod processed;
mod storage;
mod task;

pub use pool::{TaskPool, TaskRunner, TaskSource};
pub use processed::Processed;
pub use storage::TaskStorage;
pub use task::{decode_tasks, encode_tasks, Chunk, Generator, Task, TERMINATE};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the data if another thread panicked with it.
/// The panic itself surfaces through the pool's join result.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

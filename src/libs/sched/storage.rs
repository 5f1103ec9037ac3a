use super::lock;
use super::task::{Chunk, Generator, Task};
use std::sync::{Condvar, Mutex, PoisonError};

struct State {
    tasks: Vec<Task>,
    terminated: usize,
}

/// The round's work list, dispensed in chunks to every process of the group.
///
/// Lives on the leader only. Chunks are taken from the tail of the list and
/// shrink towards the end of the round so that the last tasks spread over
/// all processes.
pub struct TaskStorage {
    state: Mutex<State>,
    drained: Condvar,
    process_count: usize,
    chunk_size: usize,
}

impl TaskStorage {
    /// ```
    /// use psma::libs::sched::{Chunk, Generator, TaskStorage};
    ///
    /// let storage = TaskStorage::new(Generator::Pairwise, 4, 2, 2);
    /// assert_eq!(storage.size(), 6);
    /// match storage.get_chunk() {
    ///     Chunk::Work(tasks) => assert_eq!(tasks.len(), 2),
    ///     Chunk::Terminate => unreachable!(),
    /// }
    /// assert_eq!(storage.size(), 4);
    /// ```
    pub fn new(
        generator: Generator,
        total_items: usize,
        process_count: usize,
        chunk_size: usize,
    ) -> Self {
        Self {
            state: Mutex::new(State {
                tasks: generator.tasks(total_items),
                terminated: 0,
            }),
            drained: Condvar::new(),
            process_count: process_count.max(1),
            chunk_size: chunk_size.max(1),
        }
    }

    /// Tasks not yet handed out
    pub fn size(&self) -> usize {
        lock(&self.state).tasks.len()
    }

    /// Hand out the next chunk.
    ///
    /// Once the list is empty every call returns [`Chunk::Terminate`] and
    /// counts the requester as done. The chunk is moved out of the tail into
    /// its own `Vec`, so the caller owns it while the lock is released.
    pub fn get_chunk(&self) -> Chunk {
        let mut state = lock(&self.state);
        let remaining = state.tasks.len();

        if remaining == 0 {
            state.terminated += 1;
            if state.terminated >= self.process_count {
                self.drained.notify_all();
            }
            return Chunk::Terminate;
        }

        let fair_share = remaining.div_ceil(self.process_count);
        let want = self.chunk_size.min(fair_share).min(remaining);
        let tasks = state.tasks.split_off(remaining - want);
        Chunk::Work(tasks)
    }

    /// Blocks until every process received its terminate chunk.
    pub fn wait_drained(&self) {
        let state = lock(&self.state);
        let _state = self
            .drained
            .wait_while(state, |s| s.terminated < self.process_count)
            .unwrap_or_else(PoisonError::into_inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn drain(storage: &TaskStorage) -> Vec<Vec<Task>> {
        let mut chunks = vec![];
        while let Chunk::Work(tasks) = storage.get_chunk() {
            chunks.push(tasks);
        }
        chunks
    }

    #[test]
    fn test_chunks_cover_all_tasks_once() {
        let storage = TaskStorage::new(Generator::Pairwise, 10, 3, 4);
        let chunks = drain(&storage);

        let total: usize = chunks.iter().map(|c| c.len()).sum();
        assert_eq!(total, 45);

        let distinct: BTreeSet<Task> = chunks.iter().flatten().copied().collect();
        assert_eq!(distinct.len(), 45);
        assert!(chunks.iter().all(|c| !c.is_empty() && c.len() <= 4));
    }

    #[test]
    fn test_chunks_shrink_at_the_end() {
        // 5 tasks over 2 processes with a large chunk size: ceil(5/2), ceil(2/2), ...
        let storage = TaskStorage::new(Generator::Iterative, 5, 2, 100);
        let sizes: Vec<usize> = drain(&storage).iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![3, 1, 1]);
    }

    #[test]
    fn test_zero_chunk_size() {
        let storage = TaskStorage::new(Generator::Iterative, 3, 1, 0);
        let sizes: Vec<usize> = drain(&storage).iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![1, 1, 1]);
    }

    #[test]
    fn test_drained_after_every_process_terminated() {
        let storage = TaskStorage::new(Generator::Pairwise, 1, 3, 1);
        assert_eq!(storage.size(), 0);

        crossbeam::scope(|s| {
            s.spawn(|_| storage.wait_drained());
            for _ in 0..3 {
                assert_eq!(storage.get_chunk(), Chunk::Terminate);
            }
        })
        .unwrap();
    }
}

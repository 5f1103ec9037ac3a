use super::lock;
use super::processed::Processed;
use super::task::{Chunk, Task, TERMINATE};
use crate::libs::error::RoundError;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, PoisonError};

/// Where the fetch thread gets its chunks from.
pub trait TaskSource: Send {
    fn fetch_next(&mut self) -> Result<Chunk, RoundError>;
}

/// What an executor does with one task.
pub trait TaskRunner: Sync {
    type Output: Send;

    fn execute_one(&self, task: Task) -> Result<Self::Output, RoundError>;
}

/// One fetch thread plus `nworkers` executors around a FIFO queue.
///
/// The fetch thread only asks for more work while the queue holds at most
/// `nworkers` tasks, so a process never hoards a large share of the round.
#[derive(Debug, Clone, Copy)]
pub struct TaskPool {
    nworkers: usize,
}

impl TaskPool {
    /// `nworkers` of 0 is treated as 1
    pub fn new(nworkers: usize) -> Self {
        Self {
            nworkers: nworkers.max(1),
        }
    }

    /// Run the pool until `source` terminates and the queue is empty.
    ///
    /// Every result goes into `processed`. A source error stops fetching; the
    /// first error of any thread is returned once all threads joined.
    pub fn run<S, R>(
        &self,
        source: S,
        runner: &R,
        processed: &Processed<R::Output>,
    ) -> Result<(), RoundError>
    where
        S: TaskSource,
        R: TaskRunner,
    {
        let nworkers = self.nworkers;
        let queue: Mutex<VecDeque<Task>> = Mutex::new(VecDeque::new());
        let not_empty = Condvar::new();
        let more_tasks = Condvar::new();
        let first_error: Mutex<Option<RoundError>> = Mutex::new(None);

        let record = |err: RoundError| {
            let mut slot = lock(&first_error);
            if slot.is_none() {
                *slot = Some(err);
            }
        };

        let (queue, not_empty, more_tasks, record) = (&queue, &not_empty, &more_tasks, &record);

        crossbeam::scope(|s| {
            //----------------------------
            // Fetch thread
            //----------------------------
            s.spawn(move |_| {
                let mut source = source;
                loop {
                    {
                        let guard = lock(queue);
                        let _guard = more_tasks
                            .wait_while(guard, |q| q.len() > nworkers)
                            .unwrap_or_else(PoisonError::into_inner);
                    }

                    match source.fetch_next() {
                        Ok(Chunk::Work(tasks)) => {
                            lock(queue).extend(tasks);
                            not_empty.notify_all();
                        }
                        Ok(Chunk::Terminate) => break,
                        Err(err) => {
                            record(err);
                            break;
                        }
                    }
                }

                // One sentinel per executor, behind whatever is still queued
                lock(queue).extend(std::iter::repeat(TERMINATE).take(nworkers));
                not_empty.notify_all();
            });

            //----------------------------
            // Executors
            //----------------------------
            for _ in 0..nworkers {
                s.spawn(move |_| loop {
                    let task = {
                        let guard = lock(queue);
                        let mut guard = not_empty
                            .wait_while(guard, |q| q.is_empty())
                            .unwrap_or_else(PoisonError::into_inner);
                        let task = guard.pop_front().unwrap_or(TERMINATE);
                        if guard.len() < nworkers {
                            more_tasks.notify_all();
                        }
                        task
                    };

                    if task.is_terminate() {
                        break;
                    }
                    match runner.execute_one(task) {
                        Ok(output) => processed.push(output),
                        Err(err) => record(err),
                    }
                });
            }
        })
        .map_err(|_| RoundError::WorkerPanicked)?;

        let first = lock(&first_error).take();
        match first {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

use super::Phase;
use crate::libs::error::RoundError;
use crate::libs::logger::{RankLogger, Verbosity};
use crate::libs::sched::{decode_tasks, Chunk, TaskSource, TaskStorage};
use crate::libs::transport::{ProcessGroup, Tag};

/// The leader's own pool reads the task storage directly.
pub struct LeaderSource<'a> {
    storage: &'a TaskStorage,
    phase: Phase,
    total_tasks: usize,
    logger: &'a RankLogger,
}

impl<'a> LeaderSource<'a> {
    pub fn new(
        storage: &'a TaskStorage,
        phase: Phase,
        total_tasks: usize,
        logger: &'a RankLogger,
    ) -> Self {
        Self {
            storage,
            phase,
            total_tasks,
            logger,
        }
    }
}

impl TaskSource for LeaderSource<'_> {
    fn fetch_next(&mut self) -> Result<Chunk, RoundError> {
        let chunk = self.storage.get_chunk();
        match &chunk {
            Chunk::Work(tasks) => {
                // The remaining count may already include other dispatches
                let done = self.total_tasks - self.storage.size();
                self.logger.log(
                    Verbosity::Dispatch,
                    false,
                    format_args!(
                        "{}, sent {} task(s) to 0; ({}/{})",
                        self.phase,
                        tasks.len(),
                        done,
                        self.total_tasks
                    ),
                );
            }
            Chunk::Terminate => self.logger.log(
                Verbosity::Dispatch,
                false,
                format_args!("{}, sent terminate task to 0", self.phase),
            ),
        }
        Ok(chunk)
    }
}

/// Peers ask the leader's coordinator for every chunk.
pub struct PeerSource<'a> {
    group: &'a ProcessGroup,
}

impl<'a> PeerSource<'a> {
    pub fn new(group: &'a ProcessGroup) -> Self {
        Self { group }
    }
}

impl TaskSource for PeerSource<'_> {
    fn fetch_next(&mut self) -> Result<Chunk, RoundError> {
        self.group.send(0, Tag::WorkRequest, vec![])?;
        let reply = self.group.recv(Some(0), &[Tag::Work, Tag::Terminate])?;
        match reply.tag {
            Tag::Work => Ok(Chunk::Work(decode_tasks(&reply.payload)?)),
            _ => Ok(Chunk::Terminate),
        }
    }
}

use super::Phase;
use crate::libs::error::RoundError;
use crate::libs::logger::{RankLogger, Verbosity};
use crate::libs::sched::{encode_tasks, Chunk, TaskStorage};
use crate::libs::transport::{ProcessGroup, Tag};

/// Leader thread answering the peers' work requests for one round.
///
/// Returns once every peer got its terminate chunk and the leader's own
/// pool has drained the storage too.
pub fn coordinate(
    group: &ProcessGroup,
    storage: &TaskStorage,
    phase: Phase,
    total_tasks: usize,
    logger: &RankLogger,
) -> Result<(), RoundError> {
    let mut terminated = 0;
    while terminated + 1 < group.size() {
        let request = group.recv(None, &[Tag::WorkRequest])?;
        let peer = request.source;

        match storage.get_chunk() {
            Chunk::Work(tasks) => {
                group.send(peer, Tag::Work, encode_tasks(&tasks)?)?;
                let done = total_tasks - storage.size();
                logger.log(
                    Verbosity::Dispatch,
                    false,
                    format_args!(
                        "{}, sent {} task(s) to {}; ({}/{})",
                        phase,
                        tasks.len(),
                        peer,
                        done,
                        total_tasks
                    ),
                );
            }
            Chunk::Terminate => {
                group.send(peer, Tag::Terminate, vec![])?;
                terminated += 1;
                logger.log(
                    Verbosity::Dispatch,
                    false,
                    format_args!("{}, sent terminate task to {}", phase, peer),
                );
            }
        }
    }

    storage.wait_drained();
    Ok(())
}

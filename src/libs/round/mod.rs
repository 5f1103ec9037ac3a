//! Distributed hierarchical alignment: one pairwise round, then one merge
//! round per iteration until a single cluster is left.
//!
//! Every rank of the group calls [`align_group`] with the same chains. Each
//! round the leader fills a [`TaskStorage`] and answers work requests from a
//! coordinator thread while all ranks drain it through their [`TaskPool`].
//! Between rounds the ranks meet on a barrier, elect the best pending
//! alignment of the whole group and drop everything it consumed.
//!
//! The live cluster list is replicated: every rank applies the same winner
//! and the same pruning, so the lists stay identical without being sent.

mod coordinator;
mod election;
mod runner;
mod source;

pub use coordinator::coordinate;
pub use election::{elect, prune, sync_pairscores};
pub use runner::{best_anchors, IterativeRunner, PairwiseRunner};
pub use source::{LeaderSource, PeerSource};

use crate::libs::alignment::{Alignment, AlignmentEngine, PdbChain};
use crate::libs::error::RoundError;
use crate::libs::logger::{RankLogger, Verbosity};
use crate::libs::pairscore::PairscoreTable;
use crate::libs::sched::{Generator, Processed, TaskPool, TaskRunner, TaskStorage};
use crate::libs::transport::ProcessGroup;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

/// Per-rank settings of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundConfig {
    /// Executor threads per rank
    pub threads: usize,
    /// Tasks per dispatch; 0 uses `threads`
    pub chunk_size: usize,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            chunk_size: 0,
        }
    }
}

impl RoundConfig {
    pub fn chunk(&self) -> usize {
        if self.chunk_size == 0 {
            self.threads.max(1)
        } else {
            self.chunk_size
        }
    }
}

/// Which round is running; used in log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Pairwise,
    Iteration(usize),
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Pairwise => write!(f, "pairwise"),
            Phase::Iteration(i) => write!(f, "iteration {}", i),
        }
    }
}

/// What one rank ends up with.
#[derive(Debug)]
pub struct GroupResult {
    /// The final alignment, on the leader only
    pub alignment: Option<Alignment>,
    /// Merged pairscores of the whole group
    pub pairscores: PairscoreTable,
    /// Live cluster count at the start and after every iteration
    pub live_history: Vec<usize>,
}

/// Align `chains` together with the rest of `group`.
///
/// Chain `i` gets id `i`. On failure the group is aborted so that no other
/// rank stays blocked on this one.
pub fn align_group(
    group: &ProcessGroup,
    engine: &dyn AlignmentEngine,
    chains: Vec<PdbChain>,
    config: &RoundConfig,
    logger: &RankLogger,
) -> Result<GroupResult, RoundError> {
    let result = run(group, engine, chains, config, logger);
    if let Err(err) = &result {
        log::error!("rank {}: {}", group.rank(), err);
        group.abort(&err.to_string());
    }
    result
}

fn run(
    group: &ProcessGroup,
    engine: &dyn AlignmentEngine,
    chains: Vec<PdbChain>,
    config: &RoundConfig,
    logger: &RankLogger,
) -> Result<GroupResult, RoundError> {
    if chains.is_empty() {
        return Err(RoundError::NoChains);
    }
    let start = Instant::now();

    let mut live: Vec<Alignment> = chains
        .into_iter()
        .enumerate()
        .map(|(i, chain)| engine.single_chain(chain, i as i32))
        .collect();
    let processed = Processed::new();
    let mut live_history = vec![live.len()];

    //----------------------------
    // Pairwise
    //----------------------------
    let timer = Instant::now();
    let scores = Mutex::new(PairscoreTable::new());
    let runner = PairwiseRunner::new(engine, &live, &scores, logger);
    run_round(
        group,
        Phase::Pairwise,
        Generator::Pairwise,
        live.len(),
        config,
        &runner,
        &processed,
        logger,
    )?;
    timed_barrier(group, Phase::Pairwise, logger)?;

    let mut scores = scores.into_inner().unwrap_or_else(PoisonError::into_inner);
    sync_pairscores(group, &mut scores)?;
    logger.log(
        Verbosity::Timings,
        true,
        format_args!("pairwise time: {:.5} seconds", timer.elapsed().as_secs_f64()),
    );

    //----------------------------
    // Iterations
    //----------------------------
    let mut iteration = 0;
    while live.len() > 1 {
        let timer = Instant::now();
        let phase = Phase::Iteration(iteration);

        let winner = elect(group, &processed, iteration)?;
        prune(&mut live, &processed, &winner);

        let runner = IterativeRunner::new(engine, &live, &winner, &scores, phase, logger);
        run_round(
            group,
            phase,
            Generator::Iterative,
            live.len(),
            config,
            &runner,
            &processed,
            logger,
        )?;
        timed_barrier(group, phase, logger)?;

        live.push(winner);
        live_history.push(live.len());
        logger.log(
            Verbosity::Timings,
            true,
            format_args!(
                "iteration {} time: {:.5} seconds",
                iteration,
                timer.elapsed().as_secs_f64()
            ),
        );
        iteration += 1;
    }

    logger.log(
        Verbosity::Timings,
        true,
        format_args!("alignment done in {:.5} seconds", start.elapsed().as_secs_f64()),
    );

    let alignment = if group.is_leader() { live.pop() } else { None };
    Ok(GroupResult {
        alignment,
        pairscores: scores,
        live_history,
    })
}

/// One distributed round: the leader also runs the coordinator next to its
/// own pool.
#[allow(clippy::too_many_arguments)]
fn run_round<R>(
    group: &ProcessGroup,
    phase: Phase,
    generator: Generator,
    total_items: usize,
    config: &RoundConfig,
    runner: &R,
    processed: &Processed<Alignment>,
    logger: &RankLogger,
) -> Result<(), RoundError>
where
    R: TaskRunner<Output = Alignment>,
{
    let pool = TaskPool::new(config.threads);

    if !group.is_leader() {
        return pool.run(PeerSource::new(group), runner, processed);
    }

    let storage = TaskStorage::new(generator, total_items, group.size(), config.chunk());
    let total_tasks = storage.size();

    crossbeam::scope(|s| {
        let coordinator = s.spawn(|_| coordinate(group, &storage, phase, total_tasks, logger));
        let pooled = pool.run(
            LeaderSource::new(&storage, phase, total_tasks, logger),
            runner,
            processed,
        );
        let coordinated = coordinator
            .join()
            .map_err(|_| RoundError::WorkerPanicked)?;
        pooled.and(coordinated)
    })
    .map_err(|_| RoundError::WorkerPanicked)?
}

fn timed_barrier(group: &ProcessGroup, phase: Phase, logger: &RankLogger) -> Result<(), RoundError> {
    let timer = Instant::now();
    group.barrier()?;
    logger.log(
        Verbosity::Detail,
        false,
        format_args!(
            "{}, waiting on barrier {:.5} seconds",
            phase,
            timer.elapsed().as_secs_f64()
        ),
    );
    Ok(())
}

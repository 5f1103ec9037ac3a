use super::Phase;
use crate::libs::alignment::{Alignment, AlignmentEngine};
use crate::libs::error::RoundError;
use crate::libs::logger::{RankLogger, Verbosity};
use crate::libs::pairscore::PairscoreTable;
use crate::libs::sched::{lock, Task, TaskRunner};
use std::sync::Mutex;
use std::time::Instant;

fn cluster(list: &[Alignment], index: i32) -> Result<&Alignment, RoundError> {
    usize::try_from(index)
        .ok()
        .and_then(|i| list.get(i))
        .ok_or(RoundError::UnknownCluster { index })
}

/// Merges two single-chain alignments and records the pair's score.
pub struct PairwiseRunner<'a> {
    engine: &'a dyn AlignmentEngine,
    singles: &'a [Alignment],
    scores: &'a Mutex<PairscoreTable>,
    logger: &'a RankLogger,
}

impl<'a> PairwiseRunner<'a> {
    /// `singles[i]` must hold chain `i`.
    pub fn new(
        engine: &'a dyn AlignmentEngine,
        singles: &'a [Alignment],
        scores: &'a Mutex<PairscoreTable>,
        logger: &'a RankLogger,
    ) -> Self {
        Self {
            engine,
            singles,
            scores,
            logger,
        }
    }
}

impl TaskRunner for PairwiseRunner<'_> {
    type Output = Alignment;

    fn execute_one(&self, task: Task) -> Result<Alignment, RoundError> {
        let start = Instant::now();
        let a = cluster(self.singles, task.a)?;
        let b = cluster(self.singles, task.b)?;

        let merged = self.engine.merge(a, b, 0, 0, 0);
        if !lock(self.scores).insert(task.a, task.b, merged.score) {
            return Err(RoundError::DuplicatePairscore {
                a: task.a,
                b: task.b,
            });
        }

        self.logger.log(
            Verbosity::Detail,
            false,
            format_args!(
                "{}, aligned {} {} in {:.5} seconds",
                Phase::Pairwise,
                task.a,
                task.b,
                start.elapsed().as_secs_f64()
            ),
        );
        Ok(merged)
    }
}

/// Chain pair with the highest positive pairscore between two alignments,
/// as indices into `a.chains` and `b.chains`. Falls back to `(0, 0)`.
pub fn best_anchors(a: &Alignment, b: &Alignment, scores: &PairscoreTable) -> (usize, usize) {
    let mut best = (0.0, 0, 0);
    for (j, ca) in a.chains.iter().enumerate() {
        for (k, cb) in b.chains.iter().enumerate() {
            if let Some(score) = scores.get(ca.id, cb.id) {
                if score > best.0 {
                    best = (score, j, k);
                }
            }
        }
    }
    (best.1, best.2)
}

/// Merges one live cluster with the round's winner.
pub struct IterativeRunner<'a> {
    engine: &'a dyn AlignmentEngine,
    live: &'a [Alignment],
    winner: &'a Alignment,
    scores: &'a PairscoreTable,
    phase: Phase,
    logger: &'a RankLogger,
}

impl<'a> IterativeRunner<'a> {
    pub fn new(
        engine: &'a dyn AlignmentEngine,
        live: &'a [Alignment],
        winner: &'a Alignment,
        scores: &'a PairscoreTable,
        phase: Phase,
        logger: &'a RankLogger,
    ) -> Self {
        Self {
            engine,
            live,
            winner,
            scores,
            phase,
            logger,
        }
    }
}

impl TaskRunner for IterativeRunner<'_> {
    type Output = Alignment;

    fn execute_one(&self, task: Task) -> Result<Alignment, RoundError> {
        let start = Instant::now();
        let al = cluster(self.live, task.a)?;

        let (anchor_a, anchor_b) = best_anchors(al, self.winner, self.scores);
        let merged = self.engine.merge(al, self.winner, anchor_a, anchor_b, 0);

        self.logger.log(
            Verbosity::Detail,
            false,
            format_args!(
                "{}, aligned {} in {:.5} seconds",
                self.phase,
                task.a,
                start.elapsed().as_secs_f64()
            ),
        );
        Ok(merged)
    }
}

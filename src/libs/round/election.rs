use crate::libs::alignment::Alignment;
use crate::libs::error::RoundError;
use crate::libs::pairscore::PairscoreTable;
use crate::libs::sched::Processed;
use crate::libs::transport::{ProcessGroup, Tag};
use crate::libs::wire;

/// Pick the best pending alignment of the whole group and give every rank
/// its own copy.
///
/// The holder removes it from its `processed`; every other rank decodes the
/// broadcast buffer.
pub fn elect(
    group: &ProcessGroup,
    processed: &Processed<Alignment>,
    iteration: usize,
) -> Result<Alignment, RoundError> {
    let local = processed.best(|al| al.score);
    let score = local.map_or(f64::NEG_INFINITY, |(_, score)| score);

    let (best, root) = group.reduce_max_loc(score)?;
    if best == f64::NEG_INFINITY {
        return Err(RoundError::NoCandidate { iteration });
    }

    if group.rank() == root {
        let winner = local
            .and_then(|(index, _)| processed.take(index))
            .ok_or(RoundError::NoCandidate { iteration })?;
        let buf = wire::encode(&winner)?;
        group.broadcast_buffer(root, buf)?;
        Ok(winner)
    } else {
        let buf = group.broadcast_buffer(root, vec![])?;
        Ok(wire::decode(&buf)?)
    }
}

/// Drop every live cluster and pending candidate that shares a chain with
/// `winner`. Returns how many of each were removed.
pub fn prune(
    live: &mut Vec<Alignment>,
    processed: &Processed<Alignment>,
    winner: &Alignment,
) -> (usize, usize) {
    let before = live.len();
    live.retain(|al| !al.shares_chain(winner));
    let dropped = processed.retain(|al| !al.shares_chain(winner));
    (before - live.len(), dropped)
}

/// Union of every rank's pairscore table, installed on every rank.
pub fn sync_pairscores(group: &ProcessGroup, table: &mut PairscoreTable) -> Result<(), RoundError> {
    if group.is_leader() {
        for _ in 1..group.size() {
            let msg = group.recv(None, &[Tag::Pairscores])?;
            table.merge_from(&PairscoreTable::decode(&msg.payload)?);
        }
        group.broadcast_buffer(0, table.encode()?)?;
    } else {
        group.send(0, Tag::Pairscores, table.encode()?)?;
        let buf = group.broadcast_buffer(0, vec![])?;
        *table = PairscoreTable::decode(&buf)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::alignment::{AlignmentEngine, PdbChain, UngappedEngine};
    use crate::libs::transport::LocalTransport;

    fn single(id: i32, seq: &[u8]) -> Alignment {
        UngappedEngine.single_chain(PdbChain::from_sequence(&format!("c{}", id), seq), id)
    }

    #[test]
    fn test_prune() {
        let engine = UngappedEngine;
        let mut live: Vec<Alignment> = (0..4).map(|i| single(i, b"MQIF")).collect();
        let winner = engine.merge(&live[0], &live[2], 0, 0, 0);

        let processed = Processed::new();
        processed.push(engine.merge(&live[0], &live[1], 0, 0, 0));
        processed.push(engine.merge(&live[1], &live[3], 0, 0, 0));
        processed.push(engine.merge(&live[2], &live[3], 0, 0, 0));

        assert_eq!(prune(&mut live, &processed, &winner), (2, 2));
        assert_eq!(
            live.iter().map(|al| al.chain_ids()[0]).collect::<Vec<_>>(),
            vec![1, 3]
        );
        assert_eq!(processed.into_inner()[0].chain_ids(), vec![1, 3]);
    }

    #[test]
    fn test_elect_across_ranks() {
        let results: Vec<Result<Alignment, RoundError>> = crossbeam::scope(|s| {
            let handles: Vec<_> = LocalTransport::group(3)
                .into_iter()
                .map(|t| {
                    s.spawn(move |_| {
                        let group = ProcessGroup::new(t);
                        let processed = Processed::new();
                        // Rank 1 holds the best candidate, rank 2 holds nothing
                        match group.rank() {
                            0 => processed.push(single(0, b"MQ")),
                            1 => {
                                let mut al = single(7, b"MQIFVK");
                                al.score = 12.0;
                                processed.push(single(1, b"M"));
                                processed.push(al);
                            }
                            _ => {}
                        }
                        let winner = elect(&group, &processed, 0);
                        if group.rank() == 1 {
                            assert_eq!(processed.len(), 1);
                        }
                        winner
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        })
        .unwrap();

        for result in results {
            let winner = result.unwrap();
            assert_eq!(winner.score, 12.0);
            assert_eq!(winner.chain_ids(), vec![7]);
        }
    }

    #[test]
    fn test_elect_without_candidates() {
        let group = ProcessGroup::new(LocalTransport::group(1).remove(0));
        let processed = Processed::new();
        assert!(matches!(
            elect(&group, &processed, 4),
            Err(RoundError::NoCandidate { iteration: 4 })
        ));
    }

    #[test]
    fn test_sync_pairscores() {
        let tables: Vec<PairscoreTable> = crossbeam::scope(|s| {
            let handles: Vec<_> = LocalTransport::group(3)
                .into_iter()
                .map(|t| {
                    s.spawn(move |_| {
                        let group = ProcessGroup::new(t);
                        let mut table = PairscoreTable::new();
                        let r = group.rank() as i32;
                        table.insert(r, r + 1, r as f64);
                        sync_pairscores(&group, &mut table).unwrap();
                        table
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        })
        .unwrap();

        for table in &tables {
            assert_eq!(table.len(), 3);
            assert_eq!(table.get(2, 1), Some(1.0));
        }
    }
}

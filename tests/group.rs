use psma::libs::alignment::{read_chains, Alignment, PdbChain, UngappedEngine};
use psma::libs::error::RoundError;
use psma::libs::logger::{RankLogger, Verbosity};
use psma::libs::round::{align_group, GroupResult, RoundConfig};
use psma::libs::transport::{LocalTransport, ProcessGroup};
use psma::libs::wire;

fn run_local(
    procs: usize,
    chains: Vec<PdbChain>,
    config: RoundConfig,
) -> Vec<Result<GroupResult, RoundError>> {
    let engine = UngappedEngine::new();
    crossbeam::scope(|s| {
        let handles: Vec<_> = LocalTransport::group(procs)
            .into_iter()
            .map(|t| {
                let (chains, engine, config) = (chains.clone(), &engine, &config);
                s.spawn(move |_| {
                    let group = ProcessGroup::new(t);
                    let logger = RankLogger::new(Verbosity::Detail, group.rank(), group.is_leader());
                    align_group(&group, engine, chains, config, &logger)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
    .unwrap()
}

fn four() -> Vec<PdbChain> {
    read_chains(&vec!["tests/psma/four.fa".to_string()]).unwrap()
}

fn sorted_ids(al: &Alignment) -> Vec<i32> {
    let mut ids = al.chain_ids();
    ids.sort_unstable();
    ids
}

#[test]
fn four_chains_two_procs() {
    let config = RoundConfig {
        threads: 1,
        chunk_size: 0,
    };
    let results: Vec<GroupResult> = run_local(2, four(), config)
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    for (rank, result) in results.iter().enumerate() {
        assert_eq!(result.pairscores.len(), 6);
        assert_eq!(result.live_history, vec![4, 3, 2, 1]);
        assert_eq!(result.alignment.is_some(), rank == 0);
    }

    let al = results[0].alignment.as_ref().unwrap();
    assert_eq!(sorted_ids(al), vec![0, 1, 2, 3]);
    assert_eq!(al.order.leaves().len(), 4);
    assert_eq!(al.residues.len(), 4);
    assert!(al.residues.iter().all(|r| r.res.len() == al.num_residues()));

    // Every rank agrees on the merged scores
    assert_eq!(results[0].pairscores, results[1].pairscores);
    assert_eq!(results[0].pairscores.get(1, 0), Some(76.0));

    // The final alignment survives a trip through the codec
    let buf = wire::encode(al).unwrap();
    assert_eq!(&wire::decode(&buf).unwrap(), al);
}

#[test]
fn more_procs_than_tasks() {
    let chains: Vec<PdbChain> = ["MQIFVK", "MQIFAK", "QIFVKT"]
        .iter()
        .enumerate()
        .map(|(i, s)| PdbChain::from_sequence(&format!("c{}", i), s.as_bytes()))
        .collect();
    let config = RoundConfig {
        threads: 3,
        chunk_size: 5,
    };

    let results = run_local(5, chains, config);
    for result in &results {
        let result = result.as_ref().unwrap();
        assert_eq!(result.pairscores.len(), 3);
        assert_eq!(result.live_history, vec![3, 2, 1]);
    }
    let leader = results[0].as_ref().unwrap();
    assert_eq!(sorted_ids(leader.alignment.as_ref().unwrap()), vec![0, 1, 2]);
}

#[test]
fn same_result_for_any_layout() {
    // Distinct scores everywhere, so the merge order is fixed
    let chains = four();
    let newick = |procs, threads, chunk_size| {
        let results = run_local(procs, chains.clone(), RoundConfig { threads, chunk_size });
        let al = results.into_iter().next().unwrap().unwrap().alignment.unwrap();
        al.order.to_newick(|id| id.to_string())
    };

    let reference = newick(1, 1, 1);
    assert_eq!(newick(2, 2, 1), reference);
    assert_eq!(newick(4, 1, 3), reference);
}

#[test]
fn every_rank_fails_together() {
    let results = run_local(3, vec![], RoundConfig::default());
    for result in results {
        assert!(result.is_err());
    }
}

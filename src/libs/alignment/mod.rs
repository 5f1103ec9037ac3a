//! The multiple-alignment object graph exchanged between processes.
//!
//! # Core Components
//!
//! * [`Alignment`] - scores, aligned blocks, per-column residue rows and the member chains.
//! * [`order`] - the arena-backed [`AssemblyOrder`] merge tree.
//! * [`pdb`] - the source-structure record of each chain.
//! * [`engine`] - the [`AlignmentEngine`] interface and the built-in [`UngappedEngine`].
//!
//! An `Alignment` is always owned by exactly one process. Broadcasting one
//! produces independent deep copies through the wire codec, never shared state.

pub mod engine;
pub mod order;
pub mod pdb;

pub use engine::{AlignmentEngine, UngappedEngine};
pub use order::{AssemblyNode, AssemblyOrder, NodeId, INTERNAL_ID};
pub use pdb::PdbChain;

use std::collections::BTreeSet;

/// Position of one residue after superposition.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResiduePosition {
    pub coords: [f64; 3],
    /// Residue index within its chain, -1 for a gap
    pub index: i32,
    pub has_coords: bool,
}

impl ResiduePosition {
    pub fn residue(index: i32) -> Self {
        Self {
            coords: [0.0; 3],
            index,
            has_coords: false,
        }
    }

    pub fn gap() -> Self {
        Self::residue(-1)
    }

    pub fn is_gap(&self) -> bool {
        self.index < 0
    }
}

/// A run of columns, inclusive on both ends, where every chain is aligned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlignedBlock {
    pub first: i32,
    pub last: i32,
}

/// One row of the alignment: a residue position per column, plus the chain weight.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightedResidues {
    pub res: Vec<ResiduePosition>,
    pub weight: f64,
}

/// A member chain with its own residue positions and source record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChainAlignment {
    pub id: i32,
    pub res: Vec<ResiduePosition>,
    pub pdb: PdbChain,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Alignment {
    pub score: f64,
    pub rmsd: f64,
    pub pvalue: f64,
    pub blocks: Vec<AlignedBlock>,
    /// One row per chain, all of `num_residues()` columns
    pub residues: Vec<WeightedResidues>,
    pub chains: Vec<ChainAlignment>,
    pub order: AssemblyOrder,
}

impl Alignment {
    pub fn num_chains(&self) -> usize {
        self.chains.len()
    }

    /// Number of alignment columns
    pub fn num_residues(&self) -> usize {
        self.residues.first().map_or(0, |r| r.res.len())
    }

    pub fn chain_ids(&self) -> Vec<i32> {
        self.chains.iter().map(|c| c.id).collect()
    }

    /// True if the two alignments have at least one member chain in common.
    pub fn shares_chain(&self, other: &Alignment) -> bool {
        let ids: BTreeSet<i32> = self.chains.iter().map(|c| c.id).collect();
        other.chains.iter().any(|c| ids.contains(&c.id))
    }

    /// Recompute `blocks` as the maximal column runs with no gap in any row.
    pub fn recompute_blocks(&mut self) {
        let ncol = self.num_residues();
        let mut blocks = vec![];
        let mut start: Option<usize> = None;
        for col in 0..=ncol {
            let full = col < ncol
                && !self.residues.is_empty()
                && self.residues.iter().all(|row| !row.res[col].is_gap());
            match (full, start) {
                (true, None) => start = Some(col),
                (false, Some(s)) => {
                    blocks.push(AlignedBlock {
                        first: s as i32,
                        last: col as i32 - 1,
                    });
                    start = None;
                }
                _ => {}
            }
        }
        self.blocks = blocks;
    }
}

/// Read every record of the FASTA files as one chain, in file order.
pub fn read_chains<'a, I>(infiles: I) -> anyhow::Result<Vec<PdbChain>>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut chains = vec![];
    for infile in infiles {
        let reader = crate::reader(infile)?;
        let mut fa_in = noodles_fasta::io::Reader::new(reader);

        for result in fa_in.records() {
            let record = result?;
            let name = String::from_utf8(record.name().into())?;
            let seq = record.sequence().as_ref().to_vec();
            chains.push(PdbChain::from_sequence(&name, &seq));
        }
    }

    Ok(chains)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(indices: &[i32]) -> WeightedResidues {
        WeightedResidues {
            res: indices.iter().map(|&i| ResiduePosition::residue(i)).collect(),
            weight: 1.0,
        }
    }

    #[test]
    fn test_recompute_blocks() {
        let mut al = Alignment {
            residues: vec![row(&[0, 1, 2, -1, 3, 4]), row(&[-1, 0, 1, 2, 3, 4])],
            ..Default::default()
        };
        al.recompute_blocks();
        assert_eq!(
            al.blocks,
            vec![
                AlignedBlock { first: 1, last: 2 },
                AlignedBlock { first: 4, last: 5 }
            ]
        );

        let mut empty = Alignment::default();
        empty.recompute_blocks();
        assert!(empty.blocks.is_empty());
    }

    #[test]
    fn test_shares_chain() {
        let chain = |id| ChainAlignment {
            id,
            ..Default::default()
        };
        let a = Alignment {
            chains: vec![chain(0), chain(3)],
            ..Default::default()
        };
        let b = Alignment {
            chains: vec![chain(1), chain(3)],
            ..Default::default()
        };
        let c = Alignment {
            chains: vec![chain(2)],
            ..Default::default()
        };
        assert!(a.shares_chain(&b));
        assert!(!a.shares_chain(&c));
        assert_eq!(a.chain_ids(), vec![0, 3]);
    }

    #[test]
    fn test_read_chains() {
        let infiles = vec!["tests/psma/four.fa".to_string()];
        let chains = read_chains(&infiles).unwrap();
        assert_eq!(chains.len(), 4);
        assert_eq!(chains[0].id_string, "1ubq_A");
        assert_eq!(chains[3].chain_name, b'B');
        assert_eq!(chains[3].len(), 73);
    }
}

use super::{Alignment, AssemblyOrder, ChainAlignment, PdbChain, ResiduePosition, WeightedResidues};

/// The alignment engine consumed by the scheduler.
///
/// Implementations must be deterministic: every process of a group computes
/// merges independently and the results have to agree.
pub trait AlignmentEngine: Send + Sync {
    /// Wrap one chain into a single-member alignment.
    fn single_chain(&self, chain: PdbChain, id: i32) -> Alignment;

    /// Align `b` onto `a`, seeded by the chain pair (`anchor_a`, `anchor_b`)
    /// (indices into each alignment's `chains`). `flags` are engine specific,
    /// 0 selects the defaults.
    fn merge(
        &self,
        a: &Alignment,
        b: &Alignment,
        anchor_a: usize,
        anchor_b: usize,
        flags: u32,
    ) -> Alignment;
}

/// Places two alignments on the best gap-free diagonal between their anchor
/// chains. The score is the number of identical residues on that diagonal.
#[derive(Debug, Default, Clone, Copy)]
pub struct UngappedEngine;

impl UngappedEngine {
    pub fn new() -> Self {
        Self
    }
}

// Residue letter of `chain` at alignment column `col`
fn letter(row: &[ResiduePosition], chain: &PdbChain, col: usize) -> Option<u8> {
    let pos = row.get(col)?;
    if pos.is_gap() {
        return None;
    }
    chain.seq.get(pos.index as usize).map(|b| b.to_ascii_uppercase())
}

/// Best diagonal: returns (offset, matches, overlap) where column `j` of `b`
/// sits on column `j + offset` of `a`. The first best offset wins.
fn best_diagonal(
    row_a: &[ResiduePosition],
    chain_a: &PdbChain,
    row_b: &[ResiduePosition],
    chain_b: &PdbChain,
) -> (isize, usize, usize) {
    let na = row_a.len() as isize;
    let nb = row_b.len() as isize;
    if na == 0 || nb == 0 {
        return (0, 0, 0);
    }

    let mut best = (0, 0, 0);
    let mut found = false;
    for offset in -(nb - 1)..na {
        let (mut matches, mut overlap) = (0, 0);
        for j in (-offset).max(0)..nb.min(na - offset) {
            let la = letter(row_a, chain_a, (j + offset) as usize);
            let lb = letter(row_b, chain_b, j as usize);
            if let (Some(x), Some(y)) = (la, lb) {
                overlap += 1;
                if x == y {
                    matches += 1;
                }
            }
        }
        if !found || matches > best.1 {
            best = (offset, matches, overlap);
            found = true;
        }
    }
    best
}

fn shifted(row: &WeightedResidues, shift: usize, ncol: usize) -> WeightedResidues {
    let mut res = Vec::with_capacity(ncol);
    res.resize(shift, ResiduePosition::gap());
    res.extend_from_slice(&row.res);
    res.resize(ncol, ResiduePosition::gap());
    WeightedResidues {
        res,
        weight: row.weight,
    }
}

impl AlignmentEngine for UngappedEngine {
    fn single_chain(&self, chain: PdbChain, id: i32) -> Alignment {
        let res: Vec<ResiduePosition> = (0..chain.len() as i32)
            .map(ResiduePosition::residue)
            .collect();

        let mut alignment = Alignment {
            score: 0.0,
            rmsd: 0.0,
            pvalue: 1.0,
            blocks: vec![],
            residues: vec![WeightedResidues {
                res: res.clone(),
                weight: 1.0,
            }],
            chains: vec![ChainAlignment { id, res, pdb: chain }],
            order: AssemblyOrder::leaf(id),
        };
        alignment.recompute_blocks();
        alignment
    }

    fn merge(
        &self,
        a: &Alignment,
        b: &Alignment,
        anchor_a: usize,
        anchor_b: usize,
        _flags: u32,
    ) -> Alignment {
        let empty_row: &[ResiduePosition] = &[];
        let empty_chain = PdbChain::default();

        let row_a = a.residues.get(anchor_a).map_or(empty_row, |r| r.res.as_slice());
        let row_b = b.residues.get(anchor_b).map_or(empty_row, |r| r.res.as_slice());
        let chain_a = a.chains.get(anchor_a).map_or(&empty_chain, |c| &c.pdb);
        let chain_b = b.chains.get(anchor_b).map_or(&empty_chain, |c| &c.pdb);

        let (offset, matches, overlap) = best_diagonal(row_a, chain_a, row_b, chain_b);

        let shift_a = (-offset).max(0) as usize;
        let shift_b = offset.max(0) as usize;
        let ncol = (a.num_residues() + shift_a).max(b.num_residues() + shift_b);

        let residues = a
            .residues
            .iter()
            .map(|row| shifted(row, shift_a, ncol))
            .chain(b.residues.iter().map(|row| shifted(row, shift_b, ncol)))
            .collect();

        let score = matches as f64;
        let rmsd = if overlap > 0 {
            (overlap - matches) as f64 / overlap as f64
        } else {
            0.0
        };

        let mut merged = Alignment {
            score,
            rmsd,
            pvalue: (-score / 10.0).exp(),
            blocks: vec![],
            residues,
            chains: a.chains.iter().chain(b.chains.iter()).cloned().collect(),
            order: AssemblyOrder::join(&a.order, &b.order),
        };
        merged.recompute_blocks();
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn single(name: &str, seq: &[u8], id: i32) -> Alignment {
        UngappedEngine.single_chain(PdbChain::from_sequence(name, seq), id)
    }

    #[test]
    fn test_single_chain() {
        let al = single("x_A", b"MKVL", 3);
        assert_eq!(al.num_chains(), 1);
        assert_eq!(al.num_residues(), 4);
        assert_eq!(al.order.leaves(), vec![3]);
        assert_eq!(al.blocks.len(), 1);
        assert_eq!(al.blocks[0].last, 3);
    }

    #[test]
    fn test_merge_identical() {
        let a = single("a", b"MQIFVKTL", 0);
        let b = single("b", b"MQIFVKTL", 1);
        let ab = UngappedEngine.merge(&a, &b, 0, 0, 0);

        assert_relative_eq!(ab.score, 8.0);
        assert_relative_eq!(ab.rmsd, 0.0);
        assert_eq!(ab.chain_ids(), vec![0, 1]);
        assert_eq!(ab.num_residues(), 8);
        assert_eq!(ab.order.leaves(), vec![0, 1]);
    }

    #[test]
    fn test_merge_shifted() {
        // b starts two residues into a
        let a = single("a", b"GGMQIFV", 0);
        let b = single("b", b"MQIFVKK", 1);
        let ab = UngappedEngine.merge(&a, &b, 0, 0, 0);

        assert_relative_eq!(ab.score, 5.0);
        assert_eq!(ab.num_residues(), 9);
        // a is unshifted, b gets two leading gaps
        assert!(ab.residues[1].res[0].is_gap());
        assert_eq!(ab.residues[1].res[2].index, 0);
        assert_eq!(ab.blocks.len(), 1);
        assert_eq!((ab.blocks[0].first, ab.blocks[0].last), (2, 6));

        // Score does not depend on the argument order
        let ba = UngappedEngine.merge(&b, &a, 0, 0, 0);
        assert_relative_eq!(ba.score, ab.score);
    }

    #[test]
    fn test_merge_empty_chain() {
        let a = single("a", b"", 0);
        let b = single("b", b"MK", 1);
        let ab = UngappedEngine.merge(&a, &b, 0, 0, 0);
        assert_relative_eq!(ab.score, 0.0);
        assert_eq!(ab.num_residues(), 2);
        assert_eq!(ab.num_chains(), 2);
    }
}

//! Flat byte encoding of a complete [`Alignment`] object graph.
//!
//! The layout is little-endian with no padding, and encode and decode walk
//! the fields in the same order:
//!
//! 1. header: `score`, `rmsd`, `pvalue` (`f64`), chain count, block count (`i32`)
//! 2. the aligned blocks
//! 3. the column count (`i32`), then per chain one row of residue positions
//!    and the row weight (`f64`)
//! 4. per chain: position count, chain id, the positions, the source record
//! 5. the assembly order: node count, then `{id, left, right}` per node,
//!    where a link is the child's index in the node array and 0 means none
//!
//! [`encoded_len`] is an exact dry run of [`encode`], so the output buffer is
//! allocated once. This module knows nothing about transports.

mod cursor;
mod error;
pub mod prim;
mod records;

pub use cursor::ByteReader;
pub use error::{WireError, WireResult};

use crate::libs::alignment::{
    AlignedBlock, Alignment, AssemblyNode, AssemblyOrder, ChainAlignment, PdbChain,
    ResiduePosition, WeightedResidues,
};
use prim::*;
use records::RESIDUE_POSITION_LEN;

const HEADER_LEN: usize = 3 * F64_LEN + 2 * I32_LEN;
const ORDER_NODE_LEN: usize = 3 * I32_LEN;

/// Exact size of `encode(alignment)`.
pub fn encoded_len(alignment: &Alignment) -> usize {
    let ncol = alignment.num_residues();

    let blocks = alignment.blocks.len() * 2 * I32_LEN;
    let rows = I32_LEN + alignment.residues.len() * (ncol * RESIDUE_POSITION_LEN + F64_LEN);
    let chains: usize = alignment
        .chains
        .iter()
        .map(|c| 2 * I32_LEN + c.res.len() * RESIDUE_POSITION_LEN + c.pdb.wire_len())
        .sum();
    let order = I32_LEN + alignment.order.len() * ORDER_NODE_LEN;

    HEADER_LEN + blocks + rows + chains + order
}

/// Serialize an alignment into a freshly allocated buffer.
///
/// ```
/// use psma::libs::alignment::{AlignmentEngine, PdbChain, UngappedEngine};
/// use psma::libs::wire;
///
/// let al = UngappedEngine.single_chain(PdbChain::from_sequence("1ubq_A", b"MQIF"), 0);
/// let buf = wire::encode(&al).unwrap();
/// assert_eq!(buf.len(), wire::encoded_len(&al));
/// assert_eq!(wire::decode(&buf).unwrap(), al);
/// ```
pub fn encode(alignment: &Alignment) -> WireResult<Vec<u8>> {
    let ncol = alignment.num_residues();
    if alignment.residues.len() != alignment.chains.len() {
        return Err(WireError::invalid_length("weighted residues"));
    }
    if alignment.residues.iter().any(|row| row.res.len() != ncol) {
        return Err(WireError::invalid_length("weighted residues"));
    }

    let size = encoded_len(alignment);
    let mut out = Vec::with_capacity(size);

    put_f64(&mut out, alignment.score);
    put_f64(&mut out, alignment.rmsd);
    put_f64(&mut out, alignment.pvalue);
    put_count(&mut out, alignment.chains.len(), "chain count")?;
    put_count(&mut out, alignment.blocks.len(), "block count")?;
    for block in &alignment.blocks {
        block.put(&mut out)?;
    }

    put_count(&mut out, ncol, "column count")?;
    for row in &alignment.residues {
        for pos in &row.res {
            pos.put(&mut out)?;
        }
        put_f64(&mut out, row.weight);
    }

    for chain in &alignment.chains {
        put_count(&mut out, chain.res.len(), "chain positions")?;
        put_i32(&mut out, chain.id);
        for pos in &chain.res {
            pos.put(&mut out)?;
        }
        chain.pdb.put(&mut out)?;
    }

    put_order(&mut out, &alignment.order)?;

    debug_assert_eq!(out.len(), size);
    Ok(out)
}

/// Rebuild an independent alignment from a buffer produced by [`encode`].
pub fn decode(buf: &[u8]) -> WireResult<Alignment> {
    let mut reader = ByteReader::new(buf);

    let score = take_f64(&mut reader, "score")?;
    let rmsd = take_f64(&mut reader, "rmsd")?;
    let pvalue = take_f64(&mut reader, "pvalue")?;
    let nchains = take_count(&mut reader, "chain count", 0)?;
    let nblocks = take_count(&mut reader, "block count", 2 * I32_LEN)?;
    let blocks: Vec<AlignedBlock> = take_n(&mut reader, nblocks)?;

    let ncol = take_count(&mut reader, "column count", 0)?;
    let row_len = ncol.saturating_mul(RESIDUE_POSITION_LEN).saturating_add(F64_LEN);
    if nchains.saturating_mul(row_len) > reader.remaining() {
        return Err(WireError::invalid_length("weighted residues"));
    }
    let mut residues = Vec::with_capacity(nchains);
    for _ in 0..nchains {
        let res: Vec<ResiduePosition> = take_n(&mut reader, ncol)?;
        let weight = take_f64(&mut reader, "row weight")?;
        residues.push(WeightedResidues { res, weight });
    }

    let mut chains = Vec::with_capacity(nchains);
    for _ in 0..nchains {
        let len = take_count(&mut reader, "chain positions", RESIDUE_POSITION_LEN)?;
        let id = take_i32(&mut reader, "chain id")?;
        let res: Vec<ResiduePosition> = take_n(&mut reader, len)?;
        let pdb = PdbChain::take(&mut reader)?;
        chains.push(ChainAlignment { id, res, pdb });
    }

    let order = take_order(&mut reader)?;
    reader.finish()?;

    Ok(Alignment {
        score,
        rmsd,
        pvalue,
        blocks,
        residues,
        chains,
        order,
    })
}

fn put_order(out: &mut Vec<u8>, order: &AssemblyOrder) -> WireResult<()> {
    put_count(out, order.len(), "order nodes")?;
    for node in order.nodes() {
        put_i32(out, node.id);
        for link in [node.left, node.right] {
            // 0 is the root, never a child, so it doubles as "no child"
            let index = link.unwrap_or(0);
            put_count(out, index, "order link")?;
        }
    }
    Ok(())
}

fn take_order(reader: &mut ByteReader<'_>) -> WireResult<AssemblyOrder> {
    let count = take_count(reader, "order nodes", ORDER_NODE_LEN)?;
    let mut nodes = Vec::with_capacity(count);
    for _ in 0..count {
        let id = take_i32(reader, "order node id")?;
        let left = take_count(reader, "order link", 0)?;
        let right = take_count(reader, "order link", 0)?;
        nodes.push(AssemblyNode {
            id,
            left: (left != 0).then_some(left),
            right: (right != 0).then_some(right),
        });
    }
    AssemblyOrder::from_nodes(nodes).map_err(|_| WireError::invalid_value("order link"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::alignment::pdb::*;
    use crate::libs::alignment::{AlignmentEngine, UngappedEngine, INTERNAL_ID};

    fn rich_chain(name: &str) -> PdbChain {
        let mut chain = PdbChain::from_sequence(name, b"MQIFVK");
        chain.cis_peps = vec![CisPep {
            res1: 1,
            res2: 2,
            angle: -3.5,
        }];
        chain.seq_advs = vec![SeqAdv {
            res: 4,
            code: *b"CONF",
        }];
        chain.dbrefs = vec![DbRef {
            start: 1,
            end: 6,
            db: *b"UNP\0\0\0\0\0",
        }];
        chain.ssbonds = vec![SsBond { res1: 0, res2: 5 }];
        chain.beta_sheets = vec![
            BetaSheet {
                id: *b"S1\0\0",
                strands: vec![
                    BetaSheetPair {
                        start: 0,
                        end: 2,
                        sense: 0,
                    },
                    BetaSheetPair {
                        start: 3,
                        end: 5,
                        sense: -1,
                    },
                ],
            },
            BetaSheet {
                id: *b"S2\0\0",
                strands: vec![],
            },
        ];
        chain.alpha_helices = vec![AlphaHelix {
            start: 1,
            end: 4,
            kind: 1,
        }];
        chain.hbonds = vec![HydrogenBond {
            donor: 1,
            acceptor: 4,
            energy: -2.25,
        }];
        chain.beta_pairs = vec![BetaPair {
            res1: 0,
            res2: 5,
            parallel: true,
        }];
        chain.atoms = vec![Atom {
            coords: [1.0, -2.0, 3.5],
            res: 0,
            name: *b"CA\0\0",
            element: b'C',
        }];
        chain.temp_atoms = 1;
        chain.temp_residues = vec![TempResidue {
            index: 0,
            name: *b"MET\0",
            first_atom: 0,
        }];
        chain.secondary_calculated = true;
        chain
    }

    fn merged() -> Alignment {
        let engine = UngappedEngine;
        let a = engine.single_chain(rich_chain("a_A"), 0);
        let b = engine.single_chain(PdbChain::from_sequence("b_B", b"IFVKTL"), 1);
        let c = engine.single_chain(PdbChain::from_sequence("c", b"MQ"), 2);
        let ab = engine.merge(&a, &b, 0, 0, 0);
        engine.merge(&ab, &c, 1, 0, 0)
    }

    #[test]
    fn test_round_trip() {
        let al = merged();
        let buf = encode(&al).unwrap();
        assert_eq!(buf.len(), encoded_len(&al));

        let back = decode(&buf).unwrap();
        assert_eq!(back, al);
        assert_eq!(back.chain_ids(), vec![0, 1, 2]);
        assert_eq!(back.order.leaves(), vec![0, 1, 2]);
    }

    #[test]
    fn test_round_trip_empty() {
        // No chains, no blocks, no tree
        let al = Alignment {
            score: f64::NEG_INFINITY,
            rmsd: 0.0,
            pvalue: 1.0,
            ..Default::default()
        };
        let buf = encode(&al).unwrap();
        assert_eq!(buf.len(), HEADER_LEN + I32_LEN + I32_LEN);
        assert_eq!(decode(&buf).unwrap(), al);

        // One chain with no residues and an empty source record
        let al = UngappedEngine.single_chain(PdbChain::default(), 9);
        assert_eq!(decode(&encode(&al).unwrap()).unwrap(), al);
    }

    #[test]
    fn test_links_survive() {
        let al = merged();
        let back = decode(&encode(&al).unwrap()).unwrap();

        for (before, after) in al.order.nodes().iter().zip(back.order.nodes()) {
            assert_eq!(before.id, after.id);
            for (l0, l1) in [(before.left, after.left), (before.right, after.right)] {
                assert_eq!(l0, l1);
                if let Some(child) = l1 {
                    assert_eq!(
                        back.order.get(child).unwrap().id,
                        al.order.get(child).unwrap().id
                    );
                }
            }
        }
        assert_eq!(back.order.get(0).unwrap().id, INTERNAL_ID);
    }

    #[test]
    fn test_decode_rejects() {
        let al = merged();
        let buf = encode(&al).unwrap();

        // Truncated
        assert!(decode(&buf[..buf.len() - 1]).is_err());

        // Trailing bytes
        let mut longer = buf.clone();
        longer.push(0);
        assert!(matches!(
            decode(&longer),
            Err(WireError::TrailingBytes { remaining: 1, .. })
        ));

        // The last i32 is the right link of the last node (a leaf): point it
        // back at the root
        let mut cyclic = buf.clone();
        let n = cyclic.len();
        cyclic[n - 4..].copy_from_slice(&1i32.to_le_bytes());
        assert_eq!(
            decode(&cyclic),
            Err(WireError::InvalidValue {
                field: "order link"
            })
        );
    }

    #[test]
    fn test_encode_rejects_ragged_rows() {
        let mut al = merged();
        al.residues[0].res.pop();
        assert!(encode(&al).is_err());

        let mut al = merged();
        al.chains[0].pdb.id_string = "bad\0id".to_string();
        assert_eq!(
            encode(&al),
            Err(WireError::InvalidValue { field: "id_string" })
        );
    }
}

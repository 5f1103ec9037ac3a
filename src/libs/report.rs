use crate::libs::alignment::Alignment;
use crate::libs::pairscore::PairscoreTable;

/// Summary header and the assembly order as a Newick tree.
///
/// Leaves are labelled with the chain's id string, falling back to the
/// numeric id.
///
/// ```
/// use psma::libs::alignment::{AlignmentEngine, PdbChain, UngappedEngine};
/// use psma::libs::report::format_alignment;
///
/// let engine = UngappedEngine;
/// let a = engine.single_chain(PdbChain::from_sequence("1ubq_A", b"MQIF"), 0);
/// let b = engine.single_chain(PdbChain::from_sequence("1ubi_A", b"MQIF"), 1);
/// let out = format_alignment(&engine.merge(&a, &b, 0, 0, 0));
/// assert!(out.starts_with("#score\t4.00000\n"));
/// assert!(out.ends_with("#chains\t2\n(1ubq_A,1ubi_A);\n"));
/// ```
pub fn format_alignment(al: &Alignment) -> String {
    let newick = al.order.to_newick(|id| chain_label(al, id));

    let mut out = String::new();
    out += &format!("#score\t{:.5}\n", al.score);
    out += &format!("#rmsd\t{:.5}\n", al.rmsd);
    out += &format!("#pvalue\t{:.5e}\n", al.pvalue);
    out += &format!("#chains\t{}\n", al.num_chains());
    out += &format!("{}\n", newick);
    out
}

fn chain_label(al: &Alignment, id: i32) -> String {
    al.chains
        .iter()
        .find(|c| c.id == id)
        .map(|c| c.pdb.id_string.clone())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| id.to_string())
}

/// `name_a\tname_b\tscore` lines ordered by chain id; `names[i]` is the
/// name of chain `i`.
pub fn format_pairscores(table: &PairscoreTable, names: &[String]) -> String {
    let name = |id: i32| {
        usize::try_from(id)
            .ok()
            .and_then(|i| names.get(i))
            .cloned()
            .unwrap_or_else(|| id.to_string())
    };

    table
        .iter_sorted()
        .map(|(a, b, score)| format!("{}\t{}\t{}\n", name(a), name(b), score))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::alignment::{AlignmentEngine, PdbChain, UngappedEngine};

    #[test]
    fn test_format_pairscores() {
        let mut table = PairscoreTable::new();
        table.insert(2, 0, 3.0);
        table.insert(1, 0, 7.5);
        table.insert(9, 1, 1.0);
        let names = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        assert_eq!(
            format_pairscores(&table, &names),
            "a\tb\t7.5\na\tc\t3\nb\t9\t1\n"
        );
    }

    #[test]
    fn test_unnamed_leaf() {
        let al = UngappedEngine.single_chain(PdbChain::default(), 4);
        let out = format_alignment(&al);
        assert!(out.ends_with("#chains\t1\n4;\n"));
    }
}

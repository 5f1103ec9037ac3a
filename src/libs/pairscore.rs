use crate::libs::wire::prim::*;
use crate::libs::wire::{ByteReader, WireResult};
use fxhash::FxHashMap;
use itertools::Itertools;
use std::collections::hash_map::Entry;

/// Pairwise alignment scores keyed by the unordered pair of chain ids.
///
/// ```
/// use psma::libs::pairscore::PairscoreTable;
///
/// let mut table = PairscoreTable::new();
/// assert!(table.insert(3, 1, 42.0));
/// assert_eq!(table.get(1, 3), Some(42.0));
/// // Scored pairs are never overwritten
/// assert!(!table.insert(1, 3, 0.0));
/// assert_eq!(table.get(3, 1), Some(42.0));
/// ```
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PairscoreTable {
    scores: FxHashMap<(i32, i32), f64>,
}

const ENTRY_LEN: usize = 2 * I32_LEN + F64_LEN;

fn key(a: i32, b: i32) -> (i32, i32) {
    (a.min(b), a.max(b))
}

impl PairscoreTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the score of `(a, b)`. Returns false, leaving the table
    /// untouched, if the pair already has a score.
    pub fn insert(&mut self, a: i32, b: i32, score: f64) -> bool {
        match self.scores.entry(key(a, b)) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(score);
                true
            }
        }
    }

    pub fn get(&self, a: i32, b: i32) -> Option<f64> {
        self.scores.get(&key(a, b)).copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Union with another table; existing entries win.
    pub fn merge_from(&mut self, other: &PairscoreTable) {
        for (&(a, b), &score) in &other.scores {
            self.insert(a, b, score);
        }
    }

    /// Entries as `(min, max, score)`, ordered by the pair.
    pub fn iter_sorted(&self) -> impl Iterator<Item = (i32, i32, f64)> + '_ {
        self.scores
            .iter()
            .sorted_by_key(|(k, _)| **k)
            .map(|(&(a, b), &s)| (a, b, s))
    }

    /// Count-prefixed `{a, b, score}` entries in pair order.
    pub fn encode(&self) -> WireResult<Vec<u8>> {
        let mut out = Vec::with_capacity(I32_LEN + self.len() * ENTRY_LEN);
        put_count(&mut out, self.len(), "pairscores")?;
        for (a, b, score) in self.iter_sorted() {
            put_i32(&mut out, a);
            put_i32(&mut out, b);
            put_f64(&mut out, score);
        }
        Ok(out)
    }

    pub fn decode(buf: &[u8]) -> WireResult<Self> {
        let mut reader = ByteReader::new(buf);
        let count = take_count(&mut reader, "pairscores", ENTRY_LEN)?;
        let mut table = Self::new();
        for _ in 0..count {
            let a = take_i32(&mut reader, "pairscore")?;
            let b = take_i32(&mut reader, "pairscore")?;
            let score = take_f64(&mut reader, "pairscore")?;
            table.insert(a, b, score);
        }
        reader.finish()?;
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_existing() {
        let mut left = PairscoreTable::new();
        left.insert(0, 1, 5.0);
        left.insert(2, 0, 3.0);

        let mut right = PairscoreTable::new();
        right.insert(1, 0, 99.0);
        right.insert(2, 1, 4.0);

        left.merge_from(&right);
        assert_eq!(left.len(), 3);
        assert_eq!(left.get(0, 1), Some(5.0));
        assert_eq!(left.get(1, 2), Some(4.0));
        assert_eq!(left.get(3, 0), None);
    }

    #[test]
    fn test_transfer() {
        let mut table = PairscoreTable::new();
        table.insert(3, 2, 1.5);
        table.insert(1, 0, -2.0);
        table.insert(2, 0, 0.25);

        let buf = table.encode().unwrap();
        assert_eq!(buf.len(), 4 + 3 * ENTRY_LEN);
        let back = PairscoreTable::decode(&buf).unwrap();
        assert_eq!(back, table);
        assert_eq!(
            back.iter_sorted().collect::<Vec<_>>(),
            vec![(0, 1, -2.0), (0, 2, 0.25), (2, 3, 1.5)]
        );

        assert!(PairscoreTable::decode(&buf[..buf.len() - 1]).is_err());
        assert_eq!(
            PairscoreTable::decode(&PairscoreTable::new().encode().unwrap()).unwrap(),
            PairscoreTable::new()
        );
    }
}

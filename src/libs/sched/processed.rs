use super::lock;
use std::sync::Mutex;

/// Results produced by one process's executors.
///
/// Executors only append. Picking and pruning happen between rounds, when
/// the pool is idle.
#[derive(Debug)]
pub struct Processed<T> {
    items: Mutex<Vec<T>>,
}

impl<T> Default for Processed<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Processed<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(vec![]),
        }
    }

    pub fn push(&self, item: T) {
        lock(&self.items).push(item);
    }

    pub fn len(&self) -> usize {
        lock(&self.items).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index and key of the highest-keyed item; the first one wins a tie.
    /// A NaN key never beats a number.
    ///
    /// ```
    /// use psma::libs::sched::Processed;
    ///
    /// let processed = Processed::new();
    /// for x in [1.0, 4.0, 2.0, 4.0] {
    ///     processed.push(x);
    /// }
    /// assert_eq!(processed.best(|x| *x), Some((1, 4.0)));
    /// ```
    pub fn best<F>(&self, key: F) -> Option<(usize, f64)>
    where
        F: Fn(&T) -> f64,
    {
        let items = lock(&self.items);
        let mut best: Option<(usize, f64)> = None;
        for (i, item) in items.iter().enumerate() {
            let k = key(item);
            let wins = match best {
                None => true,
                Some((_, b)) => k > b || (b.is_nan() && !k.is_nan()),
            };
            if wins {
                best = Some((i, k));
            }
        }
        best
    }

    /// Remove and return the item at `index`; the last item takes its place.
    pub fn take(&self, index: usize) -> Option<T> {
        let mut items = lock(&self.items);
        if index < items.len() {
            Some(items.swap_remove(index))
        } else {
            None
        }
    }

    /// Keep only the items matching `keep`; returns how many were dropped.
    pub fn retain<F>(&self, keep: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let mut items = lock(&self.items);
        let before = items.len();
        items.retain(keep);
        before - items.len()
    }

    pub fn into_inner(self) -> Vec<T> {
        self.items
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_and_take() {
        let processed = Processed::new();
        assert_eq!(processed.best(|x: &f64| *x), None);

        for x in [3.0, f64::NEG_INFINITY, 7.5, 7.5, 1.0] {
            processed.push(x);
        }
        let (index, score) = processed.best(|x| *x).unwrap();
        assert_eq!((index, score), (2, 7.5));

        assert_eq!(processed.take(index), Some(7.5));
        // 1.0 moved into the hole
        assert_eq!(processed.into_inner(), vec![3.0, f64::NEG_INFINITY, 1.0, 7.5]);
    }

    #[test]
    fn test_best_skips_nan() {
        let processed = Processed::new();
        processed.push(5.0);
        processed.push(f64::NAN);
        assert_eq!(processed.best(|x| *x), Some((0, 5.0)));

        let processed = Processed::new();
        for x in [f64::NAN, 2.0, f64::NAN, 3.0] {
            processed.push(x);
        }
        assert_eq!(processed.best(|x| *x), Some((3, 3.0)));

        let processed = Processed::new();
        processed.push(f64::NAN);
        let (index, score) = processed.best(|x| *x).unwrap();
        assert_eq!(index, 0);
        assert!(score.is_nan());
    }

    #[test]
    fn test_retain() {
        let processed = Processed::new();
        for x in 0..10 {
            processed.push(x);
        }
        assert_eq!(processed.retain(|x| x % 3 != 0), 4);
        assert_eq!(processed.len(), 6);
        assert_eq!(processed.take(100), None);
    }

    #[test]
    fn test_concurrent_push() {
        let processed = Processed::new();
        crossbeam::scope(|s| {
            for t in 0..4 {
                let processed = &processed;
                s.spawn(move |_| {
                    for i in 0..100 {
                        processed.push(t * 100 + i);
                    }
                });
            }
        })
        .unwrap();

        let mut items = processed.into_inner();
        items.sort_unstable();
        assert_eq!(items, (0..400).collect::<Vec<_>>());
    }
}

use crate::dataset::Dataset;


/// A multiset of observation indices.
///
/// Each entry is a pair `(row, multiplicity)` sorted by `row`.
/// An observation drawn `k` times by a bootstrap has multiplicity `k`
/// and contributes its weight `k` times.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObservationSubset {
    entries: Vec<(usize, usize)>,
}


impl ObservationSubset {
    /// Construct an empty subset.
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }


    /// Construct a subset holding every row in `0..n_sample` once.
    pub fn all(n_sample: usize) -> Self {
        Self { entries: (0..n_sample).map(|i| (i, 1)).collect() }
    }


    /// Construct a subset from rows, possibly repeated.
    pub fn from_rows<I>(rows: I) -> Self
        where I: IntoIterator<Item = usize>
    {
        let mut rows = rows.into_iter().collect::<Vec<_>>();
        rows.sort_unstable();

        let mut entries: Vec<(usize, usize)> = Vec::with_capacity(rows.len());
        for row in rows {
            match entries.last_mut() {
                Some((last, count)) if *last == row => { *count += 1; },
                _ => { entries.push((row, 1)); },
            }
        }
        Self { entries }
    }


    /// Construct a subset from per-row multiplicities.
    /// Rows with multiplicity `0` are absent.
    pub fn from_counts(counts: &[usize]) -> Self {
        let entries = counts.iter()
            .copied()
            .enumerate()
            .filter(|(_, k)| *k > 0)
            .collect();
        Self { entries }
    }


    /// Appends a row that is larger than every row already present.
    pub(crate) fn push(&mut self, row: usize, multiplicity: usize) {
        debug_assert!(self.entries.last().map_or(true, |(r, _)| *r < row));
        self.entries.push((row, multiplicity));
    }


    /// Number of distinct rows.
    pub fn len(&self) -> usize {
        self.entries.len()
    }


    /// Returns `true` if no row is present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }


    /// Number of rows counted with multiplicity (the in-bag count).
    pub fn size(&self) -> usize {
        self.entries.iter().map(|(_, k)| k).sum()
    }


    /// Iterator over `(row, multiplicity)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.entries.iter().copied()
    }


    /// Iterator over the distinct rows.
    pub fn rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|(i, _)| *i)
    }


    /// Returns the multiplicity of `row`, `0` when absent.
    pub fn multiplicity(&self, row: usize) -> usize {
        self.entries.binary_search_by_key(&row, |(i, _)| *i)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0)
    }


    /// Total weight per class over this subset,
    /// each row counted with its multiplicity.
    pub fn class_weights(&self, dataset: &Dataset) -> Vec<f64> {
        (0..dataset.n_class())
            .map(|c| {
                self.entries.iter()
                    .map(|&(i, k)| k as f64 * dataset.weight(c, i))
                    .sum::<f64>()
            })
            .collect()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_01() {
        let subset = ObservationSubset::from_rows([3, 1, 3, 0, 3]);
        let res = subset.iter().collect::<Vec<_>>();
        let exp = vec![(0, 1), (1, 1), (3, 3)];
        assert_eq!(exp, res, "expected {exp:?}, got {res:?}.");

        let res = (subset.len(), subset.size());
        let exp = (3, 5);
        assert_eq!(exp, res, "expected {exp:?}, got {res:?}.");
    }

    #[test]
    fn test_from_counts_01() {
        let subset = ObservationSubset::from_counts(&[0, 2, 0, 1]);
        let res = subset.iter().collect::<Vec<_>>();
        let exp = vec![(1, 2), (3, 1)];
        assert_eq!(exp, res, "expected {exp:?}, got {res:?}.");
    }

    #[test]
    fn test_multiplicity_01() {
        let subset = ObservationSubset::from_rows([2, 2, 5]);
        let res = (subset.multiplicity(2), subset.multiplicity(4));
        let exp = (2, 0);
        assert_eq!(exp, res, "expected {exp:?}, got {res:?}.");
    }
}

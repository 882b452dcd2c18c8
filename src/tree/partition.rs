use crate::dataset::FeatureMatrix;
use super::{
    subset::ObservationSubset,
    types::{LeftRight, Splitter},
};


/// Partition `subset` by `splitter`:
/// `value <= threshold` goes left, the rest goes right.
///
/// Each row keeps its full multiplicity in the child it is sent to.
pub fn partition(
    matrix: &FeatureMatrix<'_>,
    subset: &ObservationSubset,
    splitter: &Splitter,
) -> (ObservationSubset, ObservationSubset)
{
    let mut left = ObservationSubset::new();
    let mut right = ObservationSubset::new();

    for (i, k) in subset.iter() {
        match splitter.split(matrix, i) {
            LeftRight::Left => { left.push(i, k); },
            LeftRight::Right => { right.push(i, k); },
        }
    }
    (left, right)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_01() {
        let column = [0.5, 2.0, 1.0, 3.0];
        let matrix = FeatureMatrix::new(vec![&column[..]]);
        let subset = ObservationSubset::from_rows([0, 1, 1, 2, 3, 3, 3]);
        let splitter = Splitter::new("x", 0, 1.0);

        let (left, right) = partition(&matrix, &subset, &splitter);

        let res = left.iter().collect::<Vec<_>>();
        let exp = vec![(0, 1), (2, 1)];
        assert_eq!(exp, res, "expected {exp:?}, got {res:?}.");

        let res = right.iter().collect::<Vec<_>>();
        let exp = vec![(1, 2), (3, 3)];
        assert_eq!(exp, res, "expected {exp:?}, got {res:?}.");
    }
}

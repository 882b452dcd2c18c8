use serde::{Serialize, Deserialize};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{ForestError, Result};


/// True/false positive counts of a single class.
///
/// `true_positive` counts observations of the class predicted as the class.
/// `false_positive` counts observations of other classes
/// predicted as the class.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfusionEntry {
    /// Correct predictions of this class.
    pub true_positive: f64,
    /// Observations of another class predicted as this class.
    pub false_positive: f64,
}


/// A confusion matrix over named classes.
///
/// Cells are indexed by (actual class, predicted class)
/// and hold (weighted) observation counts.
/// Classes iterate in lexicographic order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    classes: BTreeSet<String>,
    cells: BTreeMap<String, BTreeMap<String, f64>>,
}


impl ConfusionMatrix {
    /// Construct an all-zero matrix over `classes`.
    pub fn new<S: AsRef<str>>(classes: &[S]) -> Self {
        let classes = classes.iter()
            .map(|c| c.as_ref().to_string())
            .collect();
        Self { classes, cells: BTreeMap::new(), }
    }


    /// Add `weight` to the cell `(actual, predicted)`.
    /// Unknown classes are registered.
    pub fn record(&mut self, actual: &str, predicted: &str, weight: f64) {
        self.classes.insert(actual.to_string());
        self.classes.insert(predicted.to_string());
        *self.cells.entry(actual.to_string())
            .or_default()
            .entry(predicted.to_string())
            .or_insert(0.0) += weight;
    }


    /// Add every cell of `other` to this matrix.
    pub fn merge(&mut self, other: &Self) {
        self.classes.extend(other.classes.iter().cloned());
        for (actual, row) in &other.cells {
            for (predicted, &w) in row {
                self.record(actual, predicted, w);
            }
        }
    }


    /// Returns the classes in lexicographic order.
    pub fn classes(&self) -> impl Iterator<Item = &str> + '_ {
        self.classes.iter().map(String::as_str)
    }


    /// Returns the number of classes.
    pub fn n_class(&self) -> usize {
        self.classes.len()
    }


    /// Returns the cell `(actual, predicted)`.
    pub fn count(&self, actual: &str, predicted: &str) -> f64 {
        self.cells.get(actual)
            .and_then(|row| row.get(predicted))
            .copied()
            .unwrap_or(0.0)
    }


    /// Observations of `class` predicted as `class`.
    pub fn true_positive(&self, class: &str) -> f64 {
        self.count(class, class)
    }


    /// Observations of other classes predicted as `class`.
    pub fn false_positive(&self, class: &str) -> f64 {
        self.cells.iter()
            .filter(|(actual, _)| actual.as_str() != class)
            .filter_map(|(_, row)| row.get(class))
            .sum()
    }


    /// Observations of `class` predicted as another class.
    pub fn false_negative(&self, class: &str) -> f64 {
        self.class_total(class) - self.true_positive(class)
    }


    /// Observations whose actual class is `class`.
    pub fn class_total(&self, class: &str) -> f64 {
        self.cells.get(class)
            .map(|row| row.values().sum())
            .unwrap_or(0.0)
    }


    /// Observations predicted as `class`.
    pub fn predicted_total(&self, class: &str) -> f64 {
        self.cells.values()
            .filter_map(|row| row.get(class))
            .sum()
    }


    /// Returns the true/false positive counts of `class`.
    pub fn entry(&self, class: &str) -> ConfusionEntry {
        ConfusionEntry {
            true_positive: self.true_positive(class),
            false_positive: self.false_positive(class),
        }
    }


    /// Returns the true/false positive counts of every class.
    pub fn entries(&self) -> BTreeMap<String, ConfusionEntry> {
        self.classes.iter()
            .map(|c| (c.clone(), self.entry(c)))
            .collect()
    }


    /// Total count over all cells.
    pub fn total(&self) -> f64 {
        self.cells.values()
            .flat_map(|row| row.values())
            .sum()
    }


    /// Total count on the diagonal.
    pub fn correct(&self) -> f64 {
        self.classes.iter()
            .map(|c| self.true_positive(c))
            .sum()
    }


    /// Total count off the diagonal.
    pub fn errors(&self) -> f64 {
        self.total() - self.correct()
    }


    /// Fraction of misclassified observations.
    pub fn error_rate(&self) -> Result<f64> {
        let total = self.total();
        if total <= 0.0 {
            return Err(ForestError::UndefinedMetric(
                "error rate of an empty confusion matrix".into()
            ));
        }
        Ok(self.errors() / total)
    }


    /// Fraction of correctly classified observations.
    pub fn accuracy(&self) -> Result<f64> {
        self.error_rate().map(|e| 1.0 - e)
    }


    /// Recall `TP / (TP + FN)` of `class`.
    pub fn recall(&self, class: &str) -> Result<f64> {
        let total = self.class_total(class);
        if total <= 0.0 {
            return Err(ForestError::UndefinedMetric(
                format!("recall of class `{class}` with no observation")
            ));
        }
        Ok(self.true_positive(class) / total)
    }


    /// Precision `TP / (TP + FP)` of `class`.
    pub fn precision(&self, class: &str) -> Result<f64> {
        let total = self.predicted_total(class);
        if total <= 0.0 {
            return Err(ForestError::UndefinedMetric(
                format!("precision of class `{class}` that is never predicted")
            ));
        }
        Ok(self.true_positive(class) / total)
    }


    /// Geometric mean of the per-class recalls (macro G-mean).
    /// Undefined when some class has no observation.
    pub fn g_mean(&self) -> Result<f64> {
        if self.classes.is_empty() {
            return Err(ForestError::UndefinedMetric(
                "G-mean of a confusion matrix without classes".into()
            ));
        }
        let product = self.classes.iter()
            .map(|c| self.recall(c))
            .product::<Result<f64>>()?;

        Ok(product.powf(1.0 / self.n_class() as f64))
    }


    /// Matthews correlation coefficient.
    ///
    /// Defined for exactly two classes; the lexicographically first class
    /// is the positive one (the value does not depend on that choice).
    pub fn mcc(&self) -> Result<f64> {
        if self.n_class() != 2 {
            return Err(ForestError::UndefinedMetric(format!(
                "MCC requires exactly two classes, found {}", self.n_class()
            )));
        }
        let mut classes = self.classes.iter();
        let (positive, negative) = match (classes.next(), classes.next()) {
            (Some(p), Some(n)) => (p, n),
            _ => unreachable!(),
        };

        let tp = self.true_positive(positive);
        let fp = self.false_positive(positive);
        let tn = self.true_positive(negative);
        let fn_ = self.false_positive(negative);

        let denominator = ((tp + fp) * (tp + fn_) * (tn + fp) * (tn + fn_)).sqrt();
        if denominator <= 0.0 {
            return Err(ForestError::UndefinedMetric(
                "MCC with an empty row or column".into()
            ));
        }
        Ok((tp * tn - fp * fn_) / denominator)
    }


    /// F-beta measure of the macro-averaged precision and recall.
    pub fn f_measure(&self, beta: f64) -> Result<f64> {
        let n_class = self.n_class() as f64;
        let mut recall = 0.0;
        let mut precision = 0.0;
        for c in &self.classes {
            recall += self.recall(c)?;
            precision += self.precision(c)?;
        }
        recall /= n_class;
        precision /= n_class;

        let b2 = beta * beta;
        let denominator = b2 * precision + recall;
        if denominator <= 0.0 {
            return Err(ForestError::UndefinedMetric(
                "F-measure with zero precision and recall".into()
            ));
        }
        Ok((1.0 + b2) * precision * recall / denominator)
    }
}


impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const WIDTH: usize = 12;
        write!(f, "{:>WIDTH$}", "actual\\pred")?;
        for c in &self.classes {
            write!(f, "{c:>WIDTH$}")?;
        }
        writeln!(f)?;
        for actual in &self.classes {
            write!(f, "{actual:>WIDTH$}")?;
            for predicted in &self.classes {
                let w = self.count(actual, predicted);
                write!(f, "{w:>WIDTH$.1}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    // Positive class `A`: TP = 8, FN = 2.
    // Negative class `B`: TN = 9, FP = 1.
    fn two_class(tp: f64, fn_: f64, tn: f64, fp: f64) -> ConfusionMatrix {
        let mut matrix = ConfusionMatrix::new(&["A", "B"]);
        matrix.record("A", "A", tp);
        matrix.record("A", "B", fn_);
        matrix.record("B", "B", tn);
        matrix.record("B", "A", fp);
        matrix
    }

    #[test]
    fn test_entry_01() {
        let matrix = two_class(8.0, 2.0, 9.0, 1.0);
        let res = matrix.entry("A");
        let exp = ConfusionEntry { true_positive: 8.0, false_positive: 1.0 };
        assert_eq!(exp, res, "expected {exp:?}, got {res:?}.");

        let res = matrix.entry("B");
        let exp = ConfusionEntry { true_positive: 9.0, false_positive: 2.0 };
        assert_eq!(exp, res, "expected {exp:?}, got {res:?}.");
    }

    #[test]
    fn test_error_rate_01() {
        let matrix = two_class(8.0, 2.0, 9.0, 1.0);
        let res = matrix.error_rate().unwrap();
        assert_abs_diff_eq!(res, 3.0 / 20.0, epsilon = 1e-12);
    }

    #[test]
    fn test_g_mean_01() {
        let matrix = two_class(8.0, 2.0, 9.0, 1.0);
        let res = matrix.g_mean().unwrap();
        assert_abs_diff_eq!(res, (0.8_f64 * 0.9).sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(res, 0.8485, epsilon = 1e-4);
    }

    #[test]
    fn test_g_mean_02() {
        let mut matrix = ConfusionMatrix::new(&["A", "B", "C"]);
        matrix.record("A", "A", 3.0);
        matrix.record("B", "A", 1.0);
        let res = matrix.g_mean();
        assert!(matches!(res, Err(ForestError::UndefinedMetric(_))));
    }

    #[test]
    fn test_mcc_01() {
        // TP = 8, FP = 2, TN = 9, FN = 1.
        let matrix = two_class(8.0, 1.0, 9.0, 2.0);
        let res = matrix.mcc().unwrap();
        let exp = (8.0 * 9.0 - 2.0 * 1.0) / (10.0_f64 * 9.0 * 11.0 * 10.0).sqrt();
        assert_abs_diff_eq!(res, exp, epsilon = 1e-12);
    }

    #[test]
    fn test_mcc_02() {
        let mut matrix = ConfusionMatrix::new(&["A", "B", "C"]);
        matrix.record("A", "A", 3.0);
        let res = matrix.mcc();
        assert!(matches!(res, Err(ForestError::UndefinedMetric(_))));
    }

    #[test]
    fn test_mcc_03() {
        // Swapping the positive class leaves MCC unchanged.
        let m1 = two_class(8.0, 1.0, 9.0, 2.0);
        let m2 = two_class(9.0, 2.0, 8.0, 1.0);
        let r1 = m1.mcc().unwrap();
        let r2 = m2.mcc().unwrap();
        assert_abs_diff_eq!(r1, r2, epsilon = 1e-12);
    }

    #[test]
    fn test_merge_01() {
        let mut m1 = two_class(1.0, 0.0, 1.0, 0.0);
        let m2 = two_class(0.0, 1.0, 0.0, 1.0);
        m1.merge(&m2);
        let res = (m1.total(), m1.errors());
        let exp = (4.0, 2.0);
        assert_eq!(exp, res, "expected {exp:?}, got {res:?}.");
    }

    #[test]
    fn test_f_measure_01() {
        let matrix = two_class(5.0, 0.0, 5.0, 0.0);
        let res = matrix.f_measure(1.0).unwrap();
        assert_abs_diff_eq!(res, 1.0, epsilon = 1e-12);
    }
}

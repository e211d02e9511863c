//! Scores an input string's posterior over labels using the double
//! array and parameter matrix (§4.4). Immutable and freely shareable
//! once built: many scoring operations may run in parallel, each
//! building its own per-request event multiset (§5).
use hashbrown::HashMap;

use crate::common::{DEFAULT_THRESHOLD, SENTINEL};
use crate::doublearray::DoubleArray;
use crate::errors::{LdigError, Result};
use crate::labels::Labels;
use crate::parameters::Parameters;

/// The outcome of scoring one input string.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Posterior probability per label, in label-table order.
    pub posterior: Vec<f64>,
    /// `argmax` label, or `None` if its posterior falls below the
    /// confidence threshold (reported as "unknown", §4.4).
    pub label: Option<String>,
    /// The index of the argmax label, regardless of threshold.
    pub predicted_idx: usize,
}

/// Evaluates the posterior `p = softmax(W^T * events)` for a sparse
/// event multiset against a dense parameter matrix and label table.
pub struct Scorer<'a> {
    da: &'a DoubleArray,
    params: &'a Parameters,
    labels: &'a Labels,
    threshold: f64,
}

impl<'a> Scorer<'a> {
    /// Builds a scorer with the default confidence threshold (0.6).
    pub fn new(da: &'a DoubleArray, params: &'a Parameters, labels: &'a Labels) -> Self {
        Self {
            da,
            params,
            labels,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    /// Overrides the confidence threshold below which a prediction is
    /// reported as "unknown".
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Extracts the event multiset from `text`, sandwiching it with
    /// sentinels as the trainer and the original scorer both do (§4.3).
    pub fn extract_events(&self, text: &str) -> HashMap<u32, u32> {
        let sandwiched = format!("{SENTINEL}{text}{SENTINEL}");
        self.da.extract(&sandwiched)
    }

    /// Computes the stabilized softmax posterior over an event
    /// multiset: `s = sum(count * W[id,:])`, `p = softmax(s)` (§4.4).
    pub fn posterior(&self, events: &HashMap<u32, u32>) -> Result<Vec<f64>> {
        let k = self.labels.len();
        let mut sum = vec![0.0f64; k];
        for (&id, &count) in events {
            let row = self.params.row(id);
            for (s, &w) in sum.iter_mut().zip(row) {
                *s += w * count as f64;
            }
        }
        softmax(&sum)
    }

    /// Scores `text` end to end: extraction, posterior, and the
    /// confidence-thresholded label decision.
    pub fn predict(&self, text: &str) -> Result<Prediction> {
        let events = self.extract_events(text);
        let posterior = self.posterior(&events)?;
        let predicted_idx = argmax(&posterior);
        let label = if posterior[predicted_idx] >= self.threshold {
            Some(self.labels.as_slice()[predicted_idx].clone())
        } else {
            None
        };
        Ok(Prediction {
            posterior,
            label,
            predicted_idx,
        })
    }

    /// Negative log-likelihood of the true label under this scorer's
    /// posterior for `text`, `-log p[true_label]` (§4.4).
    pub fn nll(&self, text: &str, true_label_idx: usize) -> Result<f64> {
        let events = self.extract_events(text);
        let posterior = self.posterior(&events)?;
        Ok(-posterior[true_label_idx].ln())
    }

    /// Per-feature contribution breakdown for `--debug` (§6), one row
    /// per matched feature id sorted by feature text, mirroring
    /// `ldig.py::debug`'s `id\tfeat\tfreq\t...` table.
    pub fn debug_table(&self, text: &str, feature_texts: &[String]) -> Result<DebugTable> {
        let events = self.extract_events(text);
        let mut rows: Vec<(u32, u32)> = events.into_iter().collect();
        rows.sort_by(|a, b| feature_texts[a.0 as usize].cmp(&feature_texts[b.0 as usize]));

        let k = self.labels.len();
        let mut sum = vec![0.0f64; k];
        let mut entries = Vec::with_capacity(rows.len());
        for (id, count) in rows {
            let row = self.params.row(id).to_vec();
            for (s, &w) in sum.iter_mut().zip(&row) {
                *s += w * count as f64;
            }
            entries.push(DebugRow {
                id,
                feature: feature_texts[id as usize].clone(),
                count,
                weights: row,
            });
        }
        let posterior = softmax(&sum)?;
        Ok(DebugTable {
            entries,
            sum,
            posterior,
        })
    }
}

/// One matched feature's per-label contribution, for `--debug` output.
#[derive(Debug, Clone)]
pub struct DebugRow {
    /// The feature id.
    pub id: u32,
    /// The feature's substring text.
    pub feature: String,
    /// The occurrence count of this feature in the scored input.
    pub count: u32,
    /// This feature's row of the parameter matrix.
    pub weights: Vec<f64>,
}

/// The full per-feature breakdown and final posterior for `--debug`.
#[derive(Debug, Clone)]
pub struct DebugTable {
    /// One row per matched feature, sorted by feature text.
    pub entries: Vec<DebugRow>,
    /// The accumulated per-label score before softmax.
    pub sum: Vec<f64>,
    /// The softmax posterior over labels.
    pub posterior: Vec<f64>,
}

/// Max-subtraction-stabilized softmax (§4.4). Returns
/// [`LdigError::NumericDegeneracy`] if `s` is empty, all `-inf`, or
/// contains NaN.
pub fn softmax(s: &[f64]) -> Result<Vec<f64>> {
    let max = s.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return Err(LdigError::numeric_degeneracy(
            "softmax input is empty or all -inf",
        ));
    }
    let exps: Vec<f64> = s.iter().map(|&x| (x - max).exp()).collect();
    let denom: f64 = exps.iter().sum();
    if !denom.is_finite() || denom == 0.0 {
        return Err(LdigError::numeric_degeneracy(
            "softmax denominator is zero or non-finite",
        ));
    }
    Ok(exps.into_iter().map(|e| e / denom).collect())
}

fn argmax(v: &[f64]) -> usize {
    v.iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
        .map(|(i, _)| i)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doublearray::DoubleArray;

    fn toy() -> (DoubleArray, Labels, Parameters) {
        let da = DoubleArray::build(&["cat", "dog"]).unwrap();
        let labels = Labels::new(vec!["eng".into(), "fra".into()]);
        let mut params = Parameters::zeros(2, 2);
        params.row_mut(0).copy_from_slice(&[2.0, 0.0]); // "cat" -> eng
        params.row_mut(1).copy_from_slice(&[0.0, 2.0]); // "dog" -> fra
        (da, labels, params)
    }

    #[test]
    fn test_predict_confident() {
        let (da, labels, params) = toy();
        let scorer = Scorer::new(&da, &params, &labels);
        let pred = scorer.predict("cat").unwrap();
        assert_eq!(pred.label.as_deref(), Some("eng"));
    }

    #[test]
    fn test_predict_unknown_below_threshold() {
        let (da, labels, mut params) = toy();
        params.row_mut(0).copy_from_slice(&[0.01, 0.0]);
        let scorer = Scorer::new(&da, &params, &labels);
        let pred = scorer.predict("cat").unwrap();
        assert_eq!(pred.label, None);
    }

    #[test]
    fn test_softmax_scale_invariance() {
        // TESTABLE PROPERTY 4: scaling event counts and W's rows by a
        // common positive factor leaves the posterior unchanged.
        let (da, labels, params) = toy();
        let scorer = Scorer::new(&da, &params, &labels);
        let base = scorer.predict("cat").unwrap().posterior;

        let mut scaled = params.clone();
        for id in 0..scaled.rows() as u32 {
            for w in scaled.row_mut(id) {
                *w *= 3.0;
            }
        }
        let scorer2 = Scorer::new(&da, &scaled, &labels);
        let scaled_post = scorer2.predict("cat").unwrap().posterior;
        for (a, b) in base.iter().zip(scaled_post.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_softmax_degenerate_input() {
        assert!(softmax(&[]).is_err());
        assert!(softmax(&[f64::NEG_INFINITY, f64::NEG_INFINITY]).is_err());
    }

    #[test]
    fn test_nll_matches_posterior() {
        let (da, labels, params) = toy();
        let scorer = Scorer::new(&da, &params, &labels);
        let pred = scorer.predict("cat").unwrap();
        let nll = scorer.nll("cat", 0).unwrap();
        assert!((nll - (-pred.posterior[0].ln())).abs() < 1e-12);
    }
}

//! Online multiclass logistic regression by SGD, with optional
//! cumulative L1 (lazy) regularization (§4.5). Training mutates the
//! parameter matrix and a training-local penalty matrix in place; it
//! runs on one executor with exclusive access to both, with no
//! suspension points inside an example's update (§5).
use hashbrown::HashMap as FastMap;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::common::{DEFAULT_ETA, DEFAULT_N_FULL_REG};
use crate::corpus::CorpusRecord;
use crate::doublearray::DoubleArray;
use crate::errors::Result;
use crate::labels::Labels;
use crate::parameters::Parameters;
use crate::scorer::{softmax, Scorer};

/// Training hyperparameters, built with a chained-builder interface
/// (mirrors the teacher's `TrainerConfig`).
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    eta: f64,
    reg_const: Option<f64>,
    n_full_reg: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            eta: DEFAULT_ETA,
            reg_const: None,
            n_full_reg: DEFAULT_N_FULL_REG,
        }
    }
}

impl TrainerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base SGD learning rate (`-e`, default 0.1).
    pub fn eta(mut self, eta: f64) -> Self {
        self.eta = eta;
        self
    }

    /// Enables cumulative L1 regularization with constant `C` (`-r`).
    /// Absent by default, matching the CLI's optional `-r`.
    pub fn regularization(mut self, reg_const: f64) -> Self {
        self.reg_const = Some(reg_const);
        self
    }

    /// Sets the number of full-regularization sweeps per epoch (`--wr`,
    /// default 2).
    pub fn full_reg_count(mut self, n_full_reg: u64) -> Self {
        self.n_full_reg = n_full_reg;
        self
    }
}

/// Per-label correct/total counts plus the overall epoch summary
/// (§4.5 step 4).
#[derive(Debug, Clone)]
pub struct EpochReport {
    /// `(label, correct, total)` triples, in label-table order.
    pub per_label: Vec<(String, u64, u64)>,
    /// Total correct predictions across all labels.
    pub total_correct: u64,
    /// Total examples presented this epoch (the balanced-shuffle
    /// count, not the raw corpus size).
    pub total: u64,
    /// Rows with `||W[id,:]||_1 > 1e-7` ("relevant features").
    pub relevant_features: usize,
}

/// Owns a unique reference to the parameter matrix (and its training-
/// local penalty matrix) for the duration of an epoch.
pub struct Trainer<'a> {
    da: &'a DoubleArray,
    labels: &'a Labels,
    params: &'a mut Parameters,
    config: TrainerConfig,
    penalties: Option<Parameters>,
}

impl<'a> Trainer<'a> {
    pub fn new(da: &'a DoubleArray, labels: &'a Labels, params: &'a mut Parameters, config: TrainerConfig) -> Self {
        let penalties = config
            .reg_const
            .map(|_| Parameters::zeros(params.rows(), params.cols()));
        Self {
            da,
            labels,
            params,
            config,
            penalties,
        }
    }

    /// Runs one pass over `corpus`, balanced-shuffled per `idlist`
    /// (§4.5 step 1), updating `self.params` (and, if configured, the
    /// training-local penalty matrix) in place.
    pub fn train_epoch<R: Rng>(
        &mut self,
        corpus: &[CorpusRecord],
        idlist: &FastMap<String, Vec<usize>>,
        rng: &mut R,
    ) -> Result<EpochReport> {
        let order = balanced_shuffle(idlist, rng);
        let n = order.len();
        let k = self.labels.len();
        let m = self.params.rows();

        let mut eta = self.config.eta;
        let (alpha, mut u) = match self.config.reg_const {
            Some(_) if n > 0 => (0.9f64.powf(-1.0 / n as f64), 0.0),
            _ => (1.0, 0.0),
        };
        let whole_reg_int = n as u64 / self.config.n_full_reg.max(1) + 1;

        let mut correct = vec![0u64; k];
        let mut total = vec![0u64; k];

        for (pos, &target) in order.iter().enumerate() {
            let record = &corpus[target];
            let label_k = record.label_idx.expect("training corpus records carry a known label");

            let sandwiched = format!("{}{}{}", crate::common::SENTINEL, record.text, crate::common::SENTINEL);
            let events = self.da.extract(&sandwiched);

            let mut y = {
                let mut sum = vec![0.0f64; k];
                for (&id, &count) in &events {
                    let row = self.params.row(id);
                    for (s, &w) in sum.iter_mut().zip(row) {
                        *s += w * count as f64;
                    }
                }
                softmax(&sum)?
            };
            let predicted_k = argmax(&y);
            total[label_k] += 1;
            if predicted_k == label_k {
                correct[label_k] += 1;
            }

            if self.config.reg_const.is_some() {
                eta *= alpha;
                u += self.config.reg_const.unwrap() * eta / n as f64;
            }
            y[label_k] -= 1.0;
            for g in y.iter_mut() {
                *g *= eta;
            }

            for (&id, &count) in &events {
                let row = self.params.row_mut(id);
                for (w, &g) in row.iter_mut().zip(&y) {
                    *w -= g * count as f64;
                }
            }

            if self.config.reg_const.is_some() {
                let full_sweep = whole_reg_int > 0 && (n as u64 - pos as u64) % whole_reg_int == 1;
                if full_sweep {
                    for id in 0..m as u32 {
                        apply_l1(self.params, self.penalties.as_mut().unwrap(), id, u);
                    }
                } else {
                    for &id in events.keys() {
                        apply_l1(self.params, self.penalties.as_mut().unwrap(), id, u);
                    }
                }
            }
        }

        let per_label = self
            .labels
            .as_slice()
            .iter()
            .enumerate()
            .map(|(i, label)| (label.clone(), correct[i], total[i]))
            .collect();
        let relevant_features = (0..m as u32).filter(|&id| !self.params.is_row_zero(id)).count();

        Ok(EpochReport {
            per_label,
            total_correct: correct.iter().sum(),
            total: total.iter().sum(),
            relevant_features,
        })
    }

    /// A read-only scorer over the matrix as currently trained, e.g.
    /// to report progress mid-development.
    pub fn scorer(&self) -> Scorer<'_> {
        Scorer::new(self.da, self.params, self.labels)
    }
}

/// The cumulative-L1 "clipped subgradient with memory" step
/// (Tsuruoka & Tsujii), applied to every coordinate of row `id`.
fn apply_l1(params: &mut Parameters, penalties: &mut Parameters, id: u32, u: f64) {
    let row = params.row_mut(id);
    let pen = penalties.row_mut(id);
    for (w, q) in row.iter_mut().zip(pen.iter_mut()) {
        if *w > 0.0 {
            let w1 = *w - u - *q;
            if w1 > 0.0 {
                *q += w1 - *w;
                *w = w1;
            } else {
                *q -= *w;
                *w = 0.0;
            }
        } else if *w < 0.0 {
            let w1 = *w + u - *q;
            if w1 < 0.0 {
                *q += w1 - *w;
                *w = w1;
            } else {
                *q -= *w;
                *w = 0.0;
            }
        }
    }
}

/// The balanced-shuffle sampler (§4.5 step 1): every label's index
/// list is replicated up to `n_max` by integer repetition, then padded
/// with a `n_max % n` draw from a shuffled copy of its own indices
/// (rather than the unshuffled original — the shuffle-then-take-prefix
/// order mirrors `ldig.py::shuffle`'s in-place `numpy.random.shuffle`
/// before slicing the tail), and the concatenation across all labels
/// is shuffled once more.
fn balanced_shuffle<R: Rng>(idlist: &FastMap<String, Vec<usize>>, rng: &mut R) -> Vec<usize> {
    let n_max = idlist.values().map(Vec::len).max().unwrap_or(0);
    let mut list = Vec::new();
    for ids in idlist.values() {
        let n = ids.len();
        if n == 0 {
            continue;
        }
        let reps = n_max / n;
        for _ in 0..reps {
            list.extend_from_slice(ids);
        }
        let mut shuffled = ids.clone();
        shuffled.shuffle(rng);
        let remainder = n_max % n;
        list.extend_from_slice(&shuffled[..remainder]);
    }
    list.shuffle(rng);
    list
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
    use rand::SeedableRng;

    fn toy_corpus() -> (DoubleArray, Labels, Vec<CorpusRecord>, FastMap<String, Vec<usize>>) {
        let da = DoubleArray::build(&["cat", "dog"]).unwrap();
        let labels = Labels::new(vec!["eng".into(), "fra".into()]);
        let mut corpus = Vec::new();
        let mut idlist: FastMap<String, Vec<usize>> = FastMap::new();
        idlist.insert("eng".into(), Vec::new());
        idlist.insert("fra".into(), Vec::new());
        for _ in 0..20 {
            idlist.get_mut("eng").unwrap().push(corpus.len());
            corpus.push(CorpusRecord {
                label: "eng".into(),
                label_idx: Some(0),
                text: "cat".into(),
                original: "eng\tcat".into(),
            });
            idlist.get_mut("fra").unwrap().push(corpus.len());
            corpus.push(CorpusRecord {
                label: "fra".into(),
                label_idx: Some(1),
                text: "dog".into(),
                original: "fra\tdog".into(),
            });
        }
        (da, labels, corpus, idlist)
    }

    #[test]
    fn test_balanced_shuffle_is_balanced_multiset() {
        let mut idlist: FastMap<String, Vec<usize>> = FastMap::new();
        idlist.insert("a".into(), vec![0, 1, 2, 3]);
        idlist.insert("b".into(), vec![4, 5]);
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let order = balanced_shuffle(&idlist, &mut rng);
        assert_eq!(order.len(), 8);
        let a_count = order.iter().filter(|&&i| i < 4).count();
        let b_count = order.iter().filter(|&&i| i >= 4).count();
        assert_eq!(a_count, 4);
        assert_eq!(b_count, 4);
    }

    #[test]
    fn test_training_converges_without_regularization() {
        let (da, labels, corpus, idlist) = toy_corpus();
        let mut params = Parameters::zeros(da.len(), labels.len());
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let config = TrainerConfig::new().eta(0.5);
        let mut report = EpochReport {
            per_label: vec![],
            total_correct: 0,
            total: 0,
            relevant_features: 0,
        };
        for _ in 0..30 {
            let mut trainer = Trainer::new(&da, &labels, &mut params, config.clone());
            report = trainer.train_epoch(&corpus, &idlist, &mut rng).unwrap();
        }
        assert_eq!(report.total_correct, report.total);
    }

    #[test]
    fn test_regularization_shrinks_relevant_features_over_epochs() {
        let (da, labels, corpus, idlist) = toy_corpus();
        let mut params = Parameters::zeros(da.len(), labels.len());
        let mut rng = rand::rngs::StdRng::seed_from_u64(3);
        let config = TrainerConfig::new().eta(0.5).regularization(50.0);

        let mut counts = Vec::new();
        for _ in 0..5 {
            let mut trainer = Trainer::new(&da, &labels, &mut params, config.clone());
            let report = trainer.train_epoch(&corpus, &idlist, &mut rng).unwrap();
            counts.push(report.relevant_features);
        }
        for w in counts.windows(2) {
            assert!(w[1] <= w[0], "relevant feature count must not increase: {counts:?}");
        }
    }
}

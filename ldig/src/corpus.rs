//! The labeled corpus: reads training/detection files, applies the
//! normalizer, and produces corpus records plus per-label index lists
//! for the balanced shuffle (§3's "Corpus record", §4.5 step 1).
//! Grounded in `ldig.py::load_corpus`.
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use hashbrown::HashMap;

use crate::errors::{LdigError, Result};
use crate::labels::Labels;
use crate::normalize::normalize;

/// One normalized corpus line.
#[derive(Debug, Clone)]
pub struct CorpusRecord {
    /// The label as it appeared in the corpus line.
    pub label: String,
    /// `label`'s index in the model's label table, if known.
    pub label_idx: Option<usize>,
    /// The normalized text used for feature extraction.
    pub text: String,
    /// The original line, label prefix included.
    pub original: String,
}

/// Loads corpus files for **training**: a line whose label is not in
/// `labels` aborts the whole load (fatal, matching `ldig.py`'s
/// `sys.exit` in `load_corpus`). Lines without a label prefix are
/// likewise fatal. Returns the records and, per label, the indices
/// into that list belonging to it (`idlist` in the teacher source).
pub fn load_for_training(
    paths: &[impl AsRef<Path>],
    labels: &Labels,
) -> Result<(Vec<CorpusRecord>, HashMap<String, Vec<usize>>)> {
    let mut corpus = Vec::new();
    let mut idlist: HashMap<String, Vec<usize>> = labels
        .as_slice()
        .iter()
        .map(|l| (l.clone(), Vec::new()))
        .collect();

    for path in paths {
        let path = path.as_ref();
        let file = File::open(path)?;
        for (n, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            let normalized = normalize(&line);
            let label = normalized.label.clone().ok_or_else(|| {
                LdigError::unknown_label(format!(
                    "no label data at line {} in {:?}",
                    n + 1,
                    path
                ))
            })?;
            let label_idx = labels.index_of(&label).ok_or_else(|| {
                LdigError::unknown_label(format!(
                    "unknown label '{}' at line {} in {:?}",
                    label,
                    n + 1,
                    path
                ))
            })?;
            let idx = corpus.len();
            idlist.get_mut(&label).unwrap().push(idx);
            corpus.push(CorpusRecord {
                label,
                label_idx: Some(label_idx),
                text: normalized.text,
                original: normalized.original,
            });
        }
    }
    Ok((corpus, idlist))
}

/// Loads corpus files for **detection**: a line whose label is not in
/// `labels` is a non-fatal warning emitted once per distinct unseen
/// label (collected in `warned`); the record is still produced, with
/// `label_idx = None`, so it can be scored while being excluded from
/// accuracy/NLL aggregation.
pub fn load_for_detection(
    paths: &[impl AsRef<Path>],
    labels: &Labels,
) -> Result<Vec<CorpusRecord>> {
    let mut corpus = Vec::new();
    let mut warned: HashSet<String> = HashSet::new();

    for path in paths {
        let path = path.as_ref();
        let file = File::open(path)?;
        for line in BufReader::new(file).lines() {
            let line = line?;
            let normalized = normalize(&line);
            let label = normalized.label.clone().unwrap_or_default();
            let label_idx = labels.index_of(&label);
            if label_idx.is_none() && warned.insert(label.clone()) {
                eprintln!(
                    "WARNING: unknown label '{label}' (ignoring later occurrences of this label)"
                );
            }
            corpus.push(CorpusRecord {
                label,
                label_idx,
                text: normalized.text,
                original: normalized.original,
            });
        }
    }
    Ok(corpus)
}

//! Model directory I/O: the four files of §6 (`features`, `labels`,
//! `parameters`, `doublearray`) plus the `init` pipeline that produces
//! them from a raw corpus and an external max-substring extractor.
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::doublearray::DoubleArray;
use crate::errors::{LdigError, Result};
use crate::features::{FeatureEntry, FeatureList};
use crate::labels::Labels;
use crate::maxsubst::{admit_feature, run_extractor};
use crate::normalize::normalize;
use crate::parameters::Parameters;

/// Path to a model directory's `features` file (§6).
pub fn features_path(dir: &Path) -> PathBuf {
    dir.join("features")
}

/// Path to a model directory's `labels` file (§6).
pub fn labels_path(dir: &Path) -> PathBuf {
    dir.join("labels")
}

/// Path to a model directory's `parameters` file (§6).
pub fn parameters_path(dir: &Path) -> PathBuf {
    dir.join("parameters")
}

/// Path to a model directory's `doublearray` file (§6).
pub fn doublearray_path(dir: &Path) -> PathBuf {
    dir.join("doublearray")
}

/// The three artifacts needed for scoring and training: the double
/// array, the label table, and the parameter matrix (§5: "Scoring
/// requires only `W`, DA, and labels"). The `features` file is only
/// consulted by `init`, `shrink`, and `--debug`.
pub struct Model {
    /// The double-array trie mapping features to dense ids.
    pub da: DoubleArray,
    /// The ordered label table.
    pub labels: Labels,
    /// The dense `M x K` parameter matrix.
    pub params: Parameters,
}

impl Model {
    /// Loads a model directory. Missing files surface as
    /// [`LdigError::Io`]; malformed ones as
    /// [`LdigError::InvalidFormat`].
    pub fn load(dir: &Path) -> Result<Self> {
        let labels_p = labels_path(dir);
        let params_p = parameters_path(dir);
        let da_p = doublearray_path(dir);
        for (path, name) in [(&labels_p, "labels"), (&params_p, "parameters"), (&da_p, "doublearray")] {
            if !path.exists() {
                return Err(LdigError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{name} file doesn't exist at {path:?}"),
                )));
            }
        }
        let labels = Labels::read_path(&labels_p)?;
        let params = Parameters::read_path(&params_p)?;
        let da = DoubleArray::read(File::open(&da_p)?)?;
        Ok(Self { da, labels, params })
    }

    /// Persists `labels`, `parameters`, and `doublearray` to `dir`.
    pub fn save(&self, dir: &Path) -> Result<()> {
        self.labels.write_path(&labels_path(dir))?;
        self.params.write_path(&parameters_path(dir))?;
        let file = File::create(doublearray_path(dir))?;
        self.da.write(file)?;
        Ok(())
    }
}

/// Runs the `init` pipeline (§4.10, grounded in `ldig.py::init`):
/// normalizes every corpus line, collects the label set, hands the
/// normalized corpus to the external max-substring extractor, filters
/// its output through the admission filter, builds the double array,
/// and writes all four model files plus a zero-valued parameter
/// matrix.
pub fn init(
    dir: &Path,
    corpus_paths: &[PathBuf],
    lbff: u64,
    ngram_bound: usize,
    extractor_bin: &Path,
) -> Result<(Model, FeatureList)> {
    fs::create_dir_all(dir)?;

    let temp_corpus = dir.join("temp");
    let mut labels: Vec<String> = Vec::new();
    {
        let mut out = File::create(&temp_corpus)?;
        for path in corpus_paths {
            let file = File::open(path)?;
            for (n, line) in BufReader::new(file).lines().enumerate() {
                let line = line?;
                let normalized = normalize(&line);
                let Some(label) = normalized.label.filter(|l| !l.is_empty()) else {
                    eprintln!("no label data at line {} in {:?}", n + 1, path);
                    continue;
                };
                if !labels.contains(&label) {
                    labels.push(label);
                }
                writeln!(out, "{}", normalized.text)?;
            }
        }
    }
    labels.sort();
    let labels = Labels::new(labels);
    labels.write_path(&labels_path(dir))?;

    let temp_features = features_path(dir).with_extension("temp");
    run_extractor(extractor_bin, &temp_corpus, &temp_features)?;

    let mut admitted: Vec<FeatureEntry> = Vec::new();
    {
        let file = File::open(&temp_features)?;
        for line in BufReader::new(file).lines() {
            let line = line?;
            let Some(tab) = line.rfind('\t') else {
                continue;
            };
            let (text, count_str) = (&line[..tab], &line[tab + 1..]);
            let Ok(count) = count_str.parse::<u64>() else {
                continue;
            };
            if admit_feature(text, count, lbff, ngram_bound) {
                admitted.push(FeatureEntry {
                    text: text.to_string(),
                    freq: count,
                });
            }
        }
    }
    admitted.sort_by(|a, b| a.text.cmp(&b.text));
    let feature_list = FeatureList(admitted);
    feature_list.write_path(&features_path(dir))?;

    let da = DoubleArray::build(&feature_list.texts())?;
    let params = Parameters::zeros(feature_list.len(), labels.len());

    let file = File::create(doublearray_path(dir))?;
    da.write(file)?;
    params.write_path(&parameters_path(dir))?;

    let _ = fs::remove_file(&temp_corpus);
    let _ = fs::remove_file(&temp_features);

    Ok((Model { da, labels, params }, feature_list))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_directory_is_fatal() {
        let dir = std::env::temp_dir().join("ldig-model-test-missing-xyz");
        let _ = fs::remove_dir_all(&dir);
        assert!(Model::load(&dir).is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = std::env::temp_dir().join(format!("ldig-model-test-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        let da = DoubleArray::build(&["cat", "dog"]).unwrap();
        let labels = Labels::new(vec!["eng".into(), "fra".into()]);
        let mut params = Parameters::zeros(2, 2);
        params.row_mut(0).copy_from_slice(&[1.0, 2.0]);
        let model = Model { da, labels, params };
        model.save(&dir).unwrap();

        let loaded = Model::load(&dir).unwrap();
        assert_eq!(loaded.labels, model.labels);
        assert_eq!(loaded.params, model.params);
        assert_eq!(loaded.da.get("cat"), Ok(0));

        let _ = fs::remove_dir_all(&dir);
    }
}

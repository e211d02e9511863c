//! Cross-module fixture tests exercising the double array, extraction,
//! scoring, and training together (§8's literal scenarios).
use hashbrown::HashMap;
use rand::SeedableRng;

use crate::corpus::CorpusRecord;
use crate::doublearray::{DoubleArray, NotFound};
use crate::labels::Labels;
use crate::parameters::Parameters;
use crate::trainer::{Trainer, TrainerConfig};

#[test]
fn scenario_da_1() {
    let da = DoubleArray::build(&["ca", "cat", "deer", "dog", "fox", "rat"]).unwrap();
    assert_eq!(da.len(), 15);
    assert_eq!(da.get("c"), Err(NotFound));
    assert_eq!(da.get("ca"), Ok(0));
    assert_eq!(da.get("cat"), Ok(1));
    assert_eq!(da.get("deer"), Ok(2));
    assert_eq!(da.get("dog"), Ok(3));
    assert_eq!(da.get("xxx"), Err(NotFound));
}

#[test]
fn scenario_da_2() {
    let da = DoubleArray::build(&["cat"]).unwrap();
    assert_eq!(da.len(), 5);
    assert_eq!(da.get("ca"), Err(NotFound));
    assert_eq!(da.get("cat"), Ok(0));
}

#[test]
fn scenario_da_3_unsorted_fails() {
    assert!(DoubleArray::build(&["cat", "ant"]).is_err());
}

#[test]
fn scenario_ex_1() {
    let da = DoubleArray::build(&["ca", "cat", "deer", "dog", "fox", "rat"]).unwrap();
    assert!(da.extract("").is_empty());

    let r = da.extract("cat");
    let expected: HashMap<u32, u32> = [(0, 1), (1, 1)].into_iter().collect();
    assert_eq!(r, expected);

    let r = da.extract("deerat");
    let expected: HashMap<u32, u32> = [(2, 1), (5, 1)].into_iter().collect();
    assert_eq!(r, expected);
}

/// LEARN-1: a two-label toy corpus trained for enough epochs with
/// `C = 0` reaches 100% training accuracy; with a large `C`, the
/// number of non-zero rows does not increase across epochs.
#[test]
fn scenario_learn_1_converges_without_regularization() {
    let da = DoubleArray::build(&["cat", "dog"]).unwrap();
    let labels = Labels::new(vec!["eng".into(), "fra".into()]);
    let mut corpus = Vec::new();
    let mut idlist: hashbrown::HashMap<String, Vec<usize>> = hashbrown::HashMap::new();
    idlist.insert("eng".into(), Vec::new());
    idlist.insert("fra".into(), Vec::new());
    for _ in 0..25 {
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

    let mut params = Parameters::zeros(da.len(), labels.len());
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    let config = TrainerConfig::new().eta(0.5);

    let mut last_accuracy = 0.0;
    for _ in 0..40 {
        let mut trainer = Trainer::new(&da, &labels, &mut params, config.clone());
        let report = trainer.train_epoch(&corpus, &idlist, &mut rng).unwrap();
        last_accuracy = report.total_correct as f64 / report.total as f64;
    }
    assert!((last_accuracy - 1.0).abs() < 1e-9);
}

#[test]
fn scenario_learn_1_regularization_is_monotone_non_increasing() {
    let da = DoubleArray::build(&["cat", "dog"]).unwrap();
    let labels = Labels::new(vec!["eng".into(), "fra".into()]);
    let mut corpus = Vec::new();
    let mut idlist: hashbrown::HashMap<String, Vec<usize>> = hashbrown::HashMap::new();
    idlist.insert("eng".into(), Vec::new());
    idlist.insert("fra".into(), Vec::new());
    for _ in 0..25 {
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

    let mut params = Parameters::zeros(da.len(), labels.len());
    let mut rng = rand::rngs::StdRng::seed_from_u64(11);
    let config = TrainerConfig::new().eta(0.5).regularization(80.0);

    let mut counts = Vec::new();
    for _ in 0..6 {
        let mut trainer = Trainer::new(&da, &labels, &mut params, config.clone());
        let report = trainer.train_epoch(&corpus, &idlist, &mut rng).unwrap();
        counts.push(report.relevant_features);
    }
    for w in counts.windows(2) {
        assert!(w[1] <= w[0]);
    }
}

/// The extraction scan always sandwiches input with sentinels; a
/// feature anchored at one is distinct from the same substring
/// unsandwiched (open question (b) resolved explicitly, per §9).
#[test]
fn sentinel_sandwiching_distinguishes_boundary_features() {
    use crate::common::SENTINEL;
    let boundary = format!("{SENTINEL}cat");
    let bare = "cat".to_string();
    let mut features = [boundary, bare];
    features.sort();
    let da = DoubleArray::build(&features).unwrap();

    let sandwiched = format!("{SENTINEL}cat{SENTINEL}");
    let counts = da.extract(&sandwiched);
    assert_eq!(counts.len(), 2, "both the anchored and bare features should match");

    // Without sentinel sandwiching, only the bare feature can match.
    let counts_bare = da.extract("cat");
    assert_eq!(counts_bare.len(), 1);
}

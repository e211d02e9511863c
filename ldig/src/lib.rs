//! ldig: a double-array-backed short-text language identifier.
//!
//! Core subsystems: a packed double-array trie ([`doublearray`]) that
//! maps substring features to dense ids and extracts the multiset of
//! features occurring in an input string, and a sparse multiclass
//! logistic-regression learner/scorer ([`trainer`], [`scorer`]) whose
//! weights are indexed by feature id, trained by online SGD with an
//! optional cumulative L1 (lazy) penalty.
#![deny(missing_docs)]

pub mod common;
pub mod corpus;
pub mod doublearray;
pub mod errors;
pub mod features;
pub mod labels;
pub mod maxsubst;
pub mod model;
pub mod normalize;
pub mod parameters;
pub mod scorer;
pub mod shrink;
pub mod trainer;

pub use corpus::{load_for_detection, load_for_training, CorpusRecord};
pub use doublearray::DoubleArray;
pub use errors::{LdigError, Result};
pub use features::FeatureList;
pub use labels::Labels;
pub use model::Model;
pub use normalize::{normalize, Normalized};
pub use parameters::Parameters;
pub use scorer::{Prediction, Scorer};
pub use trainer::{EpochReport, Trainer, TrainerConfig};

#[cfg(test)]
mod tests;

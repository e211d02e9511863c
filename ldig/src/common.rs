//! Common settings shared across ldig modules.
use bincode::config::{self, Fixint, LittleEndian};

/// The reserved word-boundary marker. Appears only at position 0 or the
/// last position of a feature, and sandwiches every string handed to
/// [`crate::doublearray::DoubleArray::extract`].
pub const SENTINEL: char = '\u{0001}';

/// Default confidence threshold below which a prediction is reported as
/// "unknown" (§4.4).
pub const DEFAULT_THRESHOLD: f64 = 0.6;

/// Default lower bound of feature frequency used by the admission filter.
pub const DEFAULT_LBFF: u64 = 8;

/// Default n-gram length upper bound used by the admission filter.
pub const DEFAULT_NGRAM_BOUND: usize = 99999;

/// Default number of full-regularization sweeps per epoch.
pub const DEFAULT_N_FULL_REG: u64 = 2;

/// Default SGD learning rate.
pub const DEFAULT_ETA: f64 = 0.1;

/// Threshold below which a parameter row is considered numerically zero
/// and becomes a shrink candidate.
pub const ZERO_EPS: f64 = 1e-7;

/// Common bincode configuration used to (de)serialize the double array.
pub const fn bincode_config() -> config::Configuration<LittleEndian, Fixint> {
    config::standard()
        .with_little_endian()
        .with_fixed_int_encoding()
}

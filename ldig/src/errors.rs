//! Definition of errors.

use std::error::Error;
use std::fmt;

/// A specialized Result type for ldig.
pub type Result<T, E = LdigError> = std::result::Result<T, E>;

/// The error type for ldig.
#[derive(Debug)]
pub enum LdigError {
    /// The feature list given to the double-array builder is unsorted,
    /// duplicated, or contains a feature that is a strict prefix of
    /// another at the same terminal position.
    InvalidFeatureSet(InvalidArgumentError),

    /// A corpus line's label is not present in the model's label table.
    UnknownLabel(InvalidArgumentError),

    /// A model file is missing or does not match its expected layout.
    InvalidFormat(InvalidFormatError),

    /// The external maximum-substring extractor exited non-zero or
    /// produced no output.
    ExtractorFailed(InvalidArgumentError),

    /// Softmax input was all `-inf` or NaN.
    NumericDegeneracy(InvalidArgumentError),

    /// The error variant for [`std::num::TryFromIntError`].
    TryFromInt(std::num::TryFromIntError),

    /// The error variant for [`std::num::ParseIntError`].
    ParseInt(std::num::ParseIntError),

    /// The error variant for [`std::num::ParseFloatError`].
    ParseFloat(std::num::ParseFloatError),

    /// The error variant for [`bincode::error::DecodeError`].
    BincodeDecode(bincode::error::DecodeError),

    /// The error variant for [`bincode::error::EncodeError`].
    BincodeEncode(bincode::error::EncodeError),

    /// The error variant for [`serde_json::Error`].
    Json(serde_json::Error),

    /// The error variant for [`std::io::Error`].
    Io(std::io::Error),
}

impl LdigError {
    pub(crate) fn invalid_feature_set<S: Into<String>>(msg: S) -> Self {
        Self::InvalidFeatureSet(InvalidArgumentError { msg: msg.into() })
    }

    pub(crate) fn unknown_label<S: Into<String>>(msg: S) -> Self {
        Self::UnknownLabel(InvalidArgumentError { msg: msg.into() })
    }

    pub(crate) fn invalid_format<S: Into<String>>(file: &'static str, msg: S) -> Self {
        Self::InvalidFormat(InvalidFormatError {
            file,
            msg: msg.into(),
        })
    }

    pub(crate) fn extractor_failed<S: Into<String>>(msg: S) -> Self {
        Self::ExtractorFailed(InvalidArgumentError { msg: msg.into() })
    }

    pub(crate) fn numeric_degeneracy<S: Into<String>>(msg: S) -> Self {
        Self::NumericDegeneracy(InvalidArgumentError { msg: msg.into() })
    }
}

impl fmt::Display for LdigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidFeatureSet(e) => write!(f, "InvalidFeatureSet: {e}"),
            Self::UnknownLabel(e) => write!(f, "UnknownLabel: {e}"),
            Self::InvalidFormat(e) => e.fmt(f),
            Self::ExtractorFailed(e) => write!(f, "ExtractorFailed: {e}"),
            Self::NumericDegeneracy(e) => write!(f, "NumericDegeneracy: {e}"),
            Self::TryFromInt(e) => e.fmt(f),
            Self::ParseInt(e) => e.fmt(f),
            Self::ParseFloat(e) => e.fmt(f),
            Self::BincodeDecode(e) => e.fmt(f),
            Self::BincodeEncode(e) => e.fmt(f),
            Self::Json(e) => e.fmt(f),
            Self::Io(e) => e.fmt(f),
        }
    }
}

impl Error for LdigError {}

/// Error used when an argument or runtime input is invalid.
#[derive(Debug)]
pub struct InvalidArgumentError {
    pub(crate) msg: String,
}

impl fmt::Display for InvalidArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.msg)
    }
}

impl Error for InvalidArgumentError {}

/// Error used when a model file does not match its expected shape.
#[derive(Debug)]
pub struct InvalidFormatError {
    pub(crate) file: &'static str,
    pub(crate) msg: String,
}

impl fmt::Display for InvalidFormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidFormat: {}: {}", self.file, self.msg)
    }
}

impl Error for InvalidFormatError {}

impl From<std::num::TryFromIntError> for LdigError {
    fn from(error: std::num::TryFromIntError) -> Self {
        Self::TryFromInt(error)
    }
}

impl From<std::num::ParseIntError> for LdigError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::ParseInt(error)
    }
}

impl From<std::num::ParseFloatError> for LdigError {
    fn from(error: std::num::ParseFloatError) -> Self {
        Self::ParseFloat(error)
    }
}

impl From<bincode::error::DecodeError> for LdigError {
    fn from(error: bincode::error::DecodeError) -> Self {
        Self::BincodeDecode(error)
    }
}

impl From<bincode::error::EncodeError> for LdigError {
    fn from(error: bincode::error::EncodeError) -> Self {
        Self::BincodeEncode(error)
    }
}

impl From<serde_json::Error> for LdigError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error)
    }
}

impl From<std::io::Error> for LdigError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

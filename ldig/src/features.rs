//! The `features` file: one `<substring>\t<freq>\n` per line, sorted
//! lexicographically by substring (§6). This is the authoritative,
//! human-readable companion to the packed `doublearray`; `init` and
//! `shrink` both write it, and its row order is the feature id order
//! used to build the double array and index the parameter matrix.
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::errors::{LdigError, Result};

/// One admitted feature and the occurrence count that justified it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureEntry {
    /// The feature's substring text.
    pub text: String,
    /// Its occurrence count in the corpus at admission time.
    pub freq: u64,
}

/// An ordered, deduplicated list of features; index in the list is the
/// feature id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureList(
    /// The entries, in feature-id order.
    pub Vec<FeatureEntry>,
);

impl FeatureList {
    /// The number of features (`M`).
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` if there are no entries.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The bare substrings, in feature-id order, as needed by
    /// [`crate::doublearray::DoubleArray::build`].
    pub fn texts(&self) -> Vec<&str> {
        self.0.iter().map(|e| e.text.as_str()).collect()
    }

    /// Parses a `features` file. Each line must be `<substring>\t<freq>`;
    /// substrings must be strictly increasing (sorted, deduplicated).
    pub fn read<R: BufRead>(rdr: R) -> Result<Self> {
        let mut entries = Vec::new();
        let mut prev: Option<String> = None;
        for (n, line) in rdr.lines().enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let Some(tab) = line.rfind('\t') else {
                return Err(LdigError::invalid_format(
                    "features",
                    format!("missing separator at line {}", n + 1),
                ));
            };
            let (text, freq_str) = (&line[..tab], &line[tab + 1..]);
            let freq: u64 = freq_str.parse().map_err(|_| {
                LdigError::invalid_format(
                    "features",
                    format!("non-numeric frequency at line {}", n + 1),
                )
            })?;
            if let Some(p) = &prev {
                if p.as_str() >= text {
                    return Err(LdigError::invalid_format(
                        "features",
                        format!("unordered feature at line {}: '{}' >= '{}'", n + 1, p, text),
                    ));
                }
            }
            prev = Some(text.to_string());
            entries.push(FeatureEntry {
                text: text.to_string(),
                freq,
            });
        }
        Ok(Self(entries))
    }

    /// Reads a `features` file from a model directory path.
    pub fn read_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            LdigError::invalid_format("features", format!("cannot open {path:?}: {e}"))
        })?;
        Self::read(BufReader::new(file))
    }

    /// Writes `<substring>\t<freq>\n` per entry, in list order.
    pub fn write<W: Write>(&self, mut wtr: W) -> Result<()> {
        for entry in &self.0 {
            writeln!(wtr, "{}\t{}", entry.text, entry.freq)?;
        }
        Ok(())
    }

    /// Writes a `features` file to a model directory path.
    pub fn write_path(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.write(BufWriter::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let list = FeatureList(vec![
            FeatureEntry { text: "ca".into(), freq: 12 },
            FeatureEntry { text: "cat".into(), freq: 9 },
            FeatureEntry { text: "dog".into(), freq: 8 },
        ]);
        let mut buf = Vec::new();
        list.write(&mut buf).unwrap();
        let back = FeatureList::read(&buf[..]).unwrap();
        assert_eq!(list, back);
    }

    #[test]
    fn test_rejects_unordered() {
        let raw = "cat\t10\nant\t5\n";
        assert!(FeatureList::read(raw.as_bytes()).is_err());
    }

    #[test]
    fn test_rejects_missing_separator() {
        let raw = "cat 10\n";
        assert!(FeatureList::read(raw.as_bytes()).is_err());
    }

    #[test]
    fn test_rejects_duplicate() {
        let raw = "cat\t10\ncat\t5\n";
        assert!(FeatureList::read(raw.as_bytes()).is_err());
    }
}

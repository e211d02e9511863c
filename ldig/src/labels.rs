//! The label table: an ordered list of `K` language labels, read once
//! from `labels.json` at load time and immutable for the rest of the
//! process lifetime (§3, §6).
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use crate::errors::{LdigError, Result};

/// Ordered, lexicographically-sorted list of language labels.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Labels(Vec<String>);

impl Labels {
    /// Builds a label table from an already-sorted, deduplicated list.
    pub fn new(labels: Vec<String>) -> Self {
        Self(labels)
    }

    /// The number of labels (`K`).
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` if there are no entries.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The labels, in table order.
    #[inline(always)]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// The index of `label` in the table, if present.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.0.iter().position(|l| l == label)
    }

    /// Reads a `labels.json` file: a JSON array of strings.
    pub fn read<R: Read>(mut rdr: R) -> Result<Self> {
        let mut buf = String::new();
        rdr.read_to_string(&mut buf)?;
        let labels: Vec<String> = serde_json::from_str(&buf)?;
        Ok(Self(labels))
    }

    /// Reads `labels.json` from a model directory's `labels` path.
    pub fn read_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            LdigError::invalid_format("labels", format!("cannot open {path:?}: {e}"))
        })?;
        Self::read(file)
    }

    /// Writes the label table as a JSON array of strings.
    pub fn write<W: Write>(&self, mut wtr: W) -> Result<()> {
        let json = serde_json::to_string(&self.0)?;
        wtr.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Writes the label table to a model directory's `labels` path.
    pub fn write_path(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.write(BufWriter::new(file))
    }
}

impl AsRef<[String]> for Labels {
    fn as_ref(&self) -> &[String] {
        &self.0
    }
}

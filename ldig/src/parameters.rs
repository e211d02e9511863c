//! The parameter matrix: a dense `M x K` table of per-feature,
//! per-label weights (§3, §4.4). Serialized with a small
//! self-describing header followed by a flat little-endian `f64`
//! body, the way the teacher's `MatrixConnector::from_reader` hand-
//! parses a fixed layout rather than reaching for a serialization
//! crate on a flat numeric array (DESIGN.md).
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::errors::{LdigError, Result};

/// Magic bytes identifying the `parameters` file format.
const MAGIC: &[u8; 8] = b"LDIGPRM\0";
/// Dtype tag: little-endian 64-bit float, the only format this crate
/// writes or reads.
const DTYPE_F64_LE: u8 = 1;

/// Dense `M x K` matrix of real-valued weights, row-major (row = feature
/// id, column = label index).
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    data: Vec<f64>,
    m: usize,
    k: usize,
}

impl Parameters {
    /// A zero-valued `m x k` matrix, as created fresh at `init` (§3).
    pub fn zeros(m: usize, k: usize) -> Self {
        Self {
            data: vec![0.0; m * k],
            m,
            k,
        }
    }

    /// The number of feature rows (`M`).
    #[inline(always)]
    pub fn rows(&self) -> usize {
        self.m
    }

    /// The number of labels (`K`).
    #[inline(always)]
    pub fn cols(&self) -> usize {
        self.k
    }

    /// The per-label weight row for feature `id`.
    #[inline(always)]
    pub fn row(&self, id: u32) -> &[f64] {
        let id = id as usize;
        &self.data[id * self.k..(id + 1) * self.k]
    }

    /// A mutable view of feature `id`'s weight row.
    #[inline(always)]
    pub fn row_mut(&mut self, id: u32) -> &mut [f64] {
        let id = id as usize;
        let k = self.k;
        &mut self.data[id * k..(id + 1) * k]
    }

    /// `true` if feature row `id` is numerically zero (§4.6's shrink
    /// candidate predicate): `||W[id,:]||_1 <= 1e-7`.
    pub fn is_row_zero(&self, id: u32) -> bool {
        self.row(id).iter().map(|w| w.abs()).sum::<f64>() <= crate::common::ZERO_EPS
    }

    /// Builds a new matrix keeping only the rows at the given ids, in
    /// order, as used by shrink (§4.6).
    pub fn select_rows(&self, ids: &[u32]) -> Self {
        let mut data = Vec::with_capacity(ids.len() * self.k);
        for &id in ids {
            data.extend_from_slice(self.row(id));
        }
        Self {
            data,
            m: ids.len(),
            k: self.k,
        }
    }

    /// Reads a `parameters` file: header then `m*k` little-endian `f64`s.
    pub fn read<R: Read>(mut rdr: R) -> Result<Self> {
        let mut magic = [0u8; 8];
        rdr.read_exact(&mut magic)
            .map_err(|e| LdigError::invalid_format("parameters", format!("truncated header: {e}")))?;
        if &magic != MAGIC {
            return Err(LdigError::invalid_format(
                "parameters",
                "bad magic bytes",
            ));
        }
        let mut dtype = [0u8; 1];
        rdr.read_exact(&mut dtype)?;
        if dtype[0] != DTYPE_F64_LE {
            return Err(LdigError::invalid_format(
                "parameters",
                format!("unsupported dtype tag {}", dtype[0]),
            ));
        }
        let m = read_u64(&mut rdr)? as usize;
        let k = read_u64(&mut rdr)? as usize;

        let mut data = Vec::with_capacity(m * k);
        let mut buf = [0u8; 8];
        for _ in 0..(m * k) {
            rdr.read_exact(&mut buf).map_err(|e| {
                LdigError::invalid_format("parameters", format!("truncated body: {e}"))
            })?;
            data.push(f64::from_le_bytes(buf));
        }
        Ok(Self { data, m, k })
    }

    /// Reads `parameters` from a model directory's `parameters` path.
    pub fn read_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            LdigError::invalid_format("parameters", format!("cannot open {path:?}: {e}"))
        })?;
        Self::read(BufReader::new(file))
    }

    /// Writes the header and flat row-major body.
    pub fn write<W: Write>(&self, mut wtr: W) -> Result<()> {
        wtr.write_all(MAGIC)?;
        wtr.write_all(&[DTYPE_F64_LE])?;
        wtr.write_all(&(self.m as u64).to_le_bytes())?;
        wtr.write_all(&(self.k as u64).to_le_bytes())?;
        for &x in &self.data {
            wtr.write_all(&x.to_le_bytes())?;
        }
        Ok(())
    }

    /// Writes `parameters` to a model directory's `parameters` path.
    pub fn write_path(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.write(BufWriter::new(file))
    }
}

fn read_u64<R: Read>(rdr: &mut R) -> Result<u64> {
    let mut buf = [0u8; 8];
    rdr.read_exact(&mut buf)
        .map_err(|e| LdigError::invalid_format("parameters", format!("truncated header: {e}")))?;
    Ok(u64::from_le_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros_shape() {
        let p = Parameters::zeros(3, 2);
        assert_eq!(p.rows(), 3);
        assert_eq!(p.cols(), 2);
        assert_eq!(p.row(1), &[0.0, 0.0]);
    }

    #[test]
    fn test_round_trip() {
        let mut p = Parameters::zeros(2, 3);
        p.row_mut(0).copy_from_slice(&[1.0, -2.5, 3.0]);
        p.row_mut(1).copy_from_slice(&[0.0, 0.0, 9.25]);

        let mut buf = Vec::new();
        p.write(&mut buf).unwrap();
        let back = Parameters::read(&buf[..]).unwrap();
        assert_eq!(p, back);
    }

    #[test]
    fn test_is_row_zero() {
        let mut p = Parameters::zeros(2, 2);
        assert!(p.is_row_zero(0));
        p.row_mut(0)[1] = 1e-9;
        assert!(p.is_row_zero(0));
        p.row_mut(1)[0] = 0.5;
        assert!(!p.is_row_zero(1));
    }

    #[test]
    fn test_select_rows() {
        let mut p = Parameters::zeros(3, 2);
        p.row_mut(0).copy_from_slice(&[1.0, 1.0]);
        p.row_mut(1).copy_from_slice(&[2.0, 2.0]);
        p.row_mut(2).copy_from_slice(&[3.0, 3.0]);
        let kept = p.select_rows(&[0, 2]);
        assert_eq!(kept.rows(), 2);
        assert_eq!(kept.row(0), &[1.0, 1.0]);
        assert_eq!(kept.row(1), &[3.0, 3.0]);
    }

    #[test]
    fn test_rejects_bad_magic() {
        let buf = vec![0u8; 32];
        assert!(Parameters::read(&buf[..]).is_err());
    }
}

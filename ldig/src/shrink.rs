//! Shrinks a trained model: drops all-zero feature rows, rebuilds the
//! double array over the surviving features, and compacts the
//! parameter matrix to match (§4.6). Feature ids are reassigned by the
//! new ordering; no external identifier survives shrink.
use crate::doublearray::DoubleArray;
use crate::errors::Result;
use crate::features::FeatureList;
use crate::parameters::Parameters;

/// The artifacts produced by a shrink pass.
pub struct Shrunk {
    /// The compacted feature list, in the original relative order.
    pub features: FeatureList,
    /// The compacted parameter matrix, rows matching `features`.
    pub params: Parameters,
    /// The double array rebuilt over `features`.
    pub da: DoubleArray,
}

/// Computes the keep mask, compacts `features` and `params`, and
/// rebuilds the double array over the kept feature texts.
///
/// Running this twice in succession is a no-op on the second run
/// (TESTABLE PROPERTY 6): once every surviving row is non-zero, the
/// keep mask is all-true and the rebuild reproduces the same arrays
/// (TESTABLE PROPERTY 3).
pub fn shrink(features: &FeatureList, params: &Parameters) -> Result<Shrunk> {
    let keep_ids: Vec<u32> = (0..features.len() as u32)
        .filter(|&id| !params.is_row_zero(id))
        .collect();

    let kept_entries: Vec<_> = keep_ids.iter().map(|&id| features.0[id as usize].clone()).collect();
    let new_features = FeatureList(kept_entries);
    let new_params = params.select_rows(&keep_ids);
    let da = DoubleArray::build(&new_features.texts())?;

    Ok(Shrunk {
        features: new_features,
        params: new_params,
        da,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureEntry;

    fn entry(s: &str, freq: u64) -> FeatureEntry {
        FeatureEntry {
            text: s.to_string(),
            freq,
        }
    }

    #[test]
    fn test_shrink_drops_zero_rows() {
        let features = FeatureList(vec![entry("ca", 10), entry("cat", 5), entry("dog", 3)]);
        let mut params = Parameters::zeros(3, 2);
        params.row_mut(0).copy_from_slice(&[1.0, 0.0]);
        // row 1 ("cat") left all-zero.
        params.row_mut(2).copy_from_slice(&[0.0, 2.0]);

        let shrunk = shrink(&features, &params).unwrap();
        assert_eq!(shrunk.features.len(), 2);
        assert_eq!(shrunk.features.0[0].text, "ca");
        assert_eq!(shrunk.features.0[1].text, "dog");
        assert_eq!(shrunk.params.rows(), 2);
        assert_eq!(shrunk.da.get("cat"), Err(crate::doublearray::NotFound));
        assert_eq!(shrunk.da.get("ca"), Ok(0));
        assert_eq!(shrunk.da.get("dog"), Ok(1));
    }

    #[test]
    fn test_shrink_idempotent() {
        let features = FeatureList(vec![entry("ca", 10), entry("cat", 5), entry("dog", 3)]);
        let mut params = Parameters::zeros(3, 2);
        params.row_mut(0).copy_from_slice(&[1.0, 0.0]);
        params.row_mut(2).copy_from_slice(&[0.0, 2.0]);

        let once = shrink(&features, &params).unwrap();
        let twice = shrink(&once.features, &once.params).unwrap();
        assert_eq!(once.features, twice.features);
        assert_eq!(once.params, twice.params);
    }
}

//! Adapter for the external maximum-substring extractor, and the
//! feature admission filter applied to its output (§6).
use std::path::Path;
use std::process::Command;

use crate::common::SENTINEL;
use crate::errors::{LdigError, Result};

/// Runs the external extractor as a scoped child process exactly once.
/// Its failure (non-zero exit or missing output) is fatal to `init`.
pub fn run_extractor(bin: &Path, input: &Path, output: &Path) -> Result<()> {
    let status = Command::new(bin)
        .arg(input)
        .arg(output)
        .status()
        .map_err(|e| LdigError::extractor_failed(format!("failed to spawn {bin:?}: {e}")))?;
    if !status.success() {
        return Err(LdigError::extractor_failed(format!(
            "{bin:?} exited with {status}"
        )));
    }
    if !output.exists() {
        return Err(LdigError::extractor_failed(format!(
            "{bin:?} produced no output file at {output:?}"
        )));
    }
    Ok(())
}

/// Latin-ish ranges used by the admission filter's clause (d).
fn is_latinish(c: char) -> bool {
    c.is_ascii_alphabetic()
        || ('\u{00A1}'..='\u{00A3}').contains(&c)
        || ('\u{00BF}'..='\u{024F}').contains(&c)
        || ('\u{1E00}'..='\u{1EFF}').contains(&c)
}

/// The five-clause feature admission filter run over extractor output
/// `(substring, count)` pairs during `init` and `shrink`'s rebuild path.
pub fn admit_feature(s: &str, count: u64, lbff: u64, ngram_bound: usize) -> bool {
    if count < lbff {
        return false;
    }
    if s.chars().count() > ngram_bound {
        return false;
    }
    // (c) sentinel only at the ends: reject any interior sentinel.
    let chars: Vec<char> = s.chars().collect();
    if chars.len() >= 3 {
        for w in chars.windows(3) {
            if w[1] == SENTINEL {
                return false;
            }
        }
    }
    if !s.chars().any(is_latinish) {
        return false;
    }
    if chars.first() == Some(&SENTINEL) && chars.last() == Some(&SENTINEL) {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_below_frequency_floor() {
        assert!(!admit_feature("the", 7, 8, 99999));
        assert!(admit_feature("the", 8, 8, 99999));
    }

    #[test]
    fn test_rejects_over_ngram_bound() {
        assert!(!admit_feature("abcdef", 100, 8, 5));
    }

    #[test]
    fn test_rejects_interior_sentinel() {
        let s = format!("a{SENTINEL}b");
        assert!(!admit_feature(&s, 100, 8, 99999));
    }

    #[test]
    fn test_rejects_no_latin() {
        assert!(!admit_feature("\u{4e2d}\u{6587}", 100, 8, 99999));
    }

    #[test]
    fn test_rejects_both_ends_sentinel() {
        let s = format!("{SENTINEL}{SENTINEL}");
        assert!(!admit_feature(&s, 100, 8, 99999));
    }

    #[test]
    fn test_admits_boundary_anchored_feature() {
        let s = format!("{SENTINEL}the");
        assert!(admit_feature(&s, 100, 8, 99999));
    }
}

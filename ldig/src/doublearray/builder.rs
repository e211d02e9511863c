//! Double-array construction by common-prefix partitioning (§4.1).
use std::collections::HashMap;

use crate::errors::{LdigError, Result};

use super::DoubleArray;

/// Builds a [`DoubleArray`] over a sorted, deduplicated feature list.
pub(super) fn build<S: AsRef<str>>(features: &[S]) -> Result<DoubleArray> {
    let features: Vec<&str> = features.iter().map(AsRef::as_ref).collect();
    validate_sorted_and_unique(&features)?;

    let code_map = assign_codes(&features);
    let coded: Vec<Vec<i32>> = features
        .iter()
        .map(|f| f.chars().map(|c| code_map[&c]).collect())
        .collect();

    let mut b = Builder::new();
    let all_ids: Vec<usize> = (0..coded.len()).collect();
    b.insert(1, &all_ids, &coded, 0)?;

    Ok(DoubleArray {
        base: b.base,
        check: b.check,
        value: b.value,
        code_map,
    })
}

fn validate_sorted_and_unique(features: &[&str]) -> Result<()> {
    if features.is_empty() {
        return Ok(());
    }
    if features[0].is_empty() {
        return Err(LdigError::invalid_feature_set("feature must be non-empty"));
    }
    for w in features.windows(2) {
        if w[1].is_empty() {
            return Err(LdigError::invalid_feature_set("feature must be non-empty"));
        }
        if w[0] >= w[1] {
            return Err(LdigError::invalid_feature_set(format!(
                "features must be strictly sorted and unique: '{}' >= '{}'",
                w[0], w[1]
            )));
        }
    }
    Ok(())
}

/// Assigns `code(c)` by first occurrence, scanning the sorted feature
/// list left to right, starting at 1 (0 is reserved for end-of-string).
fn assign_codes(features: &[&str]) -> HashMap<char, i32> {
    let mut code_map = HashMap::new();
    let mut next_code = 1i32;
    for f in features {
        for c in f.chars() {
            code_map.entry(c).or_insert_with(|| {
                let code = next_code;
                next_code += 1;
                code
            });
        }
    }
    code_map
}

/// Mutable state threaded through the recursive placement algorithm.
struct Builder {
    base: Vec<i32>,
    check: Vec<i32>,
    value: Vec<i32>,
}

impl Builder {
    fn new() -> Self {
        let mut s = Self {
            base: vec![0; 2],
            check: vec![0; 2],
            value: vec![0; 2],
        };
        s.check[1] = -1; // root's parent marker (I1)
        s
    }

    fn ensure_len(&mut self, n: usize) {
        if self.base.len() <= n {
            let new_len = n + 1;
            self.base.resize(new_len, 0);
            self.check.resize(new_len, 0);
            self.value.resize(new_len, 0);
        }
    }

    fn is_free(&self, j: usize) -> bool {
        j >= self.check.len() || self.check[j] == 0
    }

    /// Smallest positive `base` such that `base + code` is free and
    /// in-bounds for every `code` in `codes` (I3). Always searches from
    /// `1`: a retained "first free" hint would need to track the lowest
    /// index not yet reachable as *any* child's slot, which is a much
    /// stronger (and more expensive to maintain) property than "the
    /// lowest index not yet used as a base" — get that wrong and a slot
    /// that no node's children ever happen to land on is skipped forever.
    fn find_base(&self, codes: &[i32]) -> i32 {
        let mut b = 1i32;
        loop {
            if codes.iter().all(|&c| {
                let j = b + c;
                j > 0 && self.is_free(j as usize)
            }) {
                return b;
            }
            b += 1;
        }
    }

    /// Places the children of `node` for the feature ids in `items`,
    /// all of which share the `depth`-character prefix already
    /// consumed to reach `node`, then recurses into each child.
    fn insert(
        &mut self,
        node: usize,
        items: &[usize],
        coded: &[Vec<i32>],
        depth: usize,
    ) -> Result<()> {
        let mut eos: Option<usize> = None;
        let mut groups: Vec<(i32, Vec<usize>)> = Vec::new();
        let mut group_index: HashMap<i32, usize> = HashMap::new();

        for &id in items {
            let codes = &coded[id];
            if codes.len() == depth {
                if eos.is_some() {
                    return Err(LdigError::invalid_feature_set(
                        "duplicate feature detected during build",
                    ));
                }
                eos = Some(id);
            } else {
                let c = codes[depth];
                match group_index.get(&c) {
                    Some(&gi) => groups[gi].1.push(id),
                    None => {
                        group_index.insert(c, groups.len());
                        groups.push((c, vec![id]));
                    }
                }
            }
        }

        let mut all_codes: Vec<i32> = groups.iter().map(|(c, _)| *c).collect();
        if eos.is_some() {
            all_codes.push(super::EOS_CODE);
        }
        if all_codes.is_empty() {
            return Ok(());
        }

        let base = self.find_base(&all_codes);
        self.base[node] = base;

        if let Some(id) = eos {
            let j = (base + super::EOS_CODE) as usize;
            self.ensure_len(j);
            self.check[j] = node as i32;
            self.base[j] = -(id as i32 + 1);
            self.value[j] = id as i32;
        }

        for (c, group_items) in groups {
            let j = (base + c) as usize;
            self.ensure_len(j);
            self.check[j] = node as i32;
            if group_items.len() == 1 && coded[group_items[0]].len() == depth + 1 {
                let id = group_items[0];
                self.base[j] = -(id as i32 + 1);
                self.value[j] = id as i32;
            } else {
                self.insert(j, &group_items, coded, depth + 1)?;
            }
        }
        Ok(())
    }
}

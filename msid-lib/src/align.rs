//! Exact-timestamp alignment of sparsely sampled channels against dense ones.
//!
//! Channels such as instrument temperatures are only recorded while the instrument is powered,
//! so they are sampled on a subset of the ticks of continuously sampled channels such as pitch.
//! They cannot be joined by position and are instead joined by timestamp equality. There is no
//! tolerance: a timestamp that differs in the last bit does not match.
use std::collections::HashSet;

use ndarray::{Array1, ArrayView1};

use crate::error::{Error, Result};

/// Hashable key for exact float equality. `-0.0` and `0.0` share a key.
fn key(t: f64) -> u64 {
    if t == 0.0 {
        0
    } else {
        t.to_bits()
    }
}

fn key_set(values: ArrayView1<f64>) -> HashSet<u64> {
    values
        .iter()
        .filter(|t| !t.is_nan())
        .map(|t| key(*t))
        .collect()
}

fn membership(values: ArrayView1<f64>, set: &HashSet<u64>) -> Vec<bool> {
    values
        .iter()
        .map(|t| !t.is_nan() && set.contains(&key(*t)))
        .collect()
}

/// Boolean mask over `values` that is true where the value also appears in `set`.
pub fn in_set(values: ArrayView1<f64>, set: ArrayView1<f64>) -> Vec<bool> {
    membership(values, &key_set(set))
}

/// Select the elements of `values` where `mask` is true.
///
/// # Errors
/// [Error::LengthMismatch] if the mask and values differ in length.
pub fn select(values: ArrayView1<f64>, mask: &[bool]) -> Result<Array1<f64>> {
    if values.len() != mask.len() {
        return Err(Error::LengthMismatch {
            what: "mask",
            expected: values.len(),
            actual: mask.len(),
        });
    }
    Ok(values
        .iter()
        .zip(mask)
        .filter_map(|(v, keep)| keep.then_some(*v))
        .collect())
}

/// Masks relating a reference channel's timestamps to a candidate channel's timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    /// True where a reference timestamp has a matching candidate sample.
    pub reference: Vec<bool>,
    /// True where a candidate timestamp appears in the reference.
    pub candidate: Vec<bool>,
}

impl Alignment {
    pub fn new(reference: ArrayView1<f64>, candidate: ArrayView1<f64>) -> Self {
        Self {
            reference: in_set(reference, candidate),
            candidate: in_set(candidate, reference),
        }
    }

    pub fn reference_matches(&self) -> usize {
        self.reference.iter().filter(|m| **m).count()
    }

    pub fn candidate_matches(&self) -> usize {
        self.candidate.iter().filter(|m| **m).count()
    }
}

/// Align any number of channels on the timestamps common to all of them.
///
/// Returns one mask per input. Selecting each channel with its mask yields equal-length series
/// whose rows correspond, provided the inputs are sorted and free of duplicates.
///
/// # Errors
/// [Error::DuplicateTimestamps] if the selected lengths disagree, naming the offending input by
/// its index in `names`.
pub fn align_all(times: &[ArrayView1<f64>], names: &[&str]) -> Result<Vec<Vec<bool>>> {
    let Some((first, rest)) = times.split_first() else {
        return Ok(Vec::default());
    };
    let mut common = key_set(*first);
    for other in rest {
        let other = key_set(*other);
        common.retain(|k| other.contains(k));
    }

    let masks: Vec<Vec<bool>> = times.iter().map(|t| membership(*t, &common)).collect();
    for (idx, mask) in masks.iter().enumerate() {
        let selected = mask.iter().filter(|m| **m).count();
        if selected != common.len() {
            let name = names.get(idx).copied().unwrap_or("?");
            return Err(Error::DuplicateTimestamps(name.to_string()));
        }
    }
    Ok(masks)
}

// src/analysis/state_diff.rs

use super::models::BalanceDiff;
use crate::simulation::models::RawStateDiff;

/// `{address, original, dirty}` -> `{address, original, new}`, entry for entry.
pub fn transform_state_diff(diffs: &[RawStateDiff]) -> Vec<BalanceDiff> {
    diffs
        .iter()
        .map(|diff| BalanceDiff {
            address: diff.address.clone(),
            original: diff.original.clone(),
            new: diff.dirty.clone(),
        })
        .collect()
}

//! Tuple-count bucketing.
//!
//! Splits the observed counter range of one snapshot into a handful of
//! readable ranges ("0", "1 - 500", "501 - 1,000") so a continuous flow value
//! can be drawn with a discrete colour.

use crate::format::thousands;
use serde::Serialize;

/// Label of the leading bucket used for edges without a real counter.
pub const NOT_APPLICABLE: &str = "Not applicable - counter not present";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub id: usize,
    pub name: String,
}

/// Partition of one snapshot's value range plus the bucket holding one value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketSet {
    pub buckets: Vec<Bucket>,
    pub index: usize,
}

impl BucketSet {
    /// Partition `values` and place `value` in it.
    ///
    /// Returns `None` for an empty value set. `derived` marks a placeholder
    /// value: a leading "not applicable" bucket is added and the value lands
    /// in it. An observed zero always lands in bucket 0.
    pub fn classify(values: &[i64], value: i64, derived: bool) -> Option<BucketSet> {
        let min = *values.iter().min()?;
        let max = *values.iter().max()?;
        let diff = max.saturating_sub(min);
        let mid = (diff as f64 / 2.0 + min as f64).trunc() as i64;
        let min_mid = (mid as f64 - min as f64 / 2.0).trunc() as i64;

        let mut names: Vec<String> = Vec::with_capacity(6);
        if derived {
            names.push(NOT_APPLICABLE.to_string());
        }
        names.push("0".to_string());

        let slot = if diff <= 100 {
            names.push(format!("1 - {}", thousands(mid)));
            if max > mid {
                names.push(range(mid.saturating_add(1), max));
            }
            match value {
                v if v <= 0 => 0,
                v if v <= mid => 1,
                _ => 2,
            }
        } else if diff <= 1000 {
            names.push(format!("1 - {}", thousands(min_mid)));
            if min == 0 {
                names.push(range(mid.saturating_add(1), max));
            } else {
                names.push(range(min_mid.saturating_add(1), mid));
                names.push(range(mid.saturating_add(1), max));
            }
            match value {
                v if v <= 0 => 0,
                v if v <= min_mid => 1,
                _ if min == 0 => 2,
                v if v <= mid => 2,
                _ => 3,
            }
        } else {
            let q1 = (min as f64 + diff as f64 / 4.0).trunc() as i64;
            let q3 = (min as f64 + diff as f64 * 0.75).trunc() as i64;
            names.push(range(min.saturating_add(1), q1));
            names.push(range(q1.saturating_add(1), mid));
            names.push(range(mid.saturating_add(1), q3));
            names.push(range(q3.saturating_add(1), max));
            match value {
                v if v <= 0 => 0,
                v if v <= q1 => 1,
                v if v <= mid => 2,
                v if v <= q3 => 3,
                _ => 4,
            }
        };

        let index = if derived {
            0
        } else {
            slot.min(names.len() - 1)
        };

        let buckets = names
            .into_iter()
            .enumerate()
            .map(|(id, name)| Bucket { id, name })
            .collect();

        Some(BucketSet { buckets, index })
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

}

fn range(lo: i64, hi: i64) -> String {
    format!("{} - {}", thousands(lo), thousands(hi))
}

/// Keep the bucket set with the most buckets; later sets win ties.
pub fn widest(current: Option<BucketSet>, candidate: BucketSet) -> BucketSet {
    match current {
        Some(cur) if cur.len() > candidate.len() => cur,
        _ => candidate,
    }
}

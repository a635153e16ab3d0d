//! Combinatorial subset search over the project's resource pool.
//!
//! k-subsets are enumerated lexicographically in the input order, so
//! the first satisfying subset is a stable function of the request.
//! Enumeration refuses to start when `C(n, k)` exceeds the hard cap:
//! callers must treat that as "no subset found" (fail-closed).

use std::collections::HashMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::blocks::{any_overlap, ResourceBlocks};
use crate::calendar::WorkCalendar;
use crate::overlap::{days_window_overlap, hours_window_overlap};

/// Hard cap on enumerated combinations per search.
pub const MAX_SUBSET_COMBINATIONS: u128 = 10_000;

/// Outcome of a subset search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubsetSearch {
    /// The first subset, in input order, satisfying the predicate.
    Found(Vec<String>),
    NotFound,
    /// `C(n, k)` exceeded the cap; enumeration was refused.
    CapExceeded,
}

impl SubsetSearch {
    pub fn found(self) -> Option<Vec<String>> {
        match self {
            SubsetSearch::Found(subset) => Some(subset),
            _ => None,
        }
    }
}

/// Binomial coefficient with saturation; `u128` keeps even degenerate
/// pool sizes exact far beyond the cap.
pub fn combination_count(n: usize, k: usize) -> u128 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result: u128 = 1;
    for i in 0..k {
        result = result.saturating_mul((n - i) as u128) / (i as u128 + 1);
        if result > MAX_SUBSET_COMBINATIONS * 1_000 {
            // No caller distinguishes magnitudes this far past the cap.
            return result;
        }
    }
    result
}

/// Enumerate k-subsets of `ordered` lexicographically, stopping at the
/// first subset for which `predicate` returns true.
///
/// The optional deadline is checked between candidates; expiry behaves
/// as exhaustion, never as an error.
pub fn find_first_subset<F>(
    ordered: &[String],
    k: usize,
    deadline: Option<Instant>,
    mut predicate: F,
) -> SubsetSearch
where
    F: FnMut(&[String]) -> bool,
{
    let n = ordered.len();
    if k == 0 || k > n {
        return SubsetSearch::NotFound;
    }
    let count = combination_count(n, k);
    if count > MAX_SUBSET_COMBINATIONS {
        tracing::warn!(
            n,
            k,
            combinations = %count,
            cap = %MAX_SUBSET_COMBINATIONS,
            "subset enumeration cap exceeded; treating as no eligible subset"
        );
        return SubsetSearch::CapExceeded;
    }

    let mut indices: Vec<usize> = (0..k).collect();
    let mut candidate: Vec<String> = Vec::with_capacity(k);
    loop {
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                return SubsetSearch::NotFound;
            }
        }
        candidate.clear();
        candidate.extend(indices.iter().map(|&i| ordered[i].clone()));
        if predicate(&candidate) {
            return SubsetSearch::Found(candidate);
        }

        // Advance to the next lexicographic index combination.
        let mut i = k;
        loop {
            if i == 0 {
                return SubsetSearch::NotFound;
            }
            i -= 1;
            if indices[i] < n - k + i {
                indices[i] += 1;
                for j in i + 1..k {
                    indices[j] = indices[j - 1] + 1;
                }
                break;
            }
        }
    }
}

/// First subset meeting the overlap requirement over an hours-mode
/// execution interval, with every member clear of its own ranges
/// during the buffer interval when one exists.
#[allow(clippy::too_many_arguments)]
pub fn find_first_eligible_subset_for_hours(
    ordered: &[String],
    k: usize,
    required_overlap: u32,
    exec_start: DateTime<Utc>,
    exec_end: DateTime<Utc>,
    buffer: Option<(DateTime<Utc>, DateTime<Utc>)>,
    per_resource: &HashMap<String, ResourceBlocks>,
    calendar: &WorkCalendar,
    zone: Tz,
    deadline: Option<Instant>,
) -> SubsetSearch {
    find_first_subset(ordered, k, deadline, |subset| {
        let overlap =
            hours_window_overlap(exec_start, exec_end, subset, per_resource, calendar, zone);
        if overlap < f64::from(required_overlap) {
            return false;
        }
        match buffer {
            None => true,
            Some((buffer_start, buffer_end)) => subset.iter().all(|id| {
                per_resource
                    .get(id)
                    .map(|r| !any_overlap(&r.personal_ranges, buffer_start, buffer_end, zone))
                    .unwrap_or(false)
            }),
        }
    })
}

/// First subset that can complete a days-mode execution window within
/// twice its length while meeting the overlap requirement.
#[allow(clippy::too_many_arguments)]
pub fn find_first_eligible_subset_for_days(
    ordered: &[String],
    k: usize,
    required_overlap: u32,
    start_day: DateTime<Tz>,
    execution_days: u32,
    per_resource: &HashMap<String, ResourceBlocks>,
    calendar: &WorkCalendar,
    zone: Tz,
    deadline: Option<Instant>,
) -> SubsetSearch {
    let max_throughput_days = execution_days * 2;
    find_first_subset(ordered, k, deadline, |subset| {
        let result = days_window_overlap(
            start_day,
            execution_days,
            max_throughput_days,
            subset,
            per_resource,
            calendar,
            zone,
        );
        result.can_complete && result.overlap_percentage >= f64::from(required_overlap)
    })
}

/// Best days-mode overlap across all k-subsets, for informative
/// validation failures. `None` when the cap refuses enumeration.
pub fn best_days_overlap(
    ordered: &[String],
    k: usize,
    start_day: DateTime<Tz>,
    execution_days: u32,
    per_resource: &HashMap<String, ResourceBlocks>,
    calendar: &WorkCalendar,
    zone: Tz,
) -> Option<f64> {
    let n = ordered.len();
    if k == 0 || k > n || combination_count(n, k) > MAX_SUBSET_COMBINATIONS {
        return None;
    }
    let mut best: f64 = 0.0;
    // Exhaustive scan: the predicate never matches, so the walk visits
    // every subset.
    let _ = find_first_subset(ordered, k, None, |subset| {
        let result = days_window_overlap(
            start_day,
            execution_days,
            execution_days * 2,
            subset,
            per_resource,
            calendar,
            zone,
        );
        if result.overlap_percentage > best {
            best = result.overlap_percentage;
        }
        false
    });
    Some(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn binomials() {
        assert_eq!(combination_count(3, 2), 3);
        assert_eq!(combination_count(5, 3), 10);
        assert_eq!(combination_count(20, 10), 184_756);
        assert_eq!(combination_count(2, 5), 0);
        assert_eq!(combination_count(4, 0), 1);
    }

    #[test]
    fn enumeration_is_lexicographic_in_input_order() {
        let pool = ids(&["a", "b", "c"]);
        let mut seen = Vec::new();
        let result = find_first_subset(&pool, 2, None, |s| {
            seen.push(s.to_vec());
            false
        });
        assert_eq!(result, SubsetSearch::NotFound);
        assert_eq!(
            seen,
            vec![ids(&["a", "b"]), ids(&["a", "c"]), ids(&["b", "c"])]
        );
    }

    #[test]
    fn first_satisfying_subset_wins() {
        let pool = ids(&["a", "b", "c", "d"]);
        let result = find_first_subset(&pool, 2, None, |s| s.contains(&"c".to_string()));
        assert_eq!(result, SubsetSearch::Found(ids(&["a", "c"])));
    }

    #[test]
    fn cap_refuses_enumeration_entirely() {
        let pool: Vec<String> = (0..20).map(|i| format!("r{i}")).collect();
        let mut calls = 0usize;
        let result = find_first_subset(&pool, 10, None, |_| {
            calls += 1;
            true
        });
        assert_eq!(result, SubsetSearch::CapExceeded);
        assert_eq!(calls, 0);
    }

    #[test]
    fn expired_deadline_reads_as_not_found() {
        let pool = ids(&["a", "b", "c"]);
        // A deadline of "now" has always passed by the first check.
        let result = find_first_subset(&pool, 2, Some(Instant::now()), |_| true);
        assert_eq!(result, SubsetSearch::NotFound);
    }

    #[test]
    fn k_larger_than_pool_finds_nothing() {
        let pool = ids(&["a"]);
        assert_eq!(
            find_first_subset(&pool, 2, None, |_| true),
            SubsetSearch::NotFound
        );
    }
}

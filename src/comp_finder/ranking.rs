use super::comp_finder_types::Candidate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// Secondary ordering applied within a tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Closest first, bigger discount breaks ties.
    DistancePriority,
    /// Bigger discount first, closest breaks ties.
    GapPriority,
}

impl Default for SortMode {
    fn default() -> Self {
        SortMode::DistancePriority
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "distance" | "distance priority" | "distance_priority" => Ok(SortMode::DistancePriority),
            "gap" | "gap priority" | "gap_priority" => Ok(SortMode::GapPriority),
            other => Err(format!("unknown sort mode: {}", other)),
        }
    }
}

#[inline]
fn by_distance(a: &Candidate, b: &Candidate) -> Ordering {
    a.distance.sort_miles().total_cmp(&b.distance.sort_miles())
}

#[inline]
fn by_gap_desc(a: &Candidate, b: &Candidate) -> Ordering {
    b.metric_gap.total_cmp(&a.metric_gap)
}

impl SortMode {
    pub fn compare(&self, a: &Candidate, b: &Candidate) -> Ordering {
        let by_tier = a.priority.cmp(&b.priority);
        match self {
            SortMode::DistancePriority => by_tier
                .then_with(|| by_distance(a, b))
                .then_with(|| by_gap_desc(a, b)),
            SortMode::GapPriority => by_tier
                .then_with(|| by_gap_desc(a, b))
                .then_with(|| by_distance(a, b)),
        }
    }

    /// Stable: full ties keep pool order.
    pub fn rank(&self, candidates: &mut [Candidate]) {
        candidates.sort_by(|a, b| self.compare(a, b));
    }
}

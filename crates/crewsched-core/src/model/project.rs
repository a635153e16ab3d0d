//! Project records and resource-policy normalization.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::duration::WorkDuration;
use super::resource::Resource;

/// A schedulable project owned by a professional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub professional_id: String,

    /// Defines both the run length and the execution mode. A project
    /// without one cannot be scheduled.
    #[serde(default)]
    pub execution_duration: Option<WorkDuration>,

    /// Lead time before the first bookable day.
    #[serde(default)]
    pub preparation_duration: Option<WorkDuration>,

    /// Cool-down after execution end.
    #[serde(default)]
    pub buffer_duration: Option<WorkDuration>,

    /// Ordered candidate resources. Duplicates and unknown IDs are
    /// dropped during policy resolution; order is significant.
    #[serde(default)]
    pub resources: Vec<String>,

    /// Minimum team size; clamped to `[1, resources.len()]`.
    #[serde(default = "default_min_resources")]
    pub min_resources: u32,

    /// Required joint-availability percentage over the execution
    /// window; clamped to `[10, 100]`, forced to 100 for solo work.
    #[serde(default = "default_min_overlap")]
    pub min_overlap_percentage: u32,

    #[serde(default)]
    pub subprojects: Vec<Subproject>,
}

fn default_min_resources() -> u32 {
    1
}

fn default_min_overlap() -> u32 {
    90
}

/// Per-subproject duration overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subproject {
    #[serde(default)]
    pub execution_duration: Option<WorkDuration>,
    #[serde(default)]
    pub preparation_duration: Option<WorkDuration>,
    #[serde(default)]
    pub buffer_duration: Option<WorkDuration>,
}

/// The execution/preparation/buffer durations in effect for a request,
/// after subproject overrides.
#[derive(Debug, Clone, Copy)]
pub struct EffectiveDurations {
    pub execution: Option<WorkDuration>,
    pub preparation: Option<WorkDuration>,
    pub buffer: Option<WorkDuration>,
}

impl Project {
    /// Resolve durations, applying the addressed subproject's overrides
    /// field-by-field. An out-of-range index falls back to the project.
    pub fn effective_durations(&self, subproject_index: Option<usize>) -> EffectiveDurations {
        let sub = subproject_index.and_then(|i| self.subprojects.get(i));
        EffectiveDurations {
            execution: sub
                .and_then(|s| s.execution_duration)
                .or(self.execution_duration),
            preparation: sub
                .and_then(|s| s.preparation_duration)
                .or(self.preparation_duration),
            buffer: sub.and_then(|s| s.buffer_duration).or(self.buffer_duration),
        }
    }
}

/// Normalized resource policy for one request.
#[derive(Debug, Clone)]
pub struct ResourcePolicy {
    /// Valid resource IDs, input order preserved, duplicates dropped.
    pub ordered: Vec<String>,
    /// Clamped minimum team size (the subset size `k`).
    pub min_resources: usize,
    /// Required overlap percentage for the window-level predicate.
    pub required_overlap: u32,
}

impl ResourcePolicy {
    /// Build the policy from a project against the known resource map.
    ///
    /// Unknown IDs are dropped (the engine never schedules phantom
    /// resources); clamps follow the data-model rules.
    pub fn resolve(project: &Project, known: &HashMap<String, Resource>) -> Self {
        let mut seen = HashSet::new();
        let ordered: Vec<String> = project
            .resources
            .iter()
            .filter(|id| known.contains_key(*id))
            .filter(|id| seen.insert((*id).clone()))
            .cloned()
            .collect();

        let min_resources = (project.min_resources.max(1) as usize).min(ordered.len().max(1));

        let required_overlap = if min_resources <= 1 {
            100
        } else {
            project.min_overlap_percentage.clamp(10, 100)
        };

        Self {
            ordered,
            min_resources,
            required_overlap,
        }
    }

    /// Whether the multi-resource pathways apply.
    pub fn is_multi(&self) -> bool {
        self.ordered.len() > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::duration::DurationUnit;

    fn known(ids: &[&str]) -> HashMap<String, Resource> {
        ids.iter()
            .map(|id| (id.to_string(), Resource::new(*id)))
            .collect()
    }

    fn project(resources: &[&str], min_resources: u32, min_overlap: u32) -> Project {
        Project {
            id: "p-1".into(),
            professional_id: "pro-1".into(),
            execution_duration: Some(WorkDuration::days(4.0)),
            preparation_duration: None,
            buffer_duration: None,
            resources: resources.iter().map(|s| s.to_string()).collect(),
            min_resources,
            min_overlap_percentage: min_overlap,
            subprojects: Vec::new(),
        }
    }

    #[test]
    fn duplicates_dropped_first_occurrence_kept() {
        let p = project(&["a", "b", "a", "c", "b"], 2, 75);
        let policy = ResourcePolicy::resolve(&p, &known(&["a", "b", "c"]));
        assert_eq!(policy.ordered, vec!["a", "b", "c"]);
    }

    #[test]
    fn unknown_ids_dropped() {
        let p = project(&["a", "ghost", "b"], 2, 75);
        let policy = ResourcePolicy::resolve(&p, &known(&["a", "b"]));
        assert_eq!(policy.ordered, vec!["a", "b"]);
    }

    #[test]
    fn min_resources_clamped_to_pool() {
        let p = project(&["a", "b"], 5, 75);
        let policy = ResourcePolicy::resolve(&p, &known(&["a", "b"]));
        assert_eq!(policy.min_resources, 2);

        let p = project(&["a", "b"], 0, 75);
        let policy = ResourcePolicy::resolve(&p, &known(&["a", "b"]));
        assert_eq!(policy.min_resources, 1);
    }

    #[test]
    fn overlap_clamped_and_forced_for_solo() {
        let p = project(&["a", "b"], 2, 3);
        assert_eq!(
            ResourcePolicy::resolve(&p, &known(&["a", "b"])).required_overlap,
            10
        );

        let p = project(&["a", "b"], 1, 40);
        assert_eq!(
            ResourcePolicy::resolve(&p, &known(&["a", "b"])).required_overlap,
            100
        );
    }

    #[test]
    fn subproject_overrides_apply_per_field() {
        let mut p = project(&["a"], 1, 90);
        p.preparation_duration = Some(WorkDuration::days(1.0));
        p.subprojects.push(Subproject {
            execution_duration: Some(WorkDuration::hours(6.0)),
            ..Default::default()
        });

        let eff = p.effective_durations(Some(0));
        assert_eq!(eff.execution.unwrap().unit, DurationUnit::Hours);
        // untouched fields fall through to the project
        assert_eq!(eff.preparation.unwrap().value, 1.0);

        // out-of-range index behaves like no subproject
        let eff = p.effective_durations(Some(9));
        assert_eq!(eff.execution.unwrap().unit, DurationUnit::Days);
    }
}

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    collections::BTreeMap,
    fmt::{self, Display},
};

use itertools::Itertools;
use serde::Serialize;
use tabled::Tabled;

use crate::{
    constants::PROGRESS_BINS, features::FeatureRow, trace::TraceRepository,
};

/// Length of one trace.
#[derive(Tabled, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceSteps {
    /// Assignment of the trace.
    #[tabled(rename = "assignmentID")]
    pub assignment_id: String,
    /// The trace.
    #[tabled(rename = "traceID")]
    pub trace_id:      String,
    /// `max index + 1`.
    #[tabled(rename = "n_steps")]
    pub n_steps:       u64,
}

/// Trace length statistics for one assignment.
#[derive(Tabled, Debug, Clone, PartialEq, Serialize)]
pub struct StepsSummary {
    /// The assignment.
    #[tabled(rename = "assignmentID")]
    pub assignment_id: String,
    /// Number of traces.
    #[tabled(rename = "traces")]
    pub traces:        usize,
    /// Mean steps per trace.
    #[tabled(rename = "mean", display = "crate::report::two_places")]
    pub mean:          f64,
    /// Median steps per trace.
    #[tabled(rename = "median", display = "crate::report::two_places")]
    pub median:        f64,
}

/// Steps per trace, in trace order.
pub fn steps_per_trace(repo: &TraceRepository) -> Vec<TraceSteps> {
    repo.traces()
        .iter()
        .map(|trace| TraceSteps {
            assignment_id: trace.key().assignment_id.clone(),
            trace_id:      trace.key().request_id.clone(),
            n_steps:       trace.n_steps(),
        })
        .collect()
}

/// Mean and median steps per trace for each assignment, sorted by assignment.
pub fn summarize_steps(steps: &[TraceSteps]) -> Vec<StepsSummary> {
    steps
        .iter()
        .into_group_map_by(|s| s.assignment_id.clone())
        .into_iter()
        .sorted_by(|a, b| a.0.cmp(&b.0))
        .map(|(assignment_id, group)| {
            let values: Vec<f64> = group
                .iter()
                .map(|s| s.n_steps as f64)
                .sorted_by(f64::total_cmp)
                .collect();
            StepsSummary {
                assignment_id,
                traces: values.len(),
                mean: values.iter().sum::<f64>() / values.len() as f64,
                median: median(&values),
            }
        })
        .collect()
}

/// Median of sorted, non-empty values; the mean of the middle two for even
/// lengths.
fn median(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// One of [`PROGRESS_BINS`] equal slices of `[0, 1]`.
///
/// Bins are closed on the right; the first bin also includes 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ProgressBin(pub usize);

impl ProgressBin {
    /// Upper edge of bin `i`, computed the same way for every caller so that
    /// values exactly on an edge land consistently.
    fn edge(i: usize) -> f64 {
        if i >= PROGRESS_BINS {
            1.0
        } else {
            i as f64 * (1.0 / PROGRESS_BINS as f64)
        }
    }

    /// Bin containing `progress`, or `None` outside `[0, 1]`.
    pub fn of(progress: f64) -> Option<Self> {
        if !(0.0..=1.0).contains(&progress) {
            return None;
        }
        (0..PROGRESS_BINS)
            .find(|&i| progress <= Self::edge(i + 1))
            .map(ProgressBin)
    }

    /// Lower and upper edge of the bin.
    pub fn bounds(self) -> (f64, f64) {
        (Self::edge(self.0), Self::edge(self.0 + 1))
    }
}

impl Display for ProgressBin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (low, high) = self.bounds();
        if self.0 == 0 {
            write!(f, "[{low:.1}, {high:.1}]")
        } else {
            write!(f, "({low:.1}, {high:.1}]")
        }
    }
}

/// Mean structure of programs at one stage of progress through an assignment.
#[derive(Tabled, Debug, Clone, PartialEq, Serialize)]
pub struct EvolutionRow {
    /// The assignment.
    #[tabled(rename = "assignmentID")]
    pub assignment_id: String,
    /// The progress bin.
    #[tabled(rename = "progress_bin")]
    pub bin:           ProgressBin,
    /// Snapshots falling in the bin.
    #[tabled(rename = "snapshots")]
    pub snapshots:     usize,
    /// Mean COMMAND count.
    #[tabled(rename = "mean_COMMAND", display = "crate::report::two_places")]
    pub mean_command:  f64,
    /// Mean REPORTER count.
    #[tabled(rename = "mean_REPORTER", display = "crate::report::two_places")]
    pub mean_reporter: f64,
    /// Mean HAT count.
    #[tabled(rename = "mean_HAT", display = "crate::report::two_places")]
    pub mean_hat:      f64,
}

/// Aggregates per-snapshot features by (assignment, progress bin).
///
/// Rows without progress are ignored. Only bins that contain snapshots are
/// reported.
pub fn structural_evolution(rows: &[FeatureRow]) -> Vec<EvolutionRow> {
    let mut grouped: BTreeMap<(String, ProgressBin), [usize; 4]> = BTreeMap::new();
    for row in rows {
        let Some(bin) = row.progress.and_then(ProgressBin::of) else {
            continue;
        };
        let entry = grouped
            .entry((row.assignment_id.clone(), bin))
            .or_default();
        entry[0] += 1;
        entry[1] += row.count("COMMAND");
        entry[2] += row.count("REPORTER");
        entry[3] += row.count("HAT");
    }

    grouped
        .into_iter()
        .map(|((assignment_id, bin), [n, command, reporter, hat])| {
            let n_f = n as f64;
            EvolutionRow {
                assignment_id,
                bin,
                snapshots: n,
                mean_command: command as f64 / n_f,
                mean_reporter: reporter as f64 / n_f,
                mean_hat: hat as f64 / n_f,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ast::{AstNode, Node},
        features::snapshot_features,
        grammar::GrammarCatalog,
        trace::Snapshot,
    };

    #[test]
    fn bins_are_right_closed_with_zero_in_the_first() {
        assert_eq!(ProgressBin::of(0.0), Some(ProgressBin(0)));
        assert_eq!(ProgressBin::of(0.1), Some(ProgressBin(0)));
        assert_eq!(ProgressBin::of(0.15), Some(ProgressBin(1)));
        assert_eq!(ProgressBin::of(0.3), Some(ProgressBin(2)));
        assert_eq!(ProgressBin::of(1.0), Some(ProgressBin(9)));
        assert_eq!(ProgressBin::of(1.5), None);
        assert_eq!(ProgressBin(0).to_string(), "[0.0, 0.1]");
        assert_eq!(ProgressBin(9).to_string(), "(0.9, 1.0]");
    }

    #[test]
    fn steps_summary_uses_max_index_plus_one() {
        let snap = |trace: &str, index: u64| {
            Snapshot::builder()
                .assignment_id("polygonMakerLab")
                .trace_id(trace)
                .index(index)
                .ast(AstNode::from(Node::new("script")))
                .build()
        };
        let repo = TraceRepository::from_snapshots([
            snap("a", 0),
            snap("a", 3),
            snap("b", 0),
            snap("b", 1),
            snap("c", 7),
        ]);

        let steps = steps_per_trace(&repo);
        assert_eq!(
            steps.iter().map(|s| s.n_steps).collect::<Vec<_>>(),
            [4, 2, 8]
        );

        let summary = summarize_steps(&steps);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].traces, 3);
        assert!((summary[0].mean - 14.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary[0].median, 4.0);
    }

    #[test]
    fn evolution_averages_within_bins() {
        let catalog = GrammarCatalog::build([("COMMAND", vec!["forward"])]).unwrap();
        let program = |n: usize| {
            let mut script = Node::new("script");
            for i in 0..n {
                script = script.with_child(i.to_string(), Node::new("forward"));
            }
            AstNode::from(script)
        };
        let snap = |trace: &str, index: u64, n: usize| {
            Snapshot::builder()
                .assignment_id("squiralHW")
                .trace_id(trace)
                .index(index)
                .ast(program(n))
                .build()
        };

        let repo = TraceRepository::from_snapshots([
            snap("a", 0, 0),
            snap("a", 2, 4),
            snap("b", 0, 2),
            snap("b", 4, 6),
        ]);
        let rows = snapshot_features(&catalog, &repo, "training");
        let evolution = structural_evolution(&rows);

        assert_eq!(evolution.len(), 2);
        assert_eq!(evolution[0].bin, ProgressBin(0));
        assert_eq!(evolution[0].snapshots, 2);
        assert_eq!(evolution[0].mean_command, 1.0);
        assert_eq!(evolution[1].bin, ProgressBin(9));
        assert_eq!(evolution[1].mean_command, 5.0);
    }
}

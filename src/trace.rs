#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::{
    ast::AstNode,
    error::HintkitError,
    types::{RequestKey, id_string, opt_flag},
};

/// One row of a training or request trace export.
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotRow {
    /// Assignment the trace belongs to.
    #[serde(rename = "assignmentID", deserialize_with = "id_string")]
    pub assignment_id: String,
    /// Trace identifier; for request traces this is also the request ID.
    #[serde(rename = "traceID", deserialize_with = "id_string")]
    pub trace_id:      String,
    /// Ordinal position of the snapshot within its trace.
    pub index:         u64,
    /// The program state as JSON-encoded AST text.
    pub code:          String,
    /// Whether the state passed the assignment's checks.
    #[serde(rename = "isCorrect", default, deserialize_with = "opt_flag")]
    pub is_correct:    Option<bool>,
}

/// One observed program state.
#[derive(Debug, Clone, PartialEq, Serialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct Snapshot {
    /// Assignment the trace belongs to.
    assignment_id: String,
    /// Trace the snapshot was recorded in.
    trace_id:      String,
    /// Ordinal position within the trace.
    index:         u64,
    /// The program at this point.
    ast:           AstNode,
    /// Whether the state passed the assignment's checks.
    #[builder(default)]
    is_correct:    bool,
}

impl Snapshot {
    /// Returns the assignment identifier.
    pub fn assignment_id(&self) -> &str {
        &self.assignment_id
    }

    /// Returns the trace identifier.
    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Returns the ordinal index.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Returns the program tree.
    pub fn ast(&self) -> &AstNode {
        &self.ast
    }

    /// Returns the correctness flag.
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    /// Returns the (assignment, trace) key.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(self.assignment_id.clone(), self.trace_id.clone())
    }
}

impl TryFrom<SnapshotRow> for Snapshot {
    type Error = HintkitError;

    fn try_from(row: SnapshotRow) -> Result<Self, Self::Error> {
        let ast = AstNode::parse(&row.code).map_err(|source| HintkitError::MalformedAst {
            context: format!(
                "trace {}/{} at index {}",
                row.assignment_id, row.trace_id, row.index
            ),
            source,
        })?;

        Ok(Self {
            assignment_id: row.assignment_id,
            trace_id: row.trace_id,
            index: row.index,
            ast,
            is_correct: row.is_correct.unwrap_or(false),
        })
    }
}

/// Snapshots sharing one (assignment, trace) key, in the order they were
/// supplied.
#[derive(Debug, Clone)]
pub struct Trace {
    /// The (assignment, trace) key.
    key:       RequestKey,
    /// Snapshots in input order; never empty.
    snapshots: Vec<Snapshot>,
}

impl Trace {
    /// Returns the (assignment, trace) key.
    pub fn key(&self) -> &RequestKey {
        &self.key
    }

    /// Returns the snapshots in input order.
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// Number of snapshots in the trace.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// A trace built by [`TraceRepository`] is never empty.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Largest ordinal index in the trace.
    pub fn max_index(&self) -> u64 {
        self.snapshots.iter().map(Snapshot::index).max().unwrap_or(0)
    }

    /// Number of steps, counting from index 0.
    pub fn n_steps(&self) -> u64 {
        self.max_index() + 1
    }

    /// The snapshot with the highest index. When indices tie, the one supplied
    /// last wins.
    pub fn final_snapshot(&self) -> Option<&Snapshot> {
        // max_by_key keeps the last of equal maxima
        self.snapshots.iter().max_by_key(|s| s.index)
    }

    /// Program state as of `target`: the snapshot with the greatest index not
    /// past it, ties again going to the one supplied last.
    pub fn snapshot_at(&self, target: u64) -> Option<&Snapshot> {
        self.snapshots
            .iter()
            .filter(|s| s.index <= target)
            .max_by_key(|s| s.index)
    }

    /// Relative position of `snapshot` in this trace, `index / max_index`.
    ///
    /// A trace whose only index is 0 is already at its end, so the result is
    /// 1.0 there.
    pub fn progress(&self, snapshot: &Snapshot) -> f64 {
        let max = self.max_index();
        if max == 0 {
            1.0
        } else {
            snapshot.index as f64 / max as f64
        }
    }
}

/// Snapshots grouped into traces.
#[derive(Debug, Clone, Default)]
pub struct TraceRepository {
    /// Traces in first-seen order.
    traces: Vec<Trace>,
    /// Position of each trace in `traces`.
    lookup: HashMap<RequestKey, usize>,
}

impl TraceRepository {
    /// Groups snapshots by (assignment, trace). Order inside each trace is the
    /// order of `snapshots`, which is what final-snapshot tie-breaking uses.
    pub fn from_snapshots(snapshots: impl IntoIterator<Item = Snapshot>) -> Self {
        let mut repo = Self::default();
        for snapshot in snapshots {
            let key = snapshot.key();
            match repo.lookup.get(&key) {
                Some(&position) => repo.traces[position].snapshots.push(snapshot),
                None => {
                    repo.lookup.insert(key.clone(), repo.traces.len());
                    repo.traces.push(Trace {
                        key,
                        snapshots: vec![snapshot],
                    });
                }
            }
        }
        repo
    }

    /// Decodes raw rows and groups them.
    pub fn from_rows(rows: impl IntoIterator<Item = SnapshotRow>) -> Result<Self, HintkitError> {
        let snapshots = rows
            .into_iter()
            .map(Snapshot::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_snapshots(snapshots))
    }

    /// All traces in first-seen order.
    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    /// Number of traces.
    pub fn len(&self) -> usize {
        self.traces.len()
    }

    /// Returns true if there are no traces.
    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    /// Looks up a trace by key.
    pub fn get(&self, key: &RequestKey) -> Option<&Trace> {
        self.lookup.get(key).map(|&position| &self.traces[position])
    }

    /// Final snapshot of every trace, in trace order.
    pub fn final_snapshots(&self) -> Vec<&Snapshot> {
        self.traces
            .iter()
            .filter_map(Trace::final_snapshot)
            .collect()
    }

    /// Program state at the time of a hint request: the final snapshot of the
    /// trace named after the request, within the same assignment.
    pub fn snapshot_for_request(&self, assignment_id: &str, request_id: &str) -> Option<&Snapshot> {
        self.get(&RequestKey::new(assignment_id, request_id))
            .and_then(Trace::final_snapshot)
    }

    /// Request-time snapshots keyed by (assignment, request).
    pub fn request_snapshots(&self) -> HashMap<RequestKey, &Snapshot> {
        self.traces
            .iter()
            .filter_map(|trace| {
                trace
                    .final_snapshot()
                    .map(|snapshot| (trace.key.clone(), snapshot))
            })
            .collect()
    }
}

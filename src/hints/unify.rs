#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::collections::{BTreeSet, HashMap};

use itertools::Itertools;
use serde::Serialize;

use super::{
    GeneratedHintDocument, GoldRow, Hint, SkippedHint, normalize_generated, normalize_gold,
};
use crate::{
    error::HintkitError,
    trace::{Snapshot, TraceRepository},
    types::RequestKey,
};

/// Counters describing everything the unifier dropped or could not match.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnificationReport {
    /// Generated documents offered.
    pub generated_total:    usize,
    /// Generated documents skipped for shape or identity problems.
    pub generated_skipped:  Vec<SkippedHint>,
    /// Gold rows offered.
    pub gold_total:         usize,
    /// Gold rows dropped for lacking an AST.
    pub gold_dropped:       usize,
    /// Hints in the merged table before origin resolution.
    pub merged:             usize,
    /// Hints whose origin was filled from a request trace.
    pub resolved:           usize,
    /// Hints excluded because no origin could be found.
    pub unevaluable:        usize,
    /// Request keys referenced by hints that no request trace carries.
    pub uncovered_requests: Vec<RequestKey>,
}

impl UnificationReport {
    /// Hints left after exclusion.
    pub fn retained(&self) -> usize {
        self.merged - self.unevaluable
    }
}

/// Output of a unification run.
#[derive(Debug, Clone)]
pub struct Unified {
    /// Evaluable hints, generated first, then gold.
    pub hints:  Vec<Hint>,
    /// What happened along the way.
    pub report: UnificationReport,
}

/// Reconciles generated and gold hints and resolves their starting programs
/// against request traces.
pub struct HintUnifier<'a> {
    /// Final snapshot of each request trace, by (assignment, request).
    request_snapshots: HashMap<RequestKey, &'a Snapshot>,
}

impl<'a> HintUnifier<'a> {
    /// Prepares a unifier over the request traces.
    pub fn new(requests: &'a TraceRepository) -> Self {
        Self {
            request_snapshots: requests.request_snapshots(),
        }
    }

    /// Runs the whole pipeline: normalize both sources, merge, resolve origins,
    /// drop unevaluable hints and check the result.
    pub fn unify(
        &self,
        generated: Vec<GeneratedHintDocument>,
        gold: &[GoldRow],
    ) -> Result<Unified, HintkitError> {
        let generated_total = generated.len();
        let (mut hints, generated_skipped) = normalize_generated(generated);
        let (gold_hints, gold_dropped) = normalize_gold(gold)?;
        hints.extend(gold_hints);

        let mut unified = self.resolve(hints)?;
        unified.report.generated_total = generated_total;
        unified.report.generated_skipped = generated_skipped;
        unified.report.gold_total = gold.len();
        unified.report.gold_dropped = gold_dropped;
        Ok(unified)
    }

    /// Fills missing origin ASTs from request-time snapshots, excludes hints
    /// that stay unresolved, and verifies every survivor has a target.
    ///
    /// Hints that already have an origin are passed through untouched, so
    /// resolving an already-canonical table returns it unchanged.
    pub fn resolve(&self, hints: Vec<Hint>) -> Result<Unified, HintkitError> {
        let merged = hints.len();
        let mut resolved = 0;
        let mut uncovered = BTreeSet::new();

        let hints: Vec<Hint> = hints
            .into_iter()
            .map(|mut hint| {
                let key = hint.key();
                let snapshot = self.request_snapshots.get(&key);
                match snapshot {
                    None => {
                        uncovered.insert(key);
                    }
                    Some(snapshot) if hint.from_ast.is_none() => {
                        hint.from_ast = Some(snapshot.ast().clone());
                        resolved += 1;
                    }
                    Some(_) => {}
                }
                hint
            })
            .collect();

        let (hints, excluded): (Vec<Hint>, Vec<Hint>) =
            hints.into_iter().partition(|hint| hint.from_ast.is_some());
        let unevaluable = excluded.len();

        tracing::info!("Hints without request AST: {unevaluable} / {merged}");
        if !uncovered.is_empty() {
            tracing::warn!(
                "{} hinted requests have no matching request trace: {}",
                uncovered.len(),
                uncovered.iter().take(10).join(", ")
            );
        }

        if let Some(hint) = hints.iter().find(|hint| hint.to_ast.is_none()) {
            return Err(HintkitError::DataConsistencyViolation {
                algorithm: hint.algorithm.clone(),
                key:       hint.key(),
            });
        }

        Ok(Unified {
            hints,
            report: UnificationReport {
                merged,
                resolved,
                unevaluable,
                uncovered_requests: uncovered.into_iter().collect(),
                ..Default::default()
            },
        })
    }
}

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tabled::Tabled;

use crate::{features::FeatureRow, hints::GoldRow, types::RequestKey};

/// How ambiguous one hint request is, judged from the gold standard.
#[derive(Tabled, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmbiguityMetric {
    /// Assignment of the request.
    #[tabled(rename = "assignmentID")]
    pub assignment_id: String,
    /// The request.
    #[tabled(rename = "requestID")]
    pub request_id:    String,
    /// Gold hints written for the request.
    #[tabled(rename = "n_gold_hints")]
    pub n_gold_hints:  usize,
    /// Of those, how many several tutors wrote independently.
    #[tabled(rename = "n_multi_tutor")]
    pub n_multi_tutor: usize,
    /// Of those, how many the tutors agreed on.
    #[tabled(rename = "n_consensus")]
    pub n_consensus:   usize,
}

impl AmbiguityMetric {
    /// The (assignment, request) key.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(self.assignment_id.clone(), self.request_id.clone())
    }
}

/// Reduces gold rows to one metric per (assignment, request), sorted by key.
///
/// Every row counts, including rows the unifier would drop for missing ASTs.
pub fn ambiguity_for(gold: &[GoldRow]) -> Vec<AmbiguityMetric> {
    let mut grouped: BTreeMap<RequestKey, (usize, usize, usize)> = BTreeMap::new();
    for row in gold {
        let entry = grouped.entry(row.key()).or_default();
        entry.0 += 1;
        entry.1 += usize::from(row.is_multiple_tutors());
        entry.2 += usize::from(row.is_consensus());
    }

    grouped
        .into_iter()
        .map(|(key, (n_gold_hints, n_multi_tutor, n_consensus))| AmbiguityMetric {
            assignment_id: key.assignment_id,
            request_id: key.request_id,
            n_gold_hints,
            n_multi_tutor,
            n_consensus,
        })
        .collect()
}

/// A request feature row with the ambiguity of that request, if known.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestAmbiguity {
    /// Structure of the program at request time.
    pub features:  FeatureRow,
    /// Gold-standard ambiguity; `None` when the request has no gold hints.
    pub ambiguity: Option<AmbiguityMetric>,
}

/// Left-joins request features onto ambiguity metrics, matching trace ID to
/// request ID within an assignment. Rows without a trace ID never match.
pub fn attach_ambiguity(
    features: Vec<FeatureRow>,
    metrics: &[AmbiguityMetric],
) -> Vec<RequestAmbiguity> {
    let by_key: HashMap<RequestKey, &AmbiguityMetric> =
        metrics.iter().map(|m| (m.key(), m)).collect();

    features
        .into_iter()
        .map(|row| {
            let ambiguity = row
                .trace_id
                .as_ref()
                .map(|trace| RequestKey::new(row.assignment_id.clone(), trace.clone()))
                .and_then(|key| by_key.get(&key).map(|m| (*m).clone()));
            RequestAmbiguity {
                features: row,
                ambiguity,
            }
        })
        .collect()
}

/// Mean command and reporter counts of request programs, grouped by how many
/// gold hints the request has.
#[derive(Tabled, Debug, Clone, PartialEq, Serialize)]
pub struct StructureByAmbiguity {
    /// Number of gold hints.
    #[tabled(rename = "n_gold_hints")]
    pub n_gold_hints: usize,
    /// Requests in this group.
    #[tabled(rename = "requests")]
    pub requests:     usize,
    /// Mean COMMAND count.
    #[tabled(rename = "n_COMMAND", display = "crate::report::two_places")]
    pub mean_command: f64,
    /// Mean REPORTER count.
    #[tabled(rename = "n_REPORTER", display = "crate::report::two_places")]
    pub mean_reporter: f64,
}

/// Groups joined rows by gold hint count. Rows without ambiguity are left out.
pub fn structure_by_ambiguity(rows: &[RequestAmbiguity]) -> Vec<StructureByAmbiguity> {
    let mut grouped: BTreeMap<usize, (usize, usize, usize)> = BTreeMap::new();
    for row in rows {
        let Some(metric) = &row.ambiguity else {
            continue;
        };
        let entry = grouped.entry(metric.n_gold_hints).or_default();
        entry.0 += 1;
        entry.1 += row.features.count("COMMAND");
        entry.2 += row.features.count("REPORTER");
    }

    grouped
        .into_iter()
        .map(|(n_gold_hints, (n, command, reporter))| StructureByAmbiguity {
            n_gold_hints,
            requests: n,
            mean_command: command as f64 / n as f64,
            mean_reporter: reporter as f64 / n as f64,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{ast::AstNode, features::count_categories, grammar::GrammarCatalog};

    fn gold(assignment: &str, request: &str, multi: bool, consensus: bool) -> GoldRow {
        GoldRow {
            assignment_id: assignment.into(),
            request_id: request.into(),
            multiple_tutors: Some(multi),
            consensus: Some(consensus),
            ..Default::default()
        }
    }

    #[test]
    fn counts_hints_and_flags_per_request() {
        let rows = [
            gold("squiralHW", "7", true, true),
            gold("squiralHW", "7", false, true),
            gold("squiralHW", "7", true, false),
            gold("guess1Lab", "7", false, false),
        ];

        let metrics = ambiguity_for(&rows);
        assert_eq!(metrics.len(), 2);

        let squiral = metrics
            .iter()
            .find(|m| m.assignment_id == "squiralHW")
            .unwrap();
        assert_eq!(squiral.n_gold_hints, 3);
        assert_eq!(squiral.n_consensus, 2);
        assert_eq!(squiral.n_multi_tutor, 2);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(ambiguity_for(&[]).is_empty());
    }

    #[test]
    fn blank_flags_count_as_unset() {
        let rows: Vec<GoldRow> = [
            json!({"assignmentID": "a", "requestID": "r", "MultipleTutors": null, "Consensus": null}),
            json!({"assignmentID": "a", "requestID": "r", "MultipleTutors": ""}),
            json!({"assignmentID": "a", "requestID": "r"}),
            json!({"assignmentID": "a", "requestID": "r", "MultipleTutors": true}),
        ]
        .into_iter()
        .map(|value| serde_json::from_value(value).unwrap())
        .collect();

        let metrics = ambiguity_for(&rows);
        assert_eq!(metrics[0].n_gold_hints, 4);
        assert_eq!(metrics[0].n_multi_tutor, 1);
        assert_eq!(metrics[0].n_consensus, 0);
    }

    #[test]
    fn join_keeps_unmatched_requests() {
        let catalog = GrammarCatalog::build([("COMMAND", vec!["forward"])]).unwrap();
        let counts = count_categories(
            &catalog,
            &AstNode::from_value(json!({"type": "forward", "children": {}})),
        );
        let row = |trace: &str| {
            FeatureRow::builder()
                .assignment_id("squiralHW")
                .state("request")
                .counts(counts.clone())
                .trace_id(trace)
                .build()
        };

        let metrics = ambiguity_for(&[gold("squiralHW", "1", true, true)]);
        let joined = attach_ambiguity(vec![row("1"), row("2")], &metrics);

        assert_eq!(joined.len(), 2);
        assert_eq!(joined[0].ambiguity.as_ref().unwrap().n_gold_hints, 1);
        assert!(joined[1].ambiguity.is_none());

        let summary = structure_by_ambiguity(&joined);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].requests, 1);
        assert_eq!(summary[0].mean_command, 1.0);
        assert_eq!(summary[0].mean_reporter, 0.0);
    }
}

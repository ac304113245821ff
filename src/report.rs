#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use itertools::Itertools;
use tabled::{
    Table, Tabled,
    builder::Builder,
    settings::{Panel, Style},
};

use crate::{
    ambiguity::RequestAmbiguity,
    features::FeatureRow,
    hints::{Hint, UnificationReport},
};

/// Formats a float with two decimals, for `#[tabled(display = ...)]`.
pub fn two_places(value: &f64) -> String {
    format!("{value:.2}")
}

/// Renders derived rows as a titled table.
pub fn render<T: Tabled>(title: &str, rows: impl IntoIterator<Item = T>) -> String {
    Table::new(rows)
        .with(Style::modern())
        .with(Panel::header(title))
        .to_string()
}

/// Renders feature rows. Optional columns appear only when some row has them.
pub fn feature_table(title: &str, rows: &[FeatureRow], categories: &[String]) -> String {
    let with_trace = rows.iter().any(|r| r.trace_id.is_some());
    let with_index = rows.iter().any(|r| r.index.is_some());
    let with_progress = rows.iter().any(|r| r.progress.is_some());

    let mut builder = Builder::default();

    let mut header = vec!["assignmentID".to_string(), "state".to_string()];
    if with_trace {
        header.push("traceID".to_string());
    }
    if with_index {
        header.push("index".to_string());
    }
    if with_progress {
        header.push("progress".to_string());
    }
    header.extend(categories.iter().map(|c| format!("n_{c}")));
    builder.push_record(header);

    for row in rows {
        let mut record = vec![row.assignment_id.clone(), row.state.clone()];
        if with_trace {
            record.push(row.trace_id.clone().unwrap_or_default());
        }
        if with_index {
            record.push(row.index.map(|i| i.to_string()).unwrap_or_default());
        }
        if with_progress {
            record.push(row.progress.map(|p| two_places(&p)).unwrap_or_default());
        }
        record.extend(categories.iter().map(|c| row.count(c).to_string()));
        builder.push_record(record);
    }

    builder
        .build()
        .with(Style::modern())
        .with(Panel::header(title))
        .to_string()
}

/// Renders request features joined with ambiguity metrics.
pub fn request_ambiguity_table(rows: &[RequestAmbiguity], categories: &[String]) -> String {
    let mut builder = Builder::default();

    let mut header = vec!["assignmentID".to_string(), "traceID".to_string()];
    header.extend(categories.iter().map(|c| format!("n_{c}")));
    header.extend(["n_gold_hints", "n_multi_tutor", "n_consensus"].map(String::from));
    builder.push_record(header);

    for row in rows {
        let mut record = vec![
            row.features.assignment_id.clone(),
            row.features.trace_id.clone().unwrap_or_default(),
        ];
        record.extend(categories.iter().map(|c| row.features.count(c).to_string()));
        match &row.ambiguity {
            Some(m) => {
                let counts = [m.n_gold_hints, m.n_multi_tutor, m.n_consensus];
                record.extend(counts.map(|n| n.to_string()));
            }
            None => record.extend(std::iter::repeat_n(String::new(), 3)),
        }
        builder.push_record(record);
    }

    builder
        .build()
        .with(Style::modern())
        .with(Panel::header("Request-level structure + ambiguity"))
        .to_string()
}

/// Number of evaluable hints per source and algorithm.
#[derive(Tabled, Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmCount {
    /// Generated or gold.
    #[tabled(rename = "source")]
    pub source:    String,
    /// Algorithm name.
    #[tabled(rename = "algorithm")]
    pub algorithm: String,
    /// Hints retained.
    #[tabled(rename = "hints")]
    pub hints:     usize,
}

/// Counts hints by (source, algorithm), sorted.
pub fn algorithm_counts(hints: &[Hint]) -> Vec<AlgorithmCount> {
    hints
        .iter()
        .counts_by(|h| (h.source, h.algorithm.clone()))
        .into_iter()
        .sorted()
        .map(|((source, algorithm), hints)| AlgorithmCount {
            source: source.to_string(),
            algorithm,
            hints,
        })
        .collect()
}

/// One line per counter of a unification run.
pub fn unification_summary(report: &UnificationReport) -> String {
    let rows = [
        ("generated documents", report.generated_total),
        ("generated skipped", report.generated_skipped.len()),
        ("gold rows", report.gold_total),
        ("gold dropped (missing from/to)", report.gold_dropped),
        ("merged hints", report.merged),
        ("origins resolved from requests", report.resolved),
        ("unevaluable (no request AST)", report.unevaluable),
        ("retained", report.retained()),
        ("requests without a trace", report.uncovered_requests.len()),
    ];

    let mut builder = Builder::default();
    builder.push_record(["counter".to_string(), "value".to_string()]);
    for (name, value) in rows {
        builder.push_record([name.to_string(), value.to_string()]);
    }
    builder
        .build()
        .with(Style::modern())
        .with(Panel::header("Hint unification"))
        .to_string()
}

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::collections::HashMap;

use rayon::prelude::*;
use serde::Serialize;
use typed_builder::TypedBuilder;

use crate::{
    ast::AstNode,
    grammar::GrammarCatalog,
    trace::{Snapshot, TraceRepository},
};

/// Per-category node counts for one program, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CategoryCounts {
    /// Category name and count, one entry per catalog category.
    counts: Vec<(String, usize)>,
}

impl CategoryCounts {
    /// Count for `category`, zero if it is not tracked.
    pub fn get(&self, category: &str) -> usize {
        self.counts
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    /// Iterates over (category, count) pairs in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(name, n)| (name.as_str(), *n))
    }

    /// Sum over all categories.
    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, n)| n).sum()
    }
}

/// Counts categorized nodes in `root`.
///
/// Every structural node whose type the grammar knows adds one to its
/// category. Uncategorized and non-structural nodes add nothing, and child order
/// does not matter. The result has an entry for every catalog category.
pub fn count_categories(catalog: &GrammarCatalog, root: &AstNode) -> CategoryCounts {
    let mut tally: HashMap<&str, usize> = HashMap::new();
    for node in root.nodes() {
        if let Some(category) = catalog.lookup(node.kind()) {
            *tally.entry(category).or_default() += 1;
        }
    }

    CategoryCounts {
        counts: catalog
            .categories()
            .iter()
            .map(|category| {
                let n = tally.get(category.as_str()).copied().unwrap_or(0);
                (category.clone(), n)
            })
            .collect(),
    }
}

/// Structural summary of one program state.
#[derive(Debug, Clone, PartialEq, Serialize, TypedBuilder)]
pub struct FeatureRow {
    /// Assignment the program belongs to.
    #[builder(setter(into))]
    pub assignment_id: String,
    /// What kind of state this is, e.g. `correct` or `request`.
    #[builder(setter(into))]
    pub state:         String,
    /// Category counts.
    pub counts:        CategoryCounts,
    /// Trace the state came from, when kept for later joins.
    #[builder(default, setter(strip_option, into))]
    pub trace_id:      Option<String>,
    /// Snapshot index, when relevant.
    #[builder(default, setter(strip_option))]
    pub index:         Option<u64>,
    /// Position within the trace in `[0, 1]`, when relevant.
    #[builder(default, setter(strip_option))]
    pub progress:      Option<f64>,
}

impl FeatureRow {
    /// Shorthand for `self.counts.get(category)`.
    pub fn count(&self, category: &str) -> usize {
        self.counts.get(category)
    }
}

/// Builds one feature row per snapshot, labelled `state`.
///
/// Rows are computed in parallel; output order matches `snapshots`.
pub fn extract_features(
    catalog: &GrammarCatalog,
    snapshots: &[&Snapshot],
    state: &str,
    include_trace: bool,
) -> Vec<FeatureRow> {
    snapshots
        .par_iter()
        .map(|snapshot| FeatureRow {
            assignment_id: snapshot.assignment_id().to_string(),
            state:         state.to_string(),
            counts:        count_categories(catalog, snapshot.ast()),
            trace_id:      include_trace.then(|| snapshot.trace_id().to_string()),
            index:         None,
            progress:      None,
        })
        .collect()
}

/// Features of every trace's final snapshot, with trace ID, index and progress
/// filled in.
///
/// Applied to request traces this describes the program at the moment help was
/// asked for.
pub fn request_features(catalog: &GrammarCatalog, repo: &TraceRepository) -> Vec<FeatureRow> {
    repo.traces()
        .par_iter()
        .filter_map(|trace| {
            let snapshot = trace.final_snapshot()?;
            Some(FeatureRow {
                assignment_id: snapshot.assignment_id().to_string(),
                state:         crate::constants::REQUEST_STATE.to_string(),
                counts:        count_categories(catalog, snapshot.ast()),
                trace_id:      Some(snapshot.trace_id().to_string()),
                index:         Some(snapshot.index()),
                progress:      Some(trace.progress(snapshot)),
            })
        })
        .collect()
}

/// Features of every snapshot in every trace, each with its progress.
pub fn snapshot_features(
    catalog: &GrammarCatalog,
    repo: &TraceRepository,
    state: &str,
) -> Vec<FeatureRow> {
    repo.traces()
        .par_iter()
        .flat_map_iter(|trace| {
            trace.snapshots().iter().map(move |snapshot| FeatureRow {
                assignment_id: snapshot.assignment_id().to_string(),
                state:         state.to_string(),
                counts:        count_categories(catalog, snapshot.ast()),
                trace_id:      Some(snapshot.trace_id().to_string()),
                index:         Some(snapshot.index()),
                progress:      Some(trace.progress(snapshot)),
            })
        })
        .collect()
}

/// Final-state features of correct (training) traces and request traces,
/// concatenated for structural comparison. Trace IDs are dropped.
pub fn comparison_features(
    catalog: &GrammarCatalog,
    training: &TraceRepository,
    requests: &TraceRepository,
) -> Vec<FeatureRow> {
    let mut rows = extract_features(
        catalog,
        &training.final_snapshots(),
        crate::constants::CORRECT_STATE,
        false,
    );
    rows.extend(extract_features(
        catalog,
        &requests.final_snapshots(),
        crate::constants::REQUEST_STATE,
        false,
    ));
    rows
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn catalog() -> GrammarCatalog {
        GrammarCatalog::build([("COMMAND", vec!["doX"]), ("REPORTER", vec!["getY"])]).unwrap()
    }

    #[test]
    fn counts_every_canonical_category() {
        let ast = AstNode::from_value(json!({
            "type": "doX",
            "children": {"a": {"type": "getY", "children": {}}}
        }));

        let counts = count_categories(&catalog(), &ast);
        assert_eq!(
            counts.iter().collect::<Vec<_>>(),
            [("COMMAND", 1), ("REPORTER", 1), ("HAT", 0), ("BOOLEAN", 0)]
        );
    }

    #[test]
    fn total_matches_categorized_structural_nodes() {
        let catalog = catalog();
        let ast = AstNode::from_value(json!({
            "type": "script",
            "children": {
                "0": {"type": "doX", "children": {"v": {"type": "getY"}, "w": 5}},
                "1": {"type": "doX"},
                "2": {"type": "unknownBlock", "children": {"x": {"type": "getY"}}},
                "3": [1, 2],
                "4": {"children": {"hidden": {"type": "doX"}}}
            }
        }));

        let counts = count_categories(&catalog, &ast);
        let expected = ast
            .nodes()
            .filter(|node| catalog.lookup(node.kind()).is_some())
            .count();

        assert_eq!(counts.total(), expected);
        assert_eq!(counts.get("COMMAND"), 2);
        assert_eq!(counts.get("REPORTER"), 2);
    }

    #[test]
    fn non_structural_root_counts_nothing() {
        let counts = count_categories(&catalog(), &AstNode::from_value(json!("doX")));
        assert_eq!(counts.total(), 0);
        assert_eq!(counts.get("COMMAND"), 0);
    }
}

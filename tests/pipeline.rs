use std::{
    fs,
    path::{Path, PathBuf},
};

use hintkit::{
    HintkitError,
    ambiguity::{ambiguity_for, attach_ambiguity, structure_by_ambiguity},
    config::DataPaths,
    evolution::{steps_per_trace, structural_evolution, summarize_steps},
    features::{comparison_features, request_features, snapshot_features},
    grammar::GrammarCatalog,
    hints::{HintSource, HintUnifier},
    load::{discover_generated, load_gold, load_traces},
};
use serde_json::{Value, json};
use uuid::Uuid;

fn temp_root() -> PathBuf {
    let root = std::env::temp_dir().join(format!("hintkit-pipeline-{}", Uuid::new_v4()));
    fs::create_dir_all(&root).expect("create temp root");
    root
}

fn write_json(path: &Path, value: &Value) {
    fs::create_dir_all(path.parent().unwrap()).expect("create parent");
    fs::write(path, value.to_string()).expect("write json");
}

fn write_lines(path: &Path, rows: &[Value]) {
    let body = rows
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join("\n");
    fs::write(path, body).expect("write jsonl");
}

/// `when green flag clicked; move (1 + 2) steps`
fn moving_script() -> Value {
    json!({
        "type": "snapshot",
        "children": {
            "0": {"type": "receiveGo", "children": {}},
            "1": {
                "type": "forward",
                "children": {"0": {"type": "reportSum", "children": {}}}
            }
        }
    })
}

fn empty_script() -> Value {
    json!({"type": "snapshot", "children": {}})
}

fn snapshot_row(trace: &str, index: u64, code: &Value, correct: bool) -> Value {
    json!({
        "assignmentID": "squiralHW",
        "traceID": trace,
        "index": index,
        "code": code.to_string(),
        "isCorrect": correct,
    })
}

fn seed(root: &Path) -> DataPaths {
    let paths = DataPaths::new(root.to_path_buf());

    write_json(
        paths.grammar(),
        &json!({"categories": {
            "COMMAND": ["forward", "turn"],
            "REPORTER": ["reportSum"],
            "HAT": ["receiveGo"],
            "BOOLEAN": ["reportLessThan"],
        }}),
    );

    write_lines(
        paths.training(),
        &[
            snapshot_row("t1", 0, &empty_script(), false),
            snapshot_row("t1", 1, &empty_script(), false),
            snapshot_row("t1", 2, &moving_script(), true),
        ],
    );

    // Request 101 asks for help with a working script; 102 asks with an empty
    // one, recorded as a numeric trace ID.
    write_lines(
        paths.requests(),
        &[
            snapshot_row("101", 0, &empty_script(), false),
            snapshot_row("101", 1, &moving_script(), false),
            json!({
                "assignmentID": "squiralHW",
                "traceID": 102,
                "index": 0,
                "code": empty_script().to_string(),
            }),
        ],
    );

    let gold_to = moving_script().to_string();
    write_lines(
        paths.gold(),
        &[
            json!({
                "assignmentID": "squiralHW", "requestID": "101", "hintID": 1,
                "from": moving_script().to_string(), "to": gold_to,
                "MultipleTutors": true, "Consensus": true,
            }),
            json!({
                "assignmentID": "squiralHW", "requestID": "101", "hintID": 2,
                "from": moving_script().to_string(), "to": gold_to,
                "MultipleTutors": false, "Consensus": false,
            }),
            json!({
                "assignmentID": "squiralHW", "requestID": "102", "hintID": 3,
                "from": "", "to": gold_to,
            }),
        ],
    );

    let algorithms = paths.algorithms_dir().join("CTD").join("squiralHW");
    write_json(&algorithms.join("101_0.json"), &json!({"to": moving_script()}));
    write_json(&algorithms.join("101_1.json"), &moving_script());
    write_json(&algorithms.join("102.json"), &json!({"hintAST": empty_script()}));
    // Unknown wrapper, skipped.
    write_json(&algorithms.join("102_1.json"), &json!({"edits": []}));
    // Not an integer index, skipped.
    write_json(&algorithms.join("101_x.json"), &json!({"to": empty_script()}));
    // No request trace for 999, so unevaluable.
    write_json(
        &paths.algorithms_dir().join("ITAP").join("squiralHW").join("999_0.json"),
        &json!({"toAST": moving_script()}),
    );

    paths
}

#[test]
fn final_state_comparison_counts_categories() {
    let root = temp_root();
    let paths = seed(&root);

    let catalog = GrammarCatalog::load(paths.grammar()).unwrap();
    let training = load_traces(paths.training()).unwrap();
    let requests = load_traces(paths.requests()).unwrap();

    let rows = comparison_features(&catalog, &training, &requests);
    assert_eq!(rows.len(), 3);

    let correct = &rows[0];
    assert_eq!(correct.state, "correct");
    assert_eq!(correct.count("COMMAND"), 1);
    assert_eq!(correct.count("REPORTER"), 1);
    assert_eq!(correct.count("HAT"), 1);
    assert_eq!(correct.count("BOOLEAN"), 0);
    assert!(correct.trace_id.is_none());

    let request_states: Vec<_> = rows[1..].iter().map(|r| r.state.as_str()).collect();
    assert_eq!(request_states, ["request", "request"]);
    assert_eq!(rows[1].counts.total(), 3);
    assert_eq!(rows[2].counts.total(), 0);

    let _ = fs::remove_dir_all(root);
}

#[test]
fn request_features_join_gold_ambiguity() {
    let root = temp_root();
    let paths = seed(&root);

    let catalog = GrammarCatalog::load(paths.grammar()).unwrap();
    let requests = load_traces(paths.requests()).unwrap();
    let gold = load_gold(paths.gold()).unwrap();

    let rows = request_features(&catalog, &requests);
    let by_trace: Vec<_> = rows
        .iter()
        .map(|r| (r.trace_id.clone().unwrap(), r.index.unwrap(), r.progress.unwrap()))
        .collect();
    assert_eq!(
        by_trace,
        [("101".to_string(), 1, 1.0), ("102".to_string(), 0, 1.0)]
    );

    let metrics = ambiguity_for(&gold);
    assert_eq!(metrics.len(), 2);
    assert_eq!(metrics[0].request_id, "101");
    assert_eq!(metrics[0].n_gold_hints, 2);
    assert_eq!(metrics[0].n_multi_tutor, 1);
    assert_eq!(metrics[0].n_consensus, 1);
    // Missing flags count as unset.
    assert_eq!(metrics[1].n_gold_hints, 1);
    assert_eq!(metrics[1].n_multi_tutor, 0);
    assert_eq!(metrics[1].n_consensus, 0);

    let joined = attach_ambiguity(rows, &metrics);
    assert!(joined.iter().all(|r| r.ambiguity.is_some()));

    let structure = structure_by_ambiguity(&joined);
    let gold_counts: Vec<_> = structure.iter().map(|s| s.n_gold_hints).collect();
    assert_eq!(gold_counts, [1, 2]);

    let _ = fs::remove_dir_all(root);
}

#[test]
fn training_traces_evolve_toward_the_solution() {
    let root = temp_root();
    let paths = seed(&root);

    let catalog = GrammarCatalog::load(paths.grammar()).unwrap();
    let training = load_traces(paths.training()).unwrap();

    let steps = steps_per_trace(&training);
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].n_steps, 3);
    let summary = summarize_steps(&steps);
    assert_eq!(summary[0].traces, 1);
    assert_eq!(summary[0].median, 3.0);

    let rows = snapshot_features(&catalog, &training, "training");
    let evolution = structural_evolution(&rows);
    let bins: Vec<_> = evolution.iter().map(|e| e.bin.0).collect();
    // Progress 0.0, 0.5 and 1.0.
    assert_eq!(bins, [0, 4, 9]);
    assert_eq!(evolution[0].mean_command, 0.0);
    assert_eq!(evolution[2].mean_command, 1.0);
    assert_eq!(evolution[2].mean_hat, 1.0);

    let _ = fs::remove_dir_all(root);
}

#[test]
fn unifies_generated_and_gold_hints() {
    let root = temp_root();
    let paths = seed(&root);

    let requests = load_traces(paths.requests()).unwrap();
    let gold = load_gold(paths.gold()).unwrap();
    let generated = discover_generated(paths.algorithms_dir()).unwrap();
    assert_eq!(generated.len(), 6);

    let unified = HintUnifier::new(&requests).unify(generated, &gold).unwrap();
    let report = &unified.report;

    assert_eq!(report.generated_total, 6);
    assert_eq!(report.generated_skipped.len(), 2);
    assert_eq!(report.gold_total, 3);
    assert_eq!(report.gold_dropped, 1);
    assert_eq!(report.merged, 6);
    assert_eq!(report.unevaluable, 1);
    assert_eq!(report.retained(), 5);
    assert_eq!(report.resolved, 3);
    assert_eq!(report.uncovered_requests.len(), 1);
    assert_eq!(report.uncovered_requests[0].request_id(), "999");

    assert_eq!(unified.hints.len(), 5);
    assert!(unified.hints.iter().all(|h| h.is_evaluable()));
    assert!(unified.hints.iter().all(|h| h.algorithm != "ITAP"));

    let ctd: Vec<_> = unified
        .hints
        .iter()
        .filter(|h| h.source == HintSource::Generated)
        .map(|h| (h.request_id.as_str(), h.hint_index))
        .collect();
    assert_eq!(ctd, [("101", Some(0)), ("101", Some(1)), ("102", None)]);

    // The request-time program is the final snapshot of the request trace.
    let first = &unified.hints[0];
    assert_eq!(first.from_ast.as_ref().unwrap().node_count(), 4);

    let gold_hints = unified
        .hints
        .iter()
        .filter(|h| h.source == HintSource::Gold)
        .count();
    assert_eq!(gold_hints, 2);

    let again = HintUnifier::new(&requests)
        .resolve(unified.hints.clone())
        .unwrap();
    assert_eq!(again.hints, unified.hints);
    assert_eq!(again.report.resolved, 0);

    let _ = fs::remove_dir_all(root);
}

#[test]
fn null_generated_target_aborts_unification() {
    let root = temp_root();
    let paths = seed(&root);
    write_json(
        &paths.algorithms_dir().join("CTD").join("squiralHW").join("101_5.json"),
        &json!({"to": null}),
    );

    let requests = load_traces(paths.requests()).unwrap();
    let gold = load_gold(paths.gold()).unwrap();
    let generated = discover_generated(paths.algorithms_dir()).unwrap();

    let err = HintUnifier::new(&requests)
        .unify(generated, &gold)
        .unwrap_err();
    assert!(matches!(err, HintkitError::DataConsistencyViolation { .. }));
    assert!(!err.is_recoverable());

    let _ = fs::remove_dir_all(root);
}

#[test]
fn invalid_generated_json_is_an_error() {
    let root = temp_root();
    let paths = seed(&root);
    let bad = paths.algorithms_dir().join("CTD").join("squiralHW").join("101_7.json");
    fs::write(&bad, "{not json").unwrap();

    let err = discover_generated(paths.algorithms_dir()).unwrap_err();
    assert!(format!("{err:#}").contains("101_7.json"));

    let _ = fs::remove_dir_all(root);
}

#[test]
fn missing_algorithms_dir_yields_nothing() {
    let root = temp_root();
    let generated = discover_generated(&root.join("algorithms")).unwrap();
    assert!(generated.is_empty());
    let _ = fs::remove_dir_all(root);
}

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # hintkit
//!
//! Command line front end: loads the exported traces, gold-standard hints and
//! generated hints from a data directory and prints the derived tables.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bpaf::*;
use dotenvy::dotenv;
use hintkit::{
    ambiguity::{ambiguity_for, attach_ambiguity, structure_by_ambiguity},
    config::DataPaths,
    constants::DATA_DIR_ENV,
    evolution::{steps_per_trace, structural_evolution, summarize_steps},
    features::{comparison_features, request_features, snapshot_features},
    grammar::GrammarCatalog,
    hints::HintUnifier,
    load::{discover_generated, load_gold, load_traces},
    report::{
        algorithm_counts, feature_table, render, request_ambiguity_table, unification_summary,
    },
};
use tracing::{Level, metadata::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Final-state features of correct and request traces
    Features,
    /// Request-time features joined with gold-standard ambiguity
    Requests,
    /// Trace lengths and structure across trace progress
    Evolution,
    /// Unify generated and gold hints
    Hints {
        /// Print the unified hints as JSON lines instead of tables
        json: bool,
    },
    /// Gold-standard ambiguity per request
    Ambiguity,
}

/// Parsed command line.
#[derive(Debug, Clone)]
struct Opts {
    /// Data directory override.
    data:    Option<PathBuf>,
    /// Grammar file override.
    grammar: Option<PathBuf>,
    /// What to run.
    cmd:     Cmd,
}

/// Parse the command line arguments and return an `Opts`
fn options() -> Opts {
    let data = long("data")
        .short('d')
        .env(DATA_DIR_ENV)
        .help("Directory holding the grammar, trace, gold and algorithm exports")
        .argument::<PathBuf>("DIR")
        .optional();

    let grammar = long("grammar")
        .help("Grammar file to use instead of <DIR>/snap-grammar.json")
        .argument::<PathBuf>("FILE")
        .optional();

    let features = pure(Cmd::Features)
        .to_options()
        .command("features")
        .help("Compare final states of correct and request traces");

    let requests = pure(Cmd::Requests)
        .to_options()
        .command("requests")
        .help("Request-time structure joined with hint ambiguity");

    let evolution = pure(Cmd::Evolution)
        .to_options()
        .command("evolution")
        .help("Steps per trace and structural evolution of training traces");

    let json = long("json")
        .help("Emit unified hints as JSON lines")
        .switch();
    let hints = construct!(Cmd::Hints { json })
        .to_options()
        .command("hints")
        .help("Unify generated and gold hints and report what was dropped");

    let ambiguity = pure(Cmd::Ambiguity)
        .to_options()
        .command("ambiguity")
        .help("Gold-standard ambiguity metrics per request");

    let cmd = construct!([features, requests, evolution, hints, ambiguity]);

    construct!(Opts { data, grammar, cmd })
        .to_options()
        .descr("Structural features and hint unification for iSnap hint analysis")
        .run()
}

/// Loads the grammar named by `paths`.
fn grammar(paths: &DataPaths) -> Result<GrammarCatalog> {
    GrammarCatalog::load(paths.grammar())
}

/// `features` subcommand.
fn run_features(paths: &DataPaths) -> Result<()> {
    let catalog = grammar(paths)?;
    let training = load_traces(paths.training())?;
    let requests = load_traces(paths.requests())?;

    let rows = comparison_features(&catalog, &training, &requests);
    println!("{}", feature_table("Correct vs request states", &rows, catalog.categories()));
    Ok(())
}

/// `requests` subcommand.
fn run_requests(paths: &DataPaths) -> Result<()> {
    let catalog = grammar(paths)?;
    let requests = load_traces(paths.requests())?;
    let gold = load_gold(paths.gold())?;

    let rows = request_features(&catalog, &requests);
    println!("{}", feature_table("Request-time features", &rows, catalog.categories()));

    let joined = attach_ambiguity(rows, &ambiguity_for(&gold));
    println!("{}", request_ambiguity_table(&joined, catalog.categories()));
    println!(
        "{}",
        render("Structure by number of gold hints", structure_by_ambiguity(&joined))
    );
    Ok(())
}

/// `evolution` subcommand.
fn run_evolution(paths: &DataPaths) -> Result<()> {
    let catalog = grammar(paths)?;
    let training = load_traces(paths.training())?;

    let steps = steps_per_trace(&training);
    println!("{}", render("Steps per trace", summarize_steps(&steps)));

    let rows = snapshot_features(&catalog, &training, "training");
    println!("{}", render("Structural evolution", structural_evolution(&rows)));
    Ok(())
}

/// `hints` subcommand.
fn run_hints(paths: &DataPaths, json: bool) -> Result<()> {
    let requests = load_traces(paths.requests())?;
    let gold = load_gold(paths.gold())?;
    let generated = discover_generated(paths.algorithms_dir())?;

    let unified = HintUnifier::new(&requests)
        .unify(generated, &gold)
        .context("Hint unification aborted")?;

    if json {
        for hint in &unified.hints {
            println!("{}", serde_json::to_string(hint)?);
        }
        return Ok(());
    }

    println!("{}", unification_summary(&unified.report));
    if !unified.report.generated_skipped.is_empty() {
        println!(
            "{}",
            render("Skipped generated hints", unified.report.generated_skipped.iter().cloned())
        );
    }
    println!("{}", render("Unified hints", algorithm_counts(&unified.hints)));
    Ok(())
}

/// `ambiguity` subcommand.
fn run_ambiguity(paths: &DataPaths) -> Result<()> {
    let gold = load_gold(paths.gold())?;
    println!("{}", render("Gold-standard ambiguity", ambiguity_for(&gold)));
    Ok(())
}

fn main() -> Result<()> {
    dotenv().ok();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);
    let filter_layer = LevelFilter::from_level(Level::INFO);
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    let opts = options();

    let mut paths = match opts.data {
        Some(dir) => DataPaths::new(dir),
        None => DataPaths::from_env(),
    };
    if let Some(grammar) = opts.grammar {
        paths = paths.with_grammar(grammar);
    }

    match opts.cmd {
        Cmd::Features => run_features(&paths),
        Cmd::Requests => run_requests(&paths),
        Cmd::Evolution => run_evolution(&paths),
        Cmd::Hints { json } => run_hints(&paths, json),
        Cmd::Ambiguity => run_ambiguity(&paths),
    }
}

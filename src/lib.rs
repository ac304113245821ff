//! # hintkit
//!
//! Grammar-aware structural features and hint unification for analysing hint
//! quality in iSnap, a block-based programming environment.
//!
//! The pieces, from the leaves up:
//! - [`grammar::GrammarCatalog`] maps Snap! node types to grammar categories.
//! - [`features::count_categories`] summarises one AST as per-category counts.
//! - [`trace::TraceRepository`] groups snapshots into traces and picks out the
//!   final and request-time states.
//! - [`hints::HintUnifier`] reconciles generated and gold hints into one table
//!   and resolves where each hint starts.
//! - [`ambiguity::ambiguity_for`] turns gold hints into per-request ambiguity.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Gold-standard ambiguity metrics and joins onto request features
pub mod ambiguity;
/// The program tree type and its traversal
pub mod ast;
/// Input locations
pub mod config;
/// A module defining a bunch of constant values to be used throughout
pub mod constants;
/// Crate error type
pub mod error;
/// How program structure changes over the course of a trace
pub mod evolution;
/// Grammar category counts and feature rows
pub mod features;
/// The grammar category catalog
pub mod grammar;
/// Canonical hints, both sources, and unification
pub mod hints;
/// Reading exported rows and generated hint files
pub mod load;
/// Table rendering for the CLI
pub mod report;
/// Snapshots and traces
pub mod trace;
/// Shared key types and column deserializers
pub mod types;
/// Utility functions for convenience
pub mod util;

pub use error::HintkitError;

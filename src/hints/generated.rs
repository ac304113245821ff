#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

use super::{Hint, HintSource};
use crate::{ast::AstNode, constants::HINT_ID_SEPARATOR, error::HintkitError};

/// The ways hint algorithms wrap their target program.
///
/// Classification tries the variants top to bottom and stops at the first
/// match, so a bare AST that also happens to have a `to` key is still a bare
/// AST.
#[derive(Debug, Clone, PartialEq)]
pub enum HintShape {
    /// The document is itself an AST (has both `type` and `children`).
    Bare(Value),
    /// Target under `to`.
    To(Value),
    /// Target under `toAST`.
    ToAst(Value),
    /// Target under `hintAST`.
    HintAst(Value),
    /// None of the above; carries the top-level keys for diagnostics.
    Unrecognized(Vec<String>),
}

impl HintShape {
    /// Classifies a hint document.
    pub fn classify(document: Value) -> Self {
        let Value::Object(mut map) = document else {
            return HintShape::Unrecognized(Vec::new());
        };

        if map.contains_key("type") && map.contains_key("children") {
            return HintShape::Bare(Value::Object(map));
        }
        if let Some(target) = map.remove("to") {
            return HintShape::To(target);
        }
        if let Some(target) = map.remove("toAST") {
            return HintShape::ToAst(target);
        }
        if let Some(target) = map.remove("hintAST") {
            return HintShape::HintAst(target);
        }

        HintShape::Unrecognized(map.keys().cloned().collect())
    }

    /// Short name of the shape.
    pub fn name(&self) -> &'static str {
        match self {
            HintShape::Bare(_) => "bare",
            HintShape::To(_) => "to",
            HintShape::ToAst(_) => "toAST",
            HintShape::HintAst(_) => "hintAST",
            HintShape::Unrecognized(_) => "unrecognized",
        }
    }
}

/// Pulls the target AST out of a generated hint document.
///
/// Returns `Ok(None)` when a known wrapper holds an explicit `null`. Such a
/// hint keeps going and is rejected later by the unifier's consistency check.
pub fn extract_target_ast(id: &str, document: Value) -> Result<Option<AstNode>, HintkitError> {
    let shape = HintShape::classify(document);
    tracing::trace!("Hint `{id}` has the {} shape", shape.name());
    let target = match shape {
        HintShape::Bare(target)
        | HintShape::To(target)
        | HintShape::ToAst(target)
        | HintShape::HintAst(target) => target,
        HintShape::Unrecognized(keys) => {
            return Err(HintkitError::UnknownHintFormat {
                id: id.to_string(),
                keys,
            });
        }
    };

    Ok(match target {
        Value::Null => None,
        other => Some(AstNode::from_value(other)),
    })
}

/// Splits a hint identifier such as `1234_2` into request ID and hint index.
///
/// Only the first separator counts. An identifier without one is a single,
/// unnumbered hint for that request.
pub fn parse_hint_id(id: &str) -> Result<(String, Option<u32>), HintkitError> {
    match id.split_once(HINT_ID_SEPARATOR) {
        None => Ok((id.to_string(), None)),
        Some((request_id, index)) => {
            let index = index
                .trim()
                .parse::<u32>()
                .map_err(|_| HintkitError::InvalidHintIdentity {
                    id:    id.to_string(),
                    index: index.to_string(),
                })?;
            Ok((request_id.to_string(), Some(index)))
        }
    }
}

/// One generated hint as found on disk, not yet normalized.
#[derive(Debug, Clone)]
pub struct GeneratedHintDocument {
    /// Algorithm that produced the hint (its directory name).
    pub algorithm:     String,
    /// Assignment the hint is for (its directory name).
    pub assignment_id: String,
    /// Identifier the request and index are parsed from (the file stem).
    pub id:            String,
    /// The decoded JSON document.
    pub document:      Value,
    /// Where the document was read from, if anywhere.
    pub origin:        Option<String>,
}

/// A generated hint that could not be normalized.
#[derive(Tabled, Debug, Clone, PartialEq, Serialize)]
pub struct SkippedHint {
    /// Algorithm that produced the hint.
    #[tabled(rename = "Algorithm")]
    pub algorithm:     String,
    /// Assignment the hint is for.
    #[tabled(rename = "Assignment")]
    pub assignment_id: String,
    /// Identifier of the document.
    #[tabled(rename = "Hint")]
    pub id:            String,
    /// Why it was skipped.
    #[tabled(rename = "Reason")]
    pub reason:        String,
}

/// Normalizes generated hint documents into canonical hints.
///
/// Documents with an unknown shape or an unparseable identifier are skipped
/// and returned alongside, one [`SkippedHint`] each. Origin ASTs are left
/// empty for the unifier to fill in.
pub fn normalize_generated(
    documents: impl IntoIterator<Item = GeneratedHintDocument>,
) -> (Vec<Hint>, Vec<SkippedHint>) {
    let mut hints = Vec::new();
    let mut skipped = Vec::new();

    for doc in documents {
        match normalize_one(&doc.id, doc.document) {
            Ok((request_id, hint_index, to_ast)) => hints.push(Hint {
                source: HintSource::Generated,
                algorithm: doc.algorithm,
                assignment_id: doc.assignment_id,
                request_id,
                hint_index,
                from_ast: None,
                to_ast,
                origin: doc.origin,
            }),
            Err(err) => {
                tracing::warn!(
                    "Skipping {}: {err}",
                    doc.origin.as_deref().unwrap_or(doc.id.as_str())
                );
                skipped.push(SkippedHint {
                    algorithm:     doc.algorithm,
                    assignment_id: doc.assignment_id,
                    id:            doc.id,
                    reason:        err.to_string(),
                });
            }
        }
    }

    (hints, skipped)
}

/// Shape extraction followed by identity parsing for a single document.
fn normalize_one(
    id: &str,
    document: Value,
) -> Result<(String, Option<u32>, Option<AstNode>), HintkitError> {
    let to_ast = extract_target_ast(id, document)?;
    let (request_id, hint_index) = parse_hint_id(id)?;
    Ok((request_id, hint_index, to_ast))
}

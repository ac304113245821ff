#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use serde::Deserialize;

use super::{Hint, HintSource};
use crate::{
    ast::AstNode,
    constants::TUTOR_ALGORITHM,
    error::HintkitError,
    types::{RequestKey, id_string, opt_flag, opt_id_string},
};

/// One row of the gold-standard export.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoldRow {
    /// Assignment of the request.
    #[serde(rename = "assignmentID", deserialize_with = "id_string")]
    pub assignment_id:   String,
    /// Request the tutor answered.
    #[serde(rename = "requestID", deserialize_with = "id_string")]
    pub request_id:      String,
    /// Identifier of the hint within the gold standard.
    #[serde(rename = "hintID", default, deserialize_with = "opt_id_string")]
    pub hint_id:         Option<String>,
    /// JSON-encoded origin AST.
    #[serde(rename = "from", default)]
    pub from:            Option<String>,
    /// JSON-encoded target AST.
    #[serde(rename = "to", default)]
    pub to:              Option<String>,
    /// Set when more than one tutor independently wrote this hint.
    #[serde(rename = "MultipleTutors", default, deserialize_with = "opt_flag")]
    pub multiple_tutors: Option<bool>,
    /// Set when the tutors agreed on this hint.
    #[serde(rename = "Consensus", default, deserialize_with = "opt_flag")]
    pub consensus:       Option<bool>,
}

impl GoldRow {
    /// The (assignment, request) key.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(self.assignment_id.clone(), self.request_id.clone())
    }

    /// True only for an explicit `true`; blank cells count as unset.
    pub fn is_multiple_tutors(&self) -> bool {
        self.multiple_tutors == Some(true)
    }

    /// True only for an explicit `true`; blank cells count as unset.
    pub fn is_consensus(&self) -> bool {
        self.consensus == Some(true)
    }

    /// Origin AST text, if present and non-blank.
    fn from_source(&self) -> Option<&str> {
        present(self.from.as_deref())
    }

    /// Target AST text, if present and non-blank.
    fn to_source(&self) -> Option<&str> {
        present(self.to.as_deref())
    }
}

/// Treats blank cells the way a CSV reader treats empty ones: as missing.
fn present(cell: Option<&str>) -> Option<&str> {
    cell.filter(|s| !s.trim().is_empty())
}

/// Normalizes gold rows into canonical hints.
///
/// Rows lacking either AST are dropped; the second value is how many. An AST
/// that is present but not valid JSON is an input error.
pub fn normalize_gold(rows: &[GoldRow]) -> Result<(Vec<Hint>, usize), HintkitError> {
    let mut hints = Vec::with_capacity(rows.len());
    let mut dropped = 0;

    for row in rows {
        let (Some(from), Some(to)) = (row.from_source(), row.to_source()) else {
            dropped += 1;
            continue;
        };

        let parse = |source: &str, end: &str| {
            AstNode::parse(source).map_err(|err| HintkitError::MalformedAst {
                context: format!(
                    "gold hint {} `{end}` for request {}",
                    row.hint_id.as_deref().unwrap_or("?"),
                    row.key()
                ),
                source:  err,
            })
        };

        hints.push(Hint {
            source:        HintSource::Gold,
            algorithm:     TUTOR_ALGORITHM.to_string(),
            assignment_id: row.assignment_id.clone(),
            request_id:    row.request_id.clone(),
            hint_index:    None,
            from_ast:      Some(parse(from, "from")?),
            to_ast:        Some(parse(to, "to")?),
            origin:        None,
        });
    }

    if dropped > 0 {
        tracing::debug!("Dropped {dropped} gold hints without both from and to ASTs");
    }

    Ok((hints, dropped))
}

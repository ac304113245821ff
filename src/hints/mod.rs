#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Algorithm-generated hint documents and their wrapper shapes.
pub mod generated;
/// Tutor-authored gold-standard hints.
pub mod gold;
/// Merging both sources and resolving origin ASTs.
pub mod unify;

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

pub use generated::{
    GeneratedHintDocument, HintShape, SkippedHint, extract_target_ast, normalize_generated,
    parse_hint_id,
};
pub use gold::{GoldRow, normalize_gold};
pub use unify::{HintUnifier, UnificationReport, Unified};

use crate::{ast::AstNode, types::RequestKey};

/// Where a hint came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintSource {
    /// Produced by a hint-generation algorithm.
    Generated,
    /// Written by a tutor.
    Gold,
}

impl HintSource {
    /// Lower-case name used in output tables.
    pub fn as_str(self) -> &'static str {
        match self {
            HintSource::Generated => "generated",
            HintSource::Gold => "gold",
        }
    }
}

impl Display for HintSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A hint in canonical form, whichever source it came from.
#[derive(Debug, Clone, PartialEq, Serialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct Hint {
    /// Generated or gold.
    pub source:        HintSource,
    /// Algorithm name; `tutor` for gold hints.
    pub algorithm:     String,
    /// Assignment of the request.
    pub assignment_id: String,
    /// The hint request this hint answers.
    pub request_id:    String,
    /// Position among several hints for the same request, if numbered.
    #[builder(default)]
    pub hint_index:    Option<u32>,
    /// Program the hint starts from. Filled from the request trace when the
    /// source did not supply it.
    #[builder(default)]
    pub from_ast:      Option<AstNode>,
    /// Program the hint leads to.
    #[builder(default)]
    pub to_ast:        Option<AstNode>,
    /// File the hint was read from, for generated hints.
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin:        Option<String>,
}

impl Hint {
    /// The (assignment, request) key used for joins.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(self.assignment_id.clone(), self.request_id.clone())
    }

    /// True when both ends of the hint are known.
    pub fn is_evaluable(&self) -> bool {
        self.from_ast.is_some() && self.to_ast.is_some()
    }
}

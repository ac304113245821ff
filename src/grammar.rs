#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    collections::{BTreeMap, HashMap, hash_map::Entry},
    path::Path,
};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::{
    constants::{CANONICAL_CATEGORIES, UNCATEGORIZED},
    error::HintkitError,
};

/// On-disk shape of a grammar file: `{"categories": {"COMMAND": [...], ...}}`.
#[derive(Debug, Deserialize)]
struct GrammarFile {
    /// Category name to the node types it contains.
    categories: BTreeMap<String, Vec<String>>,
}

/// Immutable lookup from AST node type to grammar category.
///
/// Built once per run and handed to every extraction call by reference.
#[derive(Debug, Clone)]
pub struct GrammarCatalog {
    /// Node type to the single category that owns it.
    type_to_category: HashMap<String, String>,
    /// Canonical categories first, then any extra ones from the grammar.
    categories:       Vec<String>,
}

impl GrammarCatalog {
    /// Builds a catalog from category name → node type names.
    ///
    /// Fails with [`HintkitError::InvalidGrammar`] when a node type is claimed
    /// by two categories. Repeating a node type inside one category is fine.
    pub fn build<I, C, T, N>(entries: I) -> Result<Self, HintkitError>
    where
        I: IntoIterator<Item = (C, T)>,
        C: Into<String>,
        T: IntoIterator<Item = N>,
        N: Into<String>,
    {
        let mut type_to_category: HashMap<String, String> = HashMap::new();
        let mut categories: Vec<String> =
            CANONICAL_CATEGORIES.iter().map(|c| c.to_string()).collect();
        let mut extra: Vec<String> = Vec::new();

        for (category, node_types) in entries {
            let category = category.into();
            for node_type in node_types {
                match type_to_category.entry(node_type.into()) {
                    Entry::Vacant(slot) => {
                        slot.insert(category.clone());
                    }
                    Entry::Occupied(slot) if slot.get() == &category => {}
                    Entry::Occupied(slot) => {
                        return Err(HintkitError::InvalidGrammar {
                            node_type: slot.key().clone(),
                            first:     slot.get().clone(),
                            second:    category,
                        });
                    }
                }
            }

            if !categories.contains(&category) && !extra.contains(&category) {
                extra.push(category);
            }
        }

        extra.sort();
        categories.extend(extra);

        tracing::debug!(
            "Grammar catalog built with {} node types in {} categories",
            type_to_category.len(),
            categories.len()
        );

        Ok(Self {
            type_to_category,
            categories,
        })
    }

    /// Parses a grammar document (`{"categories": {...}}`) and builds a catalog.
    pub fn from_json(source: &str) -> Result<Self> {
        let file: GrammarFile =
            serde_json::from_str(source).context("Grammar JSON is missing a `categories` map")?;
        Ok(Self::build(file.categories)?)
    }

    /// Reads and builds a catalog from a grammar file.
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read grammar file {}", path.display()))?;
        Self::from_json(&source)
            .with_context(|| format!("Invalid grammar file {}", path.display()))
    }

    /// Returns the category for `node_type`, if it has one.
    pub fn lookup(&self, node_type: &str) -> Option<&str> {
        self.type_to_category.get(node_type).map(String::as_str)
    }

    /// Returns the category for `node_type`, or `"none"` when uncategorized.
    pub fn category_of(&self, node_type: &str) -> &str {
        self.lookup(node_type).unwrap_or(UNCATEGORIZED)
    }

    /// All categories that feature rows report, in a stable order.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Number of node types the grammar categorizes.
    pub fn len(&self) -> usize {
        self.type_to_category.len()
    }

    /// Returns true if the grammar categorizes no node types at all.
    pub fn is_empty(&self) -> bool {
        self.type_to_category.is_empty()
    }
}

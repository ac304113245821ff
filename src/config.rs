#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::DATA_DIR_ENV;

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Locations of every input the pipeline reads.
pub struct DataPaths {
    /// Directory the defaults below are resolved against.
    root_dir:       PathBuf,
    /// Grammar category file.
    grammar:        PathBuf,
    /// Training (correct solution) trace rows.
    training:       PathBuf,
    /// Hint-request trace rows.
    requests:       PathBuf,
    /// Gold-standard hint rows.
    gold:           PathBuf,
    /// Directory of generated hints, one subdirectory per algorithm.
    algorithms_dir: PathBuf,
}

impl DataPaths {
    /// Creates the standard layout rooted at `root_dir`.
    pub fn new(root_dir: PathBuf) -> Self {
        Self::build_with_defaults(root_dir, None, None, None, None, None)
    }

    /// Uses `HINTKIT_DATA_DIR` when set, otherwise the working directory.
    pub fn from_env() -> Self {
        let root = std::env::var(DATA_DIR_ENV)
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(root)
    }

    /// Construct paths from optional overrides.
    pub fn from_parts(
        root_dir: PathBuf,
        grammar: Option<PathBuf>,
        training: Option<PathBuf>,
        requests: Option<PathBuf>,
        gold: Option<PathBuf>,
        algorithms_dir: Option<PathBuf>,
    ) -> Self {
        Self::build_with_defaults(root_dir, grammar, training, requests, gold, algorithms_dir)
    }

    /// Root directory.
    pub fn root_dir(&self) -> &Path {
        self.root_dir.as_path()
    }

    /// Grammar category file.
    pub fn grammar(&self) -> &Path {
        self.grammar.as_path()
    }

    /// Training trace rows.
    pub fn training(&self) -> &Path {
        self.training.as_path()
    }

    /// Request trace rows.
    pub fn requests(&self) -> &Path {
        self.requests.as_path()
    }

    /// Gold-standard rows.
    pub fn gold(&self) -> &Path {
        self.gold.as_path()
    }

    /// Generated hints directory.
    pub fn algorithms_dir(&self) -> &Path {
        self.algorithms_dir.as_path()
    }

    /// Returns a copy of these paths with a different grammar file.
    pub fn with_grammar(mut self, grammar: impl Into<PathBuf>) -> Self {
        self.grammar = grammar.into();
        self
    }

    /// Centralized constructor that applies standard defaults when overrides
    /// are absent.
    fn build_with_defaults(
        root_dir: PathBuf,
        grammar: Option<PathBuf>,
        training: Option<PathBuf>,
        requests: Option<PathBuf>,
        gold: Option<PathBuf>,
        algorithms_dir: Option<PathBuf>,
    ) -> Self {
        let grammar = grammar.unwrap_or_else(|| root_dir.join("snap-grammar.json"));
        let training = training.unwrap_or_else(|| root_dir.join("training.jsonl"));
        let requests = requests.unwrap_or_else(|| root_dir.join("requests.jsonl"));
        let gold = gold.unwrap_or_else(|| root_dir.join("gold-standard.jsonl"));
        let algorithms_dir = algorithms_dir.unwrap_or_else(|| root_dir.join("algorithms"));

        Self {
            root_dir,
            grammar,
            training,
            requests,
            gold,
            algorithms_dir,
        }
    }
}

impl Default for DataPaths {
    fn default() -> Self {
        Self::new(PathBuf::from("."))
    }
}

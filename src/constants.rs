#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Categories every feature row reports, whether or not the grammar uses them.
pub const CANONICAL_CATEGORIES: [&str; 4] = ["COMMAND", "REPORTER", "HAT", "BOOLEAN"];

/// Category name reported for node types the grammar does not mention.
pub const UNCATEGORIZED: &str = "none";

/// Algorithm name given to tutor-authored hints.
pub const TUTOR_ALGORITHM: &str = "tutor";

/// Separator between request ID and hint index in generated hint file stems.
pub const HINT_ID_SEPARATOR: char = '_';

/// Number of equal-width bins used when aggregating over trace progress.
pub const PROGRESS_BINS: usize = 10;

/// State label for final snapshots of training (correct) traces.
pub const CORRECT_STATE: &str = "correct";

/// State label for final snapshots of hint-request traces.
pub const REQUEST_STATE: &str = "request";

/// Environment variable naming the default data directory.
pub const DATA_DIR_ENV: &str = "HINTKIT_DATA_DIR";

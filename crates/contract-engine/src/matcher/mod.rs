//! Placeholder matcher
//!
//! Locates a placeholder inside a document and writes a value into it. The
//! strategies are tried in order and the first one that finds the placeholder
//! wins:
//!
//! 1. exact text
//! 2. whitespace-normalized text (rewrites the whole document's whitespace)
//! 3. flexible pattern where blanks of dots, dashes and underscores are
//!    interchangeable and spacing is optional
//!
//! Not finding the placeholder is a normal outcome (`None`), never an error.

mod placeholder;
mod strategies;

use contract_types::MatchStrategy;
use tracing::debug;

type StrategyFn = fn(&str, &str, &str) -> Option<(String, usize)>;

const STRATEGIES: [(MatchStrategy, StrategyFn); 3] = [
    (MatchStrategy::Exact, strategies::exact),
    (MatchStrategy::WhitespaceNormalized, strategies::whitespace_normalized),
    (MatchStrategy::Flexible, strategies::flexible),
];

/// A successful placeholder replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub document: String,
    pub strategy: MatchStrategy,
    pub replacements: usize,
}

/// Replace every occurrence of `placeholder` in `document` with `value`.
///
/// Returns `None` when no strategy locates the placeholder; the caller keeps
/// the document unchanged in that case. Placeholders made only of whitespace
/// never match.
pub fn replace_placeholder(placeholder: &str, document: &str, value: &str) -> Option<MatchResult> {
    if placeholder.trim().is_empty() {
        return None;
    }

    STRATEGIES.iter().find_map(|(strategy, apply)| {
        apply(placeholder, document, value).map(|(document, replacements)| {
            debug!(
                "Placeholder {:?} matched via {:?} ({} replacement(s))",
                placeholder, strategy, replacements
            );
            MatchResult {
                document,
                strategy: *strategy,
                replacements,
            }
        })
    })
}

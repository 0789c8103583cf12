//! Contract template substitution
//!
//! Fills the blanks of a rental contract template with the values collected
//! for each catalog variable, and lays out the result for export.

pub mod export;
pub mod matcher;

use contract_types::{
    CollectedValues, OutcomeStatus, SubstitutionOutcome, SubstitutionReport, VariableCatalog,
};
use tracing::{debug, info, warn};

pub use matcher::{replace_placeholder, MatchResult};

/// SubstitutionEngine entry point
///
/// Holds no state between calls: every pass is a function of the template,
/// the catalog and the collected values.
pub struct SubstitutionEngine;

impl SubstitutionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Run one substitution pass over `template`.
    ///
    /// Variables are processed in catalog order and each one sees the
    /// document as rewritten by the variables before it.
    pub fn substitute(
        &self,
        template: &str,
        catalog: &VariableCatalog,
        values: &CollectedValues,
    ) -> SubstitutionReport {
        let mut document = template.to_string();
        let mut applied_count = 0;
        let mut unmatched = Vec::new();
        let mut outcomes = Vec::with_capacity(catalog.len());

        for descriptor in catalog {
            let key = descriptor.key.as_str();

            let Some(value) = values.resolve(key) else {
                debug!("Skipping {}: no value collected", key);
                outcomes.push(SubstitutionOutcome::skipped(key, OutcomeStatus::SkippedNoValue));
                continue;
            };

            let placeholder = descriptor.placeholder_text.trim();
            if placeholder.is_empty() {
                debug!("Skipping {}: empty placeholder", key);
                outcomes.push(SubstitutionOutcome::skipped(
                    key,
                    OutcomeStatus::SkippedNoPlaceholder,
                ));
                continue;
            }

            match replace_placeholder(placeholder, &document, value) {
                Some(result) => {
                    document = result.document;
                    applied_count += 1;
                    outcomes.push(SubstitutionOutcome::applied(
                        key,
                        result.strategy,
                        result.replacements,
                    ));
                }
                None => {
                    warn!("No match for {} (placeholder {:?})", key, placeholder);
                    unmatched.push(key.to_string());
                    outcomes.push(SubstitutionOutcome::skipped(key, OutcomeStatus::NoMatch));
                }
            }
        }

        info!(
            "Substitution pass: {} of {} variable(s) applied, {} unmatched",
            applied_count,
            catalog.len(),
            unmatched.len()
        );

        SubstitutionReport {
            document,
            applied_count,
            unmatched,
            outcomes,
        }
    }
}

impl Default for SubstitutionEngine {
    fn default() -> Self {
        Self::new()
    }
}


// ============================================================================
// PROPERTY TESTS
// ============================================================================

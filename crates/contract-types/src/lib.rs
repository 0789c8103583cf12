pub mod catalog;
pub mod types;
pub mod values;

pub use catalog::VariableCatalog;
pub use types::{
    MatchStrategy, OutcomeStatus, SubstitutionOutcome, SubstitutionReport, VariableDescriptor,
};
pub use values::CollectedValues;

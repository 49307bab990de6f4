//! Search-time error taxonomy: only the classes that can
//! occur once grounding has already succeeded. Malformed input and
//! unsupported-feature errors are reported by `mimir-formalism`'s
//! translator and never reach this crate.

#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
pub enum SearchError {
    #[error(transparent)]
    Numeric(#[from] mimir_formalism::NumericError),

    #[error("grounding overflow: {schema} produced more than {budget} ground actions")]
    GroundingOverflow { schema: String, budget: u64 },
}

pub type Result<T> = std::result::Result<T, SearchError>;

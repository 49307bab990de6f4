//! The formalism-level error taxonomy: malformed input and
//! unsupported features are reported by the translator/front end and
//! never reach search; grounding overflow is fatal and aborts the run.

#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
pub enum FormalismError {
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("unsupported PDDL feature at {site}: {detail}")]
    UnsupportedFeature { site: String, detail: String },

    #[error("grounding overflow: {schema} produced more than {budget} ground actions")]
    GroundingOverflow { schema: String, budget: u64 },
}

pub type Result<T> = std::result::Result<T, FormalismError>;

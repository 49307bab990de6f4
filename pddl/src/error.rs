//! Parse/lowering errors: reported by the translator front end, never seen by
//! search. Fatal by construction — `mimir-cli` is the only place these
//! turn into a process exit code.

#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
pub enum PddlError {
    #[error("{0}:{1}: unexpected end of input")]
    UnexpectedEof(String, usize),
    #[error("{0}:{1}: expected {2}, found `{3}`")]
    UnexpectedToken(String, usize, String, String),
    #[error("{0}: unknown type `{1}`")]
    UnknownType(String, String),
    #[error("{0}: unknown predicate `{1}`")]
    UnknownPredicate(String, String),
    #[error("{0}: unknown function `{1}`")]
    UnknownFunction(String, String),
    #[error("{0}: unknown object or constant `{1}`")]
    UnknownObject(String, String),
    #[error("{0}: unbound variable `{1}`")]
    UnboundVariable(String, String),
    #[error("{0}: unsupported PDDL feature: {1}")]
    UnsupportedFeature(String, String),
    #[error("{0}: predicate `{1}` redeclared with a different arity")]
    PredicateArityMismatch(String, String),
}

pub type Result<T> = std::result::Result<T, PddlError>;

//! PDDL formalism: the typed in-memory representation of a domain and
//! problem (types, objects, predicates, functions, atoms, conditions,
//! effects, actions, axioms) plus the front-end-agnostic normalizations
//! (`translator`) a parser lowers its parse tree through before this
//! crate's search-facing types are populated. Does not itself parse any
//! concrete syntax — see `mimir-pddl`.

pub mod action;
pub mod atom;
pub mod axiom;
pub mod condition;
pub mod domain;
pub mod effect;
pub mod error;
pub mod function;
pub mod indices;
pub mod literal;
pub mod numeric;
pub mod object;
pub mod predicate;
pub mod problem;
pub mod repositories;
pub mod stratification;
pub mod term;
pub mod translator;
pub mod types;
pub mod variable;

pub use action::ActionSchema;
pub use atom::{GroundAtom, LiftedAtom};
pub use axiom::Axiom;
pub use condition::{ConjunctiveCondition, PerCategory};
pub use domain::Domain;
pub use effect::{AtomEffect, ConditionalEffect, ConjunctiveEffect};
pub use error::{FormalismError, Result};
pub use function::{Function, FunctionCategory, FunctionRepository, GroundFunction, GroundFunctionRepository};
pub use indices::{
    ActionIndex, AxiomIndex, FunctionIndex, GroundActionIndex, GroundAtomIndex, GroundAxiomIndex, GroundFunctionIndex,
    ObjectIndex, PredicateIndex, TypeIndex, VariableIndex,
};
pub use literal::Literal;
pub use numeric::{
    BinaryOp, Comparator, EffectFamily, NumericConstraint, NumericEffect, NumericEffectKind, NumericError,
    NumericExpression,
};
pub use object::{Object, ObjectRepository};
pub use predicate::{Predicate, PredicateCategory, PredicateRepository};
pub use problem::{InitialNumericValue, Metric, MetricDirection, Problem};
pub use repositories::{GroundAtomRepositories, PddlRepositories};
pub use stratification::{stratify, Stratum};
pub use term::Term;
pub use types::{PddlType, TypeRepository};
pub use variable::Variable;

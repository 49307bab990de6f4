//! A problem: objects, initial state, goal, and an optional metric
//! over a [`Domain`].

use crate::atom::GroundAtom;
use crate::condition::ConjunctiveCondition;
use crate::indices::{FunctionIndex, ObjectIndex};
use crate::numeric::NumericExpression;
use smallvec::SmallVec;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum MetricDirection {
    Minimize,
    Maximize,
}

#[derive(Clone, Debug)]
pub struct Metric {
    pub direction: MetricDirection,
    pub expression: NumericExpression,
}

#[derive(Clone, Debug)]
pub struct InitialNumericValue {
    pub function: FunctionIndex,
    pub arguments: SmallVec<[ObjectIndex; 4]>,
    pub value: f64,
}

#[derive(Clone, Debug, Default)]
pub struct Problem {
    pub name: String,
    /// Problem-local objects, in addition to the domain's constants
    /// (both live in the shared `PddlRepositories::objects`; this list
    /// is only "which of those are this problem's").
    pub objects: Vec<ObjectIndex>,
    pub initial_static_atoms: Vec<GroundAtom>,
    pub initial_fluent_atoms: Vec<GroundAtom>,
    pub initial_numeric_values: Vec<InitialNumericValue>,
    /// The goal, represented as a (parameter-less) conjunctive condition
    /// over ground terms: with no parameters to bind, it is gated
    /// purely by nullary literals and numeric constraints, plus any
    /// arity >= 1 literals whose terms are all ground `Term::Object`s.
    pub goal: ConjunctiveCondition,
    pub metric: Option<Metric>,
}

impl Problem {
    pub fn new(name: impl Into<String>) -> Self {
        Problem {
            name: name.into(),
            ..Default::default()
        }
    }
}

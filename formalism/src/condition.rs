//! Conjunctive conditions: a parameter list, per-category
//! literal lists, per-category lists of *nullary* ground literals (kept
//! apart because they collapse to a constant Boolean per state and
//! require no binding), and a numeric-constraint list.

use crate::atom::{GroundAtom, LiftedAtom};
use crate::indices::TypeIndex;
use crate::literal::Literal;
use crate::numeric::NumericConstraint;
use crate::predicate::PredicateCategory;
use crate::variable::Variable;
use smallvec::SmallVec;

/// Three parallel lists, one per [`PredicateCategory`], in place of
/// compile-time template specialisation per category.
#[derive(Clone, Debug, Default)]
pub struct PerCategory<T> {
    pub static_: Vec<T>,
    pub fluent: Vec<T>,
    pub derived: Vec<T>,
}

impl<T> PerCategory<T> {
    pub fn get(&self, category: PredicateCategory) -> &[T] {
        match category {
            PredicateCategory::Static => &self.static_,
            PredicateCategory::Fluent => &self.fluent,
            PredicateCategory::Derived => &self.derived,
        }
    }

    pub fn get_mut(&mut self, category: PredicateCategory) -> &mut Vec<T> {
        match category {
            PredicateCategory::Static => &mut self.static_,
            PredicateCategory::Fluent => &mut self.fluent,
            PredicateCategory::Derived => &mut self.derived,
        }
    }

    pub fn iter_all(&self) -> impl Iterator<Item = &T> + '_ {
        self.static_.iter().chain(self.fluent.iter()).chain(self.derived.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.static_.is_empty() && self.fluent.is_empty() && self.derived.is_empty()
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConjunctiveCondition {
    pub parameters: Vec<Variable>,
    /// Declared type(s) of each entry in `parameters`, same length and
    /// order — the consistency graph's vertex filter needs these to
    /// test "object compatible with paramᵢ's type".
    pub parameter_types: Vec<SmallVec<[TypeIndex; 1]>>,
    pub literals: PerCategory<Literal<LiftedAtom>>,
    pub nullary_literals: PerCategory<Literal<GroundAtom>>,
    pub numeric_constraints: Vec<NumericConstraint>,
}

impl ConjunctiveCondition {
    pub fn new(parameters: Vec<Variable>, parameter_types: Vec<SmallVec<[TypeIndex; 1]>>) -> Self {
        debug_assert_eq!(parameters.len(), parameter_types.len());
        ConjunctiveCondition {
            parameters,
            parameter_types,
            literals: PerCategory::default(),
            nullary_literals: PerCategory::default(),
            numeric_constraints: Vec::new(),
        }
    }

    /// An arity-0 schema: no parameters, so
    /// it is gated purely by nullary literals and numeric constraints.
    pub fn is_nullary(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Binary literals — both argument positions are variables — are
    /// exactly the edges the static/dynamic consistency graphs filter
    /// on.
    pub fn binary_literals(&self) -> impl Iterator<Item = &Literal<LiftedAtom>> + '_ {
        self.literals.iter_all().filter(|l| l.atom.arity() == 2)
    }

    pub fn unary_literals(&self) -> impl Iterator<Item = &Literal<LiftedAtom>> + '_ {
        self.literals.iter_all().filter(|l| l.atom.arity() == 1)
    }

    /// Literals of arity 0 or >= 3, verified directly against the state
    /// once a complete binding is known.
    pub fn other_literals(&self) -> impl Iterator<Item = &Literal<LiftedAtom>> + '_ {
        self.literals.iter_all().filter(|l| !matches!(l.atom.arity(), 1 | 2))
    }
}

//! [`DynamicStateView`] implementation over a packed state plus the
//! repositories needed to resolve a lifted literal/numeric constraint
//! against it. Shared by the lifted generator and
//! the lifted axiom evaluator — both verify a binding's "remaining"
//! literals/constraints the same way, only the condition differs.

use crate::binding_generator::DynamicStateView;
use crate::ground::ground_numeric_constraint;
use fixedbitset::FixedBitSet;
use hashbrown::HashSet;
use mimir_collections::Idx;
use mimir_formalism::{GroundAtom, GroundAtomIndex, GroundAtomRepositories, GroundFunctionRepository, NumericConstraint, ObjectIndex, PredicateCategory, PredicateRepository};

pub struct StateView<'a> {
    pub predicates: &'a PredicateRepository,
    pub ground_atoms: &'a GroundAtomRepositories,
    pub ground_functions: &'a GroundFunctionRepository,
    pub static_atoms: &'a HashSet<GroundAtom>,
    pub fluent_atoms: &'a FixedBitSet,
    pub derived_atoms: &'a FixedBitSet,
    pub numeric_values: &'a [f64],
    /// When set, every numeric constraint is treated as satisfied
    /// without evaluating it. Used only by the grounded generator's
    /// delete-relaxed reachability precompute, which has no
    /// real numeric state to check against and must not let an
    /// undefined function value wrongly prune a reachable binding —
    /// correctness is restored later when the match tree's numeric
    /// tests and the ground precondition's own `holds` check run
    /// against the real state.
    pub numeric_relaxed: bool,
}

impl<'a> DynamicStateView for StateView<'a> {
    fn has_ground_atom(&self, atom: &GroundAtom) -> bool {
        match self.predicates.get(atom.predicate).category {
            PredicateCategory::Static => self.static_atoms.contains(atom),
            PredicateCategory::Fluent => self
                .ground_atoms
                .categories
                .fluent
                .get_ref(atom)
                .is_some_and(|idx| self.fluent_atoms.contains(idx.to_usize())),
            PredicateCategory::Derived => self
                .ground_atoms
                .categories
                .derived
                .get_ref(atom)
                .is_some_and(|idx| self.derived_atoms.contains(idx.to_usize())),
        }
    }

    fn evaluate_numeric_constraint(&self, constraint: &NumericConstraint, binding: &[ObjectIndex]) -> bool {
        if self.numeric_relaxed {
            return true;
        }
        let ground = ground_numeric_constraint(constraint, binding, self.ground_functions);
        match ground.evaluate(self.numeric_values) {
            Ok(holds) => holds,
            Err(error) => {
                tracing::debug!(%error, "numeric constraint evaluation failed, treating binding as inapplicable");
                false
            }
        }
    }
}

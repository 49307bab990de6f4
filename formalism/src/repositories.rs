//! The repository hub: the domain/problem pair
//! owns every PDDL entity; all other components hold borrowed
//! references keyed by index, mirroring the single owning struct
//! (holding every interning table and arena) that the rest of the
//! planner borrows from rather than threading individual lifetimes
//! through every entity.

use crate::atom::GroundAtom;
use crate::condition::PerCategory;
use crate::function::{FunctionRepository, GroundFunctionRepository};
use crate::indices::GroundAtomIndex;
use crate::object::ObjectRepository;
use crate::predicate::PredicateRepository;
use crate::types::TypeRepository;
use mimir_collections::RefPool;

/// Ground atoms are interned per predicate category, since the state
/// repository only ever needs to store fluent/derived bits densely and
/// static atoms are never stored per-state.
#[derive(Default, Clone, Debug)]
pub struct GroundAtomRepositories {
    pub categories: PerCategory<RefPool<GroundAtomIndex, GroundAtom>>,
}

impl GroundAtomRepositories {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Created once per problem, destroyed together with it. Owns every interned PDDL entity; the applicable-action
/// generators, match tree and state repository all borrow from this.
#[derive(Default, Clone, Debug)]
pub struct PddlRepositories {
    pub types: TypeRepository,
    pub objects: ObjectRepository,
    pub predicates: PredicateRepository,
    pub functions: FunctionRepository,
    pub ground_atoms: GroundAtomRepositories,
    pub ground_functions: GroundFunctionRepository,
}

impl PddlRepositories {
    pub fn new() -> Self {
        Self::default()
    }
}

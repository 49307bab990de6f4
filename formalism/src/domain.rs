//! A domain: the action schemas and axioms shared by every problem
//! instance defined over it. Objects, types, predicates and functions
//! live in the shared [`crate::repositories::PddlRepositories`] instead
//! of here, since a problem may add problem-local objects to the same
//! namespaces.

use crate::action::ActionSchema;
use crate::axiom::Axiom;
use crate::indices::{ActionIndex, AxiomIndex};
use mimir_collections::RefVec;

#[derive(Clone, Debug, Default)]
pub struct Domain {
    pub name: String,
    pub action_schemas: RefVec<ActionIndex, ActionSchema>,
    pub axioms: RefVec<AxiomIndex, Axiom>,
}

impl Domain {
    pub fn new(name: impl Into<String>) -> Self {
        Domain {
            name: name.into(),
            action_schemas: RefVec::new(),
            axioms: RefVec::new(),
        }
    }
}

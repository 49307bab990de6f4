//! Ground and lifted atoms: a ground atom is (predicate,
//! object list of length = arity); a lifted atom is (predicate, term
//! list).

use crate::indices::{ObjectIndex, PredicateIndex};
use crate::term::Term;
use smallvec::SmallVec;

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct GroundAtom {
    pub predicate: PredicateIndex,
    pub objects: SmallVec<[ObjectIndex; 4]>,
}

impl GroundAtom {
    pub fn new(predicate: PredicateIndex, objects: impl Into<SmallVec<[ObjectIndex; 4]>>) -> Self {
        GroundAtom {
            predicate,
            objects: objects.into(),
        }
    }

    pub fn arity(&self) -> usize {
        self.objects.len()
    }
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct LiftedAtom {
    pub predicate: PredicateIndex,
    pub terms: SmallVec<[Term; 4]>,
}

impl LiftedAtom {
    pub fn new(predicate: PredicateIndex, terms: impl Into<SmallVec<[Term; 4]>>) -> Self {
        LiftedAtom {
            predicate,
            terms: terms.into(),
        }
    }

    pub fn arity(&self) -> usize {
        self.terms.len()
    }

    /// Substitutes every variable term by the object at its parameter
    /// index in `binding`, producing the ground atom this lifted atom
    /// denotes under that binding. Panics if a variable's parameter
    /// index is out of range for `binding` — callers only invoke this
    /// once a binding is complete for all parameters the atom mentions.
    pub fn ground(&self, binding: &[ObjectIndex]) -> GroundAtom {
        let objects = self
            .terms
            .iter()
            .map(|t| match t {
                Term::Object(o) => *o,
                Term::Variable(v) => binding[v.parameter_index as usize],
            })
            .collect();
        GroundAtom {
            predicate: self.predicate,
            objects,
        }
    }
}

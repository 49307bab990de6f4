//! Effects: atomic add/delete of a fluent atom, numeric
//! assignment effects, bundled into a conjunctive effect, optionally
//! guarded by a conjunctive condition (a conditional effect).

use crate::atom::LiftedAtom;
use crate::condition::ConjunctiveCondition;
use crate::numeric::NumericEffect;

#[derive(Clone, Debug)]
pub enum AtomEffect {
    Add(LiftedAtom),
    Delete(LiftedAtom),
}

impl AtomEffect {
    pub fn atom(&self) -> &LiftedAtom {
        match self {
            AtomEffect::Add(a) | AtomEffect::Delete(a) => a,
        }
    }

    pub fn is_add(&self) -> bool {
        matches!(self, AtomEffect::Add(_))
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConjunctiveEffect {
    pub atom_effects: Vec<AtomEffect>,
    pub numeric_effects: Vec<NumericEffect>,
}

impl ConjunctiveEffect {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A conjunctive condition paired with a conjunctive effect; universal
/// quantification over the conditional effect's own parameters is
/// assumed already compiled away upstream — the parameters
/// still live in `condition.parameters`, continuing the schema's
/// parameter-index numbering.
#[derive(Clone, Debug)]
pub struct ConditionalEffect {
    pub condition: ConjunctiveCondition,
    pub effect: ConjunctiveEffect,
}

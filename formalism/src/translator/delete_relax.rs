//! Delete relaxation: drop every negative
//! effect, keeping adds only. Used by the grounded generator's
//! reachability precompute to upper-bound which actions/atoms can ever
//! become applicable — it is only a *filter* on which ground actions
//! exist, never on which effects a retained ground action keeps: each
//! reachable action is still grounded in full, with all its original
//! effects intact.

use crate::action::ActionSchema;
use crate::axiom::Axiom;
use crate::effect::{AtomEffect, ConditionalEffect, ConjunctiveEffect};

/// Returns a copy of `schema` with every effect's delete atoms removed
/// and every numeric effect dropped (numeric fluents do not participate
/// in delete-relaxed reachability, which only asks for fluent/derived
/// *atom* reachability).
pub fn delete_relax_schema(schema: &ActionSchema) -> ActionSchema {
    let mut relaxed = schema.clone();
    for eff in &mut relaxed.effects {
        relax_conditional_effect(eff);
    }
    relaxed
}

pub fn delete_relax_axiom(axiom: &Axiom) -> Axiom {
    // Axiom heads are always additive; nothing to relax
    // beyond keeping the structure as-is, this exists mainly so callers
    // iterating over "relaxed schemas and axioms" uniformly don't need
    // a special case.
    axiom.clone()
}

fn relax_conditional_effect(eff: &mut ConditionalEffect) {
    relax_conjunctive_effect(&mut eff.effect);
}

fn relax_conjunctive_effect(eff: &mut ConjunctiveEffect) {
    eff.atom_effects.retain(|e| matches!(e, AtomEffect::Add(_)));
    eff.numeric_effects.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::LiftedAtom;
    use crate::condition::ConjunctiveCondition;
    use crate::indices::PredicateIndex;

    #[test]
    fn drops_delete_effects_keeps_adds() {
        let p = PredicateIndex::new(0);
        let q = PredicateIndex::new(1);
        let schema = ActionSchema {
            name: "test".into(),
            parameters: vec![],
            precondition: ConjunctiveCondition::new(vec![], vec![]),
            effects: vec![ConditionalEffect {
                condition: ConjunctiveCondition::new(vec![], vec![]),
                effect: ConjunctiveEffect {
                    atom_effects: vec![AtomEffect::Add(LiftedAtom::new(p, [])), AtomEffect::Delete(LiftedAtom::new(q, []))],
                    numeric_effects: vec![],
                },
            }],
            cost: None,
        };
        let relaxed = delete_relax_schema(&schema);
        assert_eq!(relaxed.effects[0].effect.atom_effects.len(), 1);
        assert!(relaxed.effects[0].effect.atom_effects[0].is_add());
    }
}

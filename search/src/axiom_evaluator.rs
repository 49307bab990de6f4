//! Axiom evaluator: derived predicates are stratified into
//! strongly-connected components ordered topologically
//! ([`mimir_formalism::stratify`]); each stratum is iterated to a
//! least fixpoint before the next stratum starts, which is sound
//! because within a stratum only positive derived literals are
//! permitted.
//!
//! Two evaluation modes mirror the lifted/grounded split of the
//! applicable-action generator: lifted mode reruns
//! the satisficing binding generator per axiom per pass; grounded mode
//! precomputes every reachable ground axiom once and dispatches
//! through a per-stratum [`MatchTree`].

use crate::assignment_set::AssignmentSet;
use crate::binding_generator::BindingGenerator;
use crate::consistency_graph::StaticConsistencyGraph;
use crate::ground::GroundAxiom;
use crate::match_tree::{MatchTree, MatchTreeOptions};
use crate::view::StateView;
use fixedbitset::FixedBitSet;
use mimir_collections::Idx;
use mimir_formalism::{AxiomIndex, Domain, ObjectIndex, PddlRepositories, Stratum};
use smallvec::SmallVec;

struct LiftedStratum {
    stratum: Stratum,
    graphs: Vec<StaticConsistencyGraph>,
}

/// Lifted-mode evaluator: rebuilds bindings via the binding generator
/// on every fixpoint pass.
pub struct LiftedAxiomEvaluator {
    strata: Vec<LiftedStratum>,
}

impl LiftedAxiomEvaluator {
    pub fn new(domain: &Domain, repos: &PddlRepositories, num_objects: usize, static_assignment_set: &AssignmentSet) -> Self {
        let axioms: Vec<(AxiomIndex, &mimir_formalism::Axiom)> = domain.axioms.iter().collect();
        let strata = mimir_formalism::stratify(&axioms);

        let object_is_type_compatible = |object: u32, declared: &[mimir_formalism::TypeIndex]| {
            let obj = repos.objects.get(ObjectIndex::new(object));
            declared.iter().any(|&t| obj.types.iter().any(|&ot| repos.types.is_subtype_of(ot, t)))
        };

        let strata = strata
            .into_iter()
            .map(|stratum| {
                let graphs = stratum
                    .axioms
                    .iter()
                    .map(|&idx| {
                        let axiom = &domain.axioms[idx];
                        StaticConsistencyGraph::build(&axiom.precondition, num_objects, &repos.predicates, &repos.types, static_assignment_set, object_is_type_compatible)
                    })
                    .collect();
                LiftedStratum { stratum, graphs }
            })
            .collect();

        LiftedAxiomEvaluator { strata }
    }

    /// Evaluates every stratum to fixpoint, setting bits in
    /// `derived_atoms` (expected cleared on entry).
    pub fn evaluate(
        &self,
        domain: &Domain,
        repos: &mut PddlRepositories,
        dynamic_assignment_set: &mut AssignmentSet,
        static_atoms: &hashbrown::HashSet<mimir_formalism::GroundAtom>,
        fluent_atoms: &FixedBitSet,
        derived_atoms: &mut FixedBitSet,
        numeric_values: &[f64],
    ) {
        for lifted in &self.strata {
            loop {
                let mut changed = false;
                for (&axiom_idx, graph) in lifted.stratum.axioms.iter().zip(&lifted.graphs) {
                    let axiom = &domain.axioms[axiom_idx];
                    let bindings: Vec<Vec<ObjectIndex>> = {
                        let view = StateView {
                            predicates: &repos.predicates,
                            ground_atoms: &repos.ground_atoms,
                            ground_functions: &repos.ground_functions,
                            static_atoms,
                            fluent_atoms,
                            derived_atoms,
                            numeric_values,
                            numeric_relaxed: false,
                        };
                        BindingGenerator::new(&axiom.precondition, &repos.predicates, graph, dynamic_assignment_set, &view).collect()
                    };
                    for binding in bindings {
                        let ground_head = axiom.head.ground(&binding);
                        let idx = repos.ground_atoms.categories.derived.push(ground_head);
                        if !derived_atoms.contains(idx.to_usize()) {
                            if derived_atoms.len() <= idx.to_usize() {
                                derived_atoms.grow(idx.to_usize() + 1);
                            }
                            derived_atoms.insert(idx.to_usize());
                            changed = true;
                        }
                    }
                }
                if changed {
                    dynamic_assignment_set.refresh_derived(&repos.predicates, &repos.ground_atoms, derived_atoms);
                } else {
                    break;
                }
            }
        }
    }

    /// Materializes every ground axiom whose precondition is satisfiable
    /// against the state described by `static_atoms`/`fluent_atoms`/
    /// `derived_atoms`/`numeric_values`, grouped per stratum in
    /// evaluation order, for feeding into [`GroundedAxiomEvaluator::build`].
    /// That state is expected to reflect the endpoint of a delete-relaxed
    /// forward reachability pass: an over-approximation of
    /// every state the search could ever reach, so every binding found
    /// here really is reachable, and none that could occur is missed.
    /// `numeric_relaxed` should be set while that endpoint carries no
    /// real numeric values, per [`crate::view::StateView::numeric_relaxed`].
    #[allow(clippy::too_many_arguments)]
    pub fn ground_all(
        &self,
        domain: &Domain,
        repos: &mut PddlRepositories,
        dynamic_assignment_set: &AssignmentSet,
        static_atoms: &hashbrown::HashSet<mimir_formalism::GroundAtom>,
        fluent_atoms: &FixedBitSet,
        derived_atoms: &FixedBitSet,
        numeric_values: &[f64],
        numeric_relaxed: bool,
    ) -> Vec<(Stratum, Vec<GroundAxiom>)> {
        self.strata
            .iter()
            .map(|lifted| {
                let mut grounded = Vec::new();
                for (&axiom_idx, graph) in lifted.stratum.axioms.iter().zip(&lifted.graphs) {
                    let axiom = &domain.axioms[axiom_idx];
                    let bindings: Vec<Vec<ObjectIndex>> = {
                        let view = StateView {
                            predicates: &repos.predicates,
                            ground_atoms: &repos.ground_atoms,
                            ground_functions: &repos.ground_functions,
                            static_atoms,
                            fluent_atoms,
                            derived_atoms,
                            numeric_values,
                            numeric_relaxed,
                        };
                        BindingGenerator::new(&axiom.precondition, &repos.predicates, graph, dynamic_assignment_set, &view).collect()
                    };
                    for binding in bindings {
                        let precondition = crate::lifted_generator::ground_condition(&axiom.precondition, &binding, &repos.predicates, &mut repos.ground_atoms, &repos.ground_functions);
                        let head = axiom.head.ground(&binding);
                        let head_idx = repos.ground_atoms.categories.derived.push(head);
                        let objects: SmallVec<[ObjectIndex; 4]> = binding.iter().copied().collect();
                        grounded.push(GroundAxiom {
                            axiom: axiom_idx,
                            objects,
                            precondition,
                            head: head_idx,
                        });
                    }
                }
                (lifted.stratum.clone(), grounded)
            })
            .collect()
    }
}

struct GroundedStratum {
    stratum: Stratum,
    axioms: mimir_collections::RefVec<mimir_formalism::GroundAxiomIndex, GroundAxiom>,
    tree: MatchTree<mimir_formalism::GroundAxiomIndex>,
}

/// Grounded-mode evaluator: every reachable ground axiom per stratum is
/// precomputed once (typically fed by the same delete-relaxed
/// reachability pass the grounded action generator runs)
/// and dispatched through a match tree per fixpoint pass instead of
/// re-enumerating bindings.
pub struct GroundedAxiomEvaluator {
    strata: Vec<GroundedStratum>,
}

impl GroundedAxiomEvaluator {
    pub fn build(strata_with_axioms: Vec<(Stratum, Vec<GroundAxiom>)>, options: &MatchTreeOptions) -> Self {
        let strata = strata_with_axioms
            .into_iter()
            .map(|(stratum, grounded)| {
                let mut axioms = mimir_collections::RefVec::new();
                let elements: Vec<_> = grounded
                    .into_iter()
                    .map(|ga| {
                        let precondition = ga.precondition.clone();
                        let idx = axioms.push(ga);
                        (idx, precondition)
                    })
                    .collect();
                let tree = MatchTree::build(elements, options);
                GroundedStratum { stratum, axioms, tree }
            })
            .collect();
        GroundedAxiomEvaluator { strata }
    }

    pub fn evaluate(&self, fluent_atoms: &FixedBitSet, derived_atoms: &mut FixedBitSet, numeric_values: &[f64]) {
        for stratum in &self.strata {
            let _ = &stratum.stratum;
            loop {
                let mut reached = Vec::new();
                stratum.tree.query(fluent_atoms, derived_atoms, numeric_values, &mut reached);
                let mut changed = false;
                for ground_axiom_idx in reached {
                    let axiom = &stratum.axioms[ground_axiom_idx];
                    if axiom.precondition.holds(fluent_atoms, derived_atoms, numeric_values).unwrap_or(false) {
                        let bit = axiom.head.to_usize();
                        if derived_atoms.len() <= bit {
                            derived_atoms.grow(bit + 1);
                        }
                        if !derived_atoms.contains(bit) {
                            derived_atoms.insert(bit);
                            changed = true;
                        }
                    }
                }
                if !changed {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimir_formalism::{Axiom, ConjunctiveCondition, Literal, LiftedAtom, PddlRepositories, PredicateCategory, PredicateRepository, Term, Variable};
    use smallvec::smallvec;

    /// A 4-block stack `on(a,b), on(b,c), on(c,d)` and a recursive
    /// `above(x,y)` derived predicate:
    ///   above(x,y) :- on(x,y)
    ///   above(x,z) :- on(x,y), above(y,z)
    /// Both rules share one head predicate, so stratification puts them
    /// in a single (self-recursive) stratum, and the fixpoint loop has
    /// to run more than one pass to reach `above(a,d)`.
    #[test]
    fn recursive_above_reaches_the_transitive_closure_of_on() {
        let mut predicates = PredicateRepository::new();
        let on = predicates.add("on", 2, PredicateCategory::Fluent);
        let above = predicates.add("above", 2, PredicateCategory::Derived);

        let x = Variable::new(0);
        let y = Variable::new(1);
        let z = Variable::new(2);

        let mut base_rule = ConjunctiveCondition::new(vec![x, y], vec![smallvec![], smallvec![]]);
        base_rule.literals.fluent.push(Literal::positive(LiftedAtom::new(on, [Term::Variable(x), Term::Variable(y)])));
        let base_axiom = Axiom {
            parameters: vec![x, y],
            precondition: base_rule,
            head: LiftedAtom::new(above, [Term::Variable(x), Term::Variable(y)]),
        };

        let mut transitive_rule = ConjunctiveCondition::new(vec![x, y, z], vec![smallvec![], smallvec![], smallvec![]]);
        transitive_rule.literals.fluent.push(Literal::positive(LiftedAtom::new(on, [Term::Variable(x), Term::Variable(y)])));
        transitive_rule.literals.derived.push(Literal::positive(LiftedAtom::new(above, [Term::Variable(y), Term::Variable(z)])));
        let transitive_axiom = Axiom {
            parameters: vec![x, y, z],
            precondition: transitive_rule,
            head: LiftedAtom::new(above, [Term::Variable(x), Term::Variable(z)]),
        };

        let mut domain = Domain::new("blocks");
        domain.axioms.push(base_axiom);
        domain.axioms.push(transitive_axiom);

        let mut repos = PddlRepositories::new();
        for name in ["a", "b", "c", "d"] {
            repos.objects.add(name, smallvec![]);
        }
        let num_objects = 4;
        let obj = |i: u32| ObjectIndex::new(i);

        let on_ab = mimir_formalism::GroundAtom::new(on, smallvec![obj(0), obj(1)]);
        let on_bc = mimir_formalism::GroundAtom::new(on, smallvec![obj(1), obj(2)]);
        let on_cd = mimir_formalism::GroundAtom::new(on, smallvec![obj(2), obj(3)]);

        let mut fluent_atoms = FixedBitSet::new();
        for atom in [&on_ab, &on_bc, &on_cd] {
            let idx = repos.ground_atoms.categories.fluent.push(atom.clone());
            if fluent_atoms.len() <= idx.to_usize() {
                fluent_atoms.grow(idx.to_usize() + 1);
            }
            fluent_atoms.insert(idx.to_usize());
        }

        let static_assignment_set = AssignmentSet::new(num_objects, &repos.predicates, std::iter::empty());
        let mut dynamic_assignment_set = AssignmentSet::new(num_objects, &repos.predicates, [&on_ab, &on_bc, &on_cd]);
        let static_atoms: hashbrown::HashSet<mimir_formalism::GroundAtom> = hashbrown::HashSet::new();
        let mut derived_atoms = FixedBitSet::new();

        let evaluator = LiftedAxiomEvaluator::new(&domain, &repos, num_objects, &static_assignment_set);
        evaluator.evaluate(&domain, &mut repos, &mut dynamic_assignment_set, &static_atoms, &fluent_atoms, &mut derived_atoms, &[]);

        let holds = |repos: &PddlRepositories, derived_atoms: &FixedBitSet, from: u32, to: u32| {
            let atom = mimir_formalism::GroundAtom::new(above, smallvec![obj(from), obj(to)]);
            repos
                .ground_atoms
                .categories
                .derived
                .get_ref(&atom)
                .is_some_and(|idx| derived_atoms.contains(idx.to_usize()))
        };

        assert!(holds(&repos, &derived_atoms, 0, 1));
        assert!(holds(&repos, &derived_atoms, 1, 2));
        assert!(holds(&repos, &derived_atoms, 2, 3));
        assert!(holds(&repos, &derived_atoms, 0, 2));
        assert!(holds(&repos, &derived_atoms, 1, 3));
        assert!(holds(&repos, &derived_atoms, 0, 3));

        assert!(!holds(&repos, &derived_atoms, 1, 0));
        assert!(!holds(&repos, &derived_atoms, 3, 0));
    }
}

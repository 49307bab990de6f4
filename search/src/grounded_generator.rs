//! Grounded applicable-action generator and the axiom-reachability
//! precompute that feeds [`crate::axiom_evaluator::GroundedAxiomEvaluator`]:
//! a delete-relaxed forward fixpoint over fluent/derived
//! atoms bounds which (schema, binding) and (axiom, binding) pairs can
//! ever become applicable in any reachable state; each survivor is then
//! grounded in full against the real (non-relaxed) domain and dispatched
//! through a [`MatchTree`] instead of the lifted per-state binding
//! search.
//!
//! Numeric preconditions are not delete-relaxed in any useful sense (the
//! relaxed schemas drop their numeric effects entirely, so a
//! fluent's value never advances during the fixpoint): during the
//! reachability pass itself they are treated as always satisfied, the
//! same over-approximation standard relaxed-reachability analyses make,
//! so that an action whose numeric precondition would only become true
//! after some numeric effect fires is never wrongly excluded.

use crate::assignment_set::AssignmentSet;
use crate::axiom_evaluator::{GroundedAxiomEvaluator, LiftedAxiomEvaluator};
use crate::ground::{effect_family_conflict, GroundAction};
use crate::lifted_generator::{materialize, LiftedApplicableActionGenerator};
use crate::match_tree::{MatchTree, MatchTreeOptions};
use fixedbitset::FixedBitSet;
use hashbrown::{HashMap, HashSet};
use mimir_collections::{Idx, RefVec};
use mimir_formalism::{translator::delete_relax::delete_relax_schema, ActionIndex, Domain, GroundActionIndex, GroundAtom, ObjectIndex, PddlRepositories, Problem};
use smallvec::SmallVec;

pub struct GroundedApplicableActionGenerator {
    ground_actions: RefVec<GroundActionIndex, GroundAction>,
    tree: MatchTree<GroundActionIndex>,
}

impl GroundedApplicableActionGenerator {
    pub fn ground_action(&self, index: GroundActionIndex) -> &GroundAction {
        &self.ground_actions[index]
    }

    pub fn num_ground_actions(&self) -> usize {
        self.ground_actions.len()
    }

    /// Every ground action the match tree's query reaches whose
    /// precondition still holds — imperfect leaves may over-report, so
    /// each candidate is re-checked directly.
    pub fn applicable_actions(&self, fluent_atoms: &FixedBitSet, derived_atoms: &FixedBitSet, numeric_values: &[f64]) -> Vec<GroundActionIndex> {
        let mut reached = Vec::new();
        self.tree.query(fluent_atoms, derived_atoms, numeric_values, &mut reached);
        reached.retain(|&idx| self.ground_actions[idx].precondition.holds(fluent_atoms, derived_atoms, numeric_values).unwrap_or(false));
        reached
    }
}

/// Runs the delete-relaxed forward reachability fixpoint, then fully
/// (non-relaxed) grounds every reachable action schema binding and
/// every reachable axiom binding, returning a grounded generator plus a
/// grounded axiom evaluator built from the latter.
pub fn build(domain: &Domain, repos: &mut PddlRepositories, problem: &Problem, num_objects: usize, action_options: &MatchTreeOptions, axiom_options: &MatchTreeOptions) -> (GroundedApplicableActionGenerator, GroundedAxiomEvaluator) {
    let static_atoms: HashSet<GroundAtom> = problem.initial_static_atoms.iter().cloned().collect();
    let static_assignment_set = AssignmentSet::new(num_objects, &repos.predicates, problem.initial_static_atoms.iter());

    let mut relaxed_domain = Domain::new(format!("{}-delete-relaxed", domain.name));
    for (_, schema) in domain.action_schemas.iter() {
        relaxed_domain.action_schemas.push(delete_relax_schema(schema));
    }
    relaxed_domain.axioms = domain.axioms.clone();

    let mut fluent_atoms = FixedBitSet::new();
    for atom in &problem.initial_fluent_atoms {
        let idx = repos.ground_atoms.categories.fluent.push(atom.clone());
        if fluent_atoms.len() <= idx.to_usize() {
            fluent_atoms.grow(idx.to_usize() + 1);
        }
        fluent_atoms.insert(idx.to_usize());
    }
    let mut derived_atoms = FixedBitSet::new();
    let mut dynamic_assignment_set = AssignmentSet::new(num_objects, &repos.predicates, std::iter::empty());
    let numeric_values: Vec<f64> = Vec::new();

    let mut relaxed_generator = LiftedApplicableActionGenerator::new(&relaxed_domain, repos, num_objects, &static_assignment_set);
    let lifted_axiom_evaluator = LiftedAxiomEvaluator::new(domain, repos, num_objects, &static_assignment_set);

    let mut reachable_bindings: HashMap<ActionIndex, HashSet<SmallVec<[ObjectIndex; 4]>>> = HashMap::new();

    loop {
        dynamic_assignment_set.refresh(&repos.predicates, &repos.ground_atoms, &fluent_atoms, &derived_atoms);
        lifted_axiom_evaluator.evaluate(domain, repos, &mut dynamic_assignment_set, &static_atoms, &fluent_atoms, &mut derived_atoms, &numeric_values);
        dynamic_assignment_set.refresh(&repos.predicates, &repos.ground_atoms, &fluent_atoms, &derived_atoms);

        let actions = relaxed_generator.applicable_actions(
            &relaxed_domain,
            repos,
            &dynamic_assignment_set,
            &static_atoms,
            &fluent_atoms,
            &derived_atoms,
            &numeric_values,
            true,
        );

        let mut changed = false;
        for idx in actions {
            let ga = relaxed_generator.ground_action(idx);
            let key = ga.objects.clone();
            if reachable_bindings.entry(ga.schema).or_default().insert(key) {
                changed = true;
            }
            for effect in &ga.effects {
                for &add in &effect.effect.add_effects {
                    if fluent_atoms.len() <= add.to_usize() {
                        fluent_atoms.grow(add.to_usize() + 1);
                    }
                    if !fluent_atoms.contains(add.to_usize()) {
                        fluent_atoms.insert(add.to_usize());
                        changed = true;
                    }
                }
            }
        }

        if !changed {
            break;
        }
    }

    let real_generator = LiftedApplicableActionGenerator::new(domain, repos, num_objects, &static_assignment_set);
    let mut ground_actions: RefVec<GroundActionIndex, GroundAction> = RefVec::new();
    let mut action_elements = Vec::new();
    for (schema_idx, schema) in domain.action_schemas.iter() {
        let Some(bindings) = reachable_bindings.get(&schema_idx) else {
            continue;
        };
        // `real_generator` was only used to build consistency graphs;
        // reuse its per-schema effect graphs via a second pass over the
        // precomputed bindings rather than its own applicable_actions
        // (which would re-run the binding search against the current
        // state instead of grounding the already-known-reachable set).
        for binding in bindings {
            let effect_graphs = real_generator.schema_effect_graphs(schema_idx).to_vec();
            let ground_action = materialize(
                schema_idx,
                schema,
                binding,
                &effect_graphs,
                repos,
                &dynamic_assignment_set,
                &static_atoms,
                &fluent_atoms,
                &derived_atoms,
                &numeric_values,
                true,
            );
            if let Some(function) = effect_family_conflict(&ground_action) {
                tracing::warn!(schema = %schema.name, ?binding, ?function, "excluding grounded action: conflicting numeric effect families on the same function");
                continue;
            }
            let precondition = ground_action.precondition.clone();
            let idx = ground_actions.push(ground_action);
            action_elements.push((idx, precondition));
        }
    }
    let action_tree = MatchTree::build(action_elements, action_options);
    let action_generator = GroundedApplicableActionGenerator {
        ground_actions,
        tree: action_tree,
    };

    let strata_with_axioms = lifted_axiom_evaluator.ground_all(domain, repos, &dynamic_assignment_set, &static_atoms, &fluent_atoms, &derived_atoms, &numeric_values, true);
    let axiom_evaluator = GroundedAxiomEvaluator::build(strata_with_axioms, axiom_options);

    (action_generator, axiom_evaluator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimir_formalism::{ActionSchema, ConjunctiveCondition, Literal, LiftedAtom, PddlRepositories, PredicateCategory, Term, Variable};
    use smallvec::smallvec;

    #[test]
    fn reachability_grounds_every_chained_action() {
        // on(x) -> move(x) adds holds(x); domain has two objects, one
        // initial atom, a single schema: only the reachable binding
        // should ever be grounded.
        let mut repos = PddlRepositories::default();
        let on = repos.predicates.add("on", 1, PredicateCategory::Fluent);
        let a = repos.objects.add("a", smallvec![]);
        let b = repos.objects.add("b", smallvec![]);
        let _ = b;

        let mut domain = Domain::new("chain");
        let mut precondition = ConjunctiveCondition::new(vec![Variable::new(0)], vec![smallvec![]]);
        precondition.literals.fluent.push(Literal::positive(LiftedAtom::new(on, [Term::Variable(Variable::new(0))])));
        domain.action_schemas.push(ActionSchema {
            name: "noop".into(),
            parameters: vec![Variable::new(0)],
            precondition,
            effects: vec![],
            cost: None,
        });

        let mut problem = Problem::new("p");
        problem.objects = vec![a, b];
        problem.initial_fluent_atoms.push(GroundAtom::new(on, smallvec![a]));
        problem.goal = ConjunctiveCondition::new(vec![], vec![]);

        let (generator, _axioms) = build(&domain, &mut repos, &problem, 2, &MatchTreeOptions::default(), &MatchTreeOptions::default());
        assert_eq!(generator.num_ground_actions(), 1);
    }

    /// A tiny ferry domain (one ferry location state, one car, two
    /// ports): `sail(from,to)`, `board(car,port)`, `debark(car,port)`.
    /// Builds both a [`crate::state_repository::RepositoryMode::Lifted`]
    /// and a `Grounded` repository over the *same* domain/problem, walks
    /// every reachable state from each, and checks that the two report
    /// identical applicable-action sets everywhere — decoded to
    /// predicate/object names rather than compared by raw index, since
    /// the two repositories intern ground atoms and ground actions in
    /// different orders.
    fn ferry_domain() -> (Domain, PddlRepositories, Problem, usize) {
        let mut repos = PddlRepositories::default();
        let at_ferry = repos.predicates.add("at-ferry", 1, PredicateCategory::Fluent);
        let at_car = repos.predicates.add("at-car", 2, PredicateCategory::Fluent);
        let on_ferry = repos.predicates.add("on-ferry", 1, PredicateCategory::Fluent);
        let p1 = repos.objects.add("p1", smallvec![]);
        let p2 = repos.objects.add("p2", smallvec![]);
        let car = repos.objects.add("car1", smallvec![]);

        let mut domain = Domain::new("ferry");

        let from = Variable::new(0);
        let to = Variable::new(1);
        let mut sail_precondition = ConjunctiveCondition::new(vec![from, to], vec![smallvec![], smallvec![]]);
        sail_precondition.literals.fluent.push(Literal::positive(LiftedAtom::new(at_ferry, [Term::Variable(from)])));
        domain.action_schemas.push(ActionSchema {
            name: "sail".into(),
            parameters: vec![from, to],
            precondition: sail_precondition,
            effects: vec![mimir_formalism::ConditionalEffect {
                condition: ConjunctiveCondition::new(vec![], vec![]),
                effect: mimir_formalism::ConjunctiveEffect {
                    atom_effects: vec![
                        mimir_formalism::AtomEffect::Delete(LiftedAtom::new(at_ferry, [Term::Variable(from)])),
                        mimir_formalism::AtomEffect::Add(LiftedAtom::new(at_ferry, [Term::Variable(to)])),
                    ],
                    numeric_effects: vec![],
                },
            }],
            cost: None,
        });

        let c = Variable::new(0);
        let loc = Variable::new(1);
        let mut board_precondition = ConjunctiveCondition::new(vec![c, loc], vec![smallvec![], smallvec![]]);
        board_precondition.literals.fluent.push(Literal::positive(LiftedAtom::new(at_car, [Term::Variable(c), Term::Variable(loc)])));
        board_precondition.literals.fluent.push(Literal::positive(LiftedAtom::new(at_ferry, [Term::Variable(loc)])));
        domain.action_schemas.push(ActionSchema {
            name: "board".into(),
            parameters: vec![c, loc],
            precondition: board_precondition,
            effects: vec![mimir_formalism::ConditionalEffect {
                condition: ConjunctiveCondition::new(vec![], vec![]),
                effect: mimir_formalism::ConjunctiveEffect {
                    atom_effects: vec![
                        mimir_formalism::AtomEffect::Delete(LiftedAtom::new(at_car, [Term::Variable(c), Term::Variable(loc)])),
                        mimir_formalism::AtomEffect::Add(LiftedAtom::new(on_ferry, [Term::Variable(c)])),
                    ],
                    numeric_effects: vec![],
                },
            }],
            cost: None,
        });

        let mut debark_precondition = ConjunctiveCondition::new(vec![c, loc], vec![smallvec![], smallvec![]]);
        debark_precondition.literals.fluent.push(Literal::positive(LiftedAtom::new(on_ferry, [Term::Variable(c)])));
        debark_precondition.literals.fluent.push(Literal::positive(LiftedAtom::new(at_ferry, [Term::Variable(loc)])));
        domain.action_schemas.push(ActionSchema {
            name: "debark".into(),
            parameters: vec![c, loc],
            precondition: debark_precondition,
            effects: vec![mimir_formalism::ConditionalEffect {
                condition: ConjunctiveCondition::new(vec![], vec![]),
                effect: mimir_formalism::ConjunctiveEffect {
                    atom_effects: vec![
                        mimir_formalism::AtomEffect::Delete(LiftedAtom::new(on_ferry, [Term::Variable(c)])),
                        mimir_formalism::AtomEffect::Add(LiftedAtom::new(at_car, [Term::Variable(c), Term::Variable(loc)])),
                    ],
                    numeric_effects: vec![],
                },
            }],
            cost: None,
        });

        let mut problem = Problem::new("p");
        problem.objects = vec![p1, p2, car];
        problem.initial_fluent_atoms.push(GroundAtom::new(at_ferry, smallvec![p1]));
        problem.initial_fluent_atoms.push(GroundAtom::new(at_car, smallvec![car, p2]));
        problem.goal = ConjunctiveCondition::new(vec![], vec![]);
        (domain, repos, problem, 3)
    }

    fn atom_text(repos: &PddlRepositories, atom: &GroundAtom) -> String {
        let name = &repos.predicates.get(atom.predicate).name;
        let objects: Vec<&str> = atom.objects.iter().map(|&o| repos.objects.get(o).name.as_str()).collect();
        format!("{name}({})", objects.join(","))
    }

    fn decode_fluent_atoms(repos: &PddlRepositories, fluent_atoms: &FixedBitSet) -> std::collections::BTreeSet<String> {
        fluent_atoms
            .ones()
            .map(|bit| atom_text(repos, repos.ground_atoms.categories.fluent.get(mimir_formalism::GroundAtomIndex::from_usize(bit))))
            .collect()
    }

    fn reachable_action_sets(mut repository: crate::state_repository::StateRepository, problem: &Problem) -> HashMap<std::collections::BTreeSet<String>, std::collections::BTreeSet<String>> {
        let s0 = repository.initial_state(problem);
        let mut frontier = std::collections::VecDeque::from([s0]);
        let mut seen = HashSet::new();
        seen.insert(s0);
        let mut result = HashMap::new();

        while let Some(state) = frontier.pop_front() {
            let fluent_key = decode_fluent_atoms(repository.repositories(), repository.fluent_atoms(state));
            let actions = repository.applicable_actions(state);
            let action_texts: std::collections::BTreeSet<String> = actions
                .iter()
                .map(|&idx| {
                    let ga = repository.ground_action(idx);
                    let schema_name = &repository.domain().action_schemas[ga.schema].name;
                    let objects: Vec<&str> = ga.objects.iter().map(|&o| repository.repositories().objects.get(o).name.as_str()).collect();
                    format!("{schema_name}({})", objects.join(","))
                })
                .collect();
            result.insert(fluent_key, action_texts);

            for &action in &actions {
                if let Ok((successor, _cost)) = repository.successor(state, action) {
                    if seen.insert(successor) {
                        frontier.push_back(successor);
                    }
                }
            }
        }
        result
    }

    #[test]
    fn lifted_and_grounded_generators_agree_on_every_reachable_state() {
        let (domain, repos, problem, num_objects) = ferry_domain();
        let lifted = crate::state_repository::StateRepository::new(domain.clone(), repos.clone(), &problem, num_objects, crate::state_repository::RepositoryMode::Lifted);
        let grounded = crate::state_repository::StateRepository::new(
            domain,
            repos,
            &problem,
            num_objects,
            crate::state_repository::RepositoryMode::Grounded {
                action_options: MatchTreeOptions::default(),
                axiom_options: MatchTreeOptions::default(),
            },
        );

        let lifted_sets = reachable_action_sets(lifted, &problem);
        let grounded_sets = reachable_action_sets(grounded, &problem);

        assert!(!lifted_sets.is_empty());
        assert_eq!(lifted_sets.len(), grounded_sets.len(), "lifted and grounded must reach the same number of distinct states");
        for (fluent_key, lifted_actions) in &lifted_sets {
            let grounded_actions = grounded_sets.get(fluent_key).unwrap_or_else(|| panic!("grounded generator never reached state {fluent_key:?}"));
            assert_eq!(lifted_actions, grounded_actions, "action sets differ for state {fluent_key:?}");
        }
    }
}

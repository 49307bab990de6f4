//! State repository: creates the initial state and every
//! successor state, deduplicating their packed byte form in a
//! content-addressed store and re-running the axiom evaluator after
//! every transition. Dispatches to whichever applicable-action
//! generator the caller chose to build with ([`ActionMode::Lifted`] or
//! [`ActionMode::Grounded`]) through one signature, so every search
//! algorithm sees the same uniform interface regardless of which
//! generator is behind it.

use crate::assignment_set::AssignmentSet;
use crate::axiom_evaluator::{GroundedAxiomEvaluator, LiftedAxiomEvaluator};
use crate::error::Result;
use crate::ground::GroundAction;
use crate::grounded_generator::{self, GroundedApplicableActionGenerator};
use crate::lifted_generator::LiftedApplicableActionGenerator;
use crate::match_tree::MatchTreeOptions;
use crate::state::{PackedState, StateIndex};
use fixedbitset::FixedBitSet;
use hashbrown::HashSet;
use mimir_collections::{Idx, IndexedHashSet, RefVec};
use mimir_formalism::{ConjunctiveCondition, Domain, GroundActionIndex, GroundAtom, PddlRepositories, Problem};

/// Which applicable-action generator backs this repository. Chosen once, at repository construction time.
enum ActionMode {
    Lifted {
        generator: LiftedApplicableActionGenerator,
        axioms: LiftedAxiomEvaluator,
    },
    Grounded {
        generator: GroundedApplicableActionGenerator,
        axioms: GroundedAxiomEvaluator,
    },
}

/// Selects [`ActionMode`] at construction. `Grounded` carries the match
/// tree options for both the action tree and the per-stratum axiom
/// trees.
pub enum RepositoryMode {
    Lifted,
    Grounded {
        action_options: MatchTreeOptions,
        axiom_options: MatchTreeOptions,
    },
}

pub struct StateRepository {
    domain: Domain,
    repos: PddlRepositories,
    static_atoms: HashSet<GroundAtom>,
    dynamic_assignment_set: AssignmentSet,
    mode: ActionMode,
    index: IndexedHashSet,
    states: RefVec<StateIndex, PackedState>,
}

impl StateRepository {
    /// Builds a fresh repository for `problem` over `domain`. Interns
    /// every ground function named by the problem's initial numeric
    /// values up front — search-time grounding only ever looks these
    /// up, never interns new ones (see [`crate::ground`]'s module doc).
    pub fn new(domain: Domain, mut repos: PddlRepositories, problem: &Problem, num_objects: usize, mode: RepositoryMode) -> Self {
        let static_atoms: HashSet<GroundAtom> = problem.initial_static_atoms.iter().cloned().collect();
        for v in &problem.initial_numeric_values {
            repos.ground_functions.intern(v.function, v.arguments.clone());
        }

        let dynamic_assignment_set = AssignmentSet::new(num_objects, &repos.predicates, std::iter::empty());
        let action_mode = match mode {
            RepositoryMode::Lifted => {
                let static_assignment_set = AssignmentSet::new(num_objects, &repos.predicates, problem.initial_static_atoms.iter());
                let generator = LiftedApplicableActionGenerator::new(&domain, &repos, num_objects, &static_assignment_set);
                let axioms = LiftedAxiomEvaluator::new(&domain, &repos, num_objects, &static_assignment_set);
                ActionMode::Lifted { generator, axioms }
            }
            RepositoryMode::Grounded { action_options, axiom_options } => {
                let (generator, axioms) = grounded_generator::build(&domain, &mut repos, problem, num_objects, &action_options, &axiom_options);
                ActionMode::Grounded { generator, axioms }
            }
        };

        StateRepository {
            domain,
            repos,
            static_atoms,
            dynamic_assignment_set,
            mode: action_mode,
            index: IndexedHashSet::new(),
            states: RefVec::new(),
        }
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn repositories(&self) -> &PddlRepositories {
        &self.repos
    }

    pub fn state(&self, index: StateIndex) -> &PackedState {
        &self.states[index]
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn ground_action(&self, index: GroundActionIndex) -> &GroundAction {
        match &self.mode {
            ActionMode::Lifted { generator, .. } => generator.ground_action(index),
            ActionMode::Grounded { generator, .. } => generator.ground_action(index),
        }
    }

    /// Clears the derived bitset and reruns the axiom evaluator to
    /// fixpoint.
    fn evaluate_axioms(&mut self, fluent_atoms: &FixedBitSet, derived_atoms: &mut FixedBitSet, numeric_values: &[f64]) {
        derived_atoms.clear();
        self.dynamic_assignment_set.refresh(&self.repos.predicates, &self.repos.ground_atoms, fluent_atoms, derived_atoms);
        match &mut self.mode {
            ActionMode::Lifted { axioms, .. } => {
                axioms.evaluate(&self.domain, &mut self.repos, &mut self.dynamic_assignment_set, &self.static_atoms, fluent_atoms, derived_atoms, numeric_values);
            }
            ActionMode::Grounded { axioms, .. } => {
                axioms.evaluate(fluent_atoms, derived_atoms, numeric_values);
            }
        }
    }

    fn insert_state(&mut self, state: PackedState) -> StateIndex {
        let bytes = state.to_bytes();
        let idx = self.index.insert(&bytes);
        if idx as usize == self.states.len() {
            self.states.push(state);
        }
        StateIndex::from_usize(idx as usize)
    }

    /// `initial_state(problem) -> state`.
    pub fn initial_state(&mut self, problem: &Problem) -> StateIndex {
        let mut fluent_atoms = FixedBitSet::new();
        for atom in &problem.initial_fluent_atoms {
            let idx = self.repos.ground_atoms.categories.fluent.push(atom.clone());
            if fluent_atoms.len() <= idx.to_usize() {
                fluent_atoms.grow(idx.to_usize() + 1);
            }
            fluent_atoms.insert(idx.to_usize());
        }

        let mut numeric_values = vec![0.0; self.repos.ground_functions.len()];
        for v in &problem.initial_numeric_values {
            if let Some(idx) = self.repos.ground_functions.get_ref(v.function, &v.arguments) {
                numeric_values[idx.to_usize()] = v.value;
            }
        }

        let mut derived_atoms = FixedBitSet::new();
        self.evaluate_axioms(&fluent_atoms, &mut derived_atoms, &numeric_values);

        self.insert_state(PackedState {
            fluent_atoms,
            derived_atoms,
            numeric_values,
        })
    }

    /// Every ground action applicable in `state_index`: precondition holds, no duplicates.
    pub fn applicable_actions(&mut self, state_index: StateIndex) -> Vec<GroundActionIndex> {
        let state = self.states[state_index].clone();
        self.dynamic_assignment_set
            .refresh(&self.repos.predicates, &self.repos.ground_atoms, &state.fluent_atoms, &state.derived_atoms);
        match &mut self.mode {
            ActionMode::Lifted { generator, .. } => generator.applicable_actions(
                &self.domain,
                &mut self.repos,
                &self.dynamic_assignment_set,
                &self.static_atoms,
                &state.fluent_atoms,
                &state.derived_atoms,
                &state.numeric_values,
                false,
            ),
            ActionMode::Grounded { generator, .. } => generator.applicable_actions(&state.fluent_atoms, &state.derived_atoms, &state.numeric_values),
        }
    }

    /// `successor(state, action) -> (state, cost)`. Conditional-effect conditions are always tested against
    /// the parent state, never the scratch copy being built.
    pub fn successor(&mut self, state_index: StateIndex, action_index: GroundActionIndex) -> Result<(StateIndex, f64)> {
        let parent = self.states[state_index].clone();
        let action = self.ground_action(action_index).clone();

        // Per spec.md §8 invariant 2, `s'.fluent = (s.fluent ∪ add(a)) \
        // del(a)` is computed over the whole action at once: gather every
        // add and delete from the satisfied conditional effects first,
        // then apply the union-then-subtract as one batched operation, so
        // a delete always wins over an add of the same atom regardless of
        // which conditional effect lists which, not just which is applied
        // last.
        let mut fluent_atoms = parent.fluent_atoms.clone();
        let mut adds = Vec::new();
        let mut deletes = Vec::new();
        for cond_effect in &action.effects {
            if !cond_effect.condition.holds(&parent.fluent_atoms, &parent.derived_atoms, &parent.numeric_values)? {
                continue;
            }
            adds.extend(cond_effect.effect.add_effects.iter().copied());
            deletes.extend(cond_effect.effect.delete_effects.iter().copied());
        }
        for add in adds {
            if fluent_atoms.len() <= add.to_usize() {
                fluent_atoms.grow(add.to_usize() + 1);
            }
            fluent_atoms.insert(add.to_usize());
        }
        for del in deletes {
            if fluent_atoms.len() > del.to_usize() {
                fluent_atoms.set(del.to_usize(), false);
            }
        }

        let mut numeric_values = parent.numeric_values.clone();
        for cond_effect in &action.effects {
            if !cond_effect.condition.holds(&parent.fluent_atoms, &parent.derived_atoms, &parent.numeric_values)? {
                continue;
            }
            for eff in &cond_effect.effect.numeric_effects {
                if eff.function.is_absent() {
                    continue;
                }
                let operand = eff.operand.evaluate(&numeric_values)?;
                let slot = eff.function.to_usize();
                if slot >= numeric_values.len() {
                    numeric_values.resize(slot + 1, 0.0);
                }
                numeric_values[slot] = eff.kind.apply(numeric_values[slot], operand);
            }
        }

        let cost = action.cost.evaluate(&parent.numeric_values).unwrap_or(1.0);

        let mut derived_atoms = FixedBitSet::new();
        self.evaluate_axioms(&fluent_atoms, &mut derived_atoms, &numeric_values);

        let idx = self.insert_state(PackedState {
            fluent_atoms,
            derived_atoms,
            numeric_values,
        });
        Ok((idx, cost))
    }

    /// Tests a parameter-less conjunctive condition — the problem goal
    /// — against `state_index` directly. Evaluated
    /// once per expansion, not once per binding, so this goes straight
    /// through [`crate::view::StateView`] instead of building a
    /// [`crate::ground::GroundCondition`].
    pub fn holds_ground(&self, condition: &ConjunctiveCondition, state_index: StateIndex) -> bool {
        let state = &self.states[state_index];
        let view = crate::view::StateView {
            predicates: &self.repos.predicates,
            ground_atoms: &self.repos.ground_atoms,
            ground_functions: &self.repos.ground_functions,
            static_atoms: &self.static_atoms,
            fluent_atoms: &state.fluent_atoms,
            derived_atoms: &state.derived_atoms,
            numeric_values: &state.numeric_values,
            numeric_relaxed: false,
        };
        use crate::binding_generator::DynamicStateView;
        for literal in condition.nullary_literals.iter_all() {
            if view.has_ground_atom(&literal.atom) != literal.polarity {
                return false;
            }
        }
        for literal in condition.literals.iter_all() {
            let atom = literal.atom.ground(&[]);
            if view.has_ground_atom(&atom) != literal.polarity {
                return false;
            }
        }
        for constraint in &condition.numeric_constraints {
            if !view.evaluate_numeric_constraint(constraint, &[]) {
                return false;
            }
        }
        true
    }

    /// Number of individual literals/constraints of `condition`
    /// currently satisfied by `state_index` — the basis of SIW's
    /// [`crate::algorithms::ProblemGoalCounter`] strategy.
    pub fn count_satisfied(&self, condition: &ConjunctiveCondition, state_index: StateIndex) -> usize {
        let state = &self.states[state_index];
        let view = crate::view::StateView {
            predicates: &self.repos.predicates,
            ground_atoms: &self.repos.ground_atoms,
            ground_functions: &self.repos.ground_functions,
            static_atoms: &self.static_atoms,
            fluent_atoms: &state.fluent_atoms,
            derived_atoms: &state.derived_atoms,
            numeric_values: &state.numeric_values,
            numeric_relaxed: false,
        };
        use crate::binding_generator::DynamicStateView;
        let mut count = 0;
        for literal in condition.nullary_literals.iter_all() {
            if view.has_ground_atom(&literal.atom) == literal.polarity {
                count += 1;
            }
        }
        for literal in condition.literals.iter_all() {
            let atom = literal.atom.ground(&[]);
            if view.has_ground_atom(&atom) == literal.polarity {
                count += 1;
            }
        }
        for constraint in &condition.numeric_constraints {
            if view.evaluate_numeric_constraint(constraint, &[]) {
                count += 1;
            }
        }
        count
    }

    /// Every fluent atom index set in `state_index` — IW's novelty
    /// table is built from tuples of these.
    pub fn fluent_atoms(&self, state_index: StateIndex) -> &FixedBitSet {
        &self.states[state_index].fluent_atoms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimir_formalism::{ActionSchema, AtomEffect, ConditionalEffect, ConjunctiveCondition, ConjunctiveEffect, Literal, LiftedAtom, PredicateCategory, Term, Variable};
    use smallvec::smallvec;

    fn two_object_move_domain() -> (Domain, PddlRepositories, Problem) {
        let mut repos = PddlRepositories::default();
        let at = repos.predicates.add("at", 1, PredicateCategory::Fluent);
        let goal_pred = repos.predicates.add("goal-reached", 1, PredicateCategory::Fluent);
        let a = repos.objects.add("a", smallvec![]);
        let b = repos.objects.add("b", smallvec![]);

        let mut domain = Domain::new("move");
        let param = Variable::new(0);
        let mut precondition = ConjunctiveCondition::new(vec![param], vec![smallvec![]]);
        precondition.literals.fluent.push(Literal::positive(LiftedAtom::new(at, [Term::Object(a)])));
        let effect = ConditionalEffect {
            condition: ConjunctiveCondition::new(vec![], vec![]),
            effect: ConjunctiveEffect {
                atom_effects: vec![
                    AtomEffect::Delete(LiftedAtom::new(at, [Term::Object(a)])),
                    AtomEffect::Add(LiftedAtom::new(goal_pred, [Term::Variable(param)])),
                ],
                numeric_effects: vec![],
            },
        };
        domain.action_schemas.push(ActionSchema {
            name: "move".into(),
            parameters: vec![param],
            precondition,
            effects: vec![effect],
            cost: None,
        });

        let mut problem = Problem::new("p");
        problem.objects = vec![a, b];
        problem.initial_fluent_atoms.push(GroundAtom::new(at, smallvec![a]));
        problem.goal = ConjunctiveCondition::new(vec![], vec![]);
        (domain, repos, problem)
    }

    #[test]
    fn successor_applies_add_and_delete_and_dedups() {
        let (domain, repos, problem) = two_object_move_domain();
        let mut repository = StateRepository::new(domain, repos, &problem, 2, RepositoryMode::Lifted);
        let s0 = repository.initial_state(&problem);
        let actions = repository.applicable_actions(s0);
        assert_eq!(actions.len(), 1);

        let (s1, cost) = repository.successor(s0, actions[0]).unwrap();
        assert_eq!(cost, 1.0);
        assert_ne!(s0, s1);
        assert_eq!(repository.applicable_actions(s1).len(), 0);

        // Recomputing the same successor must return the same index.
        let (s1_again, _) = repository.successor(s0, actions[0]).unwrap();
        assert_eq!(s1, s1_again);
        assert_eq!(repository.num_states(), 2);
    }

    /// Domain with a single schema whose two (always-satisfied)
    /// conditional effects disagree on the same atom: the first deletes
    /// `p(a)`, the second adds it. Per spec.md §8 invariant 2 the whole
    /// action's add-set and delete-set are unioned globally before
    /// subtracting, so delete must win regardless of declaration order.
    fn conflicting_conditional_effects_domain() -> (Domain, PddlRepositories, Problem) {
        let mut repos = PddlRepositories::default();
        let p = repos.predicates.add("p", 1, PredicateCategory::Fluent);
        let a = repos.objects.add("a", smallvec![]);

        let mut domain = Domain::new("conflict");
        let mut precondition = ConjunctiveCondition::new(vec![], vec![]);
        precondition.literals.fluent.push(Literal::positive(LiftedAtom::new(p, [Term::Object(a)])));
        let delete_effect = ConditionalEffect {
            condition: ConjunctiveCondition::new(vec![], vec![]),
            effect: ConjunctiveEffect {
                atom_effects: vec![AtomEffect::Delete(LiftedAtom::new(p, [Term::Object(a)]))],
                numeric_effects: vec![],
            },
        };
        let add_effect = ConditionalEffect {
            condition: ConjunctiveCondition::new(vec![], vec![]),
            effect: ConjunctiveEffect {
                atom_effects: vec![AtomEffect::Add(LiftedAtom::new(p, [Term::Object(a)]))],
                numeric_effects: vec![],
            },
        };
        domain.action_schemas.push(ActionSchema {
            name: "flip".into(),
            parameters: vec![],
            precondition,
            // Declaration order matters for the regression: delete listed
            // before add must still leave the atom deleted in the result.
            effects: vec![delete_effect, add_effect],
            cost: None,
        });

        let mut problem = Problem::new("p");
        problem.objects = vec![a];
        problem.initial_fluent_atoms.push(GroundAtom::new(p, smallvec![a]));
        problem.goal = ConjunctiveCondition::new(vec![], vec![]);
        (domain, repos, problem)
    }

    #[test]
    fn successor_lets_delete_win_over_add_across_conditional_effects() {
        let (domain, repos, problem) = conflicting_conditional_effects_domain();
        let mut repository = StateRepository::new(domain, repos, &problem, 1, RepositoryMode::Lifted);
        let s0 = repository.initial_state(&problem);
        let actions = repository.applicable_actions(s0);
        assert_eq!(actions.len(), 1);

        let (s1, _cost) = repository.successor(s0, actions[0]).unwrap();
        assert!(!repository.fluent_atoms(s1).contains(0), "delete must win over add regardless of conditional-effect declaration order");
    }
}

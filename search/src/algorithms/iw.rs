//! Iterated width search: a state is novel iff it realises some tuple
//! of fluent atoms, of size up to `k`, not realised by any previously
//! expanded state; IW(k) is BrFS with non-novel successors pruned. The
//! driver runs `k = 0, 1, …, max_arity` until a width solves the
//! instance, reporting the smallest successful `k` as the *effective
//! width*.

use super::{deadline_exceeded, reconstruct_plan, GoalStrategy, Plan, ProblemGoal, SearchStatus};
use crate::config::{IwOptions, SearchLimits};
use crate::event_handler::EventHandler;
use crate::state::StateIndex;
use crate::state_repository::StateRepository;
use fixedbitset::FixedBitSet;
use hashbrown::{HashMap, HashSet};
use itertools::Itertools;
use mimir_formalism::{GroundActionIndex, Problem};
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::time::Instant;

type Tuple = SmallVec<[u32; 6]>;

/// The set of fluent-atom tuples (size 0..=k) realised by any
/// previously expanded state.
pub(crate) struct NoveltyTable {
    k: usize,
    seen: HashSet<Tuple>,
}

impl NoveltyTable {
    pub fn new(k: usize, initial_table_atoms: usize) -> Self {
        NoveltyTable {
            k,
            seen: HashSet::with_capacity(initial_table_atoms),
        }
    }

    /// Registers every tuple of `fluent_atoms` up to size `k`, returning
    /// whether any of them was new — i.e. whether the state is novel.
    pub fn register(&mut self, fluent_atoms: &FixedBitSet) -> bool {
        let ones: Vec<u32> = fluent_atoms.ones().map(|b| b as u32).collect();
        let mut novel = false;
        for size in 0..=self.k.min(ones.len()) {
            for tuple in ones.iter().copied().combinations(size) {
                let tuple: Tuple = tuple.into_iter().collect();
                if self.seen.insert(tuple) {
                    novel = true;
                }
            }
        }
        novel
    }
}

/// Runs IW at a fixed width `k` from `start` until `is_goal` holds or
/// the bounded-width frontier is exhausted. Returns the reached goal
/// state alongside the plan from `start` to it — [`crate::algorithms::siw::siw`]
/// reuses this to search for the next goal-atom-increasing state
/// rather than the full problem goal.
pub(crate) fn iw_search_from(
    repository: &mut StateRepository,
    start: StateIndex,
    k: usize,
    initial_table_atoms: usize,
    limits: &SearchLimits,
    start_time: Instant,
    mut is_goal: impl FnMut(&StateRepository, StateIndex) -> bool,
    handler: &mut dyn EventHandler,
) -> (SearchStatus, Option<(StateIndex, Plan)>) {
    let mut table = NoveltyTable::new(k, initial_table_atoms);
    table.register(repository.fluent_atoms(start));

    if is_goal(repository, start) {
        return (SearchStatus::Solved, Some((start, Plan::default())));
    }

    let mut visited: HashSet<StateIndex> = HashSet::new();
    visited.insert(start);
    let mut parents: HashMap<StateIndex, (StateIndex, GroundActionIndex, f64)> = HashMap::new();
    let mut queue: VecDeque<StateIndex> = VecDeque::new();
    queue.push_back(start);

    while let Some(state) = queue.pop_front() {
        if deadline_exceeded(start_time, limits.max_time) {
            return (SearchStatus::OutOfTime, None);
        }
        if let Some(max) = limits.max_num_states {
            if visited.len() > max {
                return (SearchStatus::OutOfMemory, None);
            }
        }
        handler.on_expand();

        for action in repository.applicable_actions(state) {
            let Ok((successor, cost)) = repository.successor(state, action) else {
                continue;
            };
            handler.on_generate_successor();
            if !visited.insert(successor) {
                continue;
            }
            if !table.register(repository.fluent_atoms(successor)) {
                handler.on_prune();
                continue;
            }
            parents.insert(successor, (state, action, cost));
            if is_goal(repository, successor) {
                return (SearchStatus::Solved, Some((successor, reconstruct_plan(&parents, successor, start))));
            }
            queue.push_back(successor);
        }
    }

    (SearchStatus::Exhausted, None)
}

/// IW at one fixed width against the problem's own goal.
pub fn iw_k(repository: &mut StateRepository, problem: &Problem, k: usize, options: &IwOptions, limits: &SearchLimits, handler: &mut dyn EventHandler) -> (SearchStatus, Option<Plan>) {
    let initial = repository.initial_state(problem);
    let mut goal_strategy = ProblemGoal { problem };
    let (status, result) = iw_search_from(repository, initial, k, options.initial_table_atoms, limits, Instant::now(), |repo, s| goal_strategy.is_goal(repo, s), handler);
    (status, result.map(|(_, plan)| plan))
}

/// Runs `k = 0, 1, …, max_arity` until solved or every width exhausts.
/// Returns the solving plan and its effective width — the smallest `k`
/// that solves the instance — or `None` for the width if unsolved.
pub fn iw(repository: &mut StateRepository, problem: &Problem, options: &IwOptions, limits: &SearchLimits, handler: &mut dyn EventHandler) -> (SearchStatus, Option<Plan>, Option<usize>) {
    let mut last_status = SearchStatus::Unsolvable;
    for k in 0..=options.max_arity {
        let (status, plan) = iw_k(repository, problem, k, options, limits, handler);
        match status {
            SearchStatus::Solved => {
                handler.on_status(SearchStatus::Solved);
                return (SearchStatus::Solved, plan, Some(k));
            }
            SearchStatus::OutOfTime | SearchStatus::OutOfMemory => {
                handler.on_status(status);
                return (status, None, None);
            }
            SearchStatus::Exhausted | SearchStatus::Unsolvable => {
                last_status = SearchStatus::Exhausted;
            }
        }
    }
    handler.on_status(last_status);
    (last_status, None, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_handler::DefaultEventHandler;
    use crate::state_repository::RepositoryMode;
    use mimir_formalism::{ActionSchema, AtomEffect, ConditionalEffect, ConjunctiveCondition, ConjunctiveEffect, Domain, GroundAtom, Literal, LiftedAtom, PddlRepositories, PredicateCategory, Term, Variable};
    use smallvec::smallvec;

    #[test]
    fn iw1_solves_a_width_one_chain() {
        let mut repos = PddlRepositories::default();
        let at = repos.predicates.add("at", 1, PredicateCategory::Fluent);
        let a = repos.objects.add("a", smallvec![]);
        let b = repos.objects.add("b", smallvec![]);

        let mut domain = Domain::new("chain");
        let param = Variable::new(0);
        let mut precondition = ConjunctiveCondition::new(vec![param], vec![smallvec![]]);
        precondition.literals.fluent.push(Literal::positive(LiftedAtom::new(at, [Term::Object(a)])));
        let effect = ConditionalEffect {
            condition: ConjunctiveCondition::new(vec![], vec![]),
            effect: ConjunctiveEffect {
                atom_effects: vec![AtomEffect::Delete(LiftedAtom::new(at, [Term::Object(a)])), AtomEffect::Add(LiftedAtom::new(at, [Term::Object(b)]))],
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

        let mut problem = mimir_formalism::Problem::new("p");
        problem.objects = vec![a, b];
        problem.initial_fluent_atoms.push(GroundAtom::new(at, smallvec![a]));
        let mut goal = ConjunctiveCondition::new(vec![], vec![]);
        goal.literals.fluent.push(Literal::positive(LiftedAtom::new(at, [Term::Object(b)])));
        problem.goal = goal;

        let mut repository = StateRepository::new(domain, repos, &problem, 2, RepositoryMode::Lifted);
        let options = IwOptions::default();
        let limits = SearchLimits::default();
        let mut handler = DefaultEventHandler;
        let (status, plan, width) = iw(&mut repository, &problem, &options, &limits, &mut handler);
        assert_eq!(status, SearchStatus::Solved);
        assert_eq!(plan.unwrap().actions.len(), 1);
        assert_eq!(width, Some(0));
    }
}

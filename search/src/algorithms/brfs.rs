//! Breadth-first search: FIFO open list keyed by state
//! index, duplicate detection via a per-search visited set (the state
//! repository deduplicates packed state *bytes* across the whole
//! problem's lifetime; BrFS additionally needs to know
//! which of those states this particular run has already enqueued).
//! Unit-cost optimal: the first goal state reached is at the shallowest
//! depth.

use super::{deadline_exceeded, reconstruct_plan, GoalStrategy, Plan, ProblemGoal, SearchStatus};
use crate::config::SearchLimits;
use crate::event_handler::EventHandler;
use crate::state::StateIndex;
use crate::state_repository::StateRepository;
use hashbrown::{HashMap, HashSet};
use mimir_formalism::{GroundActionIndex, Problem};
use std::collections::VecDeque;
use std::time::Instant;

/// Runs BrFS to exhaustion or to the first goal. When `limits.stop_if_goal` is `false`,
/// keeps expanding after the first goal is found — e.g. to compute a
/// full reachability layer.
pub fn brfs(repository: &mut StateRepository, problem: &Problem, limits: &SearchLimits, handler: &mut dyn EventHandler) -> (SearchStatus, Option<Plan>) {
    let start_time = Instant::now();
    let initial = repository.initial_state(problem);
    let mut goal_strategy = ProblemGoal { problem };

    let mut visited: HashSet<StateIndex> = HashSet::new();
    visited.insert(initial);
    let mut parents: HashMap<StateIndex, (StateIndex, GroundActionIndex, f64)> = HashMap::new();
    let mut queue: VecDeque<StateIndex> = VecDeque::new();
    queue.push_back(initial);
    let mut first_goal: Option<StateIndex> = None;

    if goal_strategy.is_goal(repository, initial) {
        first_goal = Some(initial);
        if limits.stop_if_goal {
            handler.on_status(SearchStatus::Solved);
            return (SearchStatus::Solved, Some(Plan::default()));
        }
    }

    let mut depth = 0usize;
    let mut layer_remaining = 1usize;
    let mut next_layer = 0usize;

    while let Some(state) = queue.pop_front() {
        if deadline_exceeded(start_time, limits.max_time) {
            handler.on_status(SearchStatus::OutOfTime);
            return (SearchStatus::OutOfTime, None);
        }
        if let Some(max) = limits.max_num_states {
            if visited.len() > max {
                handler.on_status(SearchStatus::OutOfMemory);
                return (SearchStatus::OutOfMemory, None);
            }
        }
        handler.on_expand();

        for action in repository.applicable_actions(state) {
            let Ok((successor, cost)) = repository.successor(state, action) else {
                continue;
            };
            handler.on_generate_successor();
            if visited.insert(successor) {
                parents.insert(successor, (state, action, cost));
                next_layer += 1;
                if first_goal.is_none() && goal_strategy.is_goal(repository, successor) {
                    first_goal = Some(successor);
                    if limits.stop_if_goal {
                        handler.on_status(SearchStatus::Solved);
                        return (SearchStatus::Solved, Some(reconstruct_plan(&parents, successor, initial)));
                    }
                }
                queue.push_back(successor);
            }
        }

        layer_remaining -= 1;
        if layer_remaining == 0 {
            handler.on_layer(depth, next_layer);
            depth += 1;
            layer_remaining = next_layer;
            next_layer = 0;
            if layer_remaining == 0 {
                break;
            }
        }
    }

    if let Some(goal) = first_goal {
        handler.on_status(SearchStatus::Solved);
        (SearchStatus::Solved, Some(reconstruct_plan(&parents, goal, initial)))
    } else {
        handler.on_status(SearchStatus::Unsolvable);
        (SearchStatus::Unsolvable, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_handler::DefaultEventHandler;
    use crate::state_repository::RepositoryMode;
    use mimir_formalism::{ActionSchema, AtomEffect, ConditionalEffect, ConjunctiveCondition, ConjunctiveEffect, Domain, GroundAtom, Literal, LiftedAtom, PddlRepositories, PredicateCategory, Term, Variable};
    use smallvec::smallvec;

    /// A two-state chain: `at(a)` --move--> `at(b)`, goal `at(b)`. BrFS
    /// must find the one-action plan.
    #[test]
    fn brfs_finds_shortest_plan_in_a_chain() {
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
        let limits = SearchLimits::default();
        let mut handler = DefaultEventHandler;
        let (status, plan) = brfs(&mut repository, &problem, &limits, &mut handler);
        assert_eq!(status, SearchStatus::Solved);
        let plan = plan.unwrap();
        assert_eq!(plan.actions.len(), 1);
        assert_eq!(plan.cost, 1.0);
    }
}

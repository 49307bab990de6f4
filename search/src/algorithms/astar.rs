//! A*: best-first on `f = g + h`, tying on higher `g`
//! (preferring deeper nodes among equal `f`, the standard tie-break for
//! plan-length stability). Reopens a closed node whenever a strictly
//! smaller `g` is discovered — sound for any admissible heuristic, not
//! just consistent ones, at the cost of possibly re-expanding a state.
//! Blind-zero ([`super::BlindHeuristic`]) is the only heuristic this
//! core ships.

use super::{deadline_exceeded, reconstruct_plan, GoalStrategy, Heuristic, Plan, ProblemGoal, SearchStatus};
use crate::config::SearchLimits;
use crate::event_handler::EventHandler;
use crate::state::StateIndex;
use crate::state_repository::StateRepository;
use hashbrown::HashMap;
use mimir_formalism::{GroundActionIndex, Problem};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

#[derive(Copy, Clone, PartialEq, Debug)]
struct HeapEntry {
    f: f64,
    g: f64,
    state: StateIndex,
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // `BinaryHeap` is a max-heap; negate the natural `f` order to
        // pop the smallest `f` first, then prefer the larger `g`.
        other
            .f
            .partial_cmp(&self.f)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.g.partial_cmp(&other.g).unwrap_or(Ordering::Equal))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub fn astar(repository: &mut StateRepository, problem: &Problem, limits: &SearchLimits, heuristic: &mut dyn Heuristic, handler: &mut dyn EventHandler) -> (SearchStatus, Option<Plan>) {
    let start_time = Instant::now();
    let initial = repository.initial_state(problem);
    let mut goal_strategy = ProblemGoal { problem };

    let mut g_values: HashMap<StateIndex, f64> = HashMap::new();
    g_values.insert(initial, 0.0);
    let mut parents: HashMap<StateIndex, (StateIndex, GroundActionIndex, f64)> = HashMap::new();
    let mut open: BinaryHeap<HeapEntry> = BinaryHeap::new();
    let h0 = heuristic.estimate(repository, initial);
    open.push(HeapEntry { f: h0, g: 0.0, state: initial });

    let mut num_expanded = 0usize;

    while let Some(entry) = open.pop() {
        if deadline_exceeded(start_time, limits.max_time) {
            handler.on_status(SearchStatus::OutOfTime);
            return (SearchStatus::OutOfTime, None);
        }

        let current_g = g_values.get(&entry.state).copied().unwrap_or(f64::INFINITY);
        if entry.g > current_g {
            // Stale entry: a strictly better `g` superseded it already.
            continue;
        }

        if goal_strategy.is_goal(repository, entry.state) {
            handler.on_status(SearchStatus::Solved);
            return (SearchStatus::Solved, Some(reconstruct_plan(&parents, entry.state, initial)));
        }

        handler.on_expand();
        num_expanded += 1;
        if let Some(max) = limits.max_num_states {
            if num_expanded > max {
                handler.on_status(SearchStatus::OutOfMemory);
                return (SearchStatus::OutOfMemory, None);
            }
        }

        for action in repository.applicable_actions(entry.state) {
            let Ok((successor, cost)) = repository.successor(entry.state, action) else {
                continue;
            };
            handler.on_generate_successor();
            let tentative_g = entry.g + cost;
            let existing_g = g_values.get(&successor).copied().unwrap_or(f64::INFINITY);
            if tentative_g < existing_g {
                g_values.insert(successor, tentative_g);
                parents.insert(successor, (entry.state, action, tentative_g - entry.g));
                let h = heuristic.estimate(repository, successor);
                open.push(HeapEntry {
                    f: tentative_g + h,
                    g: tentative_g,
                    state: successor,
                });
            }
        }
    }

    handler.on_status(SearchStatus::Unsolvable);
    (SearchStatus::Unsolvable, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::BlindHeuristic;
    use crate::event_handler::DefaultEventHandler;
    use crate::state_repository::RepositoryMode;
    use mimir_formalism::{
        ActionSchema, AtomEffect, ConditionalEffect, ConjunctiveCondition, ConjunctiveEffect, Domain, GroundAtom, Literal, LiftedAtom, PddlRepositories, PredicateCategory, Term, Variable,
    };
    use smallvec::smallvec;

    /// Two routes from `a` to the goal `at(c)`: a direct two-cost hop
    /// and a two-step one-cost-each path. A* with blind-zero must still
    /// return the cheapest (cost 2) plan, picking the route whose
    /// total cost is lower regardless of step count.
    #[test]
    fn astar_prefers_lower_cost_over_fewer_steps() {
        let mut repos = PddlRepositories::default();
        let at = repos.predicates.add("at", 1, PredicateCategory::Fluent);
        let a = repos.objects.add("a", smallvec![]);
        let b = repos.objects.add("b", smallvec![]);
        let c = repos.objects.add("c", smallvec![]);

        let mut domain = Domain::new("routes");
        let param = Variable::new(0);

        let make_schema = |name: &str, from: mimir_formalism::ObjectIndex, to: mimir_formalism::ObjectIndex, cost: Option<f64>| {
            let mut precondition = ConjunctiveCondition::new(vec![param], vec![smallvec![]]);
            precondition.literals.fluent.push(Literal::positive(LiftedAtom::new(at, [Term::Object(from)])));
            let effect = ConditionalEffect {
                condition: ConjunctiveCondition::new(vec![], vec![]),
                effect: ConjunctiveEffect {
                    atom_effects: vec![AtomEffect::Delete(LiftedAtom::new(at, [Term::Object(from)])), AtomEffect::Add(LiftedAtom::new(at, [Term::Object(to)]))],
                    numeric_effects: vec![],
                },
            };
            ActionSchema {
                name: name.into(),
                parameters: vec![param],
                precondition,
                effects: vec![effect],
                cost: cost.map(mimir_formalism::NumericExpression::constant),
            }
        };

        domain.action_schemas.push(make_schema("direct", a, c, Some(2.0)));
        domain.action_schemas.push(make_schema("hop1", a, b, Some(1.0)));
        domain.action_schemas.push(make_schema("hop2", b, c, Some(1.0)));

        let mut problem = mimir_formalism::Problem::new("p");
        problem.objects = vec![a, b, c];
        problem.initial_fluent_atoms.push(GroundAtom::new(at, smallvec![a]));
        let mut goal = ConjunctiveCondition::new(vec![], vec![]);
        goal.literals.fluent.push(Literal::positive(LiftedAtom::new(at, [Term::Object(c)])));
        problem.goal = goal;

        let mut repository = StateRepository::new(domain, repos, &problem, 3, RepositoryMode::Lifted);
        let limits = SearchLimits::default();
        let mut heuristic = BlindHeuristic;
        let mut handler = DefaultEventHandler;
        let (status, plan) = astar(&mut repository, &problem, &limits, &mut heuristic, &mut handler);
        assert_eq!(status, SearchStatus::Solved);
        assert_eq!(plan.unwrap().cost, 2.0);
    }
}

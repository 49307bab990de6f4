//! Serialized IW: runs IW from the current state looking
//! for a state that satisfies strictly more goal literals than the
//! current best; restarts IW from there and repeats, concatenating the
//! per-restart plans, until the full goal holds or a restart's IW
//! escalation exhausts every width up to `max_arity` without progress.

use super::iw::iw_search_from;
use super::{deadline_exceeded, GoalStrategy, Plan, ProblemGoalCounter, SearchStatus};
use crate::config::SiwOptions;
use crate::event_handler::EventHandler;
use crate::state_repository::StateRepository;
use mimir_formalism::Problem;
use std::time::Instant;

pub fn siw(repository: &mut StateRepository, problem: &Problem, options: &SiwOptions, limits: &crate::config::SearchLimits, handler: &mut dyn EventHandler) -> (SearchStatus, Option<Plan>) {
    let start_time = Instant::now();
    let mut current = repository.initial_state(problem);
    let mut counter = ProblemGoalCounter { problem };
    let total = counter.total();

    let mut actions = Vec::new();
    let mut cost = 0.0;

    if counter.is_goal(repository, current) {
        handler.on_status(SearchStatus::Solved);
        return (SearchStatus::Solved, Some(Plan::default()));
    }

    loop {
        if deadline_exceeded(start_time, limits.max_time) {
            handler.on_status(SearchStatus::OutOfTime);
            return (SearchStatus::OutOfTime, None);
        }

        let best_count = counter.count_satisfied(repository, current);
        let mut improved = None;

        for k in 0..=options.iw.max_arity {
            let (status, result) = iw_search_from(repository, current, k, options.iw.initial_table_atoms, limits, start_time, |repo, s| counter.count_satisfied(repo, s) > best_count, handler);
            match status {
                SearchStatus::Solved => {
                    improved = result;
                    break;
                }
                SearchStatus::OutOfTime | SearchStatus::OutOfMemory => {
                    handler.on_status(status);
                    return (status, None);
                }
                SearchStatus::Exhausted | SearchStatus::Unsolvable => continue,
            }
        }

        let Some((reached, plan)) = improved else {
            handler.on_status(SearchStatus::Exhausted);
            return (SearchStatus::Exhausted, None);
        };

        actions.extend(plan.actions);
        cost += plan.cost;
        current = reached;

        if counter.count_satisfied(repository, current) == total {
            handler.on_status(SearchStatus::Solved);
            return (SearchStatus::Solved, Some(Plan { actions, cost }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchLimits;
    use crate::event_handler::DefaultEventHandler;
    use crate::state_repository::RepositoryMode;
    use mimir_formalism::{ActionSchema, AtomEffect, ConditionalEffect, ConjunctiveCondition, ConjunctiveEffect, Domain, GroundAtom, Literal, LiftedAtom, PddlRepositories, PredicateCategory, Term, Variable};
    use smallvec::smallvec;

    /// Two independent goal literals, each reached by its own one-step
    /// action: `on(a)` and `on(b)`. SIW must restart after the first is
    /// satisfied and chain a second plan segment to finish the goal.
    #[test]
    fn siw_chains_restarts_across_independent_subgoals() {
        let mut repos = PddlRepositories::default();
        let on = repos.predicates.add("on", 1, PredicateCategory::Fluent);
        let off = repos.predicates.add("off", 1, PredicateCategory::Fluent);
        let a = repos.objects.add("a", smallvec![]);
        let b = repos.objects.add("b", smallvec![]);

        let mut domain = Domain::new("switches");
        let param = Variable::new(0);

        let make_schema = |name: &str, obj: mimir_formalism::ObjectIndex| {
            let mut precondition = ConjunctiveCondition::new(vec![param], vec![smallvec![]]);
            precondition.literals.fluent.push(Literal::positive(LiftedAtom::new(off, [Term::Object(obj)])));
            let effect = ConditionalEffect {
                condition: ConjunctiveCondition::new(vec![], vec![]),
                effect: ConjunctiveEffect {
                    atom_effects: vec![AtomEffect::Delete(LiftedAtom::new(off, [Term::Object(obj)])), AtomEffect::Add(LiftedAtom::new(on, [Term::Object(obj)]))],
                    numeric_effects: vec![],
                },
            };
            ActionSchema {
                name: name.into(),
                parameters: vec![param],
                precondition,
                effects: vec![effect],
                cost: None,
            }
        };
        domain.action_schemas.push(make_schema("flip-a", a));
        domain.action_schemas.push(make_schema("flip-b", b));

        let mut problem = mimir_formalism::Problem::new("p");
        problem.objects = vec![a, b];
        problem.initial_fluent_atoms.push(GroundAtom::new(off, smallvec![a]));
        problem.initial_fluent_atoms.push(GroundAtom::new(off, smallvec![b]));
        let mut goal = ConjunctiveCondition::new(vec![], vec![]);
        goal.literals.fluent.push(Literal::positive(LiftedAtom::new(on, [Term::Object(a)])));
        goal.literals.fluent.push(Literal::positive(LiftedAtom::new(on, [Term::Object(b)])));
        problem.goal = goal;

        let mut repository = StateRepository::new(domain, repos, &problem, 2, RepositoryMode::Lifted);
        let options = SiwOptions::default();
        let limits = SearchLimits::default();
        let mut handler = DefaultEventHandler;
        let (status, plan) = siw(&mut repository, &problem, &options, &limits, &mut handler);
        assert_eq!(status, SearchStatus::Solved);
        assert_eq!(plan.unwrap().actions.len(), 2);
    }
}

//! Search algorithms: BrFS, A*, IW(k) and SIW, all layered
//! over [`crate::state_repository::StateRepository`] and
//! [`crate::event_handler::EventHandler`] via the shared
//! [`GoalStrategy`]/[`PruningStrategy`]/[`Heuristic`] traits named in
//! this system's "shared problem, applicable-action generator, state
//! repository, goal-test strategy, pruning strategy, optional
//! heuristic, and an event handler" contract.

pub mod astar;
pub mod brfs;
pub mod iw;
pub mod siw;

use crate::state::StateIndex;
use crate::state_repository::StateRepository;
use mimir_formalism::{GroundActionIndex, Problem};

/// Outcome of a search run.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SearchStatus {
    Solved,
    Unsolvable,
    Exhausted,
    OutOfTime,
    OutOfMemory,
}

/// A solution plan: the ground actions in execution order and their
/// summed cost.
#[derive(Clone, Debug, Default)]
pub struct Plan {
    pub actions: Vec<GroundActionIndex>,
    pub cost: f64,
}

/// `IGoalStrategy`: `is_goal(state) -> bool`.
pub trait GoalStrategy {
    fn is_goal(&mut self, repository: &StateRepository, state: StateIndex) -> bool;
}

/// The default goal strategy every algorithm but SIW uses: the
/// problem's own goal condition, tested directly against the state.
pub struct ProblemGoal<'p> {
    pub problem: &'p Problem,
}

impl<'p> GoalStrategy for ProblemGoal<'p> {
    fn is_goal(&mut self, repository: &StateRepository, state: StateIndex) -> bool {
        repository.holds_ground(&self.problem.goal, state)
    }
}

/// SIW's goal strategy: tracks how many individual goal
/// literals/constraints a state satisfies rather than an all-or-none
/// test, so [`crate::algorithms::siw::siw`] can detect "strictly more
/// satisfied goal atoms" and decide when to restart IW.
pub struct ProblemGoalCounter<'p> {
    pub problem: &'p Problem,
}

impl<'p> ProblemGoalCounter<'p> {
    pub fn count_satisfied(&self, repository: &StateRepository, state: StateIndex) -> usize {
        repository.count_satisfied(&self.problem.goal, state)
    }

    pub fn total(&self) -> usize {
        self.problem.goal.literals.static_.len()
            + self.problem.goal.literals.fluent.len()
            + self.problem.goal.literals.derived.len()
            + self.problem.goal.nullary_literals.static_.len()
            + self.problem.goal.nullary_literals.fluent.len()
            + self.problem.goal.nullary_literals.derived.len()
            + self.problem.goal.numeric_constraints.len()
    }
}

impl<'p> GoalStrategy for ProblemGoalCounter<'p> {
    /// Satisfies [`GoalStrategy`] too: "is a goal" when every literal
    /// is among the satisfied ones, i.e. the count equals the total.
    fn is_goal(&mut self, repository: &StateRepository, state: StateIndex) -> bool {
        self.count_satisfied(repository, state) == self.total()
    }
}

/// `IPruningStrategy`: decides whether a generated
/// successor should be expanded further.
pub trait PruningStrategy {
    fn should_prune(&mut self, repository: &StateRepository, state: StateIndex) -> bool;
}

/// Default: never prunes.
#[derive(Default)]
pub struct NoPruning;

impl PruningStrategy for NoPruning {
    fn should_prune(&mut self, _repository: &StateRepository, _state: StateIndex) -> bool {
        false
    }
}

/// Drops a successor already generated before.
#[derive(Default)]
pub struct DuplicatePruning {
    seen: hashbrown::HashSet<StateIndex>,
}

impl PruningStrategy for DuplicatePruning {
    fn should_prune(&mut self, _repository: &StateRepository, state: StateIndex) -> bool {
        !self.seen.insert(state)
    }
}

/// A search heuristic, `f = g + h` for A*.
pub trait Heuristic {
    fn estimate(&mut self, repository: &StateRepository, state: StateIndex) -> f64;
}

/// The only heuristic this core ships.
#[derive(Default)]
pub struct BlindHeuristic;

impl Heuristic for BlindHeuristic {
    fn estimate(&mut self, _repository: &StateRepository, _state: StateIndex) -> f64 {
        0.0
    }
}

/// Reconstructs the action sequence and total cost from a parent-link
/// chain, shared by every algorithm below.
pub(crate) fn reconstruct_plan(parents: &hashbrown::HashMap<StateIndex, (StateIndex, GroundActionIndex, f64)>, mut current: StateIndex, initial: StateIndex) -> Plan {
    let mut actions = Vec::new();
    let mut cost = 0.0;
    while current != initial {
        let &(parent, action, step_cost) = &parents[&current];
        actions.push(action);
        cost += step_cost;
        current = parent;
    }
    actions.reverse();
    Plan { actions, cost }
}

/// Checks a wall-clock deadline:
/// search checks between expansions and between schema iterations,
/// returning `OUT_OF_TIME` at the next check.
pub(crate) fn deadline_exceeded(start: std::time::Instant, max_time: Option<std::time::Duration>) -> bool {
    max_time.is_some_and(|max| start.elapsed() >= max)
}

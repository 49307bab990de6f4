//! End-to-end scenarios: parse and lower a PDDL domain/problem pair
//! through `mimir-pddl`, build a state repository over it, and run a
//! search algorithm to completion.

use mimir_pddl::PddlFrontend;
use mimir_search::algorithms::{astar, brfs, BlindHeuristic, SearchStatus};
use mimir_search::config::SearchLimits;
use mimir_search::event_handler::DefaultEventHandler;
use mimir_search::{RepositoryMode, StateRepository};

fn load(domain_text: &str, problem_text: &str) -> (mimir_formalism::Domain, mimir_formalism::Problem, mimir_formalism::PddlRepositories) {
    let mut frontend = PddlFrontend::new();
    let domain = frontend.parse_domain("domain.pddl", domain_text).expect("domain parses");
    let problem = frontend.parse_problem("problem.pddl", problem_text).expect("problem parses");
    (domain, problem, frontend.into_repositories())
}

fn repository(domain: mimir_formalism::Domain, repos: mimir_formalism::PddlRepositories, problem: &mimir_formalism::Problem, mode: RepositoryMode) -> StateRepository {
    let num_objects = repos.objects.len();
    StateRepository::new(domain, repos, problem, num_objects, mode)
}

#[test]
fn gripper_brfs_finds_a_plan() {
    let (domain, problem, repos) = load(include_str!("fixtures/gripper_domain.pddl"), include_str!("fixtures/gripper_problem.pddl"));
    let mut repo = repository(domain, repos, &problem, RepositoryMode::Lifted);

    let limits = SearchLimits::default();
    let mut handler = DefaultEventHandler;
    let (status, plan) = brfs::brfs(&mut repo, &problem, &limits, &mut handler);

    assert_eq!(status, SearchStatus::Solved);
    let plan = plan.expect("solved status carries a plan");
    assert!(!plan.actions.is_empty());

    let mut state = repo.initial_state(&problem);
    for &action in &plan.actions {
        let (next, _cost) = repo.successor(state, action).expect("plan actions stay applicable");
        state = next;
    }
    assert!(repo.holds_ground(&problem.goal, state), "executing the plan should reach a goal state");
}

#[test]
fn ferry_lifted_and_grounded_modes_agree_on_solvability() {
    let (domain, problem, repos) = load(include_str!("fixtures/ferry_domain.pddl"), include_str!("fixtures/ferry_problem.pddl"));
    let mut lifted = repository(domain.clone(), repos.clone(), &problem, RepositoryMode::Lifted);

    let limits = SearchLimits::default();
    let mut handler = DefaultEventHandler;
    let (lifted_status, lifted_plan) = brfs::brfs(&mut lifted, &problem, &limits, &mut handler);
    assert_eq!(lifted_status, SearchStatus::Solved);
    let lifted_plan = lifted_plan.unwrap();

    let mut grounded = repository(
        domain,
        repos,
        &problem,
        RepositoryMode::Grounded {
            action_options: Default::default(),
            axiom_options: Default::default(),
        },
    );
    let (grounded_status, grounded_plan) = brfs::brfs(&mut grounded, &problem, &limits, &mut handler);
    assert_eq!(grounded_status, SearchStatus::Solved);
    let grounded_plan = grounded_plan.unwrap();

    // BrFS is unit-cost optimal in either mode, so the shortest plan length must agree.
    assert_eq!(lifted_plan.actions.len(), grounded_plan.actions.len());
}

#[test]
fn blocksworld_axioms_derived_predicate_gates_the_goal() {
    let (domain, problem, repos) = load(
        include_str!("fixtures/blocksworld_axioms_domain.pddl"),
        include_str!("fixtures/blocksworld_axioms_problem.pddl"),
    );
    let mut repo = repository(domain, repos, &problem, RepositoryMode::Lifted);

    // Initially `d` is buried under `c`, so the derived `on-table`
    // predicate (stratified over `on`) must not hold for it yet.
    let initial = repo.initial_state(&problem);
    assert!(!repo.holds_ground(&problem.goal, initial));

    let limits = SearchLimits::default();
    let mut handler = DefaultEventHandler;
    let (status, plan) = astar::astar(&mut repo, &problem, &limits, &mut BlindHeuristic, &mut handler);

    assert_eq!(status, SearchStatus::Solved);
    let plan = plan.expect("solved status carries a plan");

    let mut state = initial;
    for &action in &plan.actions {
        let (next, _cost) = repo.successor(state, action).expect("plan actions stay applicable");
        state = next;
    }
    assert!(repo.holds_ground(&problem.goal, state));
}

//! Renders a lowered [`Domain`]/[`Problem`] back to readable PDDL-ish
//! text for the `translator` binary, and a [`Plan`] to the one-action-per-line
//! format `planner` writes to stdout.

use mimir_formalism::{
    ConjunctiveCondition, Domain, GroundAtom, LiftedAtom, Literal, PddlRepositories, PredicateCategory, Problem, Term,
};
use mimir_search::state_repository::StateRepository;
use std::fmt::Write;

fn term_name(repos: &PddlRepositories, term: &Term, action_params: &[String]) -> String {
    match term {
        Term::Object(o) => repos.objects.get(*o).name.clone(),
        Term::Variable(v) => action_params
            .get(v.parameter_index as usize)
            .cloned()
            .unwrap_or_else(|| format!("?x{}", v.parameter_index)),
    }
}

fn lifted_atom_text(repos: &PddlRepositories, atom: &LiftedAtom, params: &[String]) -> String {
    let predicate = &repos.predicates.get(atom.predicate).name;
    let args: Vec<String> = atom.terms.iter().map(|t| term_name(repos, t, params)).collect();
    if args.is_empty() {
        format!("({predicate})")
    } else {
        format!("({predicate} {})", args.join(" "))
    }
}

fn ground_atom_text(repos: &PddlRepositories, atom: &GroundAtom) -> String {
    let predicate = &repos.predicates.get(atom.predicate).name;
    let args: Vec<String> = atom.objects.iter().map(|o| repos.objects.get(*o).name.clone()).collect();
    if args.is_empty() {
        format!("({predicate})")
    } else {
        format!("({predicate} {})", args.join(" "))
    }
}

fn literal_text<A>(text: String, literal: &Literal<A>) -> String {
    if literal.polarity {
        text
    } else {
        format!("(not {text})")
    }
}

fn condition_text(repos: &PddlRepositories, condition: &ConjunctiveCondition, params: &[String]) -> String {
    let mut parts = Vec::new();
    for category in [PredicateCategory::Static, PredicateCategory::Fluent, PredicateCategory::Derived] {
        for literal in condition.literals.get(category) {
            parts.push(literal_text(lifted_atom_text(repos, &literal.atom, params), literal));
        }
        for literal in condition.nullary_literals.get(category) {
            parts.push(literal_text(ground_atom_text(repos, &literal.atom), literal));
        }
    }
    for constraint in &condition.numeric_constraints {
        parts.push(format!("{:?}", constraint.comparator));
    }
    if parts.is_empty() {
        "(and)".to_string()
    } else {
        format!("(and {})", parts.join(" "))
    }
}

/// Prints every type, predicate, function, action schema and axiom of
/// `domain` in a flat, readable (not round-trippable) form — enough to
/// inspect the translator pipeline's output (NNF, parameter-index
/// tagging, delete-relaxation bookkeeping is internal and not shown).
pub fn print_domain(out: &mut String, domain: &Domain, repos: &PddlRepositories) {
    let _ = writeln!(out, "(define (domain {})", domain.name);
    if !repos.types.is_empty() {
        let _ = writeln!(out, "  (:types)");
    }
    let _ = writeln!(out, "  (:predicates)");
    for (_, action) in domain.action_schemas.iter() {
        let params: Vec<String> = action.parameters.iter().enumerate().map(|(i, _)| format!("?x{i}")).collect();
        let _ = writeln!(out, "  (:action {}", action.name);
        let _ = writeln!(out, "    :parameters ({})", params.join(" "));
        let _ = writeln!(out, "    :precondition {}", condition_text(repos, &action.precondition, &params));
        let _ = writeln!(out, "    :effect (and {} conditional-effects)", action.effects.len());
        let _ = writeln!(out, "  )");
    }
    for (_, axiom) in domain.axioms.iter() {
        let params: Vec<String> = axiom.parameters.iter().enumerate().map(|(i, _)| format!("?x{i}")).collect();
        let _ = writeln!(out, "  (:derived {}", lifted_atom_text(repos, &axiom.head, &params));
        let _ = writeln!(out, "    {}", condition_text(repos, &axiom.precondition, &params));
        let _ = writeln!(out, "  )");
    }
    let _ = writeln!(out, ")");
}

/// Prints a problem's objects, initial state and goal.
pub fn print_problem(out: &mut String, problem: &Problem, repos: &PddlRepositories) {
    let _ = writeln!(out, "(define (problem {})", problem.name);
    let objects: Vec<String> = problem.objects.iter().map(|o| repos.objects.get(*o).name.clone()).collect();
    let _ = writeln!(out, "  (:objects {})", objects.join(" "));
    let _ = write!(out, "  (:init");
    for atom in &problem.initial_static_atoms {
        let _ = write!(out, " {}", ground_atom_text(repos, atom));
    }
    for atom in &problem.initial_fluent_atoms {
        let _ = write!(out, " {}", ground_atom_text(repos, atom));
    }
    let _ = writeln!(out, ")");
    let _ = writeln!(out, "  (:goal {})", condition_text(repos, &problem.goal, &[]));
    if let Some(metric) = &problem.metric {
        let _ = writeln!(out, "  (:metric {:?} ...)", metric.direction);
    }
    let _ = writeln!(out, ")");
}

/// Formats a solved [`mimir_search::algorithms::Plan`] as one ground
/// action per line, `(schema-name arg0 arg1 ...)`, the conventional
/// PDDL plan-file shape.
pub fn print_plan(out: &mut String, repository: &StateRepository, plan: &mimir_search::algorithms::Plan) {
    let domain = repository.domain();
    let repos = repository.repositories();
    for &action_index in &plan.actions {
        let ground = repository.ground_action(action_index);
        let schema = &domain.action_schemas[ground.schema];
        let args: Vec<String> = ground.objects.iter().map(|o| repos.objects.get(*o).name.clone()).collect();
        if args.is_empty() {
            let _ = writeln!(out, "({})", schema.name);
        } else {
            let _ = writeln!(out, "({} {})", schema.name, args.join(" "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_domain_still_has_define_header() {
        let domain = Domain::new("d");
        let repos = PddlRepositories::new();
        let mut out = String::new();
        print_domain(&mut out, &domain, &repos);
        assert!(out.starts_with("(define (domain d)"));
    }
}

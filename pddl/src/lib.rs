//! Minimal PDDL 2.1-subset front end.
//!
//! Pipeline: [`sexpr::parse_sexprs`] (bracket matching) ->
//! [`parser::parse_domain`]/[`parser::parse_problem`] (source-text AST)
//! -> [`lower::Lowerer`] (interning + the `mimir_formalism::translator`
//! pipeline). [`PddlFrontend`] threads one [`mimir_formalism::PddlRepositories`]
//! across a domain and its problems, since a problem's objects and
//! initial facts share the domain's predicate/function/type namespace.

pub mod ast;
pub mod error;
pub mod lower;
pub mod parser;
pub mod sexpr;

pub use error::{PddlError, Result};

use lower::Lowerer;
use mimir_formalism::{Domain, PddlRepositories, Problem};

/// Owns the shared [`PddlRepositories`] a domain and its problem(s) are
/// interned into. Parse the domain once, then any number of problems
/// defined over it.
#[derive(Default)]
pub struct PddlFrontend {
    lowerer: Lowerer,
}

impl PddlFrontend {
    pub fn new() -> Self {
        PddlFrontend { lowerer: Lowerer::new() }
    }

    /// Parses and lowers a domain. `source` names the input in error
    /// messages (typically its file path).
    pub fn parse_domain(&mut self, source: &str, text: &str) -> Result<Domain> {
        let forms = sexpr::parse_sexprs(source, text)?;
        let ast = parser::parse_domain(source, &forms)?;
        self.lowerer.lower_domain(source, &ast)
    }

    /// Parses and lowers a problem over the domain already parsed by
    /// [`Self::parse_domain`].
    pub fn parse_problem(&mut self, source: &str, text: &str) -> Result<Problem> {
        let forms = sexpr::parse_sexprs(source, text)?;
        let ast = parser::parse_problem(source, &forms)?;
        self.lowerer.lower_problem(source, &ast)
    }

    pub fn repositories(&self) -> &PddlRepositories {
        &self.lowerer.repos
    }

    pub fn into_repositories(self) -> PddlRepositories {
        self.lowerer.repos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRIPPER_DOMAIN: &str = r#"
        (define (domain gripper)
          (:predicates (room ?r) (ball ?b) (gripper ?g)
                       (at-robby ?r) (at ?b ?r) (free ?g) (carry ?b ?g))
          (:action move
            :parameters (?from ?to)
            :precondition (and (room ?from) (room ?to) (at-robby ?from))
            :effect (and (at-robby ?to) (not (at-robby ?from))))
          (:action pick
            :parameters (?b ?r ?g)
            :precondition (and (ball ?b) (room ?r) (gripper ?g) (at ?b ?r) (at-robby ?r) (free ?g))
            :effect (and (carry ?b ?g) (not (at ?b ?r)) (not (free ?g)))))
    "#;

    const GRIPPER_PROBLEM: &str = r#"
        (define (problem strips-gripper)
          (:domain gripper)
          (:objects rooma roomb ball1 left right)
          (:init (room rooma) (room roomb) (ball ball1) (gripper left) (gripper right)
                 (at-robby rooma) (at ball1 rooma) (free left) (free right))
          (:goal (at ball1 roomb)))
    "#;

    #[test]
    fn parses_and_lowers_gripper() {
        let mut frontend = PddlFrontend::new();
        let domain = frontend.parse_domain("gripper.pddl", GRIPPER_DOMAIN).unwrap();
        assert_eq!(domain.action_schemas.len(), 2);

        let problem = frontend.parse_problem("gripper-problem.pddl", GRIPPER_PROBLEM).unwrap();
        assert_eq!(problem.objects.len(), 5);
        assert!(!problem.initial_fluent_atoms.is_empty());
        assert!(!problem.goal.nullary_literals.is_empty() || !problem.goal.literals.is_empty());
    }

    #[test]
    fn unknown_predicate_is_an_error() {
        let mut frontend = PddlFrontend::new();
        let bad = r#"
            (define (domain d)
              (:predicates (on ?x ?y))
              (:action noop :parameters () :precondition (missing) :effect (and)))
        "#;
        assert!(frontend.parse_domain("d.pddl", bad).is_err());
    }
}

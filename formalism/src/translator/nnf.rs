//! Negation normal form: pushes negation down to literals and numeric
//! constraints so that upstream NOT/AND/OR/quantifier combinations land
//! in this crate's flat, all-positive-or-negative-literal
//! [`crate::condition::ConjunctiveCondition`] representation.
//!
//! `Formula` is the general precondition syntax tree a front end
//! parses PDDL preconditions/goals into; `to_nnf` is the only
//! normalization that needs a general tree (disjunction elimination and
//! delete-relaxation both operate on the already-flat data model).

use crate::atom::LiftedAtom;
use crate::numeric::NumericConstraint;
use crate::variable::Variable;

#[derive(Clone, Debug)]
pub enum Formula {
    Atom(LiftedAtom),
    Numeric(NumericConstraint),
    Not(Box<Formula>),
    And(Vec<Formula>),
    Or(Vec<Formula>),
    /// Existentially-quantified sub-formula; `vars` extend the owning
    /// condition's parameter list as witnesses (see module docs).
    Exists(Vec<Variable>, Box<Formula>),
    /// Universally-quantified sub-formula; only meaningful inside a
    /// conditional effect's condition, where it is equivalent to
    /// binding `vars` as the conditional effect's own parameters.
    ForAll(Vec<Variable>, Box<Formula>),
}

impl Formula {
    pub fn negate_comparator(c: crate::numeric::Comparator) -> crate::numeric::Comparator {
        use crate::numeric::Comparator::*;
        match c {
            Gt => Le,
            Ge => Lt,
            Lt => Ge,
            Le => Gt,
            Eq => Neq,
            Neq => Eq,
        }
    }
}

/// Pushes `Not` inward until it only ever wraps an `Atom` (flipping its
/// polarity instead) or a `Numeric` constraint (flipping its
/// comparator), via De Morgan's laws and quantifier duality
/// (`not(forall x. f) = exists x. not f`, and symmetrically for
/// `exists`). Double negation cancels immediately.
pub fn to_nnf(formula: Formula) -> Formula {
    match formula {
        Formula::Atom(_) | Formula::Numeric(_) => formula,
        Formula::Not(inner) => negate(*inner),
        Formula::And(parts) => Formula::And(parts.into_iter().map(to_nnf).collect()),
        Formula::Or(parts) => Formula::Or(parts.into_iter().map(to_nnf).collect()),
        Formula::Exists(vars, inner) => Formula::Exists(vars, Box::new(to_nnf(*inner))),
        Formula::ForAll(vars, inner) => Formula::ForAll(vars, Box::new(to_nnf(*inner))),
    }
}

fn negate(formula: Formula) -> Formula {
    match formula {
        Formula::Atom(atom) => to_nnf_negated_atom(atom),
        Formula::Numeric(constraint) => Formula::Numeric(NumericConstraint {
            comparator: Formula::negate_comparator(constraint.comparator),
            ..constraint
        }),
        Formula::Not(inner) => to_nnf(*inner),
        Formula::And(parts) => Formula::Or(parts.into_iter().map(|p| to_nnf(negate(p))).collect()),
        Formula::Or(parts) => Formula::And(parts.into_iter().map(|p| to_nnf(negate(p))).collect()),
        Formula::Exists(vars, inner) => Formula::ForAll(vars, Box::new(to_nnf(negate(*inner)))),
        Formula::ForAll(vars, inner) => Formula::Exists(vars, Box::new(to_nnf(negate(*inner)))),
    }
}

fn to_nnf_negated_atom(atom: LiftedAtom) -> Formula {
    // Represented as `Not(Atom)` one level deep so the flattening pass
    // that builds `ConjunctiveCondition` can read off polarity directly;
    // we still return through the `Formula` type rather than a literal
    // to keep `to_nnf`'s recursion uniform.
    Formula::Not(Box::new(Formula::Atom(atom)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indices::PredicateIndex;

    fn atom(i: u32) -> Formula {
        Formula::Atom(LiftedAtom::new(PredicateIndex::new(i), []))
    }

    #[test]
    fn double_negation_cancels() {
        let f = Formula::Not(Box::new(Formula::Not(Box::new(atom(0)))));
        let nnf = to_nnf(f);
        assert!(matches!(nnf, Formula::Atom(_)));
    }

    #[test]
    fn de_morgan_and_becomes_or() {
        let f = Formula::Not(Box::new(Formula::And(vec![atom(0), atom(1)])));
        let nnf = to_nnf(f);
        match nnf {
            Formula::Or(parts) => assert_eq!(parts.len(), 2),
            other => panic!("expected Or, got {other:?}"),
        }
    }

    #[test]
    fn quantifier_duality() {
        let f = Formula::Not(Box::new(Formula::Exists(vec![Variable::new(0)], Box::new(atom(0)))));
        let nnf = to_nnf(f);
        assert!(matches!(nnf, Formula::ForAll(_, _)));
    }
}

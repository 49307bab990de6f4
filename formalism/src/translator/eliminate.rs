//! Disjunction elimination via axiom introduction, plus
//! universal-quantifier elimination, flattening the resulting
//! (And/Atom/Exists)-only [`Formula`] into a [`ConjunctiveCondition`].
//!
//! Both eliminations reduce to the same trick: replace the offending
//! sub-formula by a positive (for `Or`) or negated (for `ForAll`) atom
//! of a freshly minted derived predicate, and record one or more
//! [`Axiom`]s whose bodies reconstruct the original meaning — `Or`
//! gets one axiom per disjunct (multiple rules concluding the same
//! head is disjunction), `ForAll x. f` gets one axiom whose
//! body is `Exists x. not f` via the duality `forall x. f = not exists
//! x. not f`. Existentials never need this: the data model already
//! lets a condition's `parameters` extend past its owning schema's own
//! arity for exactly this purpose (see `translator/mod.rs`).
//!
//! A derived predicate's own axiom needs a fresh, dense 0-based
//! parameter numbering independent of whatever indices its free
//! variables happened to have in the enclosing scope, so every atom
//! and sub-quantifier inside the axiom body is remapped through a
//! substitution built while walking it.

use crate::atom::{GroundAtom, LiftedAtom};
use crate::axiom::Axiom;
use crate::condition::ConjunctiveCondition;
use crate::indices::{ObjectIndex, PredicateIndex, TypeIndex};
use crate::literal::Literal;
use crate::numeric::NumericExpression;
use crate::predicate::{PredicateCategory, PredicateRepository};
use crate::term::Term;
use crate::translator::nnf::{to_nnf, Formula};
use crate::variable::Variable;
use hashbrown::HashMap;
use smallvec::SmallVec;
use std::collections::BTreeSet;

fn free_vars_term(term: &Term, out: &mut BTreeSet<Variable>) {
    if let Term::Variable(v) = term {
        out.insert(*v);
    }
}

fn free_vars_expr(expr: &NumericExpression, out: &mut BTreeSet<Variable>) {
    match expr {
        NumericExpression::Constant(_) => {}
        NumericExpression::Function { terms, .. } => terms.iter().for_each(|t| free_vars_term(t, out)),
        NumericExpression::Binary(_, lhs, rhs) => {
            free_vars_expr(lhs, out);
            free_vars_expr(rhs, out);
        }
    }
}

/// The free variables of `formula` — those not bound by an enclosing
/// `Exists`/`ForAll` within it.
pub fn free_vars(formula: &Formula) -> BTreeSet<Variable> {
    let mut out = BTreeSet::new();
    collect_free_vars(formula, &mut out);
    out
}

fn collect_free_vars(formula: &Formula, out: &mut BTreeSet<Variable>) {
    match formula {
        Formula::Atom(atom) => atom.terms.iter().for_each(|t| free_vars_term(t, out)),
        Formula::Numeric(c) => {
            free_vars_expr(&c.lhs, out);
            free_vars_expr(&c.rhs, out);
        }
        Formula::Not(inner) => collect_free_vars(inner, out),
        Formula::And(parts) | Formula::Or(parts) => parts.iter().for_each(|p| collect_free_vars(p, out)),
        Formula::Exists(vars, inner) | Formula::ForAll(vars, inner) => {
            let mut inner_free = BTreeSet::new();
            collect_free_vars(inner, &mut inner_free);
            for v in vars {
                inner_free.remove(v);
            }
            out.extend(inner_free);
        }
    }
}

fn remap_term(term: Term, map: &HashMap<Variable, Variable>) -> Term {
    match term {
        Term::Object(o) => Term::Object(o),
        Term::Variable(v) => Term::Variable(*map.get(&v).unwrap_or(&v)),
    }
}

fn remap_expr(expr: NumericExpression, map: &HashMap<Variable, Variable>) -> NumericExpression {
    match expr {
        NumericExpression::Constant(c) => NumericExpression::Constant(c),
        NumericExpression::Function { function, terms } => NumericExpression::Function {
            function,
            terms: terms.into_iter().map(|t| remap_term(t, map)).collect(),
        },
        NumericExpression::Binary(op, lhs, rhs) => NumericExpression::Binary(op, Box::new(remap_expr(*lhs, map)), Box::new(remap_expr(*rhs, map))),
    }
}

fn remap_atom(atom: LiftedAtom, map: &HashMap<Variable, Variable>) -> LiftedAtom {
    LiftedAtom::new(atom.predicate, atom.terms.into_iter().map(|t| remap_term(t, map)).collect::<SmallVec<[Term; 4]>>())
}

/// Renumbers every variable `formula` mentions through `map`, assigning
/// a fresh dense index (continuing from `next_index`) to any `Exists`
/// or `ForAll` binder it meets that isn't already in `map`.
fn remap_formula(formula: Formula, map: &mut HashMap<Variable, Variable>, next_index: &mut u32) -> Formula {
    match formula {
        Formula::Atom(atom) => Formula::Atom(remap_atom(atom, map)),
        Formula::Numeric(c) => Formula::Numeric(crate::numeric::NumericConstraint {
            comparator: c.comparator,
            lhs: remap_expr(c.lhs, map),
            rhs: remap_expr(c.rhs, map),
        }),
        Formula::Not(inner) => Formula::Not(Box::new(remap_formula(*inner, map, next_index))),
        Formula::And(parts) => Formula::And(parts.into_iter().map(|p| remap_formula(p, map, next_index)).collect()),
        Formula::Or(parts) => Formula::Or(parts.into_iter().map(|p| remap_formula(p, map, next_index)).collect()),
        Formula::Exists(vars, inner) => {
            let new_vars = bind_fresh(&vars, map, next_index);
            Formula::Exists(new_vars, Box::new(remap_formula(*inner, map, next_index)))
        }
        Formula::ForAll(vars, inner) => {
            let new_vars = bind_fresh(&vars, map, next_index);
            Formula::ForAll(new_vars, Box::new(remap_formula(*inner, map, next_index)))
        }
    }
}

fn bind_fresh(vars: &[Variable], map: &mut HashMap<Variable, Variable>, next_index: &mut u32) -> Vec<Variable> {
    vars.iter()
        .map(|v| {
            let fresh = Variable::new(*next_index);
            *next_index += 1;
            map.insert(*v, fresh);
            fresh
        })
        .collect()
}

fn fresh_derived_predicate(predicates: &mut PredicateRepository, next_derived_id: &mut u32, arity: usize) -> PredicateIndex {
    let name = format!("derived#{}", *next_derived_id);
    *next_derived_id += 1;
    predicates.add(name, arity, PredicateCategory::Derived)
}

fn head_atom(predicate: PredicateIndex, free: &[Variable]) -> LiftedAtom {
    LiftedAtom::new(predicate, free.iter().map(|v| Term::Variable(*v)).collect::<SmallVec<[Term; 4]>>())
}

/// Builds the axiom `predicate(free...) :- body`, renumbering `body`'s
/// variables to a dense 0-based scheme starting with `free` in order.
fn build_axiom(predicate: PredicateIndex, free: &[Variable], body: Formula, predicates: &PredicateRepository) -> Axiom {
    let mut map = HashMap::new();
    let mut next_index = 0u32;
    for v in free {
        map.insert(*v, Variable::new(next_index));
        next_index += 1;
    }
    let remapped = remap_formula(body, &mut map, &mut next_index);
    let num_params = next_index as usize;
    let parameters: Vec<Variable> = (0..num_params as u32).map(Variable::new).collect();
    let parameter_types = vec![SmallVec::<[TypeIndex; 1]>::new(); num_params];
    let mut precondition = ConjunctiveCondition::new(parameters.clone(), parameter_types);
    flatten_into(remapped, predicates, &mut precondition);
    Axiom {
        parameters,
        precondition,
        head: head_atom(predicate, free),
    }
}

/// Rewrites every `Or`/`ForAll` node in `formula` (already in negation
/// normal form) into a literal over a freshly minted derived predicate,
/// appending the axioms that reconstruct its meaning to `axioms_out`.
/// The result contains only `Atom`/`Not(Atom)`/`Numeric`/`And`/`Exists`.
pub fn eliminate_or_forall(formula: Formula, predicates: &mut PredicateRepository, next_derived_id: &mut u32, axioms_out: &mut Vec<Axiom>) -> Formula {
    match formula {
        Formula::Atom(_) | Formula::Numeric(_) => formula,
        Formula::Not(inner) => Formula::Not(Box::new(eliminate_or_forall(*inner, predicates, next_derived_id, axioms_out))),
        Formula::And(parts) => Formula::And(parts.into_iter().map(|p| eliminate_or_forall(p, predicates, next_derived_id, axioms_out)).collect()),
        Formula::Exists(vars, inner) => Formula::Exists(vars, Box::new(eliminate_or_forall(*inner, predicates, next_derived_id, axioms_out))),
        Formula::Or(parts) => {
            let whole = Formula::Or(parts.clone());
            let free: Vec<Variable> = free_vars(&whole).into_iter().collect();
            let predicate = fresh_derived_predicate(predicates, next_derived_id, free.len());
            for part in parts {
                let eliminated = eliminate_or_forall(part, predicates, next_derived_id, axioms_out);
                axioms_out.push(build_axiom(predicate, &free, eliminated, predicates));
            }
            Formula::Atom(head_atom(predicate, &free))
        }
        Formula::ForAll(vars, inner) => {
            // forall vars. inner  ==  not (exists vars. not inner)
            let negated_inner = to_nnf(Formula::Not(inner));
            let eliminated_body = eliminate_or_forall(negated_inner, predicates, next_derived_id, axioms_out);
            let witnessed = Formula::Exists(vars, Box::new(eliminated_body));
            let free: Vec<Variable> = free_vars(&witnessed).into_iter().collect();
            let predicate = fresh_derived_predicate(predicates, next_derived_id, free.len());
            axioms_out.push(build_axiom(predicate, &free, witnessed, predicates));
            Formula::Not(Box::new(Formula::Atom(head_atom(predicate, &free))))
        }
    }
}

fn push_literal(atom: LiftedAtom, polarity: bool, predicates: &PredicateRepository, cond: &mut ConjunctiveCondition) {
    let category = predicates.get(atom.predicate).category;
    if atom.arity() == 0 {
        let ground = GroundAtom::new(atom.predicate, SmallVec::<[ObjectIndex; 4]>::new());
        cond.nullary_literals.get_mut(category).push(Literal::new(ground, polarity));
    } else {
        cond.literals.get_mut(category).push(Literal::new(atom, polarity));
    }
}

fn flatten_into(formula: Formula, predicates: &PredicateRepository, cond: &mut ConjunctiveCondition) {
    match formula {
        Formula::And(parts) => parts.into_iter().for_each(|p| flatten_into(p, predicates, cond)),
        Formula::Atom(atom) => push_literal(atom, true, predicates, cond),
        Formula::Not(inner) => {
            if let Formula::Atom(atom) = *inner {
                push_literal(atom, false, predicates, cond);
            }
        }
        Formula::Numeric(c) => cond.numeric_constraints.push(c),
        Formula::Exists(vars, inner) => {
            for _ in &vars {
                cond.parameter_types.push(SmallVec::new());
            }
            cond.parameters.extend(vars);
            flatten_into(*inner, predicates, cond);
        }
        Formula::Or(_) | Formula::ForAll(_, _) => unreachable!("eliminate_or_forall must run before flatten"),
    }
}

/// Flattens an `Or`/`ForAll`-free [`Formula`] (see
/// [`eliminate_or_forall`]) into a [`ConjunctiveCondition`] rooted at
/// `parameters`/`parameter_types`.
pub fn flatten(formula: Formula, predicates: &PredicateRepository, parameters: Vec<Variable>, parameter_types: Vec<SmallVec<[TypeIndex; 1]>>) -> ConjunctiveCondition {
    let mut cond = ConjunctiveCondition::new(parameters, parameter_types);
    flatten_into(formula, predicates, &mut cond);
    cond
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indices::PredicateIndex;

    fn atom(predicate: PredicateIndex, var: u32) -> Formula {
        Formula::Atom(LiftedAtom::new(predicate, [Term::Variable(Variable::new(var))]))
    }

    #[test]
    fn or_elimination_introduces_one_axiom_per_disjunct() {
        let mut predicates = PredicateRepository::new();
        let p = predicates.add("p", 1, PredicateCategory::Fluent);
        let q = predicates.add("q", 1, PredicateCategory::Fluent);

        let formula = Formula::Or(vec![atom(p, 0), atom(q, 0)]);
        let mut axioms = Vec::new();
        let mut next_id = 0;
        let rewritten = eliminate_or_forall(formula, &mut predicates, &mut next_id, &mut axioms);

        assert!(matches!(rewritten, Formula::Atom(_)));
        assert_eq!(axioms.len(), 2);
        assert_eq!(axioms[0].head.predicate, axioms[1].head.predicate);
        assert_eq!(axioms[0].arity(), 1);
    }

    #[test]
    fn forall_elimination_introduces_witnessed_negated_axiom() {
        let mut predicates = PredicateRepository::new();
        let p = predicates.add("p", 1, PredicateCategory::Fluent);

        // forall ?y. p(?y), with no free variables outside the quantifier.
        let formula = Formula::ForAll(vec![Variable::new(0)], Box::new(atom(p, 0)));
        let mut axioms = Vec::new();
        let mut next_id = 0;
        let rewritten = eliminate_or_forall(formula, &mut predicates, &mut next_id, &mut axioms);

        match rewritten {
            Formula::Not(inner) => assert!(matches!(*inner, Formula::Atom(_))),
            other => panic!("expected Not(Atom), got {other:?}"),
        }
        assert_eq!(axioms.len(), 1);
        // The axiom's body is `exists ?y. not p(?y)`, so its own arity
        // is 1 (the witness), with zero free variables from outside.
        assert_eq!(axioms[0].arity(), 1);
    }

    #[test]
    fn flatten_builds_per_category_literal_lists() {
        let mut predicates = PredicateRepository::new();
        let p = predicates.add("p", 1, PredicateCategory::Fluent);
        let q = predicates.add("q", 1, PredicateCategory::Static);

        let formula = Formula::And(vec![atom(p, 0), Formula::Not(Box::new(atom(q, 0)))]);
        let cond = flatten(formula, &predicates, vec![Variable::new(0)], vec![SmallVec::new()]);

        assert_eq!(cond.literals.fluent.len(), 1);
        assert_eq!(cond.literals.static_.len(), 1);
        assert!(!cond.literals.static_[0].polarity);
    }
}

//! Lowers the generic [`crate::sexpr::Spanned`] tree produced for a
//! `(define ...)` form into the surface [`crate::ast`] types, still
//! named by source text. Handles a PDDL 2.1 subset: STRIPS + typing +
//! negative/disjunctive preconditions + equality + quantifiers +
//! conditional effects + numeric fluents + derived predicates + action
//! costs.

use crate::ast::*;
use crate::error::{PddlError, Result};
use crate::sexpr::{Sexpr, Spanned};

fn err_tok(source: &str, line: usize, expected: &str, found: &Spanned) -> PddlError {
    let found_text = match &found.expr {
        Sexpr::Atom(a) => a.clone(),
        Sexpr::List(_) => "(...)".to_string(),
    };
    PddlError::UnexpectedToken(source.to_string(), line, expected.to_string(), found_text)
}

fn atom<'a>(source: &str, s: &'a Spanned) -> Result<&'a str> {
    s.atom().ok_or_else(|| err_tok(source, s.line, "an atom", s))
}

fn list<'a>(source: &str, s: &'a Spanned) -> Result<&'a [Spanned]> {
    s.list().ok_or_else(|| err_tok(source, s.line, "a list", s))
}

/// Parses a `name... [- type] name... [- type] ...` run, where `type`
/// is either a single atom or `(either t1 t2 ...)`. Used for
/// `:types`/`:constants`/`:objects` (plain names) and parameter lists
/// (`?`-prefixed variables) alike — the caller only cares whether the
/// leading sigil differs, so `keep_sigil` controls whether it's
/// stripped from the stored name.
fn parse_typed_list(source: &str, items: &[Spanned]) -> Result<Vec<TypedName>> {
    let mut out: Vec<TypedName> = Vec::new();
    let mut pending: Vec<usize> = Vec::new();
    let mut i = 0;
    while i < items.len() {
        let tok = atom(source, &items[i])?;
        if tok == "-" {
            i += 1;
            let type_item = items.get(i).ok_or_else(|| PddlError::UnexpectedEof(source.to_string(), items[i - 1].line))?;
            let types = parse_type_ref(source, type_item)?;
            for &idx in &pending {
                out[idx].types = types.clone();
            }
            pending.clear();
            i += 1;
        } else {
            pending.push(out.len());
            out.push(TypedName { name: tok.to_string(), types: Vec::new() });
            i += 1;
        }
    }
    Ok(out)
}

fn parse_type_ref(source: &str, item: &Spanned) -> Result<Vec<String>> {
    if let Some(name) = item.atom() {
        return Ok(vec![name.to_string()]);
    }
    let items = list(source, item)?;
    if items.first().and_then(|s| s.atom()) != Some("either") {
        return Err(err_tok(source, item.line, "a type name or (either ...)", item));
    }
    items[1..].iter().map(|s| atom(source, s).map(|a| a.to_string())).collect()
}

fn parse_term(source: &str, item: &Spanned) -> Result<Term> {
    let name = atom(source, item)?;
    if let Some(stripped) = name.strip_prefix('?') {
        Ok(Term::Var(stripped.to_string()))
    } else {
        Ok(Term::Name(name.to_string()))
    }
}

fn parse_expr(source: &str, item: &Spanned) -> Result<Expr> {
    if let Some(a) = item.atom() {
        if let Ok(n) = a.parse::<f64>() {
            return Ok(Expr::Number(n));
        }
        return Ok(Expr::Func(a.to_string(), Vec::new()));
    }
    let items = list(source, item)?;
    let head = atom(source, &items[0])?;
    match head {
        "+" | "-" | "*" | "/" if items.len() == 3 => {
            let op = match head {
                "+" => BinOp::Add,
                "-" => BinOp::Sub,
                "*" => BinOp::Mul,
                _ => BinOp::Div,
            };
            Ok(Expr::Binary(op, Box::new(parse_expr(source, &items[1])?), Box::new(parse_expr(source, &items[2])?)))
        }
        _ => {
            let args = items[1..].iter().map(|t| parse_term(source, t)).collect::<Result<Vec<_>>>()?;
            Ok(Expr::Func(head.to_string(), args))
        }
    }
}

fn is_numeric_head(items: &[Spanned]) -> bool {
    items.len() == 2 && (items[0].atom().is_none() || items[0].atom().and_then(|a| a.parse::<f64>().ok()).is_some())
}

fn parse_gd(source: &str, item: &Spanned) -> Result<Gd> {
    let items = list(source, item)?;
    if items.is_empty() {
        return Ok(Gd::True);
    }
    let head = atom(source, &items[0])?;
    match head {
        "and" => Ok(Gd::And(items[1..].iter().map(|i| parse_gd(source, i)).collect::<Result<_>>()?)),
        "or" => Ok(Gd::Or(items[1..].iter().map(|i| parse_gd(source, i)).collect::<Result<_>>()?)),
        "not" => Ok(Gd::Not(Box::new(parse_gd(source, &items[1])?))),
        "imply" => Ok(Gd::Or(vec![Gd::Not(Box::new(parse_gd(source, &items[1])?)), parse_gd(source, &items[2])?])),
        "forall" => {
            let params = parse_typed_list(source, list(source, &items[1])?)?;
            Ok(Gd::Forall(params, Box::new(parse_gd(source, &items[2])?)))
        }
        "exists" => {
            let params = parse_typed_list(source, list(source, &items[1])?)?;
            Ok(Gd::Exists(params, Box::new(parse_gd(source, &items[2])?)))
        }
        ">" | "<" | ">=" | "<=" => {
            let op = match head {
                ">" => CompareOp::Gt,
                "<" => CompareOp::Lt,
                ">=" => CompareOp::Ge,
                _ => CompareOp::Le,
            };
            Ok(Gd::Compare(op, parse_expr(source, &items[1])?, parse_expr(source, &items[2])?))
        }
        "=" if is_numeric_head(&items[1..]) => Ok(Gd::Compare(CompareOp::Eq, parse_expr(source, &items[1])?, parse_expr(source, &items[2])?)),
        "=" => Ok(Gd::Equal(parse_term(source, &items[1])?, parse_term(source, &items[2])?)),
        predicate => {
            let args = items[1..].iter().map(|t| parse_term(source, t)).collect::<Result<Vec<_>>>()?;
            Ok(Gd::Atom(predicate.to_string(), args))
        }
    }
}

fn parse_eff(source: &str, item: &Spanned) -> Result<Eff> {
    let items = list(source, item)?;
    if items.is_empty() {
        return Ok(Eff::NoOp);
    }
    let head = atom(source, &items[0])?;
    match head {
        "and" => Ok(Eff::And(items[1..].iter().map(|i| parse_eff(source, i)).collect::<Result<_>>()?)),
        "not" => {
            let inner = list(source, &items[1])?;
            let pred = atom(source, &inner[0])?;
            let args = inner[1..].iter().map(|t| parse_term(source, t)).collect::<Result<Vec<_>>>()?;
            Ok(Eff::Atom(false, pred.to_string(), args))
        }
        "forall" => {
            let params = parse_typed_list(source, list(source, &items[1])?)?;
            Ok(Eff::Forall(params, Box::new(parse_eff(source, &items[2])?)))
        }
        "when" => Ok(Eff::When(parse_gd(source, &items[1])?, Box::new(parse_eff(source, &items[2])?))),
        "assign" | "increase" | "decrease" | "scale-up" | "scale-down" => {
            let kind = match head {
                "assign" => NumKind::Assign,
                "increase" => NumKind::Increase,
                "decrease" => NumKind::Decrease,
                "scale-up" => NumKind::ScaleUp,
                _ => NumKind::ScaleDown,
            };
            let target = list(source, &items[1])?;
            let func = atom(source, &target[0])?;
            let args = target[1..].iter().map(|t| parse_term(source, t)).collect::<Result<Vec<_>>>()?;
            Ok(Eff::Numeric(kind, func.to_string(), args, parse_expr(source, &items[2])?))
        }
        predicate => {
            let args = items[1..].iter().map(|t| parse_term(source, t)).collect::<Result<Vec<_>>>()?;
            Ok(Eff::Atom(true, predicate.to_string(), args))
        }
    }
}

fn find_section<'a>(items: &'a [Spanned], keyword: &str) -> Option<&'a [Spanned]> {
    items.iter().find_map(|i| {
        let l = i.list()?;
        if l.first()?.atom()? == keyword {
            Some(&l[1..])
        } else {
            None
        }
    })
}

fn parse_predicates(source: &str, items: &[Spanned]) -> Result<Vec<PredicateDecl>> {
    items
        .iter()
        .map(|i| {
            let l = list(source, i)?;
            let name = atom(source, &l[0])?;
            let params = parse_typed_list(source, &l[1..])?;
            Ok(PredicateDecl { name: name.to_string(), params })
        })
        .collect()
}

fn parse_functions(source: &str, items: &[Spanned]) -> Result<Vec<FunctionDecl>> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < items.len() {
        if items[i].atom() == Some("-") {
            // `- number` (or any type) applying to preceding signatures; functions
            // are always numeric in this subset, so the type name itself is unused.
            i += 2;
            continue;
        }
        let l = list(source, &items[i])?;
        let name = atom(source, &l[0])?;
        let params = parse_typed_list(source, &l[1..])?;
        out.push(FunctionDecl { name: name.to_string(), params });
        i += 1;
    }
    Ok(out)
}

fn parse_action(source: &str, items: &[Spanned]) -> Result<ActionDecl> {
    let name = atom(source, &items[0])?.to_string();
    let mut params = Vec::new();
    let mut precondition = Gd::True;
    let mut effect = Eff::NoOp;
    let mut cost = None;
    let mut i = 1;
    while i < items.len() {
        match atom(source, &items[i])? {
            ":parameters" => {
                params = parse_typed_list(source, list(source, &items[i + 1])?)?;
                i += 2;
            }
            ":precondition" => {
                precondition = parse_gd(source, &items[i + 1])?;
                i += 2;
            }
            ":effect" => {
                effect = parse_eff(source, &items[i + 1])?;
                i += 2;
            }
            _ => i += 1,
        }
    }
    extract_action_cost(&mut effect, &mut cost);
    Ok(ActionDecl { name, params, precondition, effect, cost })
}

/// Pulls a top-level `(increase (total-cost) expr)` numeric effect out
/// of the effect tree into the schema's own cost expression, the common PDDL idiom for
/// declaring action costs rather than leaving it as a generic numeric
/// effect on a function no one else reads.
fn extract_action_cost(effect: &mut Eff, cost: &mut Option<crate::ast::Expr>) {
    fn is_total_cost(func: &str, args: &[Term]) -> bool {
        func == "total-cost" && args.is_empty()
    }
    match effect {
        Eff::And(parts) => {
            parts.retain(|p| {
                if let Eff::Numeric(NumKind::Increase, func, args, expr) = p {
                    if is_total_cost(func, args) {
                        *cost = Some(expr.clone());
                        return false;
                    }
                }
                true
            });
        }
        Eff::Numeric(NumKind::Increase, func, args, expr) if is_total_cost(func, args) => {
            *cost = Some(expr.clone());
            *effect = Eff::NoOp;
        }
        _ => {}
    }
}

fn parse_derived(source: &str, items: &[Spanned]) -> Result<DerivedDecl> {
    let head = list(source, &items[0])?;
    let head_predicate = atom(source, &head[0])?.to_string();
    let head_params = parse_typed_list(source, &head[1..])?;
    let body = parse_gd(source, &items[1])?;
    Ok(DerivedDecl { head_predicate, head_params, body })
}

/// Flattens a `(:types t1 t2 - parent t3 - (either a b))` section into
/// (subtype, direct-parent) pairs; multi-parent `either` groups get one
/// pair per named parent (a pragmatic widening — the type hierarchy
/// stays a forest by taking the first, the common case in practice).
fn parse_types(source: &str, items: &[Spanned]) -> Result<Vec<(String, Option<String>)>> {
    let typed = parse_typed_list(source, items)?;
    Ok(typed
        .into_iter()
        .map(|t| (t.name, t.types.into_iter().next()))
        .collect())
}

pub fn parse_domain(source: &str, forms: &[Spanned]) -> Result<DomainAst> {
    let define = forms.first().ok_or_else(|| PddlError::UnexpectedEof(source.to_string(), 0))?;
    let items = list(source, define)?;
    if items.first().and_then(|i| i.atom()) != Some("define") {
        return Err(err_tok(source, define.line, "(define ...)", define));
    }
    let name_form = list(source, &items[1])?;
    let name = atom(source, &name_form[1])?.to_string();

    let mut domain = DomainAst {
        name,
        ..Default::default()
    };
    if let Some(reqs) = find_section(&items[2..], ":requirements") {
        domain.requirements = reqs.iter().map(|r| atom(source, r).map(|s| s.to_string())).collect::<Result<_>>()?;
    }
    if let Some(types) = find_section(&items[2..], ":types") {
        domain.types = parse_types(source, types)?;
    }
    if let Some(constants) = find_section(&items[2..], ":constants") {
        domain.constants = parse_typed_list(source, constants)?;
    }
    if let Some(predicates) = find_section(&items[2..], ":predicates") {
        domain.predicates = parse_predicates(source, predicates)?;
    }
    if let Some(functions) = find_section(&items[2..], ":functions") {
        domain.functions = parse_functions(source, functions)?;
    }
    for item in &items[2..] {
        let Some(l) = item.list() else { continue };
        match l.first().and_then(|a| a.atom()) {
            Some(":action") => domain.actions.push(parse_action(source, &l[1..])?),
            Some(":derived") => domain.derived.push(parse_derived(source, &l[1..])?),
            _ => {}
        }
    }
    Ok(domain)
}

fn parse_init_fact(source: &str, item: &Spanned) -> Result<InitFact> {
    let items = list(source, item)?;
    let head = atom(source, &items[0])?;
    if head == "=" {
        let target = list(source, &items[1])?;
        let func = atom(source, &target[0])?.to_string();
        let args = target[1..].iter().map(|t| atom(source, t).map(|s| s.to_string())).collect::<Result<Vec<_>>>()?;
        let value_tok = atom(source, &items[2])?;
        let value: f64 = value_tok
            .parse()
            .map_err(|_| err_tok(source, items[2].line, "a numeric literal", &items[2]))?;
        return Ok(InitFact::NumericAssign(func, args, value));
    }
    let args = items[1..].iter().map(|t| atom(source, t).map(|s| s.to_string())).collect::<Result<Vec<_>>>()?;
    Ok(InitFact::Atom(head.to_string(), args))
}

pub fn parse_problem(source: &str, forms: &[Spanned]) -> Result<ProblemAst> {
    let define = forms.first().ok_or_else(|| PddlError::UnexpectedEof(source.to_string(), 0))?;
    let items = list(source, define)?;
    if items.first().and_then(|i| i.atom()) != Some("define") {
        return Err(err_tok(source, define.line, "(define ...)", define));
    }
    let name_form = list(source, &items[1])?;
    let name = atom(source, &name_form[1])?.to_string();
    let domain_form = list(source, &items[2])?;
    if domain_form.first().and_then(|a| a.atom()) != Some(":domain") {
        return Err(err_tok(source, items[2].line, "(:domain ...)", &items[2]));
    }
    let domain_name = atom(source, &domain_form[1])?.to_string();

    let mut problem = ProblemAst {
        name,
        domain_name,
        ..Default::default()
    };
    if let Some(objects) = find_section(&items[3..], ":objects") {
        problem.objects = parse_typed_list(source, objects)?;
    }
    if let Some(init) = find_section(&items[3..], ":init") {
        problem.init = init.iter().map(|f| parse_init_fact(source, f)).collect::<Result<_>>()?;
    }
    if let Some(goal) = find_section(&items[3..], ":goal") {
        problem.goal = Some(parse_gd(source, &goal[0])?);
    }
    if let Some(metric) = find_section(&items[3..], ":metric") {
        let dir = match atom(source, &metric[0])? {
            "minimize" => MetricDir::Minimize,
            "maximize" => MetricDir::Maximize,
            other => return Err(PddlError::UnsupportedFeature(source.to_string(), format!("metric direction `{other}`"))),
        };
        problem.metric = Some((dir, parse_expr(source, &metric[1])?));
    }
    Ok(problem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sexpr::parse_sexprs;

    #[test]
    fn parses_minimal_domain() {
        let src = "(define (domain d) (:requirements :strips :typing)
            (:types block)
            (:predicates (on ?x - block ?y - block) (clear ?x - block))
            (:action stack :parameters (?x - block ?y - block)
              :precondition (clear ?y)
              :effect (and (on ?x ?y) (not (clear ?y)))))";
        let forms = parse_sexprs("t", src).unwrap();
        let domain = parse_domain("t", &forms).unwrap();
        assert_eq!(domain.name, "d");
        assert_eq!(domain.predicates.len(), 2);
        assert_eq!(domain.actions.len(), 1);
        assert_eq!(domain.actions[0].params.len(), 2);
    }

    #[test]
    fn parses_minimal_problem() {
        let src = "(define (problem p) (:domain d)
            (:objects a b - block)
            (:init (on a b) (= (total-cost) 0))
            (:goal (and (clear a)))
            (:metric minimize (total-cost)))";
        let forms = parse_sexprs("t", src).unwrap();
        let problem = parse_problem("t", &forms).unwrap();
        assert_eq!(problem.domain_name, "d");
        assert_eq!(problem.objects.len(), 2);
        assert_eq!(problem.init.len(), 2);
        assert!(problem.metric.is_some());
    }

    #[test]
    fn extracts_total_cost_effect_as_schema_cost() {
        let src = "(define (domain d) (:predicates (p))
            (:action a :parameters () :precondition (p)
              :effect (and (not (p)) (increase (total-cost) 1))))";
        let forms = parse_sexprs("t", src).unwrap();
        let domain = parse_domain("t", &forms).unwrap();
        assert!(domain.actions[0].cost.is_some());
        assert!(matches!(domain.actions[0].effect, Eff::And(ref parts) if parts.len() == 1));
    }
}

//! Lowers the surface [`crate::ast`] tree into `mimir-formalism`'s
//! dense-index representation: interns every name into its repository,
//! assigns `Variable`s their parameter index via
//! [`mimir_formalism::translator::parameter_index::ParameterScope`],
//! and runs the translator pipeline (NNF, OR/FORALL elimination via
//! axiom introduction, flattening) on every precondition/effect
//! condition/axiom body.
//!
//! Object equality (`(= ?x ?y)`) is modelled as a
//! built-in static predicate `=` whose extension is the reflexive
//! diagonal over every object — an ordinary static binary literal from
//! every downstream component's point of view, so the existing
//! consistency-graph/assignment-set machinery handles it with no further code.

use crate::ast::*;
use crate::error::{PddlError, Result};
use mimir_formalism::translator::parameter_index::ParameterScope;
use mimir_formalism::translator::{eliminate_or_forall, flatten, Formula};
use mimir_formalism::{
    ActionSchema, Axiom, BinaryOp, Comparator, ConditionalEffect, ConjunctiveCondition, ConjunctiveEffect, Domain, FunctionCategory, GroundAtom,
    InitialNumericValue, Metric, MetricDirection, NumericConstraint, NumericEffect, NumericEffectKind, NumericExpression, PddlRepositories,
    PredicateCategory, Problem, Term as FTerm, TypeIndex, Variable,
};
use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

const EQUALITY_PREDICATE: &str = "=";

struct Env<'a> {
    base: &'a ParameterScope,
    next_var: u32,
    stack: Vec<(String, Variable)>,
}

impl<'a> Env<'a> {
    fn new(base: &'a ParameterScope) -> Self {
        Env {
            base,
            next_var: base.len() as u32,
            stack: Vec::new(),
        }
    }

    fn lookup(&self, name: &str) -> Option<Variable> {
        self.stack.iter().rev().find(|(n, _)| n == name).map(|(_, v)| *v).or_else(|| self.base.get(name))
    }

    fn push_fresh(&mut self, names: &[TypedName]) -> Vec<Variable> {
        names
            .iter()
            .map(|t| {
                let v = Variable::new(self.next_var);
                self.next_var += 1;
                self.stack.push((t.name.clone(), v));
                v
            })
            .collect()
    }

    fn pop(&mut self, n: usize) {
        for _ in 0..n {
            self.stack.pop();
        }
    }
}

/// A schema/axiom-local naming scope: variable name -> dense index,
/// plus the parallel declared-type list the consistency graph needs to
/// test whether an object is compatible with a parameter's type.
struct Scope {
    vars: ParameterScope,
    types: Vec<SmallVec<[TypeIndex; 1]>>,
}

impl Scope {
    fn new() -> Self {
        Scope { vars: ParameterScope::new(), types: Vec::new() }
    }

    fn nested(&self) -> Scope {
        Scope {
            vars: ParameterScope::nested(&self.vars),
            types: self.types.clone(),
        }
    }

    fn bind(&mut self, name: &str, types: SmallVec<[TypeIndex; 1]>) -> Variable {
        let v = self.vars.bind(name);
        if v.parameter_index as usize == self.types.len() {
            self.types.push(types);
        }
        v
    }

    fn variables(&self) -> Vec<Variable> {
        self.vars.clone().into_variables()
    }
}

pub struct Lowerer {
    pub repos: PddlRepositories,
    types_by_name: HashMap<String, TypeIndex>,
    predicate_index: HashMap<String, mimir_formalism::PredicateIndex>,
    predicate_param_types: HashMap<String, Vec<SmallVec<[TypeIndex; 1]>>>,
    function_index: HashMap<String, mimir_formalism::FunctionIndex>,
    equality_predicate: mimir_formalism::PredicateIndex,
    next_derived_id: u32,
}

impl Lowerer {
    pub fn new() -> Self {
        let mut repos = PddlRepositories::new();
        let object_ty = repos.types.add("object", None);
        let mut types_by_name = HashMap::new();
        types_by_name.insert("object".to_string(), object_ty);
        let equality_predicate = repos.predicates.add(EQUALITY_PREDICATE, 2, PredicateCategory::Static);
        Lowerer {
            repos,
            types_by_name,
            predicate_index: HashMap::new(),
            predicate_param_types: HashMap::new(),
            function_index: HashMap::new(),
            equality_predicate,
            next_derived_id: 0,
        }
    }

    fn resolve_type(&self, source: &str, name: &str) -> Result<TypeIndex> {
        self.types_by_name.get(name).copied().ok_or_else(|| PddlError::UnknownType(source.to_string(), name.to_string()))
    }

    fn resolve_types(&self, source: &str, names: &[String]) -> Result<SmallVec<[TypeIndex; 1]>> {
        names.iter().map(|n| self.resolve_type(source, n)).collect()
    }

    /// Adds every declared type, resolving forward references by
    /// iterating to a fixpoint (PDDL does not require parents to be
    /// declared before their children).
    fn lower_types(&mut self, source: &str, types: &[(String, Option<String>)]) -> Result<()> {
        let mut remaining: Vec<&(String, Option<String>)> = types.iter().collect();
        for (name, _) in types {
            if !self.types_by_name.contains_key(name) {
                // Reserve nothing yet; real insertion happens once the parent is known.
            }
        }
        let mut progress = true;
        while !remaining.is_empty() && progress {
            progress = false;
            remaining.retain(|(name, parent)| {
                if self.types_by_name.contains_key(name) {
                    return false;
                }
                let parent_idx = match parent {
                    None => Some(self.types_by_name["object"]),
                    Some(p) => self.types_by_name.get(p).copied(),
                };
                if let Some(parent_idx) = parent_idx {
                    let idx = self.repos.types.add(name.clone(), Some(parent_idx));
                    self.types_by_name.insert(name.clone(), idx);
                    progress = true;
                    false
                } else {
                    true
                }
            });
        }
        if let Some((name, parent)) = remaining.first() {
            return Err(PddlError::UnknownType(source.to_string(), parent.clone().unwrap_or_else(|| name.clone())));
        }
        Ok(())
    }

    fn lower_objects(&mut self, source: &str, objects: &[TypedName]) -> Result<Vec<mimir_formalism::ObjectIndex>> {
        objects
            .iter()
            .map(|o| {
                let types = if o.types.is_empty() {
                    SmallVec::from_elem(self.types_by_name["object"], 1)
                } else {
                    self.resolve_types(source, &o.types)?
                };
                Ok(self.repos.objects.add(o.name.clone(), types))
            })
            .collect()
    }

    fn resolve_term(&self, source: &str, term: &Term, env: &Env) -> Result<FTerm> {
        match term {
            Term::Var(name) => env
                .lookup(name)
                .map(FTerm::Variable)
                .ok_or_else(|| PddlError::UnboundVariable(source.to_string(), name.clone())),
            Term::Name(name) => self
                .repos
                .objects
                .by_name(name)
                .map(FTerm::Object)
                .ok_or_else(|| PddlError::UnknownObject(source.to_string(), name.clone())),
        }
    }

    fn resolve_predicate(&self, source: &str, name: &str) -> Result<mimir_formalism::PredicateIndex> {
        self.predicate_index.get(name).copied().ok_or_else(|| PddlError::UnknownPredicate(source.to_string(), name.to_string()))
    }

    fn resolve_function(&self, source: &str, name: &str) -> Result<mimir_formalism::FunctionIndex> {
        self.function_index.get(name).copied().ok_or_else(|| PddlError::UnknownFunction(source.to_string(), name.to_string()))
    }

    fn lower_expr(&self, source: &str, expr: &Expr, env: &Env) -> Result<NumericExpression> {
        match expr {
            Expr::Number(n) => Ok(NumericExpression::constant(*n)),
            Expr::Func(name, args) => {
                let function = self.resolve_function(source, name)?;
                let terms = args.iter().map(|t| self.resolve_term(source, t, env)).collect::<Result<SmallVec<[FTerm; 4]>>>()?;
                Ok(NumericExpression::Function { function, terms })
            }
            Expr::Binary(op, lhs, rhs) => {
                let op = match op {
                    BinOp::Add => BinaryOp::Add,
                    BinOp::Sub => BinaryOp::Sub,
                    BinOp::Mul => BinaryOp::Mul,
                    BinOp::Div => BinaryOp::Div,
                };
                Ok(NumericExpression::binary(op, self.lower_expr(source, lhs, env)?, self.lower_expr(source, rhs, env)?))
            }
        }
    }

    fn lower_gd(&self, source: &str, gd: &Gd, env: &mut Env) -> Result<Formula> {
        match gd {
            Gd::True => Ok(Formula::And(Vec::new())),
            Gd::Atom(name, args) => {
                let predicate = self.resolve_predicate(source, name)?;
                let terms = args.iter().map(|t| self.resolve_term(source, t, env)).collect::<Result<SmallVec<[FTerm; 4]>>>()?;
                Ok(Formula::Atom(mimir_formalism::LiftedAtom::new(predicate, terms)))
            }
            Gd::Equal(a, b) => {
                let terms: SmallVec<[FTerm; 4]> = SmallVec::from_vec(vec![self.resolve_term(source, a, env)?, self.resolve_term(source, b, env)?]);
                Ok(Formula::Atom(mimir_formalism::LiftedAtom::new(self.equality_predicate, terms)))
            }
            Gd::Not(inner) => Ok(Formula::Not(Box::new(self.lower_gd(source, inner, env)?))),
            Gd::And(parts) => Ok(Formula::And(parts.iter().map(|p| self.lower_gd(source, p, env)).collect::<Result<_>>()?)),
            Gd::Or(parts) => Ok(Formula::Or(parts.iter().map(|p| self.lower_gd(source, p, env)).collect::<Result<_>>()?)),
            Gd::Forall(vars, inner) => {
                let bound = env.push_fresh(vars);
                let body = self.lower_gd(source, inner, env)?;
                env.pop(vars.len());
                Ok(Formula::ForAll(bound, Box::new(body)))
            }
            Gd::Exists(vars, inner) => {
                let bound = env.push_fresh(vars);
                let body = self.lower_gd(source, inner, env)?;
                env.pop(vars.len());
                Ok(Formula::Exists(bound, Box::new(body)))
            }
            Gd::Compare(op, lhs, rhs) => {
                let comparator = match op {
                    CompareOp::Gt => Comparator::Gt,
                    CompareOp::Ge => Comparator::Ge,
                    CompareOp::Lt => Comparator::Lt,
                    CompareOp::Le => Comparator::Le,
                    CompareOp::Eq => Comparator::Eq,
                };
                Ok(Formula::Numeric(NumericConstraint {
                    comparator,
                    lhs: self.lower_expr(source, lhs, env)?,
                    rhs: self.lower_expr(source, rhs, env)?,
                }))
            }
        }
    }

    /// Lowers `gd` into a fully flattened [`ConjunctiveCondition`] rooted
    /// at `scope`'s current parameters, running the full translator
    /// pipeline: NNF, OR/FORALL elimination (appending any introduced
    /// axioms to `axioms_out`), then flattening.
    fn lower_condition(&mut self, source: &str, gd: &Gd, scope: &Scope, axioms_out: &mut Vec<Axiom>) -> Result<ConjunctiveCondition> {
        let mut env = Env::new(&scope.vars);
        let formula = self.lower_gd(source, gd, &mut env)?;
        let nnf = mimir_formalism::translator::nnf::to_nnf(formula);
        let eliminated = eliminate_or_forall(nnf, &mut self.repos.predicates, &mut self.next_derived_id, axioms_out);
        Ok(flatten(eliminated, &self.repos.predicates, scope.variables(), scope.types.clone()))
    }

    fn build_atom_effect(&self, source: &str, positive: bool, name: &str, args: &[Term], env: &Env) -> Result<mimir_formalism::AtomEffect> {
        let predicate = self.resolve_predicate(source, name)?;
        let terms = args.iter().map(|t| self.resolve_term(source, t, env)).collect::<Result<SmallVec<[FTerm; 4]>>>()?;
        let atom = mimir_formalism::LiftedAtom::new(predicate, terms);
        Ok(if positive {
            mimir_formalism::AtomEffect::Add(atom)
        } else {
            mimir_formalism::AtomEffect::Delete(atom)
        })
    }

    fn build_numeric_effect(&self, source: &str, kind: NumKind, func: &str, args: &[Term], expr: &Expr, env: &Env) -> Result<NumericEffect> {
        let function = self.resolve_function(source, func)?;
        let function_terms = args.iter().map(|t| self.resolve_term(source, t, env)).collect::<Result<SmallVec<[FTerm; 4]>>>()?;
        let kind = match kind {
            NumKind::Assign => NumericEffectKind::Assign,
            NumKind::Increase => NumericEffectKind::Increase,
            NumKind::Decrease => NumericEffectKind::Decrease,
            NumKind::ScaleUp => NumericEffectKind::ScaleUp,
            NumKind::ScaleDown => NumericEffectKind::ScaleDown,
        };
        Ok(NumericEffect {
            kind,
            function,
            function_terms,
            operand: self.lower_expr(source, expr, env)?,
        })
    }

    /// Collects plain (non-conditional) atom/numeric effects under
    /// `scope` into `bundle`; `when`/`forall` nested inside another
    /// `when`/`forall` are rejected as unsupported.
    fn collect_plain_effects(&self, source: &str, eff: &Eff, scope: &Scope, bundle: &mut ConjunctiveEffect) -> Result<()> {
        let env = Env::new(&scope.vars);
        match eff {
            Eff::NoOp => Ok(()),
            Eff::And(parts) => {
                for p in parts {
                    self.collect_plain_effects(source, p, scope, bundle)?;
                }
                Ok(())
            }
            Eff::Atom(positive, name, args) => {
                bundle.atom_effects.push(self.build_atom_effect(source, *positive, name, args, &env)?);
                Ok(())
            }
            Eff::Numeric(kind, func, args, expr) => {
                bundle.numeric_effects.push(self.build_numeric_effect(source, *kind, func, args, expr, &env)?);
                Ok(())
            }
            Eff::When(_, _) | Eff::Forall(_, _) => Err(PddlError::UnsupportedFeature(source.to_string(), "doubly-nested conditional effect".to_string())),
        }
    }

    /// Lowers one action's `:effect` body into its unconditional bundle
    /// plus a list of conditional effects.
    fn lower_effect(&mut self, source: &str, eff: &Eff, scope: &Scope, axioms_out: &mut Vec<Axiom>, unconditional: &mut ConjunctiveEffect, conditionals: &mut Vec<ConditionalEffect>) -> Result<()> {
        match eff {
            Eff::NoOp => Ok(()),
            Eff::And(parts) => {
                for p in parts {
                    self.lower_effect(source, p, scope, axioms_out, unconditional, conditionals)?;
                }
                Ok(())
            }
            Eff::Atom(_, _, _) | Eff::Numeric(_, _, _, _) => self.collect_plain_effects(source, eff, scope, unconditional),
            Eff::When(cond, body) => {
                let condition = self.lower_condition(source, cond, scope, axioms_out)?;
                let mut bundle = ConjunctiveEffect::new();
                self.collect_plain_effects(source, body, scope, &mut bundle)?;
                conditionals.push(ConditionalEffect { condition, effect: bundle });
                Ok(())
            }
            Eff::Forall(vars, body) => {
                let mut nested = scope.nested();
                for v in vars {
                    let types = if v.types.is_empty() {
                        SmallVec::new()
                    } else {
                        self.resolve_types(source, &v.types)?
                    };
                    nested.bind(&v.name, types);
                }
                match body.as_ref() {
                    Eff::When(cond, inner) => {
                        let condition = self.lower_condition(source, cond, &nested, axioms_out)?;
                        let mut bundle = ConjunctiveEffect::new();
                        self.collect_plain_effects(source, inner, &nested, &mut bundle)?;
                        conditionals.push(ConditionalEffect { condition, effect: bundle });
                    }
                    _ => {
                        let condition = self.lower_condition(source, &Gd::True, &nested, axioms_out)?;
                        let mut bundle = ConjunctiveEffect::new();
                        self.collect_plain_effects(source, body, &nested, &mut bundle)?;
                        conditionals.push(ConditionalEffect { condition, effect: bundle });
                    }
                }
                Ok(())
            }
        }
    }

    fn lower_action(&mut self, source: &str, action: &ActionDecl, axioms_out: &mut Vec<Axiom>) -> Result<ActionSchema> {
        let mut scope = Scope::new();
        for p in &action.params {
            let types = if p.types.is_empty() { SmallVec::new() } else { self.resolve_types(source, &p.types)? };
            scope.bind(&p.name, types);
        }
        let precondition = self.lower_condition(source, &action.precondition, &scope, axioms_out)?;
        let mut unconditional = ConjunctiveEffect::new();
        let mut conditionals = Vec::new();
        self.lower_effect(source, &action.effect, &scope, axioms_out, &mut unconditional, &mut conditionals)?;
        if !unconditional.atom_effects.is_empty() || !unconditional.numeric_effects.is_empty() {
            conditionals.push(ConditionalEffect {
                condition: ConjunctiveCondition::new(scope.variables(), scope.types.clone()),
                effect: unconditional,
            });
        }
        let env = Env::new(&scope.vars);
        let cost = action.cost.as_ref().map(|e| self.lower_expr(source, e, &env)).transpose()?;
        Ok(ActionSchema {
            name: action.name.clone(),
            parameters: scope.variables(),
            precondition,
            effects: conditionals,
            cost,
        })
    }

    fn lower_derived(&mut self, source: &str, derived: &DerivedDecl, axioms_out: &mut Vec<Axiom>) -> Result<Axiom> {
        let predicate = self.resolve_predicate(source, &derived.head_predicate)?;
        let declared_types = self.predicate_param_types.get(&derived.head_predicate).cloned();
        let mut scope = Scope::new();
        for (i, p) in derived.head_params.iter().enumerate() {
            let types = if !p.types.is_empty() {
                self.resolve_types(source, &p.types)?
            } else if let Some(dt) = declared_types.as_ref().and_then(|d| d.get(i)) {
                dt.clone()
            } else {
                SmallVec::new()
            };
            scope.bind(&p.name, types);
        }
        let precondition = self.lower_condition(source, &derived.body, &scope, axioms_out)?;
        let head_terms: SmallVec<[FTerm; 4]> = scope.variables().into_iter().map(FTerm::Variable).collect();
        Ok(Axiom {
            parameters: scope.variables(),
            precondition,
            head: mimir_formalism::LiftedAtom::new(predicate, head_terms),
        })
    }

    /// Determines each declared predicate's category: a
    /// derived axiom's head is `Derived`; a predicate any action effect
    /// mentions is `Fluent`; everything else is `Static`.
    fn categorize_predicates(domain: &DomainAst) -> HashMap<String, PredicateCategory> {
        let mut derived_heads: HashSet<&str> = HashSet::new();
        for d in &domain.derived {
            derived_heads.insert(d.head_predicate.as_str());
        }
        let mut fluent_names: HashSet<String> = HashSet::new();
        fn walk_eff(eff: &Eff, out: &mut HashSet<String>) {
            match eff {
                Eff::Atom(_, name, _) => {
                    out.insert(name.clone());
                }
                Eff::And(parts) => parts.iter().for_each(|p| walk_eff(p, out)),
                Eff::Forall(_, inner) | Eff::When(_, inner) => walk_eff(inner, out),
                Eff::NoOp | Eff::Numeric(_, _, _, _) => {}
            }
        }
        for action in &domain.actions {
            walk_eff(&action.effect, &mut fluent_names);
        }
        domain
            .predicates
            .iter()
            .map(|p| {
                let category = if derived_heads.contains(p.name.as_str()) {
                    PredicateCategory::Derived
                } else if fluent_names.contains(&p.name) {
                    PredicateCategory::Fluent
                } else {
                    PredicateCategory::Static
                };
                (p.name.clone(), category)
            })
            .collect()
    }

    fn categorize_functions(domain: &DomainAst) -> HashSet<String> {
        let mut fluent_names: HashSet<String> = HashSet::new();
        fn walk_eff(eff: &Eff, out: &mut HashSet<String>) {
            match eff {
                Eff::Numeric(_, name, _, _) => {
                    out.insert(name.clone());
                }
                Eff::And(parts) => parts.iter().for_each(|p| walk_eff(p, out)),
                Eff::Forall(_, inner) | Eff::When(_, inner) => walk_eff(inner, out),
                Eff::NoOp | Eff::Atom(_, _, _) => {}
            }
        }
        for action in &domain.actions {
            walk_eff(&action.effect, &mut fluent_names);
        }
        fluent_names
    }

    /// Lowers a parsed domain into a [`Domain`], populating `self.repos`
    /// with every type/object/predicate/function it declares. Also
    /// returns the axioms synthesized by OR/FORALL elimination, already
    /// merged with the domain's own `:derived` axioms.
    pub fn lower_domain(&mut self, source: &str, domain: &DomainAst) -> Result<Domain> {
        self.lower_types(source, &domain.types)?;
        self.lower_objects(source, &domain.constants)?;

        let categories = Self::categorize_predicates(domain);
        let fluent_functions = Self::categorize_functions(domain);

        for p in &domain.predicates {
            let category = categories[&p.name];
            let idx = self.repos.predicates.add(p.name.clone(), p.params.len(), category);
            self.predicate_index.insert(p.name.clone(), idx);
            let types = p
                .params
                .iter()
                .map(|t| if t.types.is_empty() { Ok(SmallVec::new()) } else { self.resolve_types(source, &t.types) })
                .collect::<Result<Vec<_>>>()?;
            self.predicate_param_types.insert(p.name.clone(), types);
        }
        for f in &domain.functions {
            let category = if fluent_functions.contains(&f.name) { FunctionCategory::Fluent } else { FunctionCategory::Auxiliary };
            let idx = self.repos.functions.add(f.name.clone(), f.params.len(), category);
            self.function_index.insert(f.name.clone(), idx);
        }

        let mut axioms = Vec::new();
        let mut action_schemas = Vec::new();
        for a in &domain.actions {
            action_schemas.push(self.lower_action(source, a, &mut axioms)?);
        }
        for d in &domain.derived {
            let axiom = self.lower_derived(source, d, &mut axioms)?;
            axioms.push(axiom);
        }

        let mut out = Domain::new(domain.name.clone());
        for a in action_schemas {
            out.action_schemas.push(a);
        }
        for ax in axioms {
            out.axioms.push(ax);
        }
        Ok(out)
    }

    /// Lowers a parsed problem over an already-lowered domain (sharing
    /// `self.repos`): interns the problem's own objects, computes the
    /// equality predicate's reflexive extension over every object now
    /// known, and lowers init/goal/metric.
    pub fn lower_problem(&mut self, source: &str, problem_ast: &ProblemAst) -> Result<Problem> {
        let object_indices = self.lower_objects(source, &problem_ast.objects)?;

        let mut problem = Problem::new(problem_ast.name.clone());
        problem.objects = object_indices;

        let all_objects: Vec<mimir_formalism::ObjectIndex> = self.repos.objects.iter().map(|(idx, _)| idx).collect();
        for idx in all_objects {
            problem
                .initial_static_atoms
                .push(GroundAtom::new(self.equality_predicate, SmallVec::from_vec(vec![idx, idx])));
        }

        for fact in &problem_ast.init {
            match fact {
                InitFact::Atom(name, args) => {
                    let predicate = self.resolve_predicate(source, name)?;
                    let objects = args
                        .iter()
                        .map(|a| self.repos.objects.by_name(a).ok_or_else(|| PddlError::UnknownObject(source.to_string(), a.clone())))
                        .collect::<Result<SmallVec<[mimir_formalism::ObjectIndex; 4]>>>()?;
                    let ground = GroundAtom::new(predicate, objects);
                    let category = self.repos.predicates.get(predicate).category;
                    match category {
                        PredicateCategory::Static => problem.initial_static_atoms.push(ground),
                        PredicateCategory::Fluent => problem.initial_fluent_atoms.push(ground),
                        PredicateCategory::Derived => {
                            return Err(PddlError::UnsupportedFeature(source.to_string(), format!("derived atom `{name}` in :init")));
                        }
                    }
                }
                InitFact::NumericAssign(func, args, value) => {
                    let function = self.resolve_function(source, func)?;
                    let objects = args
                        .iter()
                        .map(|a| self.repos.objects.by_name(a).ok_or_else(|| PddlError::UnknownObject(source.to_string(), a.clone())))
                        .collect::<Result<SmallVec<[mimir_formalism::ObjectIndex; 4]>>>()?;
                    problem.initial_numeric_values.push(InitialNumericValue {
                        function,
                        arguments: objects,
                        value: *value,
                    });
                }
            }
        }

        let empty_scope = Scope::new();
        let mut unused_axioms = Vec::new();
        let goal_gd = problem_ast.goal.clone().unwrap_or(Gd::True);
        problem.goal = self.lower_condition(source, &goal_gd, &empty_scope, &mut unused_axioms)?;
        if !unused_axioms.is_empty() {
            return Err(PddlError::UnsupportedFeature(source.to_string(), "disjunctive/universally-quantified goal".to_string()));
        }

        if let Some((dir, expr)) = &problem_ast.metric {
            let env = Env::new(&empty_scope.vars);
            problem.metric = Some(Metric {
                direction: match dir {
                    MetricDir::Minimize => MetricDirection::Minimize,
                    MetricDir::Maximize => MetricDirection::Maximize,
                },
                expression: self.lower_expr(source, expr, &env)?,
            });
        }

        Ok(problem)
    }
}

impl Default for Lowerer {
    fn default() -> Self {
        Self::new()
    }
}

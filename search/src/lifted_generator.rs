//! Lifted applicable-action generator: per-schema binding
//! generators over the shared dynamic assignment set, backed by a
//! per-schema grounding cache so that the (expensive) instantiation of
//! a schema's conditional effects only happens once per distinct
//! binding — in practice the overwhelming majority of bindings recur
//! across states.
//!
//! `applicable_actions` is contractually a lazy, cooperatively
//! suspending sequence. [`BindingGenerator`] itself is a
//! true lazy `Iterator`; chaining one per schema while also mutating
//! this generator's grounding cache as bindings are consumed needs
//! either a hand-rolled state machine or trait objects with internal
//! mutability. We take the simpler, still-correct route: one state's
//! worth of applicable actions is computed eagerly into a `Vec`.
//! Cancellation is then just dropping that `Vec`'s iterator early;
//! nothing in this system's ordering or suspension guarantees depends
//! on any per-binding frame surviving between states.

use crate::assignment_set::AssignmentSet;
use crate::binding_generator::BindingGenerator;
use crate::consistency_graph::StaticConsistencyGraph;
use crate::ground::{effect_family_conflict, ground_numeric_constraint, ground_numeric_expression, GroundAction, GroundCondition, GroundConditionalEffect, GroundConjunctiveEffect, GroundNumericEffect, UNIT_COST};
use crate::view::StateView;
use fixedbitset::FixedBitSet;
use hashbrown::{HashMap, HashSet};
use mimir_collections::{Idx, RefVec};
use mimir_formalism::{
    ActionIndex, ActionSchema, ConditionalEffect, ConjunctiveCondition, Domain, GroundActionIndex, GroundAtom, GroundAtomRepositories, GroundFunctionIndex, GroundFunctionRepository, ObjectIndex,
    PddlRepositories, PredicateCategory, PredicateRepository, Term,
};
use smallvec::SmallVec;

/// Precomputed per-schema state: the schema's own static consistency
/// graph, one per conditional effect (built over that effect's
/// possibly-wider parameter list, for universally-quantified effects),
/// and the binding -> ground-action memo.
struct SchemaEntry {
    precondition_graph: StaticConsistencyGraph,
    effect_graphs: Vec<StaticConsistencyGraph>,
    cache: HashMap<SmallVec<[ObjectIndex; 4]>, GroundActionIndex>,
}

pub struct LiftedApplicableActionGenerator {
    schemas: RefVec<ActionIndex, SchemaEntry>,
    ground_actions: RefVec<GroundActionIndex, GroundAction>,
}

impl LiftedApplicableActionGenerator {
    /// Builds the per-schema static consistency graphs once per problem.
    pub fn new(domain: &Domain, repos: &PddlRepositories, num_objects: usize, static_assignment_set: &AssignmentSet) -> Self {
        let object_is_type_compatible = |object: u32, declared: &[mimir_formalism::TypeIndex]| {
            let obj = repos.objects.get(ObjectIndex::new(object));
            declared.iter().any(|&t| obj.types.iter().any(|&ot| repos.types.is_subtype_of(ot, t)))
        };

        let mut schemas = RefVec::new();
        for (_, schema) in domain.action_schemas.iter() {
            let precondition_graph = StaticConsistencyGraph::build(&schema.precondition, num_objects, &repos.predicates, &repos.types, static_assignment_set, object_is_type_compatible);
            let effect_graphs = schema
                .effects
                .iter()
                .map(|eff| StaticConsistencyGraph::build(&eff.condition, num_objects, &repos.predicates, &repos.types, static_assignment_set, object_is_type_compatible))
                .collect();
            schemas.push(SchemaEntry {
                precondition_graph,
                effect_graphs,
                cache: HashMap::new(),
            });
        }

        LiftedApplicableActionGenerator {
            schemas,
            ground_actions: RefVec::new(),
        }
    }

    pub fn ground_action(&self, index: GroundActionIndex) -> &GroundAction {
        &self.ground_actions[index]
    }

    pub fn num_ground_actions(&self) -> usize {
        self.ground_actions.len()
    }

    /// Every ground action whose precondition holds in the state
    /// described by `static_atoms`/`fluent_atoms`/`derived_atoms`/
    /// `numeric_values`: refreshes nothing itself — callers refresh
    /// `dynamic_assignment_set` from the state once and share it across
    /// every schema. `StateView`s over that state are built internally,
    /// scoped tightly around each binding-generator call, so that the
    /// repositories they borrow from `repos` never overlap the `&mut
    /// repos` grounding needs between calls.
    #[allow(clippy::too_many_arguments)]
    pub fn applicable_actions(
        &mut self,
        domain: &Domain,
        repos: &mut PddlRepositories,
        dynamic_assignment_set: &AssignmentSet,
        static_atoms: &HashSet<GroundAtom>,
        fluent_atoms: &FixedBitSet,
        derived_atoms: &FixedBitSet,
        numeric_values: &[f64],
        numeric_relaxed: bool,
    ) -> Vec<GroundActionIndex> {
        let mut result = Vec::new();
        for (schema_idx, schema) in domain.action_schemas.iter() {
            let bindings: Vec<Vec<ObjectIndex>> = {
                let entry = &self.schemas[schema_idx];
                let view = StateView {
                    predicates: &repos.predicates,
                    ground_atoms: &repos.ground_atoms,
                    ground_functions: &repos.ground_functions,
                    static_atoms,
                    fluent_atoms,
                    derived_atoms,
                    numeric_values,
                    numeric_relaxed,
                };
                BindingGenerator::new(&schema.precondition, &repos.predicates, &entry.precondition_graph, dynamic_assignment_set, &view).collect()
            };
            for binding in bindings {
                let key: SmallVec<[ObjectIndex; 4]> = binding.iter().copied().collect();
                let cached = self.schemas[schema_idx].cache.get(&key).copied();
                let ground_index = if let Some(idx) = cached {
                    Some(idx)
                } else {
                    let effect_graphs = self.schemas[schema_idx].effect_graphs.clone();
                    let ground_action = materialize(
                        schema_idx,
                        schema,
                        &binding,
                        &effect_graphs,
                        repos,
                        dynamic_assignment_set,
                        static_atoms,
                        fluent_atoms,
                        derived_atoms,
                        numeric_values,
                        numeric_relaxed,
                    );
                    if let Some(function) = effect_family_conflict(&ground_action) {
                        tracing::warn!(schema = %schema.name, ?binding, ?function, "skipping ground action: conflicting numeric effect families on the same function");
                        None
                    } else {
                        let idx = self.ground_actions.push(ground_action);
                        self.schemas[schema_idx].cache.insert(key, idx);
                        Some(idx)
                    }
                };
                if let Some(ground_index) = ground_index {
                    result.push(ground_index);
                }
            }
        }
        result
    }

    /// Exposes a schema's precomputed conditional-effect consistency
    /// graphs so the grounded generator's final (non-relaxed) grounding
    /// pass can re-materialize an already-known-reachable binding
    /// without rebuilding them.
    pub fn schema_effect_graphs(&self, schema_idx: ActionIndex) -> &[StaticConsistencyGraph] {
        &self.schemas[schema_idx].effect_graphs
    }
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn materialize(
    schema_idx: ActionIndex,
    schema: &ActionSchema,
    binding: &[ObjectIndex],
    effect_graphs: &[StaticConsistencyGraph],
    repos: &mut PddlRepositories,
    dynamic_assignment_set: &AssignmentSet,
    static_atoms: &HashSet<GroundAtom>,
    fluent_atoms: &FixedBitSet,
    derived_atoms: &FixedBitSet,
    numeric_values: &[f64],
    numeric_relaxed: bool,
) -> GroundAction {
    let precondition = ground_condition(&schema.precondition, binding, &repos.predicates, &mut repos.ground_atoms, &repos.ground_functions);

    let mut effects = Vec::with_capacity(schema.effects.len());
    for (cond_effect, graph) in schema.effects.iter().zip(effect_graphs) {
        let extra_arity = cond_effect.condition.parameters.len().saturating_sub(schema.arity());
        if extra_arity == 0 {
            effects.push(ground_one_effect(cond_effect, binding, &repos.predicates, &mut repos.ground_atoms, &repos.ground_functions));
            continue;
        }
        let fixed: Vec<Option<u32>> = (0..cond_effect.condition.parameters.len())
            .map(|p| if p < schema.arity() { Some(binding[p].raw()) } else { None })
            .collect();
        let restricted = graph.restrict_fixed(&fixed);
        let extra_bindings: Vec<Vec<ObjectIndex>> = {
            let view = StateView {
                predicates: &repos.predicates,
                ground_atoms: &repos.ground_atoms,
                ground_functions: &repos.ground_functions,
                static_atoms,
                fluent_atoms,
                derived_atoms,
                numeric_values,
                numeric_relaxed,
            };
            BindingGenerator::new(&cond_effect.condition, &repos.predicates, &restricted, dynamic_assignment_set, &view).collect()
        };
        for extra in extra_bindings {
            effects.push(ground_one_effect(cond_effect, &extra, &repos.predicates, &mut repos.ground_atoms, &repos.ground_functions));
        }
    }

    let cost = schema
        .cost
        .as_ref()
        .map(|expr| ground_numeric_expression(expr, binding, &repos.ground_functions))
        .unwrap_or(UNIT_COST);

    GroundAction {
        schema: schema_idx,
        objects: binding.iter().copied().collect(),
        precondition,
        effects,
        cost,
    }
}

fn ground_terms(terms: &[Term], binding: &[ObjectIndex]) -> SmallVec<[ObjectIndex; 4]> {
    terms
        .iter()
        .map(|t| match t {
            Term::Object(o) => *o,
            Term::Variable(v) => binding[v.parameter_index as usize],
        })
        .collect()
}

fn ground_one_effect(
    cond_effect: &ConditionalEffect,
    binding: &[ObjectIndex],
    predicates: &PredicateRepository,
    ground_atoms: &mut GroundAtomRepositories,
    ground_functions: &GroundFunctionRepository,
) -> GroundConditionalEffect {
    let condition = ground_condition(&cond_effect.condition, binding, predicates, ground_atoms, ground_functions);

    let mut add_effects = Vec::new();
    let mut delete_effects = Vec::new();
    for atom_effect in &cond_effect.effect.atom_effects {
        let atom = atom_effect.atom();
        let ground_atom = atom.ground(binding);
        let category = predicates.get(atom.predicate).category;
        let pool = ground_atoms.categories.get_mut(category);
        let idx = pool.push(ground_atom);
        if atom_effect.is_add() {
            add_effects.push(idx);
        } else {
            delete_effects.push(idx);
        }
    }

    let numeric_effects = cond_effect
        .effect
        .numeric_effects
        .iter()
        .map(|e| {
            let args = ground_terms(&e.function_terms, binding);
            let function = ground_functions.get_ref(e.function, &args).unwrap_or_else(GroundFunctionIndex::absent);
            GroundNumericEffect {
                kind: e.kind,
                function,
                operand: ground_numeric_expression(&e.operand, binding, ground_functions),
            }
        })
        .collect();

    GroundConditionalEffect {
        condition,
        effect: GroundConjunctiveEffect {
            add_effects,
            delete_effects,
            numeric_effects,
        },
    }
}

/// Grounds every literal of `condition` — nullary, unary/binary and
/// arity >= 3 alike — into the fluent/derived index pairs a
/// [`GroundCondition`] stores. Unlike [`crate::binding_generator::BindingGenerator::verify`],
/// which only re-checks what bitset consistency couldn't rule out
/// during enumeration, the stored ground precondition must stand on
/// its own: the match tree and state repository test it against a
/// state directly, without ever re-running the lifted binding search.
pub(crate) fn ground_condition(
    condition: &ConjunctiveCondition,
    binding: &[ObjectIndex],
    predicates: &PredicateRepository,
    ground_atoms: &mut GroundAtomRepositories,
    ground_functions: &GroundFunctionRepository,
) -> GroundCondition {
    let mut fluent_literals = Vec::new();
    let mut derived_literals = Vec::new();

    for literal in condition.nullary_literals.fluent.iter() {
        let idx = ground_atoms.categories.fluent.push(literal.atom.clone());
        fluent_literals.push((idx, literal.polarity));
    }
    for literal in condition.nullary_literals.derived.iter() {
        let idx = ground_atoms.categories.derived.push(literal.atom.clone());
        derived_literals.push((idx, literal.polarity));
    }

    for literal in condition.literals.iter_all() {
        let ground_atom = literal.atom.ground(binding);
        match predicates.get(literal.atom.predicate).category {
            PredicateCategory::Fluent => {
                let idx = ground_atoms.categories.fluent.push(ground_atom);
                fluent_literals.push((idx, literal.polarity));
            }
            PredicateCategory::Derived => {
                let idx = ground_atoms.categories.derived.push(ground_atom);
                derived_literals.push((idx, literal.polarity));
            }
            PredicateCategory::Static => {
                // Already guaranteed by the static consistency graph:
                // this binding would never have been produced
                // otherwise, so it need not be stored.
            }
        }
    }

    let numeric_constraints = condition.numeric_constraints.iter().map(|c| ground_numeric_constraint(c, binding, ground_functions)).collect();

    GroundCondition {
        fluent_literals,
        derived_literals,
        numeric_constraints,
    }
}

//! Static consistency graph: vertices are (parameter,
//! object) pairs compatible with the parameter's type and not ruled out
//! by a static unary literal; edges connect two vertices whose joint
//! assignment violates no static binary literal.

use crate::assignment_set::AssignmentSet;
use mimir_formalism::{ConjunctiveCondition, PredicateCategory, PredicateRepository, TypeRepository};

pub type VertexId = usize;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Vertex {
    pub id: VertexId,
    pub parameter: u32,
    pub object: u32,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Edge {
    pub src: VertexId,
    pub dst: VertexId,
}

/// An overapproximation of the actual per-state consistency graph,
/// built once from the static assignment set and static literals of a
/// single [`ConjunctiveCondition`] (an action schema's precondition or
/// a conditional effect's own condition).
#[derive(Clone, Debug, Default)]
pub struct StaticConsistencyGraph {
    pub arity: usize,
    pub vertices: Vec<Vertex>,
    pub edges: Vec<Edge>,
    /// Vertices partitioned by parameter index, ordered smallest-first.
    pub vertices_by_parameter: Vec<Vec<VertexId>>,
}

impl StaticConsistencyGraph {
    /// Builds the graph for `condition` over `num_objects` objects,
    /// using the precomputed static assignment set for unary/binary
    /// literal filtering. `object_has_type` answers "is object `o`
    /// compatible with type `t`" (delegates to `TypeRepository::is_subtype_of`
    /// against the object's declared types — left to the caller since
    /// objects live in a different repository than types).
    pub fn build(
        condition: &ConjunctiveCondition,
        num_objects: usize,
        predicates: &PredicateRepository,
        types: &TypeRepository,
        static_assignment_set: &AssignmentSet,
        object_is_type_compatible: impl Fn(u32, &[mimir_formalism::TypeIndex]) -> bool,
    ) -> Self {
        let arity = condition.parameters.len();
        let mut vertices = Vec::new();
        let mut vertices_by_parameter: Vec<Vec<VertexId>> = vec![Vec::new(); arity];

        for (param_idx, declared_types) in condition.parameter_types.iter().enumerate() {
            for object in 0..num_objects as u32 {
                if !declared_types.is_empty() && !object_is_type_compatible(object, declared_types) {
                    continue;
                }
                if violates_unary_static_literal(condition, predicates, static_assignment_set, param_idx as u32, object) {
                    continue;
                }
                let id = vertices.len();
                vertices.push(Vertex {
                    id,
                    parameter: param_idx as u32,
                    object,
                });
                vertices_by_parameter[param_idx].push(id);
            }
        }

        vertices_by_parameter.sort_by_key(|bucket| bucket.len());

        let mut edges = Vec::new();
        for i in 0..vertices.len() {
            for j in (i + 1)..vertices.len() {
                let a = vertices[i];
                let b = vertices[j];
                if a.parameter == b.parameter {
                    continue;
                }
                if violates_binary_static_literal(condition, predicates, static_assignment_set, a, b) {
                    continue;
                }
                edges.push(Edge { src: a.id, dst: b.id });
            }
        }

        let _ = types; // type compatibility is delegated to the caller closure above

        StaticConsistencyGraph {
            arity,
            vertices,
            edges,
            vertices_by_parameter,
        }
    }

    /// Restricts this graph so that every parameter in `fixed` (indexed
    /// by parameter position, `None` meaning "leave free") may only bind
    /// to the given object. Used when grounding a conditional effect's
    /// own (possibly wider) consistency graph once the owning schema's
    /// parameters are already bound — the effect's graph covers the schema's parameters
    /// plus any existential/forall witnesses, and only the witnesses
    /// still vary.
    pub fn restrict_fixed(&self, fixed: &[Option<u32>]) -> StaticConsistencyGraph {
        let mut vertices_by_parameter = self.vertices_by_parameter.clone();
        for bucket in &mut vertices_by_parameter {
            if bucket.is_empty() {
                continue;
            }
            let param = self.vertices[bucket[0]].parameter as usize;
            if let Some(Some(object)) = fixed.get(param) {
                bucket.retain(|&vid| self.vertices[vid].object == *object);
            }
        }
        StaticConsistencyGraph {
            arity: self.arity,
            vertices: self.vertices.clone(),
            edges: self.edges.clone(),
            vertices_by_parameter,
        }
    }
}

fn violates_unary_static_literal(
    condition: &ConjunctiveCondition,
    predicates: &PredicateRepository,
    assignment_set: &AssignmentSet,
    param_idx: u32,
    object: u32,
) -> bool {
    violates_unary_literal(condition, predicates, assignment_set, param_idx, object, &[PredicateCategory::Static])
}

fn violates_binary_static_literal(condition: &ConjunctiveCondition, predicates: &PredicateRepository, assignment_set: &AssignmentSet, a: Vertex, b: Vertex) -> bool {
    violates_binary_literal(condition, predicates, assignment_set, a, b, &[PredicateCategory::Static])
}

/// Does any unary literal over `categories` rule out binding `param_idx`
/// to `object` under `assignment_set`? Shared between the static-graph
/// build pass (categories = `[Static]`) and the binding generator's
/// per-state dynamic restriction pass (categories = `[Fluent, Derived]`).
pub fn violates_unary_literal(
    condition: &ConjunctiveCondition,
    predicates: &PredicateRepository,
    assignment_set: &AssignmentSet,
    param_idx: u32,
    object: u32,
    categories: &[PredicateCategory],
) -> bool {
    for literal in condition.unary_literals() {
        if !categories.contains(&predicates.get(literal.atom.predicate).category) {
            continue;
        }
        let term = &literal.atom.terms[0];
        let var = match term.as_variable() {
            Some(v) => v,
            None => continue,
        };
        if var.parameter_index != param_idx {
            continue;
        }
        let arity = predicates.get(literal.atom.predicate).arity;
        let consistent = assignment_set.is_consistent_unary(literal.atom.predicate, arity, 0, object);
        if literal.polarity != consistent {
            return true;
        }
    }
    false
}

/// Binary counterpart of [`violates_unary_literal`].
pub fn violates_binary_literal(condition: &ConjunctiveCondition, predicates: &PredicateRepository, assignment_set: &AssignmentSet, a: Vertex, b: Vertex, categories: &[PredicateCategory]) -> bool {
    for literal in condition.binary_literals() {
        if !categories.contains(&predicates.get(literal.atom.predicate).category) {
            continue;
        }
        let v0 = literal.atom.terms[0].as_variable();
        let v1 = literal.atom.terms[1].as_variable();
        let (v0, v1) = match (v0, v1) {
            (Some(v0), Some(v1)) => (v0, v1),
            _ => continue,
        };
        let (position_a, position_b) = if v0.parameter_index == a.parameter && v1.parameter_index == b.parameter {
            (0u32, 1u32)
        } else if v0.parameter_index == b.parameter && v1.parameter_index == a.parameter {
            (1u32, 0u32)
        } else {
            continue;
        };
        let arity = predicates.get(literal.atom.predicate).arity;
        let (oi, pi, oj, pj) = if position_a == 0 {
            (a.object, position_a, b.object, position_b)
        } else {
            (b.object, position_b, a.object, position_a)
        };
        let consistent = assignment_set.is_consistent_binary(literal.atom.predicate, arity, pi, oi, pj, oj);
        if literal.polarity != consistent {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimir_formalism::{Literal, LiftedAtom, Term, Variable};
    use smallvec::smallvec;

    #[test]
    fn unary_schema_has_no_edges() {
        let predicates = PredicateRepository::new();
        let types = TypeRepository::new();
        let condition = ConjunctiveCondition::new(vec![Variable::new(0)], vec![smallvec![]]);
        let assignment_set = AssignmentSet::new(3, &predicates, std::iter::empty());
        let graph = StaticConsistencyGraph::build(&condition, 3, &predicates, &types, &assignment_set, |_, _| true);
        assert_eq!(graph.vertices.len(), 3);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn positive_static_literal_filters_incompatible_objects() {
        let mut predicates = PredicateRepository::new();
        let holds = predicates.add("holds", 1, PredicateCategory::Static);
        let types = TypeRepository::new();
        let mut condition = ConjunctiveCondition::new(vec![Variable::new(0)], vec![smallvec![]]);
        condition
            .literals
            .static_
            .push(Literal::positive(LiftedAtom::new(holds, [Term::Variable(Variable::new(0))])));

        let atom = mimir_formalism::GroundAtom::new(holds, smallvec![mimir_formalism::ObjectIndex::new(0)]);
        let assignment_set = AssignmentSet::new(3, &predicates, [&atom]);

        let graph = StaticConsistencyGraph::build(&condition, 3, &predicates, &types, &assignment_set, |_, _| true);
        assert_eq!(graph.vertices.len(), 1);
        assert_eq!(graph.vertices[0].object, 0);
    }
}

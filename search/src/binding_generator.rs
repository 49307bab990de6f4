//! Satisficing binding generator: enumerates parameter→
//! object bindings of a conjunctive condition that hold in the current
//! state, via k-partite k-clique search on the consistency graph.
//!
//! The enumeration below is a direct explicit-stack backtracking search
//! with candidate-set pruning: at each parameter partition (processed
//! smallest-first) it tries each still-candidate vertex
//! and intersects the candidate set with that vertex's adjacency before
//! descending. Restricted to exactly one vertex per partition, this
//! gives the same enumeration Bron–Kerbosch-with-pivoting gives for
//! k-partite k-cliques, and fails a branch the moment a partition's
//! candidate set is empty.

use crate::assignment_set::AssignmentSet;
use crate::consistency_graph::{violates_binary_literal, violates_unary_literal, StaticConsistencyGraph, Vertex, VertexId};
use fixedbitset::FixedBitSet;
use mimir_formalism::{ConjunctiveCondition, GroundAtom, NumericConstraint, ObjectIndex, PredicateCategory, PredicateRepository};

/// What the binding generator cannot decide from bitset-level
/// consistency alone: literals of arity 0 or >= 3, and numeric
/// constraints, verified directly once a binding is complete.
pub trait DynamicStateView {
    fn has_ground_atom(&self, atom: &GroundAtom) -> bool;
    fn evaluate_numeric_constraint(&self, constraint: &NumericConstraint, binding: &[ObjectIndex]) -> bool;
}

fn build_dynamic_adjacency(condition: &ConjunctiveCondition, graph: &StaticConsistencyGraph, predicates: &PredicateRepository, dynamic_assignment_set: &AssignmentSet) -> (Vec<FixedBitSet>, FixedBitSet) {
    let n = graph.vertices.len();
    let mut valid = FixedBitSet::with_capacity(n);
    for v in &graph.vertices {
        if !violates_unary_literal(condition, predicates, dynamic_assignment_set, v.parameter, v.object, &[PredicateCategory::Fluent, PredicateCategory::Derived]) {
            valid.insert(v.id);
        }
    }

    let mut adjacency = vec![FixedBitSet::with_capacity(n); n];
    for edge in &graph.edges {
        let a = graph.vertices[edge.src];
        let b = graph.vertices[edge.dst];
        if !valid.contains(a.id) || !valid.contains(b.id) {
            continue;
        }
        if violates_binary_literal(condition, predicates, dynamic_assignment_set, a, b, &[PredicateCategory::Fluent, PredicateCategory::Derived]) {
            continue;
        }
        adjacency[a.id].insert(b.id);
        adjacency[b.id].insert(a.id);
    }
    (adjacency, valid)
}

struct Frame {
    partition_idx: usize,
    candidates: FixedBitSet,
    cursor: usize,
    chosen: Vec<VertexId>,
}

/// Lazily enumerates complete cliques, one vertex per parameter
/// partition. An explicit stack (rather than recursion) so the
/// generator can be dropped mid-enumeration at no cost beyond freeing
/// its frames.
struct CliqueIter<'a> {
    adjacency: Vec<FixedBitSet>,
    partitions: &'a [Vec<VertexId>],
    stack: Vec<Frame>,
}

impl<'a> CliqueIter<'a> {
    fn new(adjacency: Vec<FixedBitSet>, valid: FixedBitSet, partitions: &'a [Vec<VertexId>]) -> Self {
        let stack = vec![Frame {
            partition_idx: 0,
            candidates: valid,
            cursor: 0,
            chosen: Vec::new(),
        }];
        CliqueIter { adjacency, partitions, stack }
    }
}

impl<'a> Iterator for CliqueIter<'a> {
    type Item = Vec<VertexId>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            if frame.partition_idx == self.partitions.len() {
                let chosen = frame.chosen.clone();
                self.stack.pop();
                return Some(chosen);
            }
            let partition = &self.partitions[frame.partition_idx];
            let mut found = None;
            while frame.cursor < partition.len() {
                let v = partition[frame.cursor];
                frame.cursor += 1;
                if frame.candidates.contains(v) {
                    found = Some(v);
                    break;
                }
            }
            match found {
                Some(v) => {
                    let mut next_candidates = frame.candidates.clone();
                    next_candidates.intersect_with(&self.adjacency[v]);
                    let mut chosen = frame.chosen.clone();
                    chosen.push(v);
                    self.stack.push(Frame {
                        partition_idx: frame.partition_idx + 1,
                        candidates: next_candidates,
                        cursor: 0,
                        chosen,
                    });
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

fn assemble_binding(vertices: &[Vertex], clique: &[VertexId], arity: usize) -> Vec<ObjectIndex> {
    let mut binding = vec![ObjectIndex::new(0); arity];
    for &vid in clique {
        let v = vertices[vid];
        binding[v.parameter as usize] = ObjectIndex::new(v.object);
    }
    binding
}

/// Enumerates every binding of `condition` that holds in the state
/// `view` reflects, restartable and lazy: each `next()` call does only
/// the work needed to produce (or rule out) the next candidate.
pub struct BindingGenerator<'a, S: DynamicStateView> {
    condition: &'a ConjunctiveCondition,
    vertices: &'a [Vertex],
    arity: usize,
    cliques: CliqueIter<'a>,
    view: &'a S,
}

impl<'a, S: DynamicStateView> BindingGenerator<'a, S> {
    pub fn new(condition: &'a ConjunctiveCondition, predicates: &PredicateRepository, graph: &'a StaticConsistencyGraph, dynamic_assignment_set: &AssignmentSet, view: &'a S) -> Self {
        let (adjacency, valid) = build_dynamic_adjacency(condition, graph, predicates, dynamic_assignment_set);
        BindingGenerator {
            condition,
            vertices: &graph.vertices,
            arity: graph.arity,
            cliques: CliqueIter::new(adjacency, valid, &graph.vertices_by_parameter),
            view,
        }
    }

    fn verify(&self, binding: &[ObjectIndex]) -> bool {
        for literal in self.condition.nullary_literals.iter_all() {
            let holds = self.view.has_ground_atom(&literal.atom);
            if literal.polarity != holds {
                return false;
            }
        }
        for literal in self.condition.other_literals() {
            let ground = literal.atom.ground(binding);
            let holds = self.view.has_ground_atom(&ground);
            if literal.polarity != holds {
                return false;
            }
        }
        for constraint in &self.condition.numeric_constraints {
            if !self.view.evaluate_numeric_constraint(constraint, binding) {
                return false;
            }
        }
        true
    }
}

impl<'a, S: DynamicStateView> Iterator for BindingGenerator<'a, S> {
    type Item = Vec<ObjectIndex>;

    fn next(&mut self) -> Option<Self::Item> {
        for clique in self.cliques.by_ref() {
            let binding = assemble_binding(self.vertices, &clique, self.arity);
            if self.verify(&binding) {
                return Some(binding);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimir_formalism::{Comparator, Literal, LiftedAtom, NumericExpression, PredicateRepository, Term, TypeRepository, Variable};
    use smallvec::smallvec;

    struct EmptyView;
    impl DynamicStateView for EmptyView {
        fn has_ground_atom(&self, _atom: &GroundAtom) -> bool {
            false
        }
        fn evaluate_numeric_constraint(&self, _constraint: &NumericConstraint, _binding: &[ObjectIndex]) -> bool {
            true
        }
    }

    #[test]
    fn unary_schema_enumerates_every_object() {
        let predicates = PredicateRepository::new();
        let types = TypeRepository::new();
        let condition = ConjunctiveCondition::new(vec![Variable::new(0)], vec![smallvec![]]);
        let static_set = AssignmentSet::new(3, &predicates, std::iter::empty());
        let graph = StaticConsistencyGraph::build(&condition, 3, &predicates, &types, &static_set, |_, _| true);
        let dynamic_set = AssignmentSet::new(3, &predicates, std::iter::empty());
        let view = EmptyView;
        let gen = BindingGenerator::new(&condition, &predicates, &graph, &dynamic_set, &view);
        let bindings: Vec<_> = gen.collect();
        assert_eq!(bindings.len(), 3);
    }

    #[test]
    fn dynamic_unary_literal_prunes_vertices() {
        let mut predicates = PredicateRepository::new();
        let holds = predicates.add("holds", 1, PredicateCategory::Fluent);
        let types = TypeRepository::new();
        let mut condition = ConjunctiveCondition::new(vec![Variable::new(0)], vec![smallvec![]]);
        condition
            .literals
            .fluent
            .push(Literal::positive(LiftedAtom::new(holds, [Term::Variable(Variable::new(0))])));

        let static_set = AssignmentSet::new(3, &predicates, std::iter::empty());
        let graph = StaticConsistencyGraph::build(&condition, 3, &predicates, &types, &static_set, |_, _| true);

        let atom = GroundAtom::new(holds, smallvec![ObjectIndex::new(1)]);
        let dynamic_set = AssignmentSet::new(3, &predicates, [&atom]);
        let view = EmptyView;
        let gen = BindingGenerator::new(&condition, &predicates, &graph, &dynamic_set, &view);
        let bindings: Vec<_> = gen.collect();
        assert_eq!(bindings, vec![vec![ObjectIndex::new(1)]]);
    }

    struct ConstantComparingView;
    impl DynamicStateView for ConstantComparingView {
        fn has_ground_atom(&self, _atom: &GroundAtom) -> bool {
            false
        }
        fn evaluate_numeric_constraint(&self, constraint: &NumericConstraint, _binding: &[ObjectIndex]) -> bool {
            let as_f64 = |e: &NumericExpression| match e {
                NumericExpression::Constant(bits) => f64::from_bits(*bits),
                _ => panic!("test only handles constant expressions"),
            };
            constraint.comparator.evaluate(as_f64(&constraint.lhs), as_f64(&constraint.rhs))
        }
    }

    #[test]
    fn nullary_numeric_constraint_gates_the_only_binding() {
        let predicates = PredicateRepository::new();
        let types = TypeRepository::new();
        let mut condition = ConjunctiveCondition::new(vec![], vec![]);
        condition.numeric_constraints.push(NumericConstraint {
            comparator: Comparator::Gt,
            lhs: NumericExpression::constant(1.0),
            rhs: NumericExpression::constant(0.0),
        });
        let static_set = AssignmentSet::new(0, &predicates, std::iter::empty());
        let graph = StaticConsistencyGraph::build(&condition, 0, &predicates, &types, &static_set, |_, _| true);
        let dynamic_set = AssignmentSet::new(0, &predicates, std::iter::empty());
        let view = ConstantComparingView;
        let gen = BindingGenerator::new(&condition, &predicates, &graph, &dynamic_set, &view);
        let bindings: Vec<_> = gen.collect();
        assert_eq!(bindings, vec![Vec::<ObjectIndex>::new()]);
    }

    #[test]
    fn nullary_numeric_constraint_false_yields_no_binding() {
        let predicates = PredicateRepository::new();
        let types = TypeRepository::new();
        let mut condition = ConjunctiveCondition::new(vec![], vec![]);
        condition.numeric_constraints.push(NumericConstraint {
            comparator: Comparator::Lt,
            lhs: NumericExpression::constant(1.0),
            rhs: NumericExpression::constant(0.0),
        });
        let static_set = AssignmentSet::new(0, &predicates, std::iter::empty());
        let graph = StaticConsistencyGraph::build(&condition, 0, &predicates, &types, &static_set, |_, _| true);
        let dynamic_set = AssignmentSet::new(0, &predicates, std::iter::empty());
        let view = ConstantComparingView;
        let gen = BindingGenerator::new(&condition, &predicates, &graph, &dynamic_set, &view);
        let bindings: Vec<_> = gen.collect();
        assert!(bindings.is_empty());
    }
}

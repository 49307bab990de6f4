//! Match tree: a decision diagram indexing a fixed element
//! set (ground actions or, per stratum, ground axioms) by the literals
//! and numeric constraints of their preconditions, so that listing the
//! elements applicable in a state takes time linear in tree depth
//! rather than in the element count.
//!
//! Construction and the runtime query structure are unified into a
//! single one-pass builder rather than built as two separate passes.

use crate::ground::GroundCondition;
use mimir_collections::Idx;
use mimir_formalism::GroundAtomIndex;
use std::path::PathBuf;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SplitMetric {
    Gini,
    Frequency,
    InformationGain,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SplitStrategy {
    Static,
    Dynamic,
    Hybrid,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum OptimizationDirection {
    Min,
    Max,
}

/// Defaults to `split_strategy = Dynamic`, `split_metric = Frequency`,
/// `optimization_direction = Max`.
#[derive(Clone, Debug)]
pub struct MatchTreeOptions {
    pub split_metric: SplitMetric,
    pub split_strategy: SplitStrategy,
    pub optimization_direction: OptimizationDirection,
    pub max_num_nodes: usize,
    pub output_dot_file: Option<PathBuf>,
}

impl Default for MatchTreeOptions {
    fn default() -> Self {
        MatchTreeOptions {
            split_metric: SplitMetric::Frequency,
            split_strategy: SplitStrategy::Dynamic,
            optimization_direction: OptimizationDirection::Max,
            max_num_nodes: 1_000_000,
            output_dot_file: None,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
struct NodeId(usize);

enum Node<E> {
    AtomTest {
        atom: GroundAtomIndex,
        derived: bool,
        true_branch: NodeId,
        false_branch: NodeId,
        dontcare_branch: NodeId,
    },
    NumericTest {
        constraint_index: usize,
        true_branch: NodeId,
        dontcare_branch: NodeId,
    },
    Leaf {
        elements: Vec<E>,
        /// An imperfect leaf still needs a linear scan over `elements`
        /// because at least one of them carries a literal this path
        /// never tested.
        imperfect: bool,
    },
}

#[derive(Clone, Debug, Default)]
pub struct MatchTreeStatistics {
    pub num_nodes: usize,
    pub num_leaves: usize,
    pub is_imperfect: bool,
    /// Leaf sizes, in construction order.
    pub generator_distribution: Vec<usize>,
    pub construction_time: std::time::Duration,
}

/// Indexes a fixed set of `E` (e.g. [`mimir_formalism::GroundActionIndex`]
/// or [`mimir_formalism::GroundAxiomIndex`]) by their preconditions.
/// Built once per (reachable action set | stratum's reachable axiom
/// set) and queried once per state thereafter.
pub struct MatchTree<E> {
    nodes: Vec<Node<E>>,
    root: NodeId,
    numeric_constraints: Vec<crate::ground::GroundNumericConstraint>,
    pub statistics: MatchTreeStatistics,
}

struct Element<E: Copy> {
    id: E,
    fluent: Vec<(GroundAtomIndex, bool)>,
    derived: Vec<(GroundAtomIndex, bool)>,
    numeric: Vec<usize>,
}

fn score(metric: SplitMetric, total: usize, positive: usize, negative: usize, dontcare: usize, direction: OptimizationDirection) -> f64 {
    let n = total.max(1) as f64;
    let raw = match metric {
        SplitMetric::Frequency => (positive + negative) as f64 / n,
        SplitMetric::Gini => {
            let p = positive as f64 / n;
            let q = negative as f64 / n;
            let d = dontcare as f64 / n;
            1.0 - (p * p + q * q + d * d)
        }
        SplitMetric::InformationGain => {
            let h = |x: f64| if x <= 0.0 { 0.0 } else { -x * x.log2() };
            let p = positive as f64 / n;
            let q = negative as f64 / n;
            let d = dontcare as f64 / n;
            h(p) + h(q) + h(d)
        }
    };
    match direction {
        OptimizationDirection::Max => raw,
        OptimizationDirection::Min => -raw,
    }
}

fn build_recursive<E: Copy>(elements: Vec<Element<E>>, numeric_constraints: &[crate::ground::GroundNumericConstraint], options: &MatchTreeOptions, nodes: &mut Vec<Node<E>>, stats: &mut MatchTreeStatistics) -> NodeId {
    if nodes.len() >= options.max_num_nodes {
        return push_leaf(elements, true, nodes, stats);
    }

    // A singleton group is never worth splitting further: the element
    // either has nothing left to test (a perfect leaf) or still
    // carries residual literals this path never tested, and with only
    // one candidate the remaining test is exactly the linear scan an
    // imperfect leaf already performs.
    if elements.len() <= 1 {
        let imperfect = elements.iter().any(|e| !e.fluent.is_empty() || !e.derived.is_empty() || !e.numeric.is_empty());
        return push_leaf(elements, imperfect, nodes, stats);
    }

    // An atom every remaining element agrees on (same polarity, or
    // absent from all) contributes nothing to further splitting.
    let mut fluent_candidates: hashbrown::HashSet<GroundAtomIndex> = hashbrown::HashSet::new();
    let mut derived_candidates: hashbrown::HashSet<GroundAtomIndex> = hashbrown::HashSet::new();
    for e in &elements {
        fluent_candidates.extend(e.fluent.iter().map(|&(a, _)| a));
        derived_candidates.extend(e.derived.iter().map(|&(a, _)| a));
    }

    let mut best: Option<(f64, GroundAtomIndex, bool)> = None;
    for (&atom, derived) in fluent_candidates.iter().map(|a| (a, false)).chain(derived_candidates.iter().map(|a| (a, true))) {
        let field = |e: &Element<E>| if derived { &e.derived } else { &e.fluent };
        let positive = elements.iter().filter(|e| field(e).contains(&(atom, true))).count();
        let negative = elements.iter().filter(|e| field(e).contains(&(atom, false))).count();
        let dontcare = elements.len() - positive - negative;
        if positive == 0 && negative == 0 {
            continue;
        }
        let s = score(options.split_metric, elements.len(), positive, negative, dontcare, options.optimization_direction);
        let improves = match &best {
            Some(&(best_s, _, _)) => s > best_s,
            None => true,
        };
        if improves {
            best = Some((s, atom, derived));
        }
    }

    let Some((_, atom, derived)) = best else {
        // No atom distinguishes the remaining elements: try numeric
        // constraints (true/don't-care only, .5), else leaf.
        return build_numeric_or_leaf(elements, numeric_constraints, options, nodes, stats);
    };

    let mut true_group = Vec::new();
    let mut false_group = Vec::new();
    let mut dontcare_group = Vec::new();
    for mut e in elements {
        let field = if derived { &mut e.derived } else { &mut e.fluent };
        if let Some(pos) = field.iter().position(|&(a, _)| a == atom) {
            let (_, polarity) = field.remove(pos);
            if polarity {
                true_group.push(e);
            } else {
                false_group.push(e);
            }
        } else {
            dontcare_group.push(e);
        }
    }

    let true_branch = if true_group.is_empty() { push_empty_leaf(nodes, stats) } else { build_recursive(true_group, numeric_constraints, options, nodes, stats) };
    let false_branch = if false_group.is_empty() { push_empty_leaf(nodes, stats) } else { build_recursive(false_group, numeric_constraints, options, nodes, stats) };
    let dontcare_branch = if dontcare_group.is_empty() { push_empty_leaf(nodes, stats) } else { build_recursive(dontcare_group, numeric_constraints, options, nodes, stats) };

    let id = NodeId(nodes.len());
    nodes.push(Node::AtomTest {
        atom,
        derived,
        true_branch,
        false_branch,
        dontcare_branch,
    });
    stats.num_nodes += 1;
    id
}

fn build_numeric_or_leaf<E: Copy>(elements: Vec<Element<E>>, numeric_constraints: &[crate::ground::GroundNumericConstraint], options: &MatchTreeOptions, nodes: &mut Vec<Node<E>>, stats: &mut MatchTreeStatistics) -> NodeId {
    let mut candidate: Option<usize> = None;
    'search: for idx in 0..numeric_constraints.len() {
        let mentions = elements.iter().filter(|e| e.numeric.contains(&idx)).count();
        // A constraint every remaining element shares (mentions ==
        // elements.len()) is still worth selecting, same as a
        // uniformly-held atom in build_recursive above: it strips out
        // of every element's residual condition and the dontcare
        // branch is simply empty, letting recursion reach a perfect
        // leaf instead of being stuck imperfect forever.
        if mentions > 0 {
            candidate = Some(idx);
            break 'search;
        }
    }

    let Some(idx) = candidate else {
        let perfect = elements.iter().all(|e| e.fluent.is_empty() && e.derived.is_empty() && e.numeric.is_empty());
        return push_leaf(elements, !perfect, nodes, stats);
    };

    let mut true_group = Vec::new();
    let mut dontcare_group = Vec::new();
    for mut e in elements {
        if let Some(pos) = e.numeric.iter().position(|&c| c == idx) {
            e.numeric.remove(pos);
            true_group.push(e);
        } else {
            dontcare_group.push(e);
        }
    }

    let true_branch = if true_group.is_empty() { push_empty_leaf(nodes, stats) } else { build_recursive(true_group, numeric_constraints, options, nodes, stats) };
    let dontcare_branch = if dontcare_group.is_empty() { push_empty_leaf(nodes, stats) } else { build_recursive(dontcare_group, numeric_constraints, options, nodes, stats) };

    let id = NodeId(nodes.len());
    nodes.push(Node::NumericTest {
        constraint_index: idx,
        true_branch,
        dontcare_branch,
    });
    stats.num_nodes += 1;
    id
}

fn push_empty_leaf<E>(nodes: &mut Vec<Node<E>>, stats: &mut MatchTreeStatistics) -> NodeId {
    let id = NodeId(nodes.len());
    nodes.push(Node::Leaf { elements: Vec::new(), imperfect: false });
    stats.num_nodes += 1;
    stats.num_leaves += 1;
    stats.generator_distribution.push(0);
    id
}

fn push_leaf<E: Copy>(elements: Vec<Element<E>>, imperfect: bool, nodes: &mut Vec<Node<E>>, stats: &mut MatchTreeStatistics) -> NodeId {
    let ids: Vec<E> = elements.iter().map(|e| e.id).collect();
    stats.generator_distribution.push(ids.len());
    stats.is_imperfect |= imperfect;
    let id = NodeId(nodes.len());
    nodes.push(Node::Leaf { elements: ids, imperfect });
    stats.num_nodes += 1;
    stats.num_leaves += 1;
    id
}

impl<E: Copy> MatchTree<E> {
    /// Builds the tree from `elements`, each paired with the ground
    /// condition it should be dispatched on. Numeric constraints are
    /// deduplicated into `numeric_constraints` by structural equality so
    /// that shared constraints across elements split only once.
    pub fn build(elements: Vec<(E, GroundCondition)>, options: &MatchTreeOptions) -> Self {
        let start = std::time::Instant::now();
        let mut numeric_constraints: Vec<crate::ground::GroundNumericConstraint> = Vec::new();
        let mut intern_numeric = |c: crate::ground::GroundNumericConstraint| -> usize {
            if let Some(pos) = numeric_constraints.iter().position(|existing| existing == &c) {
                pos
            } else {
                numeric_constraints.push(c);
                numeric_constraints.len() - 1
            }
        };

        let prepared: Vec<Element<E>> = elements
            .into_iter()
            .map(|(id, cond)| Element {
                id,
                fluent: cond.fluent_literals.clone(),
                derived: cond.derived_literals.clone(),
                numeric: cond.numeric_constraints.into_iter().map(&mut intern_numeric).collect(),
            })
            .collect();

        let mut nodes = Vec::new();
        let mut stats = MatchTreeStatistics::default();
        let root = if prepared.is_empty() {
            push_empty_leaf(&mut nodes, &mut stats)
        } else {
            build_recursive(prepared, &numeric_constraints, options, &mut nodes, &mut stats)
        };
        stats.construction_time = start.elapsed();

        MatchTree {
            nodes,
            root,
            numeric_constraints,
            statistics: stats,
        }
    }

    /// Appends every element reachable in `fluent_atoms`/`derived_atoms`/
    /// `numeric_values` to `out`. Imperfect leaves' elements still carry their
    /// full original `GroundCondition` requirement and must be
    /// re-verified by the caller (e.g. against the grounded generator's
    /// own copy of the precondition) before being trusted as
    /// applicable.
    pub fn query(&self, fluent_atoms: &fixedbitset::FixedBitSet, derived_atoms: &fixedbitset::FixedBitSet, numeric_values: &[f64], out: &mut Vec<E>) {
        self.query_node(self.root, fluent_atoms, derived_atoms, numeric_values, out);
    }

    fn query_node(&self, node: NodeId, fluent_atoms: &fixedbitset::FixedBitSet, derived_atoms: &fixedbitset::FixedBitSet, numeric_values: &[f64], out: &mut Vec<E>) {
        match &self.nodes[node.0] {
            Node::Leaf { elements, .. } => out.extend_from_slice(elements),
            Node::AtomTest {
                atom,
                derived,
                true_branch,
                false_branch,
                dontcare_branch,
            } => {
                let bits = if *derived { derived_atoms } else { fluent_atoms };
                let holds = bits.contains(atom.to_usize());
                self.query_node(if holds { *true_branch } else { *false_branch }, fluent_atoms, derived_atoms, numeric_values, out);
                self.query_node(*dontcare_branch, fluent_atoms, derived_atoms, numeric_values, out);
            }
            Node::NumericTest { constraint_index, true_branch, dontcare_branch } => {
                let holds = self.numeric_constraints[*constraint_index].evaluate(numeric_values).unwrap_or(false);
                if holds {
                    self.query_node(*true_branch, fluent_atoms, derived_atoms, numeric_values, out);
                }
                self.query_node(*dontcare_branch, fluent_atoms, derived_atoms, numeric_values, out);
            }
        }
    }

    pub fn is_imperfect(&self) -> bool {
        self.statistics.is_imperfect
    }

    /// Writes a Graphviz dot dump to `path`, when configured.
    pub fn write_dot(&self, path: &std::path::Path) -> std::io::Result<()>
    where
        E: std::fmt::Debug,
    {
        let mut out = String::from("digraph match_tree {\n");
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Leaf { elements, imperfect } => {
                    out.push_str(&format!("  n{i} [shape=box,label=\"leaf({}){}\"];\n", elements.len(), if *imperfect { " imperfect" } else { "" }));
                }
                Node::AtomTest { atom, derived, true_branch, false_branch, dontcare_branch } => {
                    out.push_str(&format!("  n{i} [label=\"{}atom({})\"];\n", if *derived { "derived " } else { "" }, atom.to_usize()));
                    out.push_str(&format!("  n{i} -> n{} [label=\"true\"];\n", true_branch.0));
                    out.push_str(&format!("  n{i} -> n{} [label=\"false\"];\n", false_branch.0));
                    out.push_str(&format!("  n{i} -> n{} [label=\"dontcare\"];\n", dontcare_branch.0));
                }
                Node::NumericTest { constraint_index, true_branch, dontcare_branch } => {
                    out.push_str(&format!("  n{i} [label=\"numeric({constraint_index})\"];\n"));
                    out.push_str(&format!("  n{i} -> n{} [label=\"true\"];\n", true_branch.0));
                    out.push_str(&format!("  n{i} -> n{} [label=\"dontcare\"];\n", dontcare_branch.0));
                }
            }
        }
        out.push_str("}\n");
        std::fs::write(path, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ground::GroundCondition;
    use mimir_collections::Idx;

    fn cond(fluent: &[(u32, bool)]) -> GroundCondition {
        GroundCondition {
            fluent_literals: fluent.iter().map(|&(a, p)| (GroundAtomIndex::new(a), p)).collect(),
            derived_literals: vec![],
            numeric_constraints: vec![],
        }
    }

    #[test]
    fn perfect_split_on_disjoint_atoms() {
        let elements: Vec<(u32, GroundCondition)> = (0..5u32).map(|i| (i, cond(&[(i, true)]))).collect();
        let tree = MatchTree::build(elements, &MatchTreeOptions::default());
        assert!(!tree.is_imperfect());

        let mut fluent = fixedbitset::FixedBitSet::with_capacity(5);
        fluent.insert(2);
        let derived = fixedbitset::FixedBitSet::with_capacity(0);
        let mut out = Vec::new();
        tree.query(&fluent, &derived, &[], &mut out);
        assert_eq!(out, vec![2]);

        let fluent_none = fixedbitset::FixedBitSet::with_capacity(5);
        let mut out_none = Vec::new();
        tree.query(&fluent_none, &derived, &[], &mut out_none);
        assert!(out_none.is_empty());
    }

    #[test]
    fn empty_element_set_queries_to_empty() {
        let tree: MatchTree<u32> = MatchTree::build(vec![], &MatchTreeOptions::default());
        let fluent = fixedbitset::FixedBitSet::with_capacity(0);
        let derived = fixedbitset::FixedBitSet::with_capacity(0);
        let mut out = Vec::new();
        tree.query(&fluent, &derived, &[], &mut out);
        assert!(out.is_empty());
    }
}

//! Stratification of derived predicates: derived predicates
//! form a graph with an edge `p -> q` when `q` appears in the body of a
//! rule for `p`. Strongly connected components are ordered
//! topologically; each component is a stratum, evaluated to fixpoint
//! before later strata — earlier strata hold the predicates later
//! strata's rules may depend on.

use crate::axiom::Axiom;
use crate::condition::PerCategory;
use crate::indices::{AxiomIndex, PredicateIndex};
use hashbrown::{HashMap, HashSet};

/// One maximal set of mutually (positively) recursive derived
/// predicates, plus the axioms whose head falls in it, in the order
/// they must be evaluated (this stratum's own dependencies have
/// already reached fixpoint in an earlier stratum).
#[derive(Clone, Debug)]
pub struct Stratum {
    pub predicates: Vec<PredicateIndex>,
    pub axioms: Vec<AxiomIndex>,
}

fn derived_predicates_in(literals: &PerCategory<crate::literal::Literal<crate::atom::LiftedAtom>>) -> impl Iterator<Item = PredicateIndex> + '_ {
    literals.derived.iter().map(|l| l.atom.predicate)
}

/// Builds the stratum order for a set of axioms, via Tarjan's SCC
/// algorithm over the predicate dependency graph followed by a
/// topological sort of the condensation.
pub fn stratify(axioms: &[(AxiomIndex, &Axiom)]) -> Vec<Stratum> {
    // adjacency: head predicate -> set of predicates it depends on
    let mut adjacency: HashMap<PredicateIndex, HashSet<PredicateIndex>> = HashMap::new();
    let mut axioms_of_head: HashMap<PredicateIndex, Vec<AxiomIndex>> = HashMap::new();
    let mut all_predicates: Vec<PredicateIndex> = Vec::new();
    let mut seen_predicates: HashSet<PredicateIndex> = HashSet::new();

    for &(axiom_idx, axiom) in axioms {
        let head = axiom.head.predicate;
        if seen_predicates.insert(head) {
            all_predicates.push(head);
        }
        axioms_of_head.entry(head).or_default().push(axiom_idx);
        let entry = adjacency.entry(head).or_default();
        for dep in derived_predicates_in(&axiom.precondition.literals) {
            if seen_predicates.insert(dep) {
                all_predicates.push(dep);
            }
            entry.insert(dep);
        }
    }

    let sccs = tarjan_scc(&all_predicates, &adjacency);

    // condensation edges: scc(p) -> scc(q) when p depends on q.
    let scc_of: HashMap<PredicateIndex, usize> = sccs
        .iter()
        .enumerate()
        .flat_map(|(i, comp)| comp.iter().map(move |&p| (p, i)))
        .collect();
    let mut condensation: Vec<HashSet<usize>> = vec![HashSet::new(); sccs.len()];
    for (p, deps) in &adjacency {
        let sp = scc_of[p];
        for q in deps {
            let sq = scc_of[q];
            if sp != sq {
                condensation[sp].insert(sq);
            }
        }
    }

    // topological order of the condensation such that dependencies come
    // first: repeatedly take a component with no un-scheduled
    // dependency.
    let mut scheduled = vec![false; sccs.len()];
    let mut order = Vec::with_capacity(sccs.len());
    while order.len() < sccs.len() {
        let mut progressed = false;
        for i in 0..sccs.len() {
            if scheduled[i] {
                continue;
            }
            if condensation[i].iter().all(|&dep| scheduled[dep]) {
                order.push(i);
                scheduled[i] = true;
                progressed = true;
            }
        }
        if !progressed {
            // A cycle survived condensation only if our SCC computation
            // is wrong; fall back to insertion order rather than loop
            // forever.
            for i in 0..sccs.len() {
                if !scheduled[i] {
                    order.push(i);
                    scheduled[i] = true;
                }
            }
            break;
        }
    }

    order
        .into_iter()
        .map(|i| {
            let mut axioms_in_stratum = Vec::new();
            for &p in &sccs[i] {
                if let Some(v) = axioms_of_head.get(&p) {
                    axioms_in_stratum.extend(v.iter().copied());
                }
            }
            Stratum {
                predicates: sccs[i].clone(),
                axioms: axioms_in_stratum,
            }
        })
        .filter(|s| !s.axioms.is_empty())
        .collect()
}

/// Classic Tarjan SCC, iterative-free (recursive) since axiom
/// dependency graphs are shallow in practice.
fn tarjan_scc(nodes: &[PredicateIndex], adjacency: &HashMap<PredicateIndex, HashSet<PredicateIndex>>) -> Vec<Vec<PredicateIndex>> {
    struct State {
        index: HashMap<PredicateIndex, usize>,
        low_link: HashMap<PredicateIndex, usize>,
        on_stack: HashSet<PredicateIndex>,
        stack: Vec<PredicateIndex>,
        counter: usize,
        components: Vec<Vec<PredicateIndex>>,
    }

    fn strong_connect(v: PredicateIndex, adjacency: &HashMap<PredicateIndex, HashSet<PredicateIndex>>, st: &mut State) {
        st.index.insert(v, st.counter);
        st.low_link.insert(v, st.counter);
        st.counter += 1;
        st.stack.push(v);
        st.on_stack.insert(v);

        if let Some(neighbors) = adjacency.get(&v) {
            for &w in neighbors {
                if !st.index.contains_key(&w) {
                    strong_connect(w, adjacency, st);
                    let w_low = st.low_link[&w];
                    let v_low = st.low_link[&v];
                    st.low_link.insert(v, v_low.min(w_low));
                } else if st.on_stack.contains(&w) {
                    let w_idx = st.index[&w];
                    let v_low = st.low_link[&v];
                    st.low_link.insert(v, v_low.min(w_idx));
                }
            }
        }

        if st.low_link[&v] == st.index[&v] {
            let mut component = Vec::new();
            loop {
                let w = st.stack.pop().unwrap();
                st.on_stack.remove(&w);
                component.push(w);
                if w == v {
                    break;
                }
            }
            st.components.push(component);
        }
    }

    let mut st = State {
        index: HashMap::new(),
        low_link: HashMap::new(),
        on_stack: HashSet::new(),
        stack: Vec::new(),
        counter: 0,
        components: Vec::new(),
    };
    for &n in nodes {
        if !st.index.contains_key(&n) {
            strong_connect(n, adjacency, &mut st);
        }
    }
    st.components
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::LiftedAtom;
    use crate::condition::ConjunctiveCondition;
    use crate::literal::Literal;

    fn pred(i: u32) -> PredicateIndex {
        PredicateIndex::new(i)
    }

    fn axiom_depending_on(head: PredicateIndex, deps: &[PredicateIndex]) -> Axiom {
        let mut cond = ConjunctiveCondition::new(vec![], vec![]);
        for &d in deps {
            cond.literals.derived.push(Literal::positive(LiftedAtom::new(d, [])));
        }
        Axiom {
            parameters: vec![],
            precondition: cond,
            head: LiftedAtom::new(head, []),
        }
    }

    #[test]
    fn acyclic_chain_orders_dependencies_first() {
        // on-table(x) depends on clear(x)... contrived chain p2 -> p1 -> p0
        let a0 = axiom_depending_on(pred(0), &[]);
        let a1 = axiom_depending_on(pred(1), &[pred(0)]);
        let a2 = axiom_depending_on(pred(2), &[pred(1)]);
        let axioms = vec![
            (AxiomIndex::new(0), &a0),
            (AxiomIndex::new(1), &a1),
            (AxiomIndex::new(2), &a2),
        ];
        let strata = stratify(&axioms);
        assert_eq!(strata.len(), 3);
        assert_eq!(strata[0].predicates, vec![pred(0)]);
        assert_eq!(strata[1].predicates, vec![pred(1)]);
        assert_eq!(strata[2].predicates, vec![pred(2)]);
    }

    #[test]
    fn mutual_recursion_forms_one_stratum() {
        let a0 = axiom_depending_on(pred(0), &[pred(1)]);
        let a1 = axiom_depending_on(pred(1), &[pred(0)]);
        let axioms = vec![(AxiomIndex::new(0), &a0), (AxiomIndex::new(1), &a1)];
        let strata = stratify(&axioms);
        assert_eq!(strata.len(), 1);
        assert_eq!(strata[0].axioms.len(), 2);
    }
}

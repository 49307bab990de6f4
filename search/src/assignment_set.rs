//! Assignment set: for each predicate, a dense bitset
//! answering "does some ground atom of this predicate place object `o`
//! at position `i`" (unary) or "`o` at `i` and `o'` at `j` jointly"
//! (binary), in O(1). The pair-to-rank formula below deliberately lets
//! the "no object" sentinel wrap around to rank 0 rather than special-casing it.

use fixedbitset::FixedBitSet;
use mimir_collections::{Idx, RefVec, MAX_INDEX};
use mimir_formalism::{GroundAtom, GroundAtomIndex, GroundAtomRepositories, PredicateIndex, PredicateRepository};

const ABSENT: u32 = MAX_INDEX;

/// An assignment of (at most) two (position, object) pairs within one
/// ground atom of some predicate. `ABSENT` in either second slot means
/// a unary assignment.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Assignment {
    pub first_index: u32,
    pub first_object: u32,
    pub second_index: u32,
    pub second_object: u32,
}

impl Assignment {
    pub fn unary(index: u32, object: u32) -> Self {
        Assignment {
            first_index: index,
            first_object: object,
            second_index: ABSENT,
            second_object: ABSENT,
        }
    }

    pub fn binary(first_index: u32, first_object: u32, second_index: u32, second_object: u32) -> Self {
        Assignment {
            first_index,
            first_object,
            second_index,
            second_object,
        }
    }
}

/// `rank(a, arity, O)`: `arity` is the owning predicate's own arity
/// (positions `first_index`/`second_index` range over it), `O` is the
/// problem's object count.
pub fn assignment_rank(a: Assignment, arity: usize, num_objects: usize) -> u64 {
    let arity = arity as u64;
    let num_objects = num_objects as u64;
    let first = 1u64;
    let second = first * (arity + 1);
    let third = second * (arity + 1);
    let fourth = third * (num_objects + 1);

    let fi = a.first_index.wrapping_add(1) as u64;
    let si = a.second_index.wrapping_add(1) as u64;
    let fo = a.first_object.wrapping_add(1) as u64;
    let so = a.second_object.wrapping_add(1) as u64;

    first * fi + second * si + third * fo + fourth * so
}

/// Size of the bitset needed to hold every rank for a predicate of the
/// given arity over `num_objects` objects.
pub fn num_assignments(arity: usize, num_objects: usize) -> u64 {
    let arity = arity as u64;
    let num_objects = num_objects as u64;
    let first = 1u64;
    let second = first * (arity + 1);
    let third = second * (arity + 1);
    let fourth = third * (num_objects + 1);
    let max = first * arity + second * arity + third * num_objects + fourth * num_objects;
    max + 1
}

/// One per predicate category.
#[derive(Clone, Debug, Default)]
pub struct AssignmentSet {
    num_objects: usize,
    per_predicate: RefVec<PredicateIndex, FixedBitSet>,
}

impl AssignmentSet {
    /// Allocates one bitset per predicate in `predicates`, sized to
    /// that predicate's own arity, then inserts `ground_atoms`.
    pub fn new<'a>(num_objects: usize, predicates: &PredicateRepository, ground_atoms: impl IntoIterator<Item = &'a GroundAtom>) -> Self {
        let mut per_predicate = RefVec::new();
        for (_, predicate) in predicates.iter() {
            per_predicate.push(FixedBitSet::with_capacity(num_assignments(predicate.arity, num_objects) as usize));
        }
        let mut set = AssignmentSet { num_objects, per_predicate };
        for atom in ground_atoms {
            set.insert_ground_atom(predicates, atom);
        }
        set
    }

    pub fn clear(&mut self) {
        for bitset in self.per_predicate.iter_mut() {
            bitset.clear();
        }
    }

    pub fn insert_ground_atom(&mut self, predicates: &PredicateRepository, atom: &GroundAtom) {
        let arity = predicates.get(atom.predicate).arity;
        let bitset = &mut self.per_predicate[atom.predicate];
        for i in 0..arity {
            let oi = atom.objects[i].raw();
            let rank = assignment_rank(Assignment::unary(i as u32, oi), arity, self.num_objects);
            bitset.insert(rank as usize);
        }
        for i in 0..arity {
            for j in 0..arity {
                if i == j {
                    continue;
                }
                let oi = atom.objects[i].raw();
                let oj = atom.objects[j].raw();
                let rank = assignment_rank(Assignment::binary(i as u32, oi, j as u32, oj), arity, self.num_objects);
                bitset.insert(rank as usize);
            }
        }
    }

    /// Rebuilds from scratch: clears every bitset, then inserts the
    /// ground atoms named by the set bits of `fluent_atoms` and
    /// `derived_atoms`.
    pub fn refresh(&mut self, predicates: &PredicateRepository, ground_atoms: &GroundAtomRepositories, fluent_atoms: &FixedBitSet, derived_atoms: &FixedBitSet) {
        self.clear();
        for bit in fluent_atoms.ones() {
            let atom = ground_atoms.categories.fluent.get(GroundAtomIndex::from_usize(bit));
            self.insert_ground_atom(predicates, atom);
        }
        self.refresh_derived(predicates, ground_atoms, derived_atoms);
    }

    /// Inserts the ground atoms named by the set bits of `derived_atoms`
    /// without clearing first, for incremental re-insertion inside the
    /// axiom fixpoint loop.
    pub fn refresh_derived(&mut self, predicates: &PredicateRepository, ground_atoms: &GroundAtomRepositories, derived_atoms: &FixedBitSet) {
        for bit in derived_atoms.ones() {
            let atom = ground_atoms.categories.derived.get(GroundAtomIndex::from_usize(bit));
            self.insert_ground_atom(predicates, atom);
        }
    }

    /// Is there a reachable ground atom of `predicate` with `object` at
    /// position `position`?
    pub fn is_consistent_unary(&self, predicate: PredicateIndex, arity: usize, position: u32, object: u32) -> bool {
        let rank = assignment_rank(Assignment::unary(position, object), arity, self.num_objects);
        self.per_predicate[predicate].contains(rank as usize)
    }

    /// Is there a reachable ground atom of `predicate` with `object_i`
    /// at `position_i` and `object_j` at `position_j` jointly?
    pub fn is_consistent_binary(&self, predicate: PredicateIndex, arity: usize, position_i: u32, object_i: u32, position_j: u32, object_j: u32) -> bool {
        let rank = assignment_rank(Assignment::binary(position_i, object_i, position_j, object_j), arity, self.num_objects);
        self.per_predicate[predicate].contains(rank as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimir_formalism::{ObjectIndex, PredicateCategory};
    use smallvec::smallvec;

    #[test]
    fn unary_and_binary_assignments_are_found() {
        let mut predicates = PredicateRepository::new();
        let on = predicates.add("on", 2, PredicateCategory::Fluent);
        let atom = GroundAtom::new(on, smallvec![ObjectIndex::new(0), ObjectIndex::new(1)]);
        let set = AssignmentSet::new(3, &predicates, [&atom]);

        assert!(set.is_consistent_unary(on, 2, 0, 0));
        assert!(set.is_consistent_unary(on, 2, 1, 1));
        assert!(!set.is_consistent_unary(on, 2, 0, 1));
        assert!(set.is_consistent_binary(on, 2, 0, 0, 1, 1));
        assert!(!set.is_consistent_binary(on, 2, 0, 1, 1, 0));
    }

    #[test]
    fn rank_is_injective_for_small_arity() {
        let mut seen = std::collections::HashSet::new();
        let arity = 2;
        let num_objects = 2;
        for fi in 0..=arity as u32 {
            for si in 0..=arity as u32 {
                for fo in 0..=num_objects as u32 {
                    for so in 0..=num_objects as u32 {
                        let a = Assignment {
                            first_index: if fi == arity as u32 { ABSENT } else { fi },
                            second_index: if si == arity as u32 { ABSENT } else { si },
                            first_object: if fo == num_objects as u32 { ABSENT } else { fo },
                            second_object: if so == num_objects as u32 { ABSENT } else { so },
                        };
                        let r = assignment_rank(a, arity, num_objects);
                        assert!(r < num_assignments(arity, num_objects));
                        seen.insert(r);
                    }
                }
            }
        }
        assert_eq!(seen.len(), (arity + 1).pow(2) * (num_objects + 1).pow(2));
    }
}

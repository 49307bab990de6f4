//! Predicates tagged by category: `Static` (fixed by the
//! initial state), `Fluent` (mutated by effects) and `Derived` (defined
//! by axioms). A plain enum field plus three parallel repositories,
//! rather than compile-time template specialisation per category.

use crate::indices::PredicateIndex;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum PredicateCategory {
    Static,
    Fluent,
    Derived,
}

#[derive(Clone, Debug)]
pub struct Predicate {
    pub name: String,
    pub arity: usize,
    pub category: PredicateCategory,
}

#[derive(Default, Clone, Debug)]
pub struct PredicateRepository {
    predicates: mimir_collections::RefVec<PredicateIndex, Predicate>,
    by_name: hashbrown::HashMap<String, PredicateIndex>,
}

impl PredicateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, arity: usize, category: PredicateCategory) -> PredicateIndex {
        let name = name.into();
        let idx = self.predicates.push(Predicate {
            name: name.clone(),
            arity,
            category,
        });
        self.by_name.insert(name, idx);
        idx
    }

    pub fn get(&self, index: PredicateIndex) -> &Predicate {
        &self.predicates[index]
    }

    pub fn by_name(&self, name: &str) -> Option<PredicateIndex> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PredicateIndex, &Predicate)> + '_ {
        self.predicates.iter()
    }

    pub fn of_category(&self, category: PredicateCategory) -> impl Iterator<Item = PredicateIndex> + '_ {
        self.predicates.iter().filter(move |(_, p)| p.category == category).map(|(i, _)| i)
    }
}

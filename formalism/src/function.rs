//! Numeric function symbols. Predicates and functions are tagged by
//! separate category enums: predicates use
//! [`crate::predicate::PredicateCategory`] (`Static`/`Fluent`/`Derived`),
//! functions use [`FunctionCategory`], the two tags that actually apply
//! to them.

use crate::indices::{FunctionIndex, GroundFunctionIndex, ObjectIndex};
use smallvec::SmallVec;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum FunctionCategory {
    /// Mutated by action effects, stored in the packed state's numeric
    /// array.
    Fluent,
    /// Fixed by the initial state/problem metric, never mutated — e.g.
    /// a distance table used only inside cost expressions.
    Auxiliary,
}

#[derive(Clone, Debug)]
pub struct Function {
    pub name: String,
    pub arity: usize,
    pub category: FunctionCategory,
}

#[derive(Default, Clone, Debug)]
pub struct FunctionRepository {
    functions: mimir_collections::RefVec<FunctionIndex, Function>,
    by_name: hashbrown::HashMap<String, FunctionIndex>,
}

impl FunctionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, arity: usize, category: FunctionCategory) -> FunctionIndex {
        let name = name.into();
        let idx = self.functions.push(Function {
            name: name.clone(),
            arity,
            category,
        });
        self.by_name.insert(name, idx);
        idx
    }

    pub fn get(&self, index: FunctionIndex) -> &Function {
        &self.functions[index]
    }

    pub fn by_name(&self, name: &str) -> Option<FunctionIndex> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }
}

/// A ground function application: a numeric function symbol applied to
/// a concrete object argument list.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct GroundFunction {
    pub function: FunctionIndex,
    pub objects: SmallVec<[ObjectIndex; 4]>,
}

/// Dense interning of ground function applications, mirroring
/// [`crate::repositories::GroundAtomRepositories`] for atoms: every
/// distinct (function, arguments) pair is assigned a dense
/// [`GroundFunctionIndex`] that indexes a packed state's numeric-value
/// array.
#[derive(Default, Clone, Debug)]
pub struct GroundFunctionRepository {
    pool: mimir_collections::RefPool<GroundFunctionIndex, GroundFunction>,
}

impl GroundFunctionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, function: FunctionIndex, objects: SmallVec<[ObjectIndex; 4]>) -> GroundFunctionIndex {
        self.pool.push(GroundFunction { function, objects })
    }

    pub fn get(&self, index: GroundFunctionIndex) -> &GroundFunction {
        self.pool.get(index)
    }

    /// Looks up an already-interned ground function without creating a
    /// new one (search-time callers never intern: every ground function
    /// that can have a value is established once, from the problem's
    /// initial numeric values, when the state repository is built).
    pub fn get_ref(&self, function: FunctionIndex, objects: &[ObjectIndex]) -> Option<GroundFunctionIndex> {
        self.pool.get_ref(&GroundFunction {
            function,
            objects: objects.iter().copied().collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}

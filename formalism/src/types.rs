//! PDDL `:typing` hierarchy: every type optionally extends a parent
//! type, forming a forest rooted at implicit top-level types (usually
//! just `object`).

use crate::indices::TypeIndex;

#[derive(Clone, Debug)]
pub struct PddlType {
    pub name: String,
    pub parent: Option<TypeIndex>,
}

/// Interning repository for types, with subtype queries.
#[derive(Default, Clone, Debug)]
pub struct TypeRepository {
    types: mimir_collections::RefVec<TypeIndex, PddlType>,
}

impl TypeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, parent: Option<TypeIndex>) -> TypeIndex {
        self.types.push(PddlType { name: name.into(), parent })
    }

    pub fn get(&self, index: TypeIndex) -> &PddlType {
        &self.types[index]
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Is `sub` the same type as `sup`, or transitively derived from it?
    pub fn is_subtype_of(&self, sub: TypeIndex, sup: TypeIndex) -> bool {
        let mut cur = Some(sub);
        while let Some(t) = cur {
            if t == sup {
                return true;
            }
            cur = self.types[t].parent;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtype_chain() {
        let mut repo = TypeRepository::new();
        let object = repo.add("object", None);
        let movable = repo.add("movable", Some(object));
        let block = repo.add("block", Some(movable));
        assert!(repo.is_subtype_of(block, object));
        assert!(repo.is_subtype_of(block, movable));
        assert!(!repo.is_subtype_of(object, block));
    }
}

//! Objects: opaque named constants with optional type membership.

use crate::indices::{ObjectIndex, TypeIndex};
use smallvec::SmallVec;

#[derive(Clone, Debug)]
pub struct Object {
    pub name: String,
    pub types: SmallVec<[TypeIndex; 1]>,
}

impl Object {
    pub fn has_type(&self, tpe: TypeIndex) -> bool {
        self.types.contains(&tpe)
    }
}

#[derive(Default, Clone, Debug)]
pub struct ObjectRepository {
    objects: mimir_collections::RefVec<ObjectIndex, Object>,
    by_name: hashbrown::HashMap<String, ObjectIndex>,
}

impl ObjectRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, types: SmallVec<[TypeIndex; 1]>) -> ObjectIndex {
        let name = name.into();
        if let Some(&existing) = self.by_name.get(&name) {
            return existing;
        }
        let idx = self.objects.push(Object { name: name.clone(), types });
        self.by_name.insert(name, idx);
        idx
    }

    pub fn get(&self, index: ObjectIndex) -> &Object {
        &self.objects[index]
    }

    pub fn by_name(&self, name: &str) -> Option<ObjectIndex> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectIndex, &Object)> + '_ {
        self.objects.iter()
    }
}

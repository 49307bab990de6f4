//! Storage primitives shared by the rest of the Mimir workspace:
//! dense-index newtypes, `Vec`-like containers keyed by them, a
//! segmented arena, and a content-addressed hash set built on top of
//! it. None of this is PDDL-specific; `mimir-formalism` and
//! `mimir-search` build their repositories and state store on these.

pub mod arena;
pub mod index;
pub mod indexed_hash_set;
pub mod ref_store;

pub use arena::{ArenaPtr, SegmentedArena};
pub use index::{Idx, MAX_INDEX};
pub use indexed_hash_set::IndexedHashSet;
pub use ref_store::{RefPool, RefVec};

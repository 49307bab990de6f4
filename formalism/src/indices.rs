//! Dense index newtypes for every interned PDDL entity. Each is a
//! distinct type so that e.g. passing an [`ObjectIndex`] where a
//! [`PredicateIndex`] is expected fails to compile, rather than
//! silently aliasing different kinds of dense-indexed entities behind
//! a bare `u32`.

use mimir_collections::define_index;

define_index! {
    /// Index of a named type in the type hierarchy.
    pub struct TypeIndex;
}
define_index! {
    /// Index of an object (constant) in the problem.
    pub struct ObjectIndex;
}
define_index! {
    /// Index of a variable, scoped to its owning action schema or axiom.
    pub struct VariableIndex;
}
define_index! {
    /// Index of a predicate, unique across all three categories
    /// (static/fluent/derived share one namespace rather than one
    /// per category).
    pub struct PredicateIndex;
}
define_index! {
    /// Index of a numeric function symbol.
    pub struct FunctionIndex;
}
define_index! {
    /// Index of a ground atom, dense per predicate category.
    pub struct GroundAtomIndex;
}
define_index! {
    /// Index of a ground function application (function + object
    /// arguments), dense across all functions — the position a numeric
    /// value occupies in a packed state's numeric-value array.
    pub struct GroundFunctionIndex;
}
define_index! {
    /// Index of an action schema within its domain.
    pub struct ActionIndex;
}
define_index! {
    /// Index of an axiom within its domain.
    pub struct AxiomIndex;
}
define_index! {
    /// Index of a fully grounded action.
    pub struct GroundActionIndex;
}
define_index! {
    /// Index of a fully grounded axiom.
    pub struct GroundAxiomIndex;
}

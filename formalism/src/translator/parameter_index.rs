//! Parameter-index assignment: a front end parses
//! variables by name; this pass assigns each one the dense `u32`
//! parameter index [`crate::variable::Variable`] actually carries, in
//! first-occurrence order, so that later stages never need a name
//! lookup to ground a term.

use crate::variable::Variable;
use hashbrown::HashMap;

/// Accumulates a schema's (or axiom's, or conditional effect's)
/// parameter list while lowering source-text variable names, handing
/// out the next dense index on first sight and reusing it afterwards.
///
/// Existentials and `forall`-conditional-effect variables continue
/// numbering from whatever scope they extend (module docs on
/// `translator/mod.rs`) — a nested scope is built via [`Self::nested`]
/// so its indices start after the parent's.
#[derive(Clone, Debug, Default)]
pub struct ParameterScope {
    by_name: HashMap<String, Variable>,
    names: Vec<String>,
}

impl ParameterScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// A scope that continues numbering after `parent`'s own
    /// parameters, for existential witnesses or `forall` variables that
    /// extend an owning schema's parameter list.
    pub fn nested(parent: &ParameterScope) -> Self {
        ParameterScope {
            by_name: parent.by_name.clone(),
            names: parent.names.clone(),
        }
    }

    /// Returns the variable bound to `name`, assigning the next dense
    /// index if this is the first time `name` is seen in this scope.
    pub fn bind(&mut self, name: &str) -> Variable {
        if let Some(var) = self.by_name.get(name) {
            return *var;
        }
        let var = Variable::new(self.names.len() as u32);
        self.by_name.insert(name.to_string(), var);
        self.names.push(name.to_string());
        var
    }

    /// Looks up an already-bound name without assigning a new index.
    pub fn get(&self, name: &str) -> Option<Variable> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The bound variables in parameter-index order, suitable for a
    /// schema's/axiom's/conditional effect's `parameters` field.
    pub fn into_variables(self) -> Vec<Variable> {
        self.names.into_iter().map(|n| self.by_name[&n]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_occurrence_order_assigns_dense_indices() {
        let mut scope = ParameterScope::new();
        let a = scope.bind("?a");
        let b = scope.bind("?b");
        let a_again = scope.bind("?a");
        assert_eq!(a.parameter_index, 0);
        assert_eq!(b.parameter_index, 1);
        assert_eq!(a, a_again);
        assert_eq!(scope.len(), 2);
    }

    #[test]
    fn nested_scope_continues_numbering() {
        let mut outer = ParameterScope::new();
        outer.bind("?x");
        outer.bind("?y");
        let mut inner = ParameterScope::nested(&outer);
        let witness = inner.bind("?z");
        assert_eq!(witness.parameter_index, 2);
        assert_eq!(inner.get("?x").unwrap().parameter_index, 0);
    }

    #[test]
    fn into_variables_preserves_order() {
        let mut scope = ParameterScope::new();
        scope.bind("?a");
        scope.bind("?b");
        let vars = scope.into_variables();
        assert_eq!(vars, vec![Variable::new(0), Variable::new(1)]);
    }
}

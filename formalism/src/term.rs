//! A term is the tagged variant {object, variable}.

use crate::indices::ObjectIndex;
use crate::variable::Variable;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Term {
    Object(ObjectIndex),
    Variable(Variable),
}

impl Term {
    pub fn as_object(&self) -> Option<ObjectIndex> {
        match self {
            Term::Object(o) => Some(*o),
            Term::Variable(_) => None,
        }
    }

    pub fn as_variable(&self) -> Option<Variable> {
        match self {
            Term::Variable(v) => Some(*v),
            Term::Object(_) => None,
        }
    }
}

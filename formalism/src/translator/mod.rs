//! Front-end-agnostic normalizations over parsed PDDL: negation normal form, disjunction
//! elimination via axiom introduction, delete-relaxation, and
//! parameter-index encoding. These operate on the [`Formula`]
//! intermediate representation a front end (e.g. `mimir-pddl`) produces
//! before lowering into the flat [`crate::condition::ConjunctiveCondition`]
//! this crate's search-facing types expect.
//!
//! Existential quantifiers and `forall`-conditional-effects are *not* a
//! separate pass here: both are absorbed directly into the data model.
//! An existentially-quantified precondition simply extends
//! `ConjunctiveCondition::parameters` past the owning schema's own
//! arity with witness variables the binding generator must bind but the
//! schema-grounding cache ignores (see `mimir-search`'s lifted
//! generator); a `forall`-conditional-effect's quantified variables
//! become `ConditionalEffect::condition.parameters`, continuing the
//! schema's parameter-index numbering, so grounding a conditional
//! effect reduces to instantiating its own consistency graph just like
//! an action schema's precondition.

pub mod delete_relax;
pub mod eliminate;
pub mod nnf;
pub mod parameter_index;

pub use eliminate::{eliminate_or_forall, flatten, free_vars};
pub use nnf::Formula;

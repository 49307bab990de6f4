//! Search: consistency graph, assignment set, satisficing binding
//! generator, lifted/grounded applicable-action generators, match
//! tree, axiom evaluator, state repository and search algorithms.
//! Everything here borrows its PDDL entities from a
//! `mimir_formalism::PddlRepositories`; this crate owns only the
//! search-specific derived structures (consistency graphs, assignment
//! sets, the match tree, the packed-state store).

pub mod algorithms;
pub mod assignment_set;
pub mod axiom_evaluator;
pub mod binding_generator;
pub mod config;
pub mod consistency_graph;
pub mod error;
pub mod event_handler;
pub mod ground;
pub mod grounded_generator;
pub mod lifted_generator;
pub mod match_tree;
pub mod state;
pub mod state_repository;
pub mod view;

pub use error::{Result, SearchError};
pub use event_handler::{DebugEventHandler, DefaultEventHandler, EventHandler, StatisticsEventHandler};
pub use state::{PackedState, StateIndex};
pub use state_repository::{RepositoryMode, StateRepository};

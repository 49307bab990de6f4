//! Event handlers: every search algorithm and the grounded
//! generator's precompute phase report their progress through one
//! trait instead of calling `tracing` macros inline, so a caller can
//! swap in a silent, verbose, or counting implementation without
//! touching the algorithm code.

use crate::algorithms::SearchStatus;

/// Observer for grounding, match-tree construction, axiom fixpoint
/// iterations and search-algorithm progress. All methods default to a
/// no-op so implementors only override what they care about.
pub trait EventHandler {
    fn on_ground_action(&mut self, _schema_name: &str) {}
    fn on_match_tree_built(&mut self, _name: &str, _num_nodes: usize, _num_leaves: usize) {}
    fn on_axiom_fixpoint_iteration(&mut self, _stratum: usize, _pass: usize) {}
    fn on_generate_successor(&mut self) {}
    fn on_expand(&mut self) {}
    fn on_prune(&mut self) {}
    fn on_layer(&mut self, _depth: usize, _num_states_in_layer: usize) {}
    fn on_status(&mut self, _status: SearchStatus) {}
}

/// Logs through `tracing` at `debug`/`trace` for per-event detail and
/// `info` for `SearchStatus` transitions. This is the handler every
/// search algorithm defaults to.
#[derive(Default)]
pub struct DefaultEventHandler;

impl EventHandler for DefaultEventHandler {
    fn on_ground_action(&mut self, schema_name: &str) {
        tracing::trace!(schema = schema_name, "grounded action");
    }

    fn on_match_tree_built(&mut self, name: &str, num_nodes: usize, num_leaves: usize) {
        tracing::debug!(name, num_nodes, num_leaves, "match tree built");
    }

    fn on_axiom_fixpoint_iteration(&mut self, stratum: usize, pass: usize) {
        tracing::trace!(stratum, pass, "axiom fixpoint iteration");
    }

    fn on_layer(&mut self, depth: usize, num_states_in_layer: usize) {
        tracing::debug!(depth, num_states_in_layer, "search layer complete");
    }

    fn on_status(&mut self, status: SearchStatus) {
        tracing::info!(?status, "search finished");
    }
}

/// Verbose per-action tracing, for debugging a single run interactively.
#[derive(Default)]
pub struct DebugEventHandler {
    inner: DefaultEventHandler,
}

impl EventHandler for DebugEventHandler {
    fn on_ground_action(&mut self, schema_name: &str) {
        tracing::debug!(schema = schema_name, "grounded action");
    }

    fn on_match_tree_built(&mut self, name: &str, num_nodes: usize, num_leaves: usize) {
        self.inner.on_match_tree_built(name, num_nodes, num_leaves);
    }

    fn on_axiom_fixpoint_iteration(&mut self, stratum: usize, pass: usize) {
        tracing::debug!(stratum, pass, "axiom fixpoint iteration");
    }

    fn on_generate_successor(&mut self) {
        tracing::trace!("generated successor");
    }

    fn on_expand(&mut self) {
        tracing::trace!("expanded state");
    }

    fn on_prune(&mut self) {
        tracing::trace!("pruned state");
    }

    fn on_layer(&mut self, depth: usize, num_states_in_layer: usize) {
        self.inner.on_layer(depth, num_states_in_layer);
    }

    fn on_status(&mut self, status: SearchStatus) {
        self.inner.on_status(status);
    }
}

/// Counters returned alongside a [`SearchStatus`] instead of (or in
/// addition to) being logged.
#[derive(Clone, Debug, Default)]
pub struct Statistics {
    pub num_generated: u64,
    pub num_expanded: u64,
    pub num_pruned: u64,
    pub num_layers: u64,
}

#[derive(Default)]
pub struct StatisticsEventHandler {
    pub statistics: Statistics,
}

impl EventHandler for StatisticsEventHandler {
    fn on_generate_successor(&mut self) {
        self.statistics.num_generated += 1;
    }

    fn on_expand(&mut self) {
        self.statistics.num_expanded += 1;
    }

    fn on_prune(&mut self) {
        self.statistics.num_pruned += 1;
    }

    fn on_layer(&mut self, _depth: usize, _num_states_in_layer: usize) {
        self.statistics.num_layers += 1;
    }
}

//! Ambient configuration surface: plain-data structs with
//! `Default`, one per enumerated option group. Library code never
//! reads argv or environment variables directly — only `mimir-cli`
//! parses these from the command line and passes the parsed struct
//! down.

use std::time::Duration;

/// BrFS / A* resource limits.
#[derive(Clone, Debug)]
pub struct SearchLimits {
    pub max_num_states: Option<usize>,
    pub max_time: Option<Duration>,
    pub stop_if_goal: bool,
}

impl Default for SearchLimits {
    fn default() -> Self {
        SearchLimits {
            max_num_states: None,
            max_time: None,
            stop_if_goal: true,
        }
    }
}

/// IW(k) configuration: `max_arity` bounds the widths
/// tried (`k = 0..=max_arity`), `initial_table_atoms` sizes the
/// novelty table's initial atom-count guess.
#[derive(Copy, Clone, Debug)]
pub struct IwOptions {
    pub max_arity: usize,
    pub initial_table_atoms: usize,
}

impl Default for IwOptions {
    fn default() -> Self {
        IwOptions {
            max_arity: 6,
            initial_table_atoms: 64,
        }
    }
}

/// SIW configuration: inherits [`IwOptions`]; its goal-counter
/// strategy is always [`crate::algorithms::ProblemGoalCounter`] — a
/// type, not a further data option, so there is nothing else to
/// configure here.
#[derive(Copy, Clone, Debug, Default)]
pub struct SiwOptions {
    pub iw: IwOptions,
}

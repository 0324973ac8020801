mod cbs;

pub use cbs::CBS;

use crate::common::{Agent, Position, Solution};
use crate::config::{Config, SplitStrategy};
use crate::error::SolveError;
use crate::map::Map;

pub trait Solver {
    fn solve(&mut self, config: &Config) -> Result<Solution, SolveError>;
}

/// Plans conflict-free paths from `starts[i]` to `goals[i]` with default
/// search settings.
pub fn find_solution(
    map: &Map,
    starts: &[Position],
    goals: &[Position],
    strategy: SplitStrategy,
) -> Result<Solution, SolveError> {
    if starts.len() != goals.len() {
        return Err(SolveError::MismatchedEndpoints {
            starts: starts.len(),
            goals: goals.len(),
        });
    }

    let agents: Vec<Agent> = starts
        .iter()
        .zip(goals)
        .enumerate()
        .map(|(id, (&start, &goal))| Agent { id, start, goal })
        .collect();

    let config = Config {
        num_agents: agents.len(),
        strategy,
        ..Config::default()
    };
    CBS::new(agents, map).solve(&config)
}

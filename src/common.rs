mod conflict;
mod constraint;
mod highlevel;
mod lowlevel;

pub use conflict::{detect_all_conflicts, detect_conflict, Conflict, ConflictType};
pub use constraint::{
    agents_violating, disjoint_splitting, standard_splitting, AgentSelector, Constraint,
    ConstraintKind, RandomSelector,
};
pub(crate) use highlevel::HighLevelOpenNode;
pub(crate) use lowlevel::LowLevelOpenNode;

use crate::map::Map;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub type Position = (usize, usize);
pub type Path = Vec<Position>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Agent {
    pub id: usize,
    pub start: Position,
    pub goal: Position,
}

impl Agent {
    pub fn verify(&self, map: &Map) -> bool {
        map.contains(self.start)
            && map.contains(self.goal)
            && map.is_passable(self.start.0, self.start.1)
            && map.is_passable(self.goal.0, self.goal.1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Solution {
    pub paths: Vec<Path>,
}

impl Solution {
    /// Builds a solution from search-time paths, collapsing the trailing
    /// goal waits of every path into a single goal entry.
    pub(crate) fn from_paths(paths: Vec<Path>) -> Self {
        Solution {
            paths: paths.into_iter().map(remove_goal_duplicates).collect(),
        }
    }

    pub fn cost(&self) -> usize {
        sum_of_costs(&self.paths)
    }

    pub fn verify(&self, map: &Map, agents: &[Agent]) -> bool {
        if self.paths.len() != agents.len() {
            debug!(
                "solution has {} paths for {} agents",
                self.paths.len(),
                agents.len()
            );
            return false;
        }

        for (agent, path) in agents.iter().zip(&self.paths) {
            if path.first() != Some(&agent.start) || path.last() != Some(&agent.goal) {
                debug!("agent {} path does not connect start and goal", agent.id);
                return false;
            }

            if path
                .iter()
                .any(|&(x, y)| !map.contains((x, y)) || !map.is_passable(x, y))
            {
                debug!("agent {} path crosses a blocked cell", agent.id);
                return false;
            }

            if path.windows(2).any(|step| {
                let (from, to) = (step[0], step[1]);
                from.0.abs_diff(to.0) + from.1.abs_diff(to.1) > 1
            }) {
                debug!("agent {} path jumps between cells", agent.id);
                return false;
            }
        }

        detect_all_conflicts(&self.paths).is_empty()
    }
}

/// Location of an agent at `time_step`. Agents rest at their last location
/// once their path ends.
pub fn get_location(path: &[Position], time_step: usize) -> Position {
    path.get(time_step)
        .or_else(|| path.last())
        .copied()
        .unwrap_or_default()
}

// Notice: a path includes its start, so its cost is one less than its length.
pub fn sum_of_costs(paths: &[Path]) -> usize {
    paths.iter().map(|path| path.len().saturating_sub(1)).sum()
}

fn remove_goal_duplicates(mut path: Path) -> Path {
    while path.len() >= 2 && path[path.len() - 1] == path[path.len() - 2] {
        path.pop();
    }
    path
}

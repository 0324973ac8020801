mod astar;

pub use astar::a_star_search;

use crate::common::{Agent, Constraint, Path, Position};
use crate::map::{Heuristic, Map};
use crate::stat::Stats;

use std::collections::HashMap;

type Trace = HashMap<(Position, usize), (Position, usize)>;

/// Single-agent planner consumed by the high-level search.
pub trait LowLevelSolver {
    fn num_agents(&self) -> usize;

    /// Shortest path for `agent` honouring every constraint that concerns
    /// it, or `None` when the constraints leave no path to the goal.
    fn plan(&self, agent: usize, constraints: &[Constraint], stats: &mut Stats) -> Option<Path>;
}

#[derive(Debug, Clone)]
pub struct AStarSolver {
    map: Map,
    agents: Vec<Agent>,
    heuristics: Vec<Heuristic>,
}

impl AStarSolver {
    pub fn new(map: &Map, agents: &[Agent]) -> Self {
        let heuristics = agents
            .iter()
            .map(|agent| map.heuristic_dji(agent.goal))
            .collect();

        AStarSolver {
            map: map.clone(),
            agents: agents.to_vec(),
            heuristics,
        }
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }
}

impl LowLevelSolver for AStarSolver {
    fn num_agents(&self) -> usize {
        self.agents.len()
    }

    fn plan(&self, agent: usize, constraints: &[Constraint], stats: &mut Stats) -> Option<Path> {
        a_star_search(
            &self.map,
            agent,
            &self.agents[agent],
            &self.heuristics[agent],
            constraints,
            stats,
        )
    }
}

fn construct_path(trace: &Trace, mut current: (Position, usize)) -> Path {
    let mut path = vec![current.0];
    while let Some(&(pos, time)) = trace.get(&current) {
        path.push(pos);
        current = (pos, time);
    }
    path.reverse();
    path
}

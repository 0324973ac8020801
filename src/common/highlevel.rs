use super::{agents_violating, detect_all_conflicts, sum_of_costs, Conflict, Constraint, Path};
use crate::algorithm::LowLevelSolver;
use crate::error::SolveError;
use crate::stat::Stats;

use std::cmp::Ordering;
use tracing::debug;

#[derive(Clone, Eq, PartialEq, Debug)]
pub(crate) struct HighLevelOpenNode {
    pub(crate) node_id: usize,
    pub(crate) constraints: Vec<Constraint>, // Append-only along a branch
    pub(crate) conflicts: Vec<Conflict>,
    pub(crate) paths: Vec<Path>, // Maps agent IDs to their paths
    pub(crate) cost: usize,      // Total cost for all paths under current constraints
}

impl Ord for HighLevelOpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .cmp(&other.cost)
            .then_with(|| self.conflicts.len().cmp(&other.conflicts.len()))
            // Node ids are unique, so no two open nodes compare equal.
            .then_with(|| self.node_id.cmp(&other.node_id))
    }
}

impl PartialOrd for HighLevelOpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl HighLevelOpenNode {
    /// Root of the constraint tree: every agent follows its unconstrained
    /// shortest path.
    pub(crate) fn new<L: LowLevelSolver + ?Sized>(
        low_level: &L,
        node_id: usize,
        stats: &mut Stats,
    ) -> Result<Self, SolveError> {
        let mut paths = Vec::with_capacity(low_level.num_agents());

        for agent in 0..low_level.num_agents() {
            let path = low_level
                .plan(agent, &[], stats)
                .ok_or(SolveError::Infeasible { agent })?;
            paths.push(path);
        }

        let root = HighLevelOpenNode {
            node_id,
            constraints: Vec::new(),
            conflicts: detect_all_conflicts(&paths),
            cost: sum_of_costs(&paths),
            paths,
        };
        debug!("High level start node {root:?}");
        Ok(root)
    }

    /// Child node inheriting this node's constraints plus `constraint`.
    ///
    /// A negative constraint replans only its own agent; a positive one also
    /// replans every agent whose current path now runs into the reserved
    /// occupancy. Returns `None` when any of these replans fails.
    pub(crate) fn update_constraint<L: LowLevelSolver + ?Sized>(
        &self,
        constraint: Constraint,
        node_id: usize,
        low_level: &L,
        stats: &mut Stats,
    ) -> Option<HighLevelOpenNode> {
        let mut new_constraints = self.constraints.clone();
        new_constraints.push(constraint);

        let mut agents_to_update = vec![constraint.agent];
        if constraint.is_positive {
            agents_to_update.extend(agents_violating(&constraint, &self.paths));
        }

        let mut new_paths = self.paths.clone();
        for &agent in &agents_to_update {
            let Some(new_path) = low_level.plan(agent, &new_constraints, stats) else {
                debug!("Prune node {node_id:?}: agent {agent:?} has no path under {constraint:?}");
                return None;
            };
            debug!("Update agent {agent:?} with path {new_path:?} for {constraint:?}");
            new_paths[agent] = new_path;
        }

        Some(HighLevelOpenNode {
            node_id,
            constraints: new_constraints,
            conflicts: detect_all_conflicts(&new_paths),
            cost: sum_of_costs(&new_paths),
            paths: new_paths,
        })
    }
}

use super::Solver;
use crate::algorithm::{AStarSolver, LowLevelSolver};
use crate::common::{
    disjoint_splitting, standard_splitting, Agent, AgentSelector, HighLevelOpenNode,
    RandomSelector, Solution,
};
use crate::config::{Config, SplitStrategy};
use crate::error::SolveError;
use crate::map::Map;
use crate::stat::Stats;

use std::collections::BTreeSet;
use std::time::Instant;
use tracing::debug;

pub struct CBS<L: LowLevelSolver = AStarSolver> {
    low_level: L,
    selector: Option<Box<dyn AgentSelector>>,
    stats: Stats,
}

impl CBS {
    pub fn new(agents: Vec<Agent>, map: &Map) -> Self {
        CBS::with_low_level(AStarSolver::new(map, &agents))
    }
}

impl<L: LowLevelSolver> CBS<L> {
    pub fn with_low_level(low_level: L) -> Self {
        CBS {
            low_level,
            selector: None,
            stats: Stats::default(),
        }
    }

    /// Replaces the seeded random choice of the agent that receives the
    /// positive constraint under disjoint splitting.
    pub fn with_selector<S: AgentSelector + 'static>(mut self, selector: S) -> Self {
        self.selector = Some(Box::new(selector));
        self
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }
}

impl<L: LowLevelSolver> Solver for CBS<L> {
    fn solve(&mut self, config: &Config) -> Result<Solution, SolveError> {
        let total_solve_start_time = Instant::now();
        let CBS {
            low_level,
            selector,
            stats,
        } = self;
        *stats = Stats::default();

        let mut random_selector: Box<dyn AgentSelector> =
            Box::new(RandomSelector::new(config.seed));
        let selector = match selector {
            Some(selector) => selector,
            None => &mut random_selector,
        };

        let mut open = BTreeSet::new();
        let root = match HighLevelOpenNode::new(&*low_level, stats.high_level_generated_nodes, stats)
        {
            Ok(root) => root,
            Err(error) => {
                debug!("{error}");
                stats.time_us = total_solve_start_time.elapsed().as_micros() as usize;
                return Err(error);
            }
        };
        stats.high_level_generated_nodes += 1;
        open.insert(root);

        while let Some(current_node) = open.pop_first() {
            let Some(conflict) = current_node.conflicts.first() else {
                // No conflicts, return solution even if the budget just ran out.
                stats.high_level_expand_nodes += 1;
                stats.time_us = total_solve_start_time.elapsed().as_micros() as usize;
                stats.costs = current_node.cost;
                stats.print();
                return Ok(Solution::from_paths(current_node.paths));
            };

            if let Some(error) = exceeded_budget(config, stats, total_solve_start_time) {
                debug!("{error}");
                stats.time_us = total_solve_start_time.elapsed().as_micros() as usize;
                return Err(error);
            }
            stats.high_level_expand_nodes += 1;
            debug!(
                "Expand node {:?}, cost {:?}, conflicts {:?}",
                current_node.node_id,
                current_node.cost,
                current_node.conflicts.len()
            );
            debug!("conflict: {conflict:?}");

            let constraints = match config.strategy {
                SplitStrategy::Standard => standard_splitting(conflict),
                SplitStrategy::Disjoint => disjoint_splitting(conflict, &mut **selector),
            };

            for constraint in constraints {
                if let Some(child) = current_node.update_constraint(
                    constraint,
                    stats.high_level_generated_nodes,
                    &*low_level,
                    stats,
                ) {
                    debug!(
                        "Generate node {:?} from node {:?}, cost {:?}",
                        child.node_id, current_node.node_id, child.cost
                    );
                    stats.high_level_generated_nodes += 1;
                    open.insert(child);
                }
            }
        }

        debug!("open list exhausted");
        stats.time_us = total_solve_start_time.elapsed().as_micros() as usize;
        Err(SolveError::NoSolution)
    }
}

fn exceeded_budget(config: &Config, stats: &Stats, start: Instant) -> Option<SolveError> {
    let elapsed = start.elapsed();
    let out_of_nodes = config
        .max_expanded_nodes
        .is_some_and(|max| stats.high_level_expand_nodes >= max);
    let out_of_time = config
        .time_limit_ms
        .is_some_and(|limit| elapsed.as_millis() >= u128::from(limit));

    (out_of_nodes || out_of_time).then(|| SolveError::BudgetExhausted {
        expanded: stats.high_level_expand_nodes,
        elapsed_ms: elapsed.as_millis(),
    })
}

use super::construct_path;
use crate::common::{Agent, Constraint, ConstraintKind, LowLevelOpenNode, Path, Position};
use crate::map::{Heuristic, Map};
use crate::stat::Stats;

use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, instrument, trace};

/// Constraints of one agent compiled into lookup tables. Positive
/// constraints on other agents become negative ones here.
#[derive(Debug, Default, Clone)]
pub(crate) struct ConstraintTable {
    vertex: HashSet<(Position, usize)>,
    edge: HashSet<(Position, Position, usize)>,
    required: HashMap<usize, Position>,
    infeasible: bool,
    limit_time_step: usize,
}

impl ConstraintTable {
    pub(crate) fn new(agent: usize, constraints: &[Constraint]) -> Self {
        let mut table = ConstraintTable::default();

        for constraint in constraints {
            let own = constraint.agent == agent;
            match (constraint.kind, own, constraint.is_positive) {
                (_, false, false) => continue,
                (
                    ConstraintKind::Vertex {
                        position,
                        time_step,
                    },
                    true,
                    false,
                )
                | (
                    ConstraintKind::Vertex {
                        position,
                        time_step,
                    },
                    false,
                    true,
                ) => table.forbid_vertex(position, time_step),
                (
                    ConstraintKind::Edge {
                        from_position,
                        to_position,
                        to_time_step,
                    },
                    true,
                    false,
                ) => table.forbid_edge(from_position, to_position, to_time_step),
                (
                    ConstraintKind::Vertex {
                        position,
                        time_step,
                    },
                    true,
                    true,
                ) => table.require(position, time_step),
                (
                    ConstraintKind::Edge {
                        from_position,
                        to_position,
                        to_time_step,
                    },
                    true,
                    true,
                ) => match to_time_step.checked_sub(1) {
                    Some(from_time_step) => {
                        table.require(from_position, from_time_step);
                        table.require(to_position, to_time_step);
                    }
                    None => table.infeasible = true,
                },
                (
                    ConstraintKind::Edge {
                        from_position,
                        to_position,
                        to_time_step,
                    },
                    false,
                    true,
                ) => {
                    if let Some(from_time_step) = to_time_step.checked_sub(1) {
                        table.forbid_vertex(from_position, from_time_step);
                    }
                    table.forbid_vertex(to_position, to_time_step);
                    table.forbid_edge(to_position, from_position, to_time_step);
                }
            }
        }

        table
    }

    fn forbid_vertex(&mut self, position: Position, time_step: usize) {
        self.vertex.insert((position, time_step));
        self.limit_time_step = self.limit_time_step.max(time_step);
    }

    fn forbid_edge(&mut self, from: Position, to: Position, to_time_step: usize) {
        self.edge.insert((from, to, to_time_step));
        self.limit_time_step = self.limit_time_step.max(to_time_step);
    }

    fn require(&mut self, position: Position, time_step: usize) {
        if let Some(previous) = self.required.insert(time_step, position) {
            if previous != position {
                self.infeasible = true;
            }
        }
        self.limit_time_step = self.limit_time_step.max(time_step);
    }

    pub(crate) fn is_vertex_allowed(&self, position: Position, time_step: usize) -> bool {
        !self.vertex.contains(&(position, time_step))
            && self
                .required
                .get(&time_step)
                .is_none_or(|required| *required == position)
    }

    pub(crate) fn is_move_allowed(&self, from: Position, to: Position, to_time_step: usize) -> bool {
        self.is_vertex_allowed(to, to_time_step) && !self.edge.contains(&(from, to, to_time_step))
    }

    /// Latest timestep at which resting on `goal` would break a constraint.
    pub(crate) fn last_blocked_time(&self, goal: Position) -> Option<usize> {
        let forbidden = self
            .vertex
            .iter()
            .filter(|(position, _)| *position == goal)
            .map(|(_, time_step)| *time_step);
        let elsewhere = self
            .required
            .iter()
            .filter(|(_, position)| **position != goal)
            .map(|(time_step, _)| *time_step);
        forbidden.chain(elsewhere).max()
    }
}

/// Plans for `agent`, which sits at `agent_index` in the agent list that
/// `constraints` refer to.
#[instrument(skip_all, name="a_star", fields(agent_index = agent_index, id = agent.id, start = format!("{:?}", agent.start), goal = format!("{:?}", agent.goal)), level = "debug")]
pub fn a_star_search(
    map: &Map,
    agent_index: usize,
    agent: &Agent,
    heuristic: &Heuristic,
    constraints: &[Constraint],
    stats: &mut Stats,
) -> Option<Path> {
    let table = ConstraintTable::new(agent_index, constraints);
    let path_length_constraint = table.last_blocked_time(agent.goal);
    let constraint_limit_time_step = table.limit_time_step;
    debug!("constraints: {constraints:?}, limit time step: {constraint_limit_time_step:?}");

    let Some(&start_h_open_cost) = heuristic
        .get(agent.start.0)
        .and_then(|row| row.get(agent.start.1))
    else {
        debug!("start is outside the map");
        return None;
    };
    if table.infeasible
        || start_h_open_cost == usize::MAX
        || !table.is_vertex_allowed(agent.start, 0)
    {
        debug!("cannot find solution");
        return None;
    }

    let mut open_list = BTreeSet::new();
    let mut closed_list = HashSet::new();
    let mut trace = HashMap::new();

    open_list.insert(LowLevelOpenNode {
        position: agent.start,
        f_open_cost: start_h_open_cost,
        g_cost: 0,
        time_step: 0,
    });

    while let Some(current) = open_list.pop_first() {
        if !closed_list.insert((current.position, current.time_step)) {
            continue;
        }
        trace!("expand node: {current:?}");
        stats.low_level_expand_nodes += 1;

        if current.position == agent.goal
            && path_length_constraint.is_none_or(|time_step| current.g_cost > time_step)
        {
            return Some(construct_path(&trace, (current.position, current.g_cost)));
        }

        let exceed_constraints_limit_time_step = current.time_step > constraint_limit_time_step;

        // Assuming uniform cost, which also indicate the current time.
        let tentative_g_cost = current.g_cost + 1;

        // Tricky: after constraint limit, we fixed time step as T + 1, algorithm
        // demote to 2-D a star, enable branch pruning
        let tentative_time_step = if exceed_constraints_limit_time_step {
            current.time_step
        } else {
            current.time_step + 1
        };

        for neighbor in map.get_neighbors(
            current.position.0,
            current.position.1,
            !exceed_constraints_limit_time_step,
        ) {
            if closed_list.contains(&(neighbor, tentative_time_step)) {
                continue;
            }

            if !table.is_move_allowed(current.position, neighbor, tentative_g_cost) {
                continue;
            }

            let h_open_cost = heuristic[neighbor.0][neighbor.1];
            if h_open_cost == usize::MAX {
                continue;
            }

            // If this node has already in the open list, we ignore this update.
            if open_list.insert(LowLevelOpenNode {
                position: neighbor,
                f_open_cost: tentative_g_cost + h_open_cost,
                g_cost: tentative_g_cost,
                time_step: tentative_time_step,
            }) {
                trace.insert(
                    (neighbor, tentative_g_cost),
                    (current.position, current.g_cost),
                );
            }
        }
    }

    debug!("cannot find solution");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    // Helper function to setup tracing
    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    }

    fn setup() -> (Map, Agent, Heuristic) {
        init_tracing();
        let agent = Agent {
            id: 0,
            start: (2, 2),
            goal: (0, 0),
        };
        let map = Map::from_file("map_file/test/test.map").unwrap();
        let heuristic = map.heuristic_dji(agent.goal);
        (map, agent, heuristic)
    }

    fn vertex(agent: usize, position: Position, time_step: usize, is_positive: bool) -> Constraint {
        Constraint {
            agent,
            kind: ConstraintKind::Vertex {
                position,
                time_step,
            },
            is_positive,
        }
    }

    fn edge(
        agent: usize,
        from_position: Position,
        to_position: Position,
        to_time_step: usize,
        is_positive: bool,
    ) -> Constraint {
        Constraint {
            agent,
            kind: ConstraintKind::Edge {
                from_position,
                to_position,
                to_time_step,
            },
            is_positive,
        }
    }

    // Ideal Path
    // [(2, 2), (1, 2), (0, 2), (0, 1), (0, 0)]
    // or
    // [(2, 2), (2, 1), (2, 0), (1, 0), (0, 0)]
    #[test]
    fn test_a_star_no_constraint() {
        let (map, agent, heuristic) = setup();
        let stats = &mut Stats::default();
        let path = a_star_search(&map, 0, &agent, &heuristic, &[], stats).unwrap();
        debug!("{path:?}");
        assert_eq!(path.len(), 5);
        assert_eq!(path.first(), Some(&(2, 2)));
        assert_eq!(path.last(), Some(&(0, 0)));
        assert!(stats.low_level_expand_nodes > 0);
    }

    #[test]
    fn test_a_star_in_path_vertex_constraint_alternative_path() {
        let (map, agent, heuristic) = setup();
        let constraints = [vertex(0, (0, 2), 2, false)];
        let path = a_star_search(&map, 0, &agent, &heuristic, &constraints, &mut Stats::default())
            .unwrap();
        assert_eq!(path, vec![(2, 2), (2, 1), (2, 0), (1, 0), (0, 0)]);
    }

    #[test]
    fn test_a_star_in_path_vertex_constraint() {
        let (map, agent, heuristic) = setup();
        let constraints = [vertex(0, (0, 2), 2, false), vertex(0, (2, 0), 2, false)];
        let path = a_star_search(&map, 0, &agent, &heuristic, &constraints, &mut Stats::default())
            .unwrap();
        assert_eq!(path.len(), 6);
        assert_ne!(path[2], (0, 2));
        assert_ne!(path[2], (2, 0));
    }

    #[test]
    fn test_a_star_other_agent_negative_constraint_is_ignored() {
        let (map, agent, heuristic) = setup();
        let constraints = [vertex(1, (0, 2), 2, false), vertex(1, (2, 0), 2, false)];
        let path = a_star_search(&map, 0, &agent, &heuristic, &constraints, &mut Stats::default())
            .unwrap();
        assert_eq!(path.len(), 5);
    }

    #[test]
    fn test_a_star_path_length_constraint() {
        let (map, agent, heuristic) = setup();
        let constraints = [vertex(0, (0, 0), 4, false)];
        let path = a_star_search(&map, 0, &agent, &heuristic, &constraints, &mut Stats::default())
            .unwrap();
        assert_eq!(path.len(), 6);
    }

    #[test]
    fn test_a_star_late_goal_constraint() {
        let (map, agent, heuristic) = setup();
        let constraints = [vertex(0, (0, 0), 10, false)];
        let path = a_star_search(&map, 0, &agent, &heuristic, &constraints, &mut Stats::default())
            .unwrap();
        assert_eq!(path.len(), 12);
        assert_ne!(path[10], (0, 0));
        assert_eq!(path[11], (0, 0));
    }

    #[test]
    fn test_a_star_edge_constraint_alternative_path() {
        let (map, agent, heuristic) = setup();
        let constraints = [edge(0, (0, 2), (1, 2), 2, false)];
        let path = a_star_search(&map, 0, &agent, &heuristic, &constraints, &mut Stats::default())
            .unwrap();
        assert_eq!(path.len(), 5);
    }

    #[test]
    fn test_a_star_edge_constraint() {
        let (map, agent, heuristic) = setup();
        let constraints = [
            edge(0, (1, 2), (0, 2), 2, false),
            edge(0, (2, 0), (1, 0), 3, false),
        ];
        let path = a_star_search(&map, 0, &agent, &heuristic, &constraints, &mut Stats::default())
            .unwrap();
        assert_eq!(path.len(), 6);
    }

    #[test]
    fn test_a_star_own_positive_vertex_constraint() {
        let (map, agent, heuristic) = setup();
        let constraints = [vertex(0, (2, 0), 2, true)];
        let path = a_star_search(&map, 0, &agent, &heuristic, &constraints, &mut Stats::default())
            .unwrap();
        assert_eq!(path, vec![(2, 2), (2, 1), (2, 0), (1, 0), (0, 0)]);
    }

    #[test]
    fn test_a_star_own_positive_edge_constraint_forces_wait() {
        let (map, agent, heuristic) = setup();
        // Leave (1, 2) for (0, 2) only when arriving at step 3.
        let constraints = [edge(0, (1, 2), (0, 2), 3, true)];
        let path = a_star_search(&map, 0, &agent, &heuristic, &constraints, &mut Stats::default())
            .unwrap();
        assert_eq!(path.len(), 6);
        assert_eq!(path[2], (1, 2));
        assert_eq!(path[3], (0, 2));
    }

    #[test]
    fn test_a_star_other_agent_positive_constraints() {
        let (map, agent, heuristic) = setup();
        let constraints = [vertex(1, (0, 2), 2, true), vertex(2, (2, 0), 2, true)];
        let path = a_star_search(&map, 0, &agent, &heuristic, &constraints, &mut Stats::default())
            .unwrap();
        assert_eq!(path.len(), 6);

        // Reserving (2, 1) -> (2, 0) also reserves (2, 1) at step 1.
        let constraints = [edge(1, (2, 1), (2, 0), 2, true)];
        let path = a_star_search(&map, 0, &agent, &heuristic, &constraints, &mut Stats::default())
            .unwrap();
        assert_eq!(path, vec![(2, 2), (1, 2), (0, 2), (0, 1), (0, 0)]);
    }

    #[test]
    fn test_a_star_contradicting_positive_constraints() {
        let (map, agent, heuristic) = setup();
        let constraints = [vertex(0, (2, 0), 2, true), vertex(0, (0, 2), 2, true)];
        assert_eq!(
            a_star_search(&map, 0, &agent, &heuristic, &constraints, &mut Stats::default()),
            None
        );
    }

    #[test]
    fn test_a_star_unreachable_goal() {
        init_tracing();
        let map = Map::parse("type octile\nheight 1\nwidth 5\nmap\n..@..\n").unwrap();
        let agent = Agent {
            id: 0,
            start: (0, 0),
            goal: (0, 4),
        };
        let heuristic = map.heuristic_dji(agent.goal);
        assert_eq!(
            a_star_search(&map, 0, &agent, &heuristic, &[], &mut Stats::default()),
            None
        );
    }

    #[test]
    fn test_a_star_blocked_start_terminates() {
        let (map, agent, heuristic) = setup();
        // Every neighbour of the start, and the start itself, is forbidden at step 1.
        let constraints = [
            vertex(0, (2, 2), 1, false),
            vertex(0, (1, 2), 1, false),
            vertex(0, (2, 1), 1, false),
        ];
        assert_eq!(
            a_star_search(&map, 0, &agent, &heuristic, &constraints, &mut Stats::default()),
            None
        );
    }

    #[test]
    fn test_a_star_start_is_goal() {
        init_tracing();
        let map = Map::from_file("map_file/test/test.map").unwrap();
        let agent = Agent {
            id: 0,
            start: (0, 0),
            goal: (0, 0),
        };
        let heuristic = map.heuristic_dji(agent.goal);
        let path = a_star_search(&map, 0, &agent, &heuristic, &[], &mut Stats::default()).unwrap();
        assert_eq!(path, vec![(0, 0)]);
    }

    #[test]
    fn test_a_star_constraints_follow_agent_index() {
        let (map, mut agent, heuristic) = setup();
        agent.id = 7;
        let constraints = [vertex(3, (0, 2), 2, false), vertex(3, (2, 0), 2, false)];
        let path = a_star_search(&map, 3, &agent, &heuristic, &constraints, &mut Stats::default())
            .unwrap();
        assert_eq!(path.len(), 6);

        // Constraints naming the label rather than the index do not apply.
        let constraints = [vertex(7, (0, 2), 2, false), vertex(7, (2, 0), 2, false)];
        let path = a_star_search(&map, 3, &agent, &heuristic, &constraints, &mut Stats::default())
            .unwrap();
        assert_eq!(path.len(), 5);
    }

    #[test]
    fn test_a_star_start_outside_map() {
        let (map, mut agent, heuristic) = setup();
        agent.start = (9, 9);
        assert_eq!(
            a_star_search(&map, 0, &agent, &heuristic, &[], &mut Stats::default()),
            None
        );
        agent.start = (0, 3);
        assert_eq!(
            a_star_search(&map, 0, &agent, &heuristic, &[], &mut Stats::default()),
            None
        );
    }
}

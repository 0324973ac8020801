use super::{get_location, Conflict, ConflictType, Path, Position};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash, Ord, PartialOrd)]
pub enum ConstraintKind {
    Vertex {
        position: Position,
        time_step: usize,
    },
    Edge {
        from_position: Position,
        to_position: Position,
        to_time_step: usize,
    },
}

impl ConstraintKind {
    pub fn time_step(&self) -> usize {
        match self {
            ConstraintKind::Vertex { time_step, .. } => *time_step,
            ConstraintKind::Edge { to_time_step, .. } => *to_time_step,
        }
    }
}

/// A negative constraint forbids `agent` from the occupancy described by
/// `kind`; a positive one requires it and reserves it against every other
/// agent.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash, Ord, PartialOrd)]
pub struct Constraint {
    pub agent: usize,
    pub kind: ConstraintKind,
    pub is_positive: bool,
}

impl Constraint {
    fn from_conflict(conflict: &Conflict, agent: usize, is_positive: bool) -> Self {
        let kind = match conflict.conflict_type {
            ConflictType::Vertex {
                position,
                time_step,
            } => ConstraintKind::Vertex {
                position,
                time_step,
            },
            // The second agent travels the edge the other way round.
            ConflictType::Edge {
                from_position,
                to_position,
                time_step,
            } if agent == conflict.agent_1 => ConstraintKind::Edge {
                from_position,
                to_position,
                to_time_step: time_step,
            },
            ConflictType::Edge {
                from_position,
                to_position,
                time_step,
            } => ConstraintKind::Edge {
                from_position: to_position,
                to_position: from_position,
                to_time_step: time_step,
            },
        };

        Constraint {
            agent,
            kind,
            is_positive,
        }
    }
}

/// Picks which agent of a conflict receives the positive constraint under
/// disjoint splitting.
pub trait AgentSelector {
    fn select(&mut self, conflict: &Conflict) -> usize;
}

impl<F> AgentSelector for F
where
    F: FnMut(&Conflict) -> usize,
{
    fn select(&mut self, conflict: &Conflict) -> usize {
        self(conflict)
    }
}

#[derive(Debug, Clone)]
pub struct RandomSelector {
    rng: StdRng,
}

impl RandomSelector {
    pub fn new(seed: u64) -> Self {
        RandomSelector {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl AgentSelector for RandomSelector {
    fn select(&mut self, conflict: &Conflict) -> usize {
        if self.rng.gen_bool(0.5) {
            conflict.agent_1
        } else {
            conflict.agent_2
        }
    }
}

pub fn standard_splitting(conflict: &Conflict) -> [Constraint; 2] {
    [
        Constraint::from_conflict(conflict, conflict.agent_1, false),
        Constraint::from_conflict(conflict, conflict.agent_2, false),
    ]
}

/// Splits a conflict into a positive constraint on the selected agent and a
/// negative constraint on the other one.
pub fn disjoint_splitting<S: AgentSelector + ?Sized>(
    conflict: &Conflict,
    selector: &mut S,
) -> [Constraint; 2] {
    let chosen = selector.select(conflict);
    let other = if chosen == conflict.agent_1 {
        conflict.agent_2
    } else {
        conflict.agent_1
    };

    [
        Constraint::from_conflict(conflict, chosen, true),
        Constraint::from_conflict(conflict, other, false),
    ]
}

/// Agents, other than the constrained one, whose current path collides with
/// the occupancy reserved by a positive constraint.
pub fn agents_violating(constraint: &Constraint, paths: &[Path]) -> Vec<usize> {
    debug_assert!(constraint.is_positive);

    paths
        .iter()
        .enumerate()
        .filter(|&(agent, _)| agent != constraint.agent)
        .filter(|(_, path)| match constraint.kind {
            ConstraintKind::Vertex {
                position,
                time_step,
            } => get_location(path, time_step) == position,
            ConstraintKind::Edge {
                from_position,
                to_position,
                to_time_step,
            } => {
                let prev = get_location(path, to_time_step.saturating_sub(1));
                let curr = get_location(path, to_time_step);
                prev == from_position
                    || curr == to_position
                    || (prev == to_position && curr == from_position)
            }
        })
        .map(|(agent, _)| agent)
        .collect()
}

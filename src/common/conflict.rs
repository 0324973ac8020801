use super::{get_location, Path, Position};

use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConflictType {
    Vertex {
        position: Position,
        time_step: usize,
    },
    // Positions are the first agent's cells at `time_step - 1` and `time_step`.
    Edge {
        from_position: Position,
        to_position: Position,
        time_step: usize,
    },
}

impl ConflictType {
    pub fn time_step(&self) -> usize {
        match self {
            ConflictType::Vertex { time_step, .. } | ConflictType::Edge { time_step, .. } => {
                *time_step
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Conflict {
    pub agent_1: usize,
    pub agent_2: usize,
    pub conflict_type: ConflictType,
}

/// Finds the earliest collision between two paths.
///
/// Every timestep up to the end of the longer path is scanned, holding the
/// shorter path at its goal. When a vertex collision and an edge collision
/// complete at the same timestep the vertex collision is reported.
pub fn detect_conflict(path_1: &[Position], path_2: &[Position]) -> Option<ConflictType> {
    let horizon = path_1.len().max(path_2.len());

    for step in 0..horizon {
        let pos1 = get_location(path_1, step);
        let pos2 = get_location(path_2, step);

        if pos1 == pos2 {
            return Some(ConflictType::Vertex {
                position: pos1,
                time_step: step,
            });
        }

        // Edge conflicts need the previous step.
        if step == 0 {
            continue;
        }

        let prev_pos1 = get_location(path_1, step - 1);
        let prev_pos2 = get_location(path_2, step - 1);
        if prev_pos1 == pos2 && prev_pos2 == pos1 {
            return Some(ConflictType::Edge {
                from_position: prev_pos1,
                to_position: pos1,
                time_step: step,
            });
        }
    }

    None
}

/// Collects the first conflict of every agent pair, ordered by agent pair.
pub fn detect_all_conflicts(paths: &[Path]) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    for i in 0..paths.len() {
        for j in (i + 1)..paths.len() {
            if let Some(conflict_type) = detect_conflict(&paths[i], &paths[j]) {
                conflicts.push(Conflict {
                    agent_1: i,
                    agent_2: j,
                    conflict_type,
                });
            }
        }
    }

    trace!("Detect conflicts: {conflicts:?}");
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_conflict_on_disjoint_paths() {
        let path_1 = vec![(0, 0), (0, 1), (0, 2)];
        let path_2 = vec![(1, 0), (1, 1), (1, 2)];
        assert_eq!(detect_conflict(&path_1, &path_2), None);
    }

    #[test]
    fn test_following_is_not_a_conflict() {
        // Agent 2 steps into the cell agent 1 has just left.
        let path_1 = vec![(0, 1), (0, 2), (0, 3)];
        let path_2 = vec![(0, 0), (0, 1), (0, 2)];
        assert_eq!(detect_conflict(&path_1, &path_2), None);
    }

    #[test]
    fn test_vertex_conflict() {
        let path_1 = vec![(0, 0), (0, 1), (0, 2), (0, 3), (0, 4)];
        let path_2 = vec![(0, 4), (0, 3), (0, 2), (0, 1), (0, 0)];
        assert_eq!(
            detect_conflict(&path_1, &path_2),
            Some(ConflictType::Vertex {
                position: (0, 2),
                time_step: 2,
            })
        );
    }

    #[test]
    fn test_edge_conflict() {
        let path_1 = vec![(0, 0), (0, 1), (0, 2), (0, 3)];
        let path_2 = vec![(0, 3), (0, 2), (0, 1), (0, 0)];
        assert_eq!(
            detect_conflict(&path_1, &path_2),
            Some(ConflictType::Edge {
                from_position: (0, 1),
                to_position: (0, 2),
                time_step: 2,
            })
        );
    }

    #[test]
    fn test_reports_earliest_conflict() {
        // Edge swap completes at step 1, a vertex collision follows at step 3.
        let path_1 = vec![(0, 0), (0, 1), (1, 1), (2, 1)];
        let path_2 = vec![(0, 1), (0, 0), (1, 0), (2, 1)];
        assert_eq!(
            detect_conflict(&path_1, &path_2),
            Some(ConflictType::Edge {
                from_position: (0, 0),
                to_position: (0, 1),
                time_step: 1,
            })
        );
    }

    #[test]
    fn test_conflict_after_shorter_path_ends() {
        // Agent 1 rests at its goal (0, 2) while agent 2 passes through it.
        let path_1 = vec![(0, 1), (0, 2)];
        let path_2 = vec![(2, 2), (2, 2), (2, 2), (2, 2), (1, 2), (0, 2), (0, 3)];
        assert_eq!(
            detect_conflict(&path_1, &path_2),
            Some(ConflictType::Vertex {
                position: (0, 2),
                time_step: 5,
            })
        );
    }

    #[test]
    fn test_long_paths_are_scanned_to_the_end() {
        let mut path_1: Path = (0..40).map(|y| (0, y)).collect();
        let mut path_2: Path = (0..40).map(|y| (1, y)).collect();
        path_1.push((0, 40));
        path_2.push((0, 40));
        assert_eq!(
            detect_conflict(&path_1, &path_2),
            Some(ConflictType::Vertex {
                position: (0, 40),
                time_step: 40,
            })
        );
    }

    #[test]
    fn test_detect_all_conflicts_one_per_pair() {
        let paths = vec![
            vec![(0, 0), (0, 1), (0, 2), (0, 3)],
            vec![(1, 1), (0, 1), (1, 1), (0, 3)],
            vec![(5, 5), (5, 6)],
        ];
        let conflicts = detect_all_conflicts(&paths);
        assert_eq!(
            conflicts,
            vec![Conflict {
                agent_1: 0,
                agent_2: 1,
                conflict_type: ConflictType::Vertex {
                    position: (0, 1),
                    time_step: 1,
                },
            }]
        );
    }
}

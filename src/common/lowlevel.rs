use super::Position;

use std::cmp::Ordering;

#[derive(Clone, Debug)]
pub(crate) struct LowLevelOpenNode {
    pub(crate) position: Position, // once we can determine a position, we can also determine the h_cost
    pub(crate) f_open_cost: usize,
    pub(crate) g_cost: usize,
    pub(crate) time_step: usize, // before reach constraint limit, time_step is exactly same as g_cost
}

impl PartialEq for LowLevelOpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for LowLevelOpenNode {}

impl PartialOrd for LowLevelOpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LowLevelOpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_open_cost
            .cmp(&other.f_open_cost)
            // Higher g cost (time) has higher priority
            .then_with(|| other.g_cost.cmp(&self.g_cost))
            // Tricky thing: if g cost is the same, then time step must be same;
            // if time step is the same, g cost might be different.
            .then_with(|| self.position.cmp(&other.position))
    }
}

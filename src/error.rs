use thiserror::Error;

/// Terminal outcomes of a high-level search that produced no plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    #[error("agent {agent} has no path to its goal")]
    Infeasible { agent: usize },

    #[error("constraint tree exhausted without a conflict-free solution")]
    NoSolution,

    #[error("search budget exhausted after {expanded} expanded nodes ({elapsed_ms} ms)")]
    BudgetExhausted { expanded: usize, elapsed_ms: u128 },

    #[error("{starts} start positions given for {goals} goals")]
    MismatchedEndpoints { starts: usize, goals: usize },
}

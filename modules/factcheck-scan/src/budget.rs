use tracing::info;

use factcheck_common::{BudgetState, ScanBudget};

/// How many candidates one scan may fully investigate, with the
/// intermediate quantities kept for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    /// Calls left after the prescreen reservation.
    pub remaining: u32,
    /// Investigations the remaining calls can pay for.
    pub max_investigations: u32,
    /// Investigations implied by the floor target. Computed, never enforced.
    pub min_investigations: u32,
    pub target_count: u32,
}

/// Compute the investigation allowance for a budget.
///
/// The floor (`min_investigations`) only ever matters when it is below the
/// honest maximum, where `max(min, max)` is the maximum anyway, so
/// `target_count == max_investigations` in every case.
pub fn allocate(budget: &ScanBudget) -> Allocation {
    let cost = budget.cost_per_investigation;
    let reserved = budget.reserved_calls_for_prescreen;

    let remaining = budget.total_calls.saturating_sub(reserved);
    let max_investigations = if cost == 0 { 0 } else { remaining / cost };

    let min_investigations = if budget.total_calls < budget.min_calls_target || cost == 0 {
        0
    } else {
        budget
            .min_calls_target
            .saturating_sub(reserved)
            .div_ceil(cost)
    };

    let target_count = if max_investigations < min_investigations {
        max_investigations
    } else {
        min_investigations.max(max_investigations)
    };

    Allocation {
        remaining,
        max_investigations,
        min_investigations,
        target_count,
    }
}

/// Final accounting for a scan once the candidate split is known.
pub fn settle(budget: &ScanBudget, investigated: usize, deferred: usize) -> BudgetState {
    let investigated_count = investigated as u32;
    let state = BudgetState {
        total_calls: budget.total_calls,
        cost_per_investigation: budget.cost_per_investigation,
        used_calls: budget.reserved_calls_for_prescreen
            + budget.cost_per_investigation * investigated_count,
        investigated_count,
        deferred_count: deferred as u32,
    };
    info!(
        total_calls = state.total_calls,
        used_calls = state.used_calls,
        investigated = state.investigated_count,
        deferred = state.deferred_count,
        "Budget status"
    );
    state
}

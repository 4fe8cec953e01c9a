//! Gas price escalation rules

use alloy::primitives::U256;

/// A replacement must beat the current gas price by more than this percentage
pub const ESCALATION_FLOOR_PERCENT: u64 = 10;

/// True when `target` clears the escalation floor over `current`.
///
/// Computed exactly as `target * 100 > current * (100 + floor)`, so with the
/// default floor `current = 100` needs `target >= 111`.
pub fn exceeds_escalation_floor(current: u128, target: u128) -> bool {
    let lhs = U256::from(target) * U256::from(100u64);
    let rhs = U256::from(current) * U256::from(100 + ESCALATION_FLOOR_PERCENT);
    lhs > rhs
}

/// Smallest gas price that clears the escalation floor over `current`
pub fn minimum_replacement_price(current: u128) -> u128 {
    let floor = current.saturating_mul(100 + ESCALATION_FLOOR_PERCENT as u128) / 100;
    floor.saturating_add(1)
}

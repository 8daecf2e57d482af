use rust_decimal::Decimal;

/// Balance and points after applying one ledger entry, floored at zero.
pub fn apply(balance: Decimal, points: i32, amount: Decimal, entry_points: i32) -> (Decimal, i32) {
    let balance = (balance + amount).max(Decimal::ZERO);
    let points = points.saturating_add(entry_points).max(0);
    (balance, points)
}

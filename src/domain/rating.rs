use rust_decimal::{Decimal, RoundingStrategy};

/// Arithmetic mean of `ratings` rounded half-to-even to two places, zero when empty.
pub fn average(ratings: &[i32]) -> Decimal {
    if ratings.is_empty() {
        return Decimal::ZERO;
    }
    let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
    let mean = Decimal::from(sum) / Decimal::from(ratings.len() as i64);
    mean.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

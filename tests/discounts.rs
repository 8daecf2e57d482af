use bitedrop_api::entity::discounts::{DiscountType, Model as Discount};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

fn discount(discount_type: DiscountType, value: i64) -> Discount {
    let now = Utc::now();
    Discount {
        id: Uuid::new_v4(),
        restaurant_id: None,
        name: "Lunch deal".to_string(),
        description: None,
        discount_type,
        discount_value: Decimal::from(value),
        start_date: (now - Duration::days(1)).into(),
        end_date: (now + Duration::days(1)).into(),
        is_active: true,
        minimum_order_amount: Decimal::from(20),
        maximum_discount: None,
        usage_limit: None,
        used_count: 0,
        created_at: now.into(),
        updated_at: now.into(),
    }
}

#[test]
fn percentage_discount_applies_above_minimum() {
    let d = discount(DiscountType::Percentage, 10);
    assert!(d.can_be_used(Decimal::from(50)));
    assert_eq!(d.calculate_discount(Decimal::from(50)), Decimal::from(5));
}

#[test]
fn fixed_discount_returns_its_value() {
    let d = discount(DiscountType::Fixed, 7);
    assert_eq!(d.calculate_discount(Decimal::from(30)), Decimal::from(7));
}

#[test]
fn below_minimum_yields_zero() {
    let d = discount(DiscountType::Percentage, 10);
    assert!(d.is_valid());
    assert!(!d.can_be_used(Decimal::from(19)));
    assert_eq!(d.calculate_discount(Decimal::from(19)), Decimal::ZERO);
}

#[test]
fn inactive_expired_or_exhausted_discounts_cannot_be_used() {
    let amount = Decimal::from(100);

    let mut inactive = discount(DiscountType::Fixed, 5);
    inactive.is_active = false;
    assert!(!inactive.can_be_used(amount));
    assert_eq!(inactive.calculate_discount(amount), Decimal::ZERO);

    let mut expired = discount(DiscountType::Fixed, 5);
    expired.end_date = (Utc::now() - Duration::hours(1)).into();
    assert!(!expired.is_valid());
    assert_eq!(expired.calculate_discount(amount), Decimal::ZERO);

    let mut not_started = discount(DiscountType::Fixed, 5);
    not_started.start_date = (Utc::now() + Duration::hours(1)).into();
    assert!(!not_started.can_be_used(amount));

    let mut exhausted = discount(DiscountType::Fixed, 5);
    exhausted.usage_limit = Some(3);
    exhausted.used_count = 3;
    assert!(!exhausted.is_valid());
    assert_eq!(exhausted.calculate_discount(amount), Decimal::ZERO);
}

#[test]
fn maximum_discount_caps_every_amount() {
    let mut d = discount(DiscountType::Percentage, 50);
    d.maximum_discount = Some(Decimal::from(15));

    for amount in [20, 25, 30, 31, 100, 10_000] {
        let amount = Decimal::from(amount);
        let taken = d.calculate_discount(amount);
        assert!(taken <= Decimal::from(15), "{taken} exceeds cap for {amount}");
    }
    assert_eq!(d.calculate_discount(Decimal::from(20)), Decimal::from(10));
    assert_eq!(d.calculate_discount(Decimal::from(100)), Decimal::from(15));
}

#[test]
fn evaluation_time_is_explicit() {
    let d = discount(DiscountType::Fixed, 5);
    let later = Utc::now() + Duration::days(2);
    assert!(!d.can_be_used_at(Decimal::from(100), later));
    assert_eq!(d.calculate_discount_at(Decimal::from(100), later), Decimal::ZERO);
}

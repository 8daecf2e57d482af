use bitedrop_api::{
    domain::{
        ledger,
        rating,
        targets::{Target, favorite_target, review_target, validate_rating},
    },
    entity::favorites::FavoriteType,
    error::{AppError, FieldErrors},
};
use rust_decimal::Decimal;
use uuid::Uuid;

#[test]
fn negative_entry_clamps_balance_at_zero() {
    let (balance, points) = ledger::apply(Decimal::from(30), 0, Decimal::from(-50), 0);
    assert_eq!(balance, Decimal::ZERO);
    assert_eq!(points, 0);
}

#[test]
fn entries_add_amount_and_points() {
    let (balance, points) = ledger::apply(Decimal::new(1050, 2), 10, Decimal::new(450, 2), 25);
    assert_eq!(balance, Decimal::from(15));
    assert_eq!(points, 35);

    let (_, points) = ledger::apply(Decimal::ZERO, 5, Decimal::ZERO, -20);
    assert_eq!(points, 0);
}

#[test]
fn average_rating_is_plain_mean() {
    assert_eq!(rating::average(&[3, 4, 5]), Decimal::new(400, 2));
    assert_eq!(rating::average(&[4, 5]), Decimal::new(450, 2));
    assert_eq!(rating::average(&[1, 2, 2]), Decimal::new(167, 2));
    assert_eq!(rating::average(&[]), Decimal::ZERO);
}

#[test]
fn average_rating_rounds_half_to_even() {
    // 33 / 8 = 4.125
    assert_eq!(
        rating::average(&[5, 5, 5, 5, 4, 4, 3, 2]),
        Decimal::new(412, 2)
    );
    // 27 / 8 = 3.375
    assert_eq!(
        rating::average(&[5, 5, 5, 3, 3, 2, 2, 2]),
        Decimal::new(338, 2)
    );
}

#[test]
fn review_needs_exactly_one_target() {
    let product = Uuid::new_v4();
    let restaurant = Uuid::new_v4();

    assert_eq!(
        review_target(Some(product), None).unwrap(),
        Target::Product(product)
    );
    assert_eq!(
        review_target(None, Some(restaurant)).unwrap(),
        Target::Restaurant(restaurant)
    );

    match review_target(Some(product), Some(restaurant)) {
        Err(AppError::Validation(fields)) => assert!(fields.get("non_field_errors").is_some()),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(review_target(None, None).is_err());
}

#[test]
fn rating_must_be_one_to_five() {
    let mut errors = FieldErrors::new();
    validate_rating(5, &mut errors);
    validate_rating(1, &mut errors);
    assert!(errors.is_empty());

    validate_rating(0, &mut errors);
    validate_rating(6, &mut errors);
    assert_eq!(errors.get("rating").map(|m| m.len()), Some(2));
}

#[test]
fn restaurant_favorite_with_product_is_rejected() {
    let err = favorite_target(
        FavoriteType::Restaurant,
        Some(Uuid::new_v4()),
        Some(Uuid::new_v4()),
    )
    .unwrap_err();
    match err {
        AppError::Validation(fields) => assert!(fields.get("product").is_some()),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn favorite_type_must_match_target() {
    let product = Uuid::new_v4();
    assert_eq!(
        favorite_target(FavoriteType::Product, None, Some(product)).unwrap(),
        Target::Product(product)
    );
    assert!(favorite_target(FavoriteType::Product, None, None).is_err());
    assert!(favorite_target(FavoriteType::Restaurant, None, None).is_err());
}

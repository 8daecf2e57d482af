use bitedrop_api::{
    domain::order_flow::{
        OrderAction, apply_action, customer_message, customer_title, should_notify_customer,
        transition,
    },
    entity::{order_items::line_total, orders::OrderStatus},
    error::AppError,
};
use rust_decimal::Decimal;
use uuid::Uuid;

#[test]
fn happy_path_moves_one_step_at_a_time() {
    let path = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Delivering,
        OrderStatus::Delivered,
    ];
    for pair in path.windows(2) {
        assert_eq!(transition(pair[0], pair[1]).unwrap(), pair[1]);
    }

    assert!(transition(OrderStatus::Pending, OrderStatus::Ready).is_err());
    assert!(transition(OrderStatus::Delivered, OrderStatus::Pending).is_err());
}

#[test]
fn rewriting_the_same_status_is_allowed() {
    assert_eq!(
        transition(OrderStatus::Preparing, OrderStatus::Preparing).unwrap(),
        OrderStatus::Preparing
    );
}

#[test]
fn cancel_only_from_pending_or_confirmed() {
    assert_eq!(
        apply_action(OrderStatus::Pending, OrderAction::Cancel).unwrap(),
        OrderStatus::Cancelled
    );
    assert_eq!(
        apply_action(OrderStatus::Confirmed, OrderAction::Cancel).unwrap(),
        OrderStatus::Cancelled
    );

    let err = apply_action(OrderStatus::Preparing, OrderAction::Cancel).unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert!(transition(OrderStatus::Delivering, OrderStatus::Cancelled).is_err());
}

#[test]
fn confirm_and_mark_delivered_have_single_sources() {
    assert_eq!(
        apply_action(OrderStatus::Pending, OrderAction::Confirm).unwrap(),
        OrderStatus::Confirmed
    );
    assert!(apply_action(OrderStatus::Confirmed, OrderAction::Confirm).is_err());

    assert_eq!(
        apply_action(OrderStatus::Delivering, OrderAction::MarkDelivered).unwrap(),
        OrderStatus::Delivered
    );
    assert!(apply_action(OrderStatus::Ready, OrderAction::MarkDelivered).is_err());
}

#[test]
fn customer_notified_on_transitions_only_by_default() {
    assert!(should_notify_customer(
        false,
        OrderStatus::Pending,
        OrderStatus::Confirmed
    ));
    assert!(!should_notify_customer(
        false,
        OrderStatus::Preparing,
        OrderStatus::Preparing
    ));
    assert!(!should_notify_customer(
        false,
        OrderStatus::Pending,
        OrderStatus::Pending
    ));
}

#[test]
fn every_save_mode_notifies_on_no_op_saves() {
    assert!(should_notify_customer(
        true,
        OrderStatus::Preparing,
        OrderStatus::Preparing
    ));
    assert!(!should_notify_customer(
        true,
        OrderStatus::Pending,
        OrderStatus::Pending
    ));
}

#[test]
fn customer_messages_are_per_status() {
    assert_eq!(
        customer_message(OrderStatus::Delivering),
        "Your order is out for delivery!"
    );
    assert_eq!(
        customer_message(OrderStatus::Pending),
        "Your order status has been updated to pending."
    );

    let id = Uuid::parse_str("0123abcd-0000-0000-0000-000000000000").unwrap();
    assert_eq!(customer_title(id), "Order #0123abcd Update");
}

#[test]
fn line_total_is_unit_price_times_quantity() {
    assert_eq!(
        line_total(Decimal::new(1250, 2), 3),
        Decimal::new(3750, 2)
    );
    assert_eq!(line_total(Decimal::new(199, 2), 1), Decimal::new(199, 2));
}

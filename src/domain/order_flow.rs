use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{entity::orders::OrderStatus, error::AppError};

/// Explicit customer or restaurant actions on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
    Confirm,
    Cancel,
    MarkDelivered,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivering => "delivering",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Next state on the happy path, `None` for terminal states.
    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Confirmed),
            OrderStatus::Confirmed => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::Ready),
            OrderStatus::Ready => Some(OrderStatus::Delivering),
            OrderStatus::Delivering => Some(OrderStatus::Delivered),
            OrderStatus::Delivered | OrderStatus::Cancelled => None,
        }
    }

    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }

    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        if to == OrderStatus::Cancelled {
            return self.can_cancel();
        }
        self.next() == Some(to)
    }
}

/// Validate a status write. Writing the current status again is a no-op
/// and always allowed.
pub fn transition(from: OrderStatus, to: OrderStatus) -> Result<OrderStatus, AppError> {
    if from == to || from.can_transition_to(to) {
        return Ok(to);
    }
    Err(AppError::Conflict(format!(
        "Cannot change order status from {} to {}",
        from.as_str(),
        to.as_str()
    )))
}

pub fn apply_action(from: OrderStatus, action: OrderAction) -> Result<OrderStatus, AppError> {
    match action {
        OrderAction::Cancel if from.can_cancel() => Ok(OrderStatus::Cancelled),
        OrderAction::Cancel => Err(AppError::Conflict(
            "Order cannot be cancelled at this stage".to_string(),
        )),
        OrderAction::Confirm if from == OrderStatus::Pending => Ok(OrderStatus::Confirmed),
        OrderAction::Confirm => Err(AppError::Conflict(
            "Only pending orders can be confirmed".to_string(),
        )),
        OrderAction::MarkDelivered if from == OrderStatus::Delivering => {
            Ok(OrderStatus::Delivered)
        }
        OrderAction::MarkDelivered => Err(AppError::Conflict(
            "Only orders out for delivery can be marked as delivered".to_string(),
        )),
    }
}

/// Whether a save that left the order in `after` should notify the customer.
///
/// By default only real transitions count. With `every_save`, any save whose
/// resulting status is not pending notifies, even when nothing changed.
pub fn should_notify_customer(every_save: bool, before: OrderStatus, after: OrderStatus) -> bool {
    if after == OrderStatus::Pending {
        return false;
    }
    every_save || before != after
}

pub fn customer_message(status: OrderStatus) -> String {
    match status {
        OrderStatus::Confirmed => "Your order has been confirmed and is being prepared.".to_string(),
        OrderStatus::Preparing => "Your order is being prepared by the restaurant.".to_string(),
        OrderStatus::Ready => "Your order is ready for pickup/delivery!".to_string(),
        OrderStatus::Delivering => "Your order is out for delivery!".to_string(),
        OrderStatus::Delivered => "Your order has been delivered. Enjoy your meal!".to_string(),
        OrderStatus::Cancelled => "Your order has been cancelled.".to_string(),
        other => format!("Your order status has been updated to {}.", other.as_str()),
    }
}

fn short_id(order_id: Uuid) -> String {
    order_id.simple().to_string().chars().take(8).collect()
}

pub fn customer_title(order_id: Uuid) -> String {
    format!("Order #{} Update", short_id(order_id))
}

pub fn restaurant_title(order_id: Uuid) -> String {
    format!("New Order #{}", short_id(order_id))
}

pub fn restaurant_admin_message(customer_name: &str, total: Decimal) -> String {
    format!("You have a new order from {customer_name}. Total: ${total}")
}

pub fn staff_message(customer_name: &str, total: Decimal) -> String {
    format!("New order from {customer_name}. Total: ${total}")
}


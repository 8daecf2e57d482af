use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{entity::discounts::DiscountType, models::Discount};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDiscountRequest {
    /// `None` creates a global discount (super admin only).
    pub restaurant_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: Option<bool>,
    pub minimum_order_amount: Option<Decimal>,
    pub maximum_discount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    #[serde(default)]
    pub product_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDiscountRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub discount_type: Option<DiscountType>,
    pub discount_value: Option<Decimal>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
    pub minimum_order_amount: Option<Decimal>,
    pub maximum_discount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub product_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CalculateDiscountQuery {
    pub amount: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DiscountCalculation {
    pub is_valid: bool,
    pub can_be_used: bool,
    pub discount_amount: Decimal,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct DiscountList {
    #[schema(value_type = Vec<Discount>)]
    pub items: Vec<Discount>,
}

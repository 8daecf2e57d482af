use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Product;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    /// Ignored for restaurant staff, who always create for their own restaurant.
    pub restaurant_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub discount_percentage: Option<i32>,
    pub image: Option<String>,
    pub in_stock: Option<bool>,
    pub is_flash_sale: Option<bool>,
    pub ingredients: Option<Value>,
    pub allergens: Option<Value>,
    pub calories: Option<i32>,
    pub preparation_time: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub discount_price: Option<Decimal>,
    pub discount_percentage: Option<i32>,
    pub image: Option<String>,
    pub in_stock: Option<bool>,
    pub is_flash_sale: Option<bool>,
    pub ingredients: Option<Value>,
    pub allergens: Option<Value>,
    pub calories: Option<i32>,
    pub preparation_time: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

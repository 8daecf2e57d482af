use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::models::Restaurant;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRestaurantRequest {
    pub name: String,
    pub logo: Option<String>,
    pub banner: Option<String>,
    pub description: Option<String>,
    pub delivery_time: Option<String>,
    pub cuisine_type: Option<Value>,
    pub is_partner: Option<bool>,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub opening_hours: Option<Value>,
    pub delivery_fee: Option<Decimal>,
    pub minimum_order: Option<Decimal>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRestaurantRequest {
    pub name: Option<String>,
    pub logo: Option<String>,
    pub banner: Option<String>,
    pub description: Option<String>,
    pub delivery_time: Option<String>,
    pub cuisine_type: Option<Value>,
    pub is_partner: Option<bool>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub opening_hours: Option<Value>,
    pub delivery_fee: Option<Decimal>,
    pub minimum_order: Option<Decimal>,
    pub is_active: Option<bool>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct RestaurantList {
    #[schema(value_type = Vec<Restaurant>)]
    pub items: Vec<Restaurant>,
}

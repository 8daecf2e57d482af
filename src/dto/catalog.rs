use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::{
    entity::orders::PaymentMethodType,
    models::{DeliveryZone, PaymentMethod},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDeliveryZoneRequest {
    pub name: String,
    pub description: Option<String>,
    pub delivery_fee: Decimal,
    pub estimated_time: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDeliveryZoneRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub delivery_fee: Option<Decimal>,
    pub estimated_time: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct DeliveryZoneList {
    #[schema(value_type = Vec<DeliveryZone>)]
    pub items: Vec<DeliveryZone>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePaymentMethodRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub method_type: PaymentMethodType,
    pub is_active: Option<bool>,
    pub supported_networks: Option<Value>,
    pub processing_fee: Option<Decimal>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePaymentMethodRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub method_type: Option<PaymentMethodType>,
    pub is_active: Option<bool>,
    pub supported_networks: Option<Value>,
    pub processing_fee: Option<Decimal>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct PaymentMethodList {
    #[schema(value_type = Vec<PaymentMethod>)]
    pub items: Vec<PaymentMethod>,
}

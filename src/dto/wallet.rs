use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{entity::wallet_transactions::WalletTransactionType, models::WalletTransaction};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateWalletTransactionRequest {
    #[serde(rename = "type")]
    pub transaction_type: WalletTransactionType,
    pub amount: Decimal,
    #[serde(default)]
    pub points: i32,
    pub description: String,
    pub order_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WalletBalance {
    pub wallet_balance: Decimal,
    pub loyalty_points: i32,
    pub total_transactions: u64,
    pub recent_transactions: Vec<WalletTransaction>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct WalletTransactionList {
    #[schema(value_type = Vec<WalletTransaction>)]
    pub items: Vec<WalletTransaction>,
}

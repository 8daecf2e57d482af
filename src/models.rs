use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    categories, delivery_zones,
    discounts::{self, DiscountType},
    favorites::{self, FavoriteType},
    notifications::{self, NotificationType},
    order_items,
    orders::{self, OrderStatus, PaymentMethodType, PaymentStatus},
    payment_methods, products, restaurants, reviews,
    users::{self, UserRole},
    wallet_transactions::{self, WalletTransactionType},
};

/// User as returned by the API. Never carries the password hash.
#[derive(Debug, Serialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub restaurant_id: Option<Uuid>,
    pub wallet_balance: Decimal,
    pub loyalty_points: i32,
    pub must_change_password: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            role: model.role,
            phone: model.phone,
            address: model.address,
            restaurant_id: model.restaurant_id,
            wallet_balance: model.wallet_balance,
            loyalty_points: model.loyalty_points,
            must_change_password: model.must_change_password,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Restaurant {
    pub id: Uuid,
    pub name: String,
    pub logo: Option<String>,
    pub banner: Option<String>,
    pub description: Option<String>,
    pub rating: Decimal,
    pub delivery_time: Option<String>,
    pub cuisine_type: Value,
    pub is_partner: bool,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub opening_hours: Value,
    pub delivery_fee: Decimal,
    pub minimum_order: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<restaurants::Model> for Restaurant {
    fn from(model: restaurants::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            logo: model.logo,
            banner: model.banner,
            description: model.description,
            rating: model.rating,
            delivery_time: model.delivery_time,
            cuisine_type: model.cuisine_type,
            is_partner: model.is_partner,
            address: model.address,
            phone: model.phone,
            email: model.email,
            opening_hours: model.opening_hours,
            delivery_fee: model.delivery_fee,
            minimum_order: model.minimum_order,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RestaurantRef {
    pub id: Uuid,
    pub name: String,
}

impl From<restaurants::Model> for RestaurantRef {
    fn from(model: restaurants::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<categories::Model> for Category {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            icon: model.icon,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub discount_percentage: i32,
    pub final_price: Decimal,
    pub is_discounted: bool,
    pub image: Option<String>,
    pub in_stock: bool,
    pub is_flash_sale: bool,
    pub rating: Decimal,
    pub reviews_count: i32,
    pub ingredients: Value,
    pub allergens: Value,
    pub calories: Option<i32>,
    pub preparation_time: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        let final_price = model.final_price();
        let is_discounted = model.is_discounted();
        Self {
            id: model.id,
            restaurant_id: model.restaurant_id,
            category_id: model.category_id,
            name: model.name,
            description: model.description,
            price: model.price,
            discount_price: model.discount_price,
            discount_percentage: model.discount_percentage,
            final_price,
            is_discounted,
            image: model.image,
            in_stock: model.in_stock,
            is_flash_sale: model.is_flash_sale,
            rating: model.rating,
            reviews_count: model.reviews_count,
            ingredients: model.ingredients,
            allergens: model.allergens,
            calories: model.calories,
            preparation_time: model.preparation_time,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Discount {
    pub id: Uuid,
    pub restaurant_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    pub is_valid: bool,
    pub minimum_order_amount: Decimal,
    pub maximum_discount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub used_count: i32,
    pub product_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Discount {
    pub fn from_model(model: discounts::Model, product_ids: Vec<Uuid>) -> Self {
        let is_valid = model.is_valid();
        Self {
            id: model.id,
            restaurant_id: model.restaurant_id,
            name: model.name,
            description: model.description,
            discount_type: model.discount_type,
            discount_value: model.discount_value,
            start_date: model.start_date.with_timezone(&Utc),
            end_date: model.end_date.with_timezone(&Utc),
            is_active: model.is_active,
            is_valid,
            minimum_order_amount: model.minimum_order_amount,
            maximum_discount: model.maximum_discount,
            usage_limit: model.usage_limit,
            used_count: model.used_count,
            product_ids,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total: Decimal,
    pub discount_id: Option<Uuid>,
    pub discount_amount: Decimal,
    pub delivery_fee: Decimal,
    pub amount_due: Decimal,
    pub status: OrderStatus,
    pub payment_method: PaymentMethodType,
    pub payment_status: PaymentStatus,
    pub delivery_address: String,
    pub delivery_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        let amount_due = model.amount_due();
        Self {
            id: model.id,
            user_id: model.user_id,
            total: model.total,
            discount_id: model.discount_id,
            discount_amount: model.discount_amount,
            delivery_fee: model.delivery_fee,
            amount_due,
            status: model.status,
            payment_method: model.payment_method,
            payment_status: model.payment_status,
            delivery_address: model.delivery_address,
            delivery_time: model.delivery_time.map(|t| t.with_timezone(&Utc)),
            notes: model.notes,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            quantity: model.quantity,
            unit_price: model.unit_price,
            total_price: model.total_price,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Option<Uuid>,
    pub restaurant_id: Option<Uuid>,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<reviews::Model> for Review {
    fn from(model: reviews::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            product_id: model.product_id,
            restaurant_id: model.restaurant_id,
            rating: model.rating,
            comment: model.comment,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Favorite {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub favorite_type: FavoriteType,
    pub restaurant_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<favorites::Model> for Favorite {
    fn from(model: favorites::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            favorite_type: model.favorite_type,
            restaurant_id: model.restaurant_id,
            product_id: model.product_id,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub is_read: bool,
    pub order_id: Option<Uuid>,
    pub discount_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<notifications::Model> for Notification {
    fn from(model: notifications::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            title: model.title,
            message: model.message,
            notification_type: model.notification_type,
            is_read: model.is_read,
            order_id: model.order_id,
            discount_id: model.discount_id,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub transaction_type: WalletTransactionType,
    pub amount: Decimal,
    pub points: i32,
    pub description: String,
    pub order_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<wallet_transactions::Model> for WalletTransaction {
    fn from(model: wallet_transactions::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            transaction_type: model.transaction_type,
            amount: model.amount,
            points: model.points,
            description: model.description,
            order_id: model.order_id,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeliveryZone {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub delivery_fee: Decimal,
    pub estimated_time: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<delivery_zones::Model> for DeliveryZone {
    fn from(model: delivery_zones::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            delivery_fee: model.delivery_fee,
            estimated_time: model.estimated_time,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentMethod {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub method_type: PaymentMethodType,
    pub is_active: bool,
    pub supported_networks: Value,
    pub processing_fee: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<payment_methods::Model> for PaymentMethod {
    fn from(model: payment_methods::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            method_type: model.method_type,
            is_active: model.is_active,
            supported_networks: model.supported_networks,
            processing_fee: model.processing_fee,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

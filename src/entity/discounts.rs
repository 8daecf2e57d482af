use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    #[sea_orm(string_value = "percentage")]
    Percentage,
    #[sea_orm(string_value = "fixed")]
    Fixed,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "discounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// `None` marks a global discount.
    pub restaurant_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub discount_value: Decimal,
    pub start_date: DateTimeWithTimeZone,
    pub end_date: DateTimeWithTimeZone,
    pub is_active: bool,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub minimum_order_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub maximum_discount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub used_count: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Active, inside the validity window and not exhausted.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.start_date <= now
            && now <= self.end_date
            && self.usage_limit.is_none_or(|limit| self.used_count < limit)
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    pub fn can_be_used_at(&self, order_amount: Decimal, now: DateTime<Utc>) -> bool {
        self.is_valid_at(now) && order_amount >= self.minimum_order_amount
    }

    pub fn can_be_used(&self, order_amount: Decimal) -> bool {
        self.can_be_used_at(order_amount, Utc::now())
    }

    /// Amount taken off `order_amount`, zero when the discount cannot be used.
    /// The result never exceeds `maximum_discount`.
    pub fn calculate_discount_at(&self, order_amount: Decimal, now: DateTime<Utc>) -> Decimal {
        if !self.can_be_used_at(order_amount, now) {
            return Decimal::ZERO;
        }

        let amount = match self.discount_type {
            DiscountType::Percentage => order_amount * self.discount_value / Decimal::ONE_HUNDRED,
            DiscountType::Fixed => self.discount_value,
        };

        match self.maximum_discount {
            Some(cap) => amount.min(cap),
            None => amount,
        }
    }

    pub fn calculate_discount(&self, order_amount: Decimal) -> Decimal {
        self.calculate_discount_at(order_amount, Utc::now())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::restaurants::Entity",
        from = "Column::RestaurantId",
        to = "super::restaurants::Column::Id"
    )]
    Restaurants,
    #[sea_orm(has_many = "super::discount_products::Entity")]
    DiscountProducts,
}

impl Related<super::restaurants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Restaurants.def()
    }
}

impl Related<super::discount_products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DiscountProducts.def()
    }
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        super::discount_products::Relation::Products.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::discount_products::Relation::Discounts.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

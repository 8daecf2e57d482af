//! Translate a [`Scope`] into SeaORM filter conditions, one function per
//! entity that the tenant rules apply to.

use sea_orm::{
    ColumnTrait, Condition,
    sea_query::{Expr, Query},
};
use uuid::Uuid;

use crate::{
    entity::{discounts, order_items, orders, products, restaurants, users},
    policy::Scope,
};

fn nothing() -> Condition {
    Condition::all().add(Expr::cust("FALSE"))
}

pub fn products(scope: Scope) -> Condition {
    match scope {
        Scope::All => Condition::all(),
        Scope::Nothing | Scope::Owner(_) => nothing(),
        Scope::Tenant { restaurant_id, .. } => {
            Condition::all().add(products::Column::RestaurantId.eq(restaurant_id))
        }
        Scope::Public => Condition::all().add(products::Column::InStock.eq(true)),
    }
}

pub fn discounts(scope: Scope) -> Condition {
    match scope {
        Scope::All => Condition::all(),
        Scope::Nothing | Scope::Owner(_) => nothing(),
        Scope::Tenant {
            restaurant_id,
            include_global,
        } => {
            let own = discounts::Column::RestaurantId.eq(restaurant_id);
            if include_global {
                Condition::any()
                    .add(own)
                    .add(discounts::Column::RestaurantId.is_null())
            } else {
                Condition::all().add(own)
            }
        }
        Scope::Public => Condition::all().add(discounts::Column::IsActive.eq(true)),
    }
}

/// Orders containing at least one product of `restaurant_id`.
pub fn orders_of_restaurant(restaurant_id: Uuid) -> Condition {
    let order_ids = Query::select()
        .column(order_items::Column::OrderId)
        .from(order_items::Entity)
        .inner_join(
            products::Entity,
            Expr::col((products::Entity, products::Column::Id))
                .equals((order_items::Entity, order_items::Column::ProductId)),
        )
        .and_where(Expr::col((products::Entity, products::Column::RestaurantId)).eq(restaurant_id))
        .to_owned();
    Condition::all().add(orders::Column::Id.in_subquery(order_ids))
}

pub fn orders(scope: Scope) -> Condition {
    match scope {
        Scope::All => Condition::all(),
        Scope::Nothing | Scope::Public => nothing(),
        Scope::Tenant { restaurant_id, .. } => orders_of_restaurant(restaurant_id),
        Scope::Owner(user_id) => Condition::all().add(orders::Column::UserId.eq(user_id)),
    }
}

pub fn users(scope: Scope) -> Condition {
    match scope {
        Scope::All => Condition::all(),
        Scope::Nothing | Scope::Public => nothing(),
        Scope::Tenant { restaurant_id, .. } => {
            Condition::all().add(users::Column::RestaurantId.eq(restaurant_id))
        }
        Scope::Owner(user_id) => Condition::all().add(users::Column::Id.eq(user_id)),
    }
}

pub fn restaurants(scope: Scope) -> Condition {
    match scope {
        Scope::All => Condition::all(),
        Scope::Nothing | Scope::Owner(_) => nothing(),
        Scope::Tenant { restaurant_id, .. } => {
            Condition::all().add(restaurants::Column::Id.eq(restaurant_id))
        }
        Scope::Public => Condition::all().add(restaurants::Column::IsActive.eq(true)),
    }
}

/// Catalogs with only an active flag: public callers see active rows.
pub fn active_only<C: ColumnTrait>(scope: Scope, is_active: C) -> Condition {
    match scope {
        Scope::All => Condition::all(),
        Scope::Public | Scope::Tenant { .. } | Scope::Owner(_) => {
            Condition::all().add(is_active.eq(true))
        }
        Scope::Nothing => nothing(),
    }
}

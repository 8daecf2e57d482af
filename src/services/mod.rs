use sea_orm::{EntityTrait, PaginatorTrait, QuerySelect, Select};

use crate::{
    db::OrmConn, error::AppResult, response::Meta, routes::params::Pagination,
};

pub mod auth_service;
pub mod category_service;
pub mod delivery_zone_service;
pub mod discount_service;
pub mod favorite_service;
pub mod notification_service;
pub mod order_service;
pub mod payment_method_service;
pub mod product_service;
pub mod restaurant_service;
pub mod review_service;
pub mod scoping;
pub mod staff_service;
pub mod user_service;
pub mod wallet_service;

/// Run a filtered, ordered select as one page plus its total count.
pub(crate) async fn fetch_page<E>(
    finder: Select<E>,
    pagination: &Pagination,
    conn: &OrmConn,
) -> AppResult<(Vec<E::Model>, Meta)>
where
    E: EntityTrait,
    E::Model: Send + Sync,
{
    let (page, limit, offset) = pagination.normalize();
    let total = finder.clone().count(conn).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(conn)
        .await?;
    Ok((items, Meta::new(page, limit, total)))
}

use uuid::Uuid;

use crate::{
    entity::favorites::FavoriteType,
    error::{AppError, AppResult, FieldErrors},
};

/// What a review or favorite points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Product(Uuid),
    Restaurant(Uuid),
}

impl Target {
    pub fn product_id(&self) -> Option<Uuid> {
        match self {
            Target::Product(id) => Some(*id),
            Target::Restaurant(_) => None,
        }
    }

    pub fn restaurant_id(&self) -> Option<Uuid> {
        match self {
            Target::Restaurant(id) => Some(*id),
            Target::Product(_) => None,
        }
    }
}

pub const RATING_RANGE: std::ops::RangeInclusive<i32> = 1..=5;

/// A review targets exactly one of a product or a restaurant.
pub fn review_target(product_id: Option<Uuid>, restaurant_id: Option<Uuid>) -> AppResult<Target> {
    match (product_id, restaurant_id) {
        (Some(product), None) => Ok(Target::Product(product)),
        (None, Some(restaurant)) => Ok(Target::Restaurant(restaurant)),
        (Some(_), Some(_)) => Err(AppError::validation(
            "non_field_errors",
            "A review can be for either a product or a restaurant, not both.",
        )),
        (None, None) => Err(AppError::validation(
            "non_field_errors",
            "A review must be for either a product or a restaurant.",
        )),
    }
}

pub fn validate_rating(rating: i32, errors: &mut FieldErrors) {
    if !RATING_RANGE.contains(&rating) {
        errors.add("rating", "Rating must be between 1 and 5.");
    }
}

/// A favorite's type tag must match the single target it carries.
pub fn favorite_target(
    favorite_type: FavoriteType,
    restaurant_id: Option<Uuid>,
    product_id: Option<Uuid>,
) -> AppResult<Target> {
    let mut errors = FieldErrors::new();
    match favorite_type {
        FavoriteType::Restaurant => {
            if restaurant_id.is_none() {
                errors.add("restaurant", "Restaurant is required for restaurant favorites.");
            }
            if product_id.is_some() {
                errors.add("product", "Product should not be set for restaurant favorites.");
            }
        }
        FavoriteType::Product => {
            if product_id.is_none() {
                errors.add("product", "Product is required for product favorites.");
            }
            if restaurant_id.is_some() {
                errors.add("restaurant", "Restaurant should not be set for product favorites.");
            }
        }
    }
    errors.into_result()?;

    match (favorite_type, restaurant_id, product_id) {
        (FavoriteType::Restaurant, Some(id), None) => Ok(Target::Restaurant(id)),
        (FavoriteType::Product, None, Some(id)) => Ok(Target::Product(id)),
        _ => Err(AppError::validation("type", "Invalid favorite target.")),
    }
}

use axum::{
    extract::{FromRef, FromRequestParts, OptionalFromRequestParts},
    http::{header, request::Parts},
};
use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::{
    dto::auth::TokenType,
    entity::{Users, users::UserRole},
    error::{AppError, AppResult},
    services::auth_service::decode_token,
    state::AppState,
};

/// Identity attached to an authenticated request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: UserRole,
    pub restaurant_id: Option<Uuid>,
    pub is_superuser: bool,
}

impl AuthUser {
    pub fn is_super_admin(&self) -> bool {
        self.role == UserRole::Admin || self.is_superuser
    }

    /// Restaurant the identity is scoped to. Only restaurant-bound roles have one.
    pub fn tenant(&self) -> Option<Uuid> {
        if self.role.is_restaurant_scoped() {
            self.restaurant_id
        } else {
            None
        }
    }
}

fn bearer_token(parts: &Parts) -> AppResult<Option<String>> {
    let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header.to_str().map_err(|_| AppError::Unauthorized)?;
    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized)?
        .trim();
    if token.is_empty() {
        return Err(AppError::Unauthorized);
    }
    Ok(Some(token.to_string()))
}

async fn authenticate(state: &AppState, token: &str) -> AppResult<AuthUser> {
    let claims = decode_token(&state.config.jwt_secret, token, TokenType::Access)?;
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized)?;

    let user = Users::find_by_id(user_id)
        .one(&state.orm)
        .await?
        .filter(|u| u.is_active)
        .ok_or(AppError::Unauthorized)?;

    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
        restaurant_id: user.restaurant_id,
        is_superuser: user.is_superuser,
    })
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let token = bearer_token(parts)?.ok_or(AppError::Unauthorized)?;
        authenticate(&state, &token).await
    }
}

impl<S> OptionalFromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        let state = AppState::from_ref(state);
        match bearer_token(parts)? {
            Some(token) => authenticate(&state, &token).await.map(Some),
            None => Ok(None),
        }
    }
}

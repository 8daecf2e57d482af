use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::rand_core::{OsRng, RngCore};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, Set,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    audit,
    config::AppConfig,
    db::is_unique_violation,
    entity::{
        Users,
        users::{self, UserRole},
    },
    error::{AppError, AppResult, FieldErrors},
    middleware::auth::AuthUser,
    models::User,
    response::{ApiResponse, Meta},
    state::AppState,
};
use crate::dto::auth::{
    Claims, LoginRequest, LoginResponse, PasswordChangeRequest, RefreshRequest, RegisterRequest,
    TokenPair, TokenType,
};

pub const MIN_PASSWORD_LEN: usize = 8;
const TEMPORARY_PASSWORD_LEN: usize = 12;
const TEMPORARY_PASSWORD_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%";

/// Trim and lower-case the domain part, keeping the local part as given.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password_hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Random password handed to provisioned accounts.
pub fn generate_temporary_password() -> String {
    let charset_len = TEMPORARY_PASSWORD_CHARSET.len() as u32;
    // Largest multiple of the charset size, to keep the draw unbiased.
    let zone = u32::MAX - (u32::MAX % charset_len);
    let mut rng = OsRng;
    let mut password = String::with_capacity(TEMPORARY_PASSWORD_LEN);
    while password.len() < TEMPORARY_PASSWORD_LEN {
        let draw = rng.next_u32();
        if draw >= zone {
            continue;
        }
        password.push(TEMPORARY_PASSWORD_CHARSET[(draw % charset_len) as usize] as char);
    }
    password
}

/// Record password-pair problems under the given field names.
pub fn check_new_password(
    password: &str,
    confirm: &str,
    field: &str,
    confirm_field: &str,
    errors: &mut FieldErrors,
) {
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            field,
            format!("Password must be at least {MIN_PASSWORD_LEN} characters long."),
        );
    }
    if password != confirm {
        errors.add(confirm_field, "Passwords don't match.");
    }
}

fn encode_token(
    config: &AppConfig,
    user_id: Uuid,
    role: UserRole,
    token_type: TokenType,
) -> AppResult<String> {
    let ttl = match token_type {
        TokenType::Access => Duration::minutes(config.access_token_ttl_minutes),
        TokenType::Refresh => Duration::days(config.refresh_token_ttl_days),
    };
    let expiration = Utc::now()
        .checked_add_signed(ttl)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.as_str().to_string(),
        token_type,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn issue_tokens(config: &AppConfig, user: &users::Model) -> AppResult<TokenPair> {
    Ok(TokenPair {
        access: encode_token(config, user.id, user.role, TokenType::Access)?,
        refresh: encode_token(config, user.id, user.role, TokenType::Refresh)?,
    })
}

/// Decode and validate a token of the expected kind. Any failure is a 401.
pub fn decode_token(secret: &str, token: &str, expected: TokenType) -> AppResult<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|err| {
        tracing::debug!(error = %err, "token rejected");
        AppError::Unauthorized
    })?;

    if data.claims.token_type != expected {
        return Err(AppError::Unauthorized);
    }
    Ok(data.claims)
}

pub async fn email_taken(state: &AppState, email: &str) -> AppResult<bool> {
    let existing = Users::find()
        .filter(users::Column::Email.eq(email))
        .one(&state.orm)
        .await?;
    Ok(existing.is_some())
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let email = normalize_email(&payload.email);
    let name = payload.name.trim().to_string();

    let mut errors = FieldErrors::new();
    if email.is_empty() || !email.contains('@') {
        errors.add("email", "Enter a valid email address.");
    }
    if name.is_empty() {
        errors.add("name", "This field may not be blank.");
    }
    check_new_password(
        &payload.password,
        &payload.password_confirm,
        "password",
        "password_confirm",
        &mut errors,
    );
    if errors.is_empty() && email_taken(state, &email).await? {
        errors.add("email", "A user with this email already exists.");
    }
    errors.into_result()?;

    let password_hash = hash_password(&payload.password)?;
    let active = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        name: Set(name),
        password_hash: Set(password_hash),
        role: Set(UserRole::User),
        phone: Set(payload.phone),
        address: Set(payload.address),
        restaurant_id: Set(None),
        wallet_balance: Set(Decimal::ZERO),
        loyalty_points: Set(0),
        must_change_password: Set(false),
        is_active: Set(true),
        is_superuser: Set(false),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let user = active.insert(&state.orm).await.map_err(|err| {
        if is_unique_violation(&err) {
            AppError::validation("email", "A user with this email already exists.")
        } else {
            AppError::OrmError(err)
        }
    })?;

    let tokens = issue_tokens(&state.config, &user)?;
    audit::record(
        &state.pool,
        Some(user.id),
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "User created",
        LoginResponse {
            user: User::from(user),
            tokens,
        },
        None,
    ))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let email = normalize_email(&payload.email);
    let user = Users::find()
        .filter(users::Column::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::BadRequest("Invalid email or password".into())),
    };

    if !verify_password(&user.password_hash, &payload.password)? {
        return Err(AppError::BadRequest("Invalid email or password".into()));
    }
    if !user.is_active {
        return Err(AppError::BadRequest("User account is disabled".into()));
    }

    let tokens = issue_tokens(&state.config, &user)?;
    audit::record(
        &state.pool,
        Some(user.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            user: User::from(user),
            tokens,
        },
        Some(Meta::empty()),
    ))
}

pub async fn refresh_token(
    state: &AppState,
    payload: RefreshRequest,
) -> AppResult<ApiResponse<TokenPair>> {
    let claims = decode_token(&state.config.jwt_secret, &payload.refresh, TokenType::Refresh)?;
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized)?;
    let user = Users::find_by_id(user_id)
        .one(&state.orm)
        .await?
        .filter(|u| u.is_active)
        .ok_or(AppError::Unauthorized)?;

    let access = encode_token(&state.config, user.id, user.role, TokenType::Access)?;
    Ok(ApiResponse::success(
        "Token refreshed",
        TokenPair {
            access,
            refresh: payload.refresh,
        },
        Some(Meta::empty()),
    ))
}

pub async fn force_password_change(
    state: &AppState,
    user: &AuthUser,
    payload: PasswordChangeRequest,
) -> AppResult<ApiResponse<User>> {
    let mut errors = FieldErrors::new();
    check_new_password(
        &payload.new_password,
        &payload.new_password_confirm,
        "new_password",
        "new_password_confirm",
        &mut errors,
    );
    errors.into_result()?;

    let existing = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: users::ActiveModel = existing.into();
    active.password_hash = Set(hash_password(&payload.new_password)?);
    active.must_change_password = Set(false);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "password_change",
        "users",
        serde_json::json!({ "user_id": user.user_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Password changed",
        User::from(updated),
        Some(Meta::empty()),
    ))
}

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set, SqlErr,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::{AdminBootstrap, AppConfig},
    dto::auth::{
        Claims, LoginRequest, LoginResponse, MIN_PASSWORD_LEN, RegisterRequest,
        ResetPasswordRequest,
    },
    entity::users::{
        ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{User, UserRole},
    response::{ApiResponse, Meta},
    state::AppState,
};

const RECOVERY_TOKEN_TTL_MINUTES: i64 = 60;

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(stored_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn ensure_password_length(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must have at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn issue_token(config: &AppConfig, user_id: i32, role: UserRole) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(config.token_ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.as_str().to_string(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

fn first_validation_message(errors: &validator::ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);
    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{field} is invalid"))
            })
        })
        .next()
        .unwrap_or_else(|| "Invalid request".to_string())
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let payload = RegisterRequest {
        nome: payload.nome.trim().to_string(),
        email: normalize_email(&payload.email),
        senha: payload.senha,
    };
    payload
        .validate()
        .map_err(|errors| AppError::Validation(first_validation_message(&errors)))?;

    let user = create_user(
        &state.orm,
        &payload.email,
        &payload.senha,
        &payload.nome,
        UserRole::Cliente,
    )
    .await?;

    tracing::info!(user_id = user.id, "user registered");
    Ok(ApiResponse::success(
        "User created",
        user_from_entity(user),
        Some(Meta::empty()),
    ))
}

async fn create_user<C: ConnectionTrait>(
    conn: &C,
    email: &str,
    password: &str,
    name: &str,
    role: UserRole,
) -> AppResult<UserModel> {
    let exists = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(conn)
        .await?;
    if exists.is_some() {
        return Err(AppError::Conflict("Email is already taken".into()));
    }

    let password_hash = hash_password(password)?;
    let inserted = UserActive {
        id: NotSet,
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        name: Set(name.to_string()),
        created_at: Set(Utc::now().into()),
        role: Set(role.as_str().to_string()),
        last_access: Set(None),
        recovery_token: Set(None),
        recovery_expires_at: Set(None),
    }
    .insert(conn)
    .await;

    // A concurrent registration can pass the lookup above; the unique index decides.
    match inserted {
        Ok(user) => Ok(user),
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            Err(AppError::Conflict("Email is already taken".into()))
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let email = normalize_email(&payload.email);
    let invalid = || AppError::Unauthorized("Invalid email or password".into());

    let user = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&payload.senha, &user.password_hash)? {
        return Err(invalid());
    }

    let role = UserRole::parse(&user.role);
    let token = issue_token(&state.config, user.id, role)?;

    let mut active: UserActive = user.into();
    active.last_access = Set(Some(Utc::now().into()));
    let user = active.update(&state.orm).await?;

    tracing::info!(user_id = user.id, role = role.as_str(), "user logged in");

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token,
            usuario: user_from_entity(user),
        },
        Some(Meta::empty()),
    ))
}

/// Stores a fresh recovery token for the account, if there is one. The token is
/// returned to the caller for delivery; unknown emails yield `None`.
pub async fn request_password_reset(state: &AppState, email: &str) -> AppResult<Option<String>> {
    let email = normalize_email(email);
    let Some(user) = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?
    else {
        return Ok(None);
    };

    let token = Uuid::new_v4().simple().to_string();
    let expires_at = Utc::now() + Duration::minutes(RECOVERY_TOKEN_TTL_MINUTES);

    let mut active: UserActive = user.into();
    active.recovery_token = Set(Some(token.clone()));
    active.recovery_expires_at = Set(Some(expires_at.into()));
    let user = active.update(&state.orm).await?;

    tracing::info!(user_id = user.id, "password recovery requested");
    Ok(Some(token))
}

pub async fn reset_password(state: &AppState, payload: ResetPasswordRequest) -> AppResult<()> {
    ensure_password_length(&payload.nova_senha)?;
    let invalid = || AppError::Validation("Invalid or expired recovery token".into());

    let token = payload.token.trim();
    if token.is_empty() {
        return Err(invalid());
    }

    let user = Users::find()
        .filter(UserCol::RecoveryToken.eq(token))
        .one(&state.orm)
        .await?
        .ok_or_else(invalid)?;

    let still_valid = user
        .recovery_expires_at
        .is_some_and(|expires| expires.with_timezone(&Utc) > Utc::now());
    if !still_valid {
        return Err(invalid());
    }

    let password_hash = hash_password(&payload.nova_senha)?;
    let mut active: UserActive = user.into();
    active.password_hash = Set(password_hash);
    active.recovery_token = Set(None);
    active.recovery_expires_at = Set(None);
    let user = active.update(&state.orm).await?;

    tracing::info!(user_id = user.id, "password reset");
    Ok(())
}

/// Makes sure the configured admin account exists and carries the admin role.
pub async fn ensure_admin_account<C: ConnectionTrait>(
    conn: &C,
    admin: &AdminBootstrap,
) -> AppResult<i32> {
    let email = normalize_email(&admin.email);
    ensure_password_length(&admin.password)?;

    let existing = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(conn)
        .await?;

    let user = match existing {
        Some(user) if user.role == UserRole::Admin.as_str() => user,
        Some(user) => {
            let mut active: UserActive = user.into();
            active.role = Set(UserRole::Admin.as_str().to_string());
            active.update(conn).await?
        }
        None => create_user(conn, &email, &admin.password, &admin.name, UserRole::Admin).await?,
    };

    tracing::info!(user_id = user.id, "admin account ensured");
    Ok(user.id)
}

/// Loads the account a token was issued for. A token whose account is gone is
/// no longer a valid session.
pub async fn load_account<C: ConnectionTrait>(conn: &C, user_id: i32) -> AppResult<UserModel> {
    Users::find_by_id(user_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".into()))
}

/// The caller as currently stored, with the role read from the account row
/// rather than the token.
pub async fn current_user(state: &AppState, user: &AuthUser) -> AppResult<AuthUser> {
    let account = load_account(&state.orm, user.user_id).await?;
    Ok(AuthUser {
        user_id: account.id,
        role: UserRole::parse(&account.role),
    })
}

/// Token-level admin check, confirmed against the stored account.
pub async fn require_admin(state: &AppState, user: &AuthUser) -> AppResult<AuthUser> {
    ensure_admin(user)?;
    let current = current_user(state, user).await?;
    ensure_admin(&current)?;
    Ok(current)
}

pub(crate) fn user_from_entity(model: UserModel) -> User {
    User {
        id: model.id,
        email: model.email,
        nome: model.name,
        role: UserRole::parse(&model.role),
        created_at: model.created_at.with_timezone(&Utc),
        last_access: model.last_access.map(|dt| dt.with_timezone(&Utc)),
    }
}

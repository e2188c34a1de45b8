#![allow(dead_code)]

use grocery_storefront::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    entity::{
        products::{ActiveModel as ProductActive, Entity as Products},
        users::ActiveModel as UserActive,
    },
    middleware::auth::AuthUser,
    models::UserRole,
    services::auth_service::issue_token,
    state::AppState,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration-test-secret";

pub fn test_config(database_url: &str) -> AppConfig {
    AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: TEST_SECRET.into(),
        token_ttl_hours: 1,
        admin: None,
    }
}

/// State whose database is never reachable; enough for requests rejected before storage work.
pub fn offline_state() -> AppState {
    AppState::new(DatabaseConnection::Disconnected, test_config("postgres://offline"))
}

pub fn bearer(user_id: i32, role: UserRole) -> String {
    let token = issue_token(&test_config("postgres://offline"), user_id, role).expect("token");
    format!("Bearer {token}")
}

/// Connects to the test database, or returns `None` so the caller can skip.
pub async fn database_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run database flow tests."
            );
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url).await?;
    run_migrations(&pool).await?;
    pool.close().await;

    let orm = create_orm_conn(&database_url).await?;
    Ok(Some(AppState::new(orm, test_config(&database_url))))
}

pub fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

pub async fn create_product(
    state: &AppState,
    name: &str,
    price: Decimal,
    quantity: i32,
) -> anyhow::Result<i32> {
    let product = ProductActive {
        id: NotSet,
        name: Set(name.to_string()),
        price: Set(price),
        quantity: Set(quantity),
        category_id: Set(Some(1)),
    }
    .insert(&state.orm)
    .await?;
    Ok(product.id)
}

pub async fn stock_of(state: &AppState, product_id: i32) -> anyhow::Result<i32> {
    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product {product_id} vanished"))?;
    Ok(product.quantity)
}

pub async fn create_user(state: &AppState, role: UserRole) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: NotSet,
        email: Set(format!("{}@mercado.test", unique(role.as_str()))),
        password_hash: Set("dummy".into()),
        name: Set("Tester".into()),
        created_at: Set(Utc::now().into()),
        role: Set(role.as_str().into()),
        last_access: Set(None),
        recovery_token: Set(None),
        recovery_expires_at: Set(None),
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role,
    })
}

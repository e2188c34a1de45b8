mod common;

use grocery_storefront::{
    config::AdminBootstrap,
    dto::{
        auth::{LoginRequest, RegisterRequest, ResetPasswordRequest},
        profile::UpdateProfileRequest,
        purchase::CartEntry,
    },
    entity::users::{ActiveModel as UserActive, Entity as Users},
    error::AppError,
    middleware::auth::{AuthUser, decode_token},
    models::UserRole,
    services::{auth_service, purchase_service, user_service},
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

fn login(email: &str, senha: &str) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        senha: senha.to_string(),
    }
}

#[tokio::test]
async fn register_login_and_change_password() -> anyhow::Result<()> {
    let Some(state) = common::database_state().await? else {
        return Ok(());
    };
    let email = format!("{}@mercado.test", common::unique("ana"));

    let registered = auth_service::register_user(
        &state,
        RegisterRequest {
            nome: "Ana".into(),
            email: email.clone(),
            senha: "segredo123".into(),
        },
    )
    .await?
    .data
    .ok_or_else(|| anyhow::anyhow!("missing user"))?;
    assert_eq!(registered.role, UserRole::Cliente);

    let stored = Users::find_by_id(registered.id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("user row missing"))?;
    assert_ne!(stored.password_hash, "segredo123");

    let err = auth_service::login_user(&state, login(&email, "errada"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    let session = auth_service::login_user(&state, login(&email, "segredo123"))
        .await?
        .data
        .ok_or_else(|| anyhow::anyhow!("missing login data"))?;
    assert!(session.usuario.last_access.is_some());
    let user: AuthUser = decode_token(&session.token, common::TEST_SECRET)?;
    assert_eq!(user.user_id, registered.id);

    let err = user_service::update_profile(
        &state,
        &user,
        UpdateProfileRequest {
            senha_atual: Some("errada".into()),
            nova_senha: Some("segredo456".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    let updated = user_service::update_profile(
        &state,
        &user,
        UpdateProfileRequest {
            nome: Some("Ana Souza".into()),
            senha_atual: Some("segredo123".into()),
            nova_senha: Some("segredo456".into()),
        },
    )
    .await?
    .data
    .ok_or_else(|| anyhow::anyhow!("missing profile"))?;
    assert_eq!(updated.nome, "Ana Souza");

    auth_service::login_user(&state, login(&email, "segredo456")).await?;
    Ok(())
}

#[tokio::test]
async fn password_recovery_token_is_single_use() -> anyhow::Result<()> {
    let Some(state) = common::database_state().await? else {
        return Ok(());
    };
    let email = format!("{}@mercado.test", common::unique("bia"));
    auth_service::register_user(
        &state,
        RegisterRequest {
            nome: "Bia".into(),
            email: email.clone(),
            senha: "segredo123".into(),
        },
    )
    .await?;

    let unknown = auth_service::request_password_reset(&state, "ninguem@mercado.test").await?;
    assert!(unknown.is_none());

    let token = auth_service::request_password_reset(&state, &email)
        .await?
        .ok_or_else(|| anyhow::anyhow!("token not issued"))?;

    auth_service::reset_password(
        &state,
        ResetPasswordRequest {
            token: token.clone(),
            nova_senha: "novasenha1".into(),
        },
    )
    .await?;
    auth_service::login_user(&state, login(&email, "novasenha1")).await?;

    let err = auth_service::reset_password(
        &state,
        ResetPasswordRequest {
            token,
            nova_senha: "outrasenha".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn admin_bootstrap_and_user_management() -> anyhow::Result<()> {
    let Some(state) = common::database_state().await? else {
        return Ok(());
    };
    let admin_config = AdminBootstrap {
        email: format!("{}@mercado.test", common::unique("admin")),
        password: "admin-secret".into(),
        name: "Gerente".into(),
    };

    let admin_id = auth_service::ensure_admin_account(&state.orm, &admin_config).await?;
    let again = auth_service::ensure_admin_account(&state.orm, &admin_config).await?;
    assert_eq!(admin_id, again);

    let admin = AuthUser {
        user_id: admin_id,
        role: UserRole::Admin,
    };
    let customer = common::create_user(&state, UserRole::Cliente).await?;

    let users = user_service::list_users(&state, &admin)
        .await?
        .data
        .ok_or_else(|| anyhow::anyhow!("missing users"))?;
    assert!(users.items.iter().any(|u| u.id == customer.user_id));

    user_service::delete_user(&state, &admin, customer.user_id).await?;
    let err = user_service::delete_user(&state, &admin, customer.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = user_service::delete_user(&state, &admin, admin_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    Ok(())
}

#[tokio::test]
async fn deleted_accounts_lose_their_sessions() -> anyhow::Result<()> {
    let Some(state) = common::database_state().await? else {
        return Ok(());
    };
    let customer = common::create_user(&state, UserRole::Cliente).await?;
    let admin = common::create_user(&state, UserRole::Admin).await?;
    let product_id =
        common::create_product(&state, &common::unique("Pao"), Decimal::new(650, 2), 10).await?;

    Users::delete_by_id(customer.user_id).exec(&state.orm).await?;
    Users::delete_by_id(admin.user_id).exec(&state.orm).await?;

    let err = purchase_service::checkout(
        &state,
        Some(&customer),
        vec![CartEntry::new(product_id, 1)],
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    assert_eq!(common::stock_of(&state, product_id).await?, 10);

    let err = user_service::get_profile(&state, &customer).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    let err = user_service::list_users(&state, &admin).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    Ok(())
}

#[tokio::test]
async fn demoted_admin_token_loses_admin_rights() -> anyhow::Result<()> {
    let Some(state) = common::database_state().await? else {
        return Ok(());
    };
    let admin = common::create_user(&state, UserRole::Admin).await?;

    let account = Users::find_by_id(admin.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("admin row missing"))?;
    let mut active: UserActive = account.into();
    active.role = Set(UserRole::Cliente.as_str().to_string());
    active.update(&state.orm).await?;

    let err = user_service::list_users(&state, &admin).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    Ok(())
}

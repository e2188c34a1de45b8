use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};

use crate::{
    dto::profile::{UpdateProfileRequest, UserList},
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::User,
    response::{ApiResponse, Meta},
    services::auth_service::{
        ensure_password_length, hash_password, load_account, require_admin, user_from_entity,
        verify_password,
    },
    state::AppState,
};

/// What a profile update asks for, after checking the payload on its own.
#[derive(Debug, PartialEq, Eq)]
pub struct ProfileChange {
    pub name: Option<String>,
    /// `(current, new)` when the password should change.
    pub password: Option<(String, String)>,
}

pub fn plan_profile_change(payload: UpdateProfileRequest) -> AppResult<ProfileChange> {
    let name = match payload.nome {
        Some(nome) => {
            let nome = nome.trim().to_string();
            if nome.is_empty() {
                return Err(AppError::Validation("nome must not be empty".into()));
            }
            Some(nome)
        }
        None => None,
    };

    let password = match (payload.senha_atual, payload.nova_senha) {
        (_, None) => None,
        (None, Some(_)) => {
            return Err(AppError::Validation(
                "senhaAtual is required to change the password".into(),
            ));
        }
        (Some(current), Some(new)) => {
            ensure_password_length(&new)?;
            Some((current, new))
        }
    };

    if name.is_none() && password.is_none() {
        return Err(AppError::Validation("Nothing to update".into()));
    }

    Ok(ProfileChange { name, password })
}

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let model = load_account(&state.orm, user.user_id).await?;
    Ok(ApiResponse::success(
        "Profile",
        user_from_entity(model),
        Some(Meta::empty()),
    ))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    let change = plan_profile_change(payload)?;

    let model = load_account(&state.orm, user.user_id).await?;

    let mut new_hash = None;
    if let Some((current, new)) = &change.password {
        if !verify_password(current, &model.password_hash)? {
            return Err(AppError::Unauthorized("Current password is incorrect".into()));
        }
        new_hash = Some(hash_password(new)?);
    }

    let mut active: UserActive = model.into();
    if let Some(name) = change.name {
        active.name = Set(name);
    }
    if let Some(hash) = new_hash {
        active.password_hash = Set(hash);
    }
    let model = active.update(&state.orm).await?;

    tracing::info!(
        user_id = model.id,
        password_changed = change.password.is_some(),
        "profile updated"
    );

    Ok(ApiResponse::success(
        "Profile updated",
        user_from_entity(model),
        Some(Meta::empty()),
    ))
}

pub async fn list_users(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<UserList>> {
    require_admin(state, user).await?;
    let items: Vec<User> = Users::find()
        .order_by_asc(UserCol::Id)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(user_from_entity)
        .collect();
    let meta = Meta::count(items.len());
    Ok(ApiResponse::success("Users", UserList { items }, Some(meta)))
}

pub async fn delete_user(
    state: &AppState,
    user: &AuthUser,
    id: i32,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    if id == user.user_id {
        return Err(AppError::Forbidden("Admins cannot delete their own account".into()));
    }
    require_admin(state, user).await?;

    let result = Users::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound(format!("User {id} not found")));
    }

    tracing::info!(user_id = id, admin_id = user.user_id, "user deleted");

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({ "IdUsuario": id }),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_only_change() {
        let change = plan_profile_change(UpdateProfileRequest {
            nome: Some("  Maria ".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(change.name.as_deref(), Some("Maria"));
        assert!(change.password.is_none());
    }

    #[test]
    fn new_password_requires_current_one() {
        let err = plan_profile_change(UpdateProfileRequest {
            nova_senha: Some("segredo456".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("senhaAtual")));
    }

    #[test]
    fn new_password_must_meet_minimum_length() {
        let err = plan_profile_change(UpdateProfileRequest {
            senha_atual: Some("segredo123".into()),
            nova_senha: Some("abc".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn empty_update_is_rejected() {
        let err = plan_profile_change(UpdateProfileRequest::default()).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == "Nothing to update"));
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = plan_profile_change(UpdateProfileRequest {
            nome: Some("   ".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}

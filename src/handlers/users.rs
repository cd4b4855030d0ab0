use axum::{
    extract::State,
    response::Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::models::errors::AppError;
use crate::models::user::{validate_email, validate_password, validate_username, UserProfile};
use crate::services::password;
use crate::utils::extract::{AuthUser, JsonBody, PathParam};
use crate::utils::nullable;
use crate::AppState;

/// Partial profile update. `null` clears an optional field.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub profile_pic: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub bio: Option<Option<String>>,
}

impl UpdateUserRequest {
    fn validate(&self) -> Result<(), AppError> {
        if let Some(username) = &self.username {
            validate_username(username)?;
        }
        if let Some(password) = &self.password {
            validate_password(password)?;
        }
        if let Some(Some(email)) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }
}

pub async fn list_users(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<UserProfile>>, AppError> {
    let users = app_state.store.list_users().await?;
    Ok(Json(users.into_iter().map(UserProfile::from).collect()))
}

/// Profile of the token holder
pub async fn current_user(
    State(app_state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserProfile>, AppError> {
    let user = app_state
        .store
        .find_user(&auth.id)
        .await?
        .ok_or_else(|| AppError::not_found("User", &auth.id))?;
    Ok(Json(user.into()))
}

pub async fn get_user(
    State(app_state): State<AppState>,
    PathParam(user_id): PathParam<String>,
) -> Result<Json<UserProfile>, AppError> {
    let user = app_state
        .store
        .find_user(&user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User", &user_id))?;
    Ok(Json(user.into()))
}

/// Users may only update their own account
pub async fn update_user(
    State(app_state): State<AppState>,
    auth: AuthUser,
    PathParam(user_id): PathParam<String>,
    JsonBody(request): JsonBody<UpdateUserRequest>,
) -> Result<Json<UserProfile>, AppError> {
    if auth.id != user_id {
        return Err(AppError::forbidden("You can only update your own account"));
    }
    request.validate()?;

    let mut user = app_state
        .store
        .find_user(&user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User", &user_id))?;

    if let Some(username) = request.username {
        if username != user.username {
            if let Some(existing) = app_state.store.find_user_by_username(&username).await? {
                if existing.id != user.id {
                    return Err(AppError::conflict("Username already exists"));
                }
            }
            user.username = username;
        }
    }
    if let Some(new_password) = request.password {
        user.password_hash =
            password::hash_password(&new_password, app_state.config.bcrypt_cost).await?;
    }
    if let Some(email) = request.email {
        user.email = email;
    }
    if let Some(profile_pic) = request.profile_pic {
        user.profile_pic = profile_pic;
    }
    if let Some(bio) = request.bio {
        user.bio = bio;
    }
    user.updated_at = Utc::now();

    let user = app_state.store.replace_user(user).await?;

    tracing::info!("Updated user {} ({})", user.username, user.id);
    Ok(Json(user.into()))
}

/// Account owners and admins may delete an account. Posts by the user are kept.
pub async fn delete_user(
    State(app_state): State<AppState>,
    auth: AuthUser,
    PathParam(user_id): PathParam<String>,
) -> Result<Json<Value>, AppError> {
    if auth.id != user_id && !auth.is_admin {
        return Err(AppError::forbidden("You can only delete your own account"));
    }

    if !app_state.store.delete_user(&user_id).await? {
        return Err(AppError::not_found("User", &user_id));
    }

    tracing::info!("Deleted user {} (requested by {})", user_id, auth.username);
    Ok(Json(json!({
        "message": "User has been deleted",
        "id": user_id
    })))
}

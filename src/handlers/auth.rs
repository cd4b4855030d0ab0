use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};

use crate::models::errors::AppError;
use crate::models::user::{validate_email, validate_password, validate_username, User, UserProfile};
use crate::services::password;
use crate::utils::extract::JsonBody;
use crate::AppState;

/// Registration payload
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl RegisterRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_username(&self.username)?;
        validate_password(&self.password)?;
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: UserProfile,
}

/// Create an account with a bcrypt-hashed password
pub async fn register(
    State(app_state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<UserProfile>), AppError> {
    request.validate()?;

    if app_state
        .store
        .find_user_by_username(&request.username)
        .await?
        .is_some()
    {
        return Err(AppError::conflict("Username already exists"));
    }

    let password_hash =
        password::hash_password(&request.password, app_state.config.bcrypt_cost).await?;
    let is_admin = app_state.config.is_admin_username(&request.username);

    let user = User::new(request.username, request.email, password_hash, is_admin);
    // The store re-checks uniqueness, which covers two concurrent registrations
    let user = app_state.store.insert_user(user).await?;

    tracing::info!("Registered user {} ({}), admin={}", user.username, user.id, user.is_admin);
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Verify credentials and issue a bearer token
pub async fn login(
    State(app_state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    if request.username.is_empty() || request.password.is_empty() {
        return Err(AppError::validation_failed("Username and password are required"));
    }

    let invalid = || AppError::unauthorized("Invalid username or password");

    let user = app_state
        .store
        .find_user_by_username(&request.username)
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password(&request.password, &user.password_hash).await? {
        tracing::info!("Failed login for {}", request.username);
        return Err(invalid());
    }

    let issued = app_state.tokens.issue(&user)?;

    tracing::info!("User {} logged in", user.username);
    Ok(Json(LoginResponse {
        token: issued.token,
        token_type: "Bearer",
        expires_in: issued.expires_in,
        user: user.into(),
    }))
}

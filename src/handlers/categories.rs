use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::models::category::{normalize_name, Category};
use crate::models::errors::AppError;
use crate::utils::extract::{AuthUser, JsonBody, PathParam};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
}

/// Names are unique; `except` is the category being renamed
async fn ensure_name_available(
    app_state: &AppState,
    name: &str,
    except: Option<&str>,
) -> Result<(), AppError> {
    match app_state.store.find_category_by_name(name).await? {
        Some(existing) if Some(existing.id.as_str()) != except => {
            Err(AppError::conflict("Category already exists"))
        }
        _ => Ok(()),
    }
}

pub async fn list_categories(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(app_state.store.list_categories().await?))
}

pub async fn get_category(
    State(app_state): State<AppState>,
    PathParam(category_id): PathParam<String>,
) -> Result<Json<Category>, AppError> {
    let category = app_state
        .store
        .find_category(&category_id)
        .await?
        .ok_or_else(|| AppError::not_found("Category", &category_id))?;
    Ok(Json(category))
}

pub async fn create_category(
    State(app_state): State<AppState>,
    auth: AuthUser,
    JsonBody(request): JsonBody<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    auth.ensure_admin()?;
    let name = normalize_name(&request.name)?;
    ensure_name_available(&app_state, &name, None).await?;

    // The store re-checks uniqueness for concurrent creates
    let category = app_state.store.insert_category(Category::new(name)).await?;

    tracing::info!("Created category {} ({})", category.name, category.id);
    Ok((StatusCode::CREATED, Json(category)))
}

/// Rename a category
pub async fn update_category(
    State(app_state): State<AppState>,
    auth: AuthUser,
    PathParam(category_id): PathParam<String>,
    JsonBody(request): JsonBody<CategoryRequest>,
) -> Result<Json<Category>, AppError> {
    auth.ensure_admin()?;
    let name = normalize_name(&request.name)?;

    let mut category = app_state
        .store
        .find_category(&category_id)
        .await?
        .ok_or_else(|| AppError::not_found("Category", &category_id))?;
    ensure_name_available(&app_state, &name, Some(&category.id)).await?;
    category.name = name;

    let category = app_state.store.replace_category(category).await?;

    tracing::info!("Renamed category {} to {}", category.id, category.name);
    Ok(Json(category))
}

/// Posts referencing the category keep their `category_id`
pub async fn delete_category(
    State(app_state): State<AppState>,
    auth: AuthUser,
    PathParam(category_id): PathParam<String>,
) -> Result<Json<Value>, AppError> {
    auth.ensure_admin()?;

    if !app_state.store.delete_category(&category_id).await? {
        return Err(AppError::not_found("Category", &category_id));
    }

    tracing::info!("Deleted category {} (requested by {})", category_id, auth.username);
    Ok(Json(json!({
        "message": "Category has been deleted",
        "id": category_id
    })))
}

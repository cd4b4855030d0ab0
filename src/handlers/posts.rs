use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::models::errors::AppError;
use crate::models::post::{validate_body, validate_title, Post, PostFilter};
use crate::utils::extract::{AuthUser, JsonBody, PathParam, QueryParams};
use crate::utils::nullable;
use crate::AppState;

/// Listing scope. Both parameters take ids; `user` and `cat` are accepted as
/// aliases of `author` and `category` and are matched against ids too, not names.
#[derive(Debug, Default, Deserialize)]
pub struct PostQuery {
    #[serde(alias = "user")]
    pub author: Option<String>,
    #[serde(alias = "cat")]
    pub category: Option<String>,
}

impl From<PostQuery> for PostFilter {
    fn from(query: PostQuery) -> Self {
        let non_empty = |value: Option<String>| value.filter(|v| !v.is_empty());
        Self {
            author_id: non_empty(query.author),
            category_id: non_empty(query.category),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
}

impl CreatePostRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_title(&self.title)?;
        validate_body(&self.body)
    }
}

/// Partial post update. `null` clears `category_id` or `photo`.
#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub body: Option<String>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub category_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub photo: Option<Option<String>>,
}

impl UpdatePostRequest {
    fn validate(&self) -> Result<(), AppError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(body) = &self.body {
            validate_body(body)?;
        }
        Ok(())
    }
}

/// A referenced category must exist when the reference is written
async fn ensure_category_exists(app_state: &AppState, category_id: &str) -> Result<(), AppError> {
    match app_state.store.find_category(category_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::validation_failed(format!(
            "Category '{}' does not exist",
            category_id
        ))),
    }
}

async fn load_post(app_state: &AppState, post_id: &str) -> Result<Post, AppError> {
    app_state
        .store
        .find_post(post_id)
        .await?
        .ok_or_else(|| AppError::not_found("Post", post_id))
}

fn ensure_owner(post: &Post, auth: &AuthUser) -> Result<(), AppError> {
    if post.is_owned_by(&auth.id) {
        Ok(())
    } else {
        tracing::info!("User {} denied access to post {}", auth.username, post.id);
        Err(AppError::forbidden("You can only modify your own posts"))
    }
}

pub async fn list_posts(
    State(app_state): State<AppState>,
    QueryParams(query): QueryParams<PostQuery>,
) -> Result<Json<Vec<Post>>, AppError> {
    let filter = PostFilter::from(query);
    let posts = app_state.store.list_posts(&filter).await?;
    Ok(Json(posts))
}

pub async fn get_post(
    State(app_state): State<AppState>,
    PathParam(post_id): PathParam<String>,
) -> Result<Json<Post>, AppError> {
    Ok(Json(load_post(&app_state, &post_id).await?))
}

pub async fn create_post(
    State(app_state): State<AppState>,
    auth: AuthUser,
    JsonBody(request): JsonBody<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), AppError> {
    request.validate()?;
    if let Some(category_id) = &request.category_id {
        ensure_category_exists(&app_state, category_id).await?;
    }

    // The username in the token is frozen at login; credit the current one
    let author = app_state
        .store
        .find_user(&auth.id)
        .await?
        .ok_or_else(|| AppError::unauthorized("Account no longer exists"))?;

    let post = Post::new(
        request.title,
        request.body,
        author.id,
        author.username,
        request.category_id,
        request.photo,
    );
    let post = app_state.store.insert_post(post).await?;

    tracing::info!("Created post {} by {}", post.id, post.author_username);
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn update_post(
    State(app_state): State<AppState>,
    auth: AuthUser,
    PathParam(post_id): PathParam<String>,
    JsonBody(request): JsonBody<UpdatePostRequest>,
) -> Result<Json<Post>, AppError> {
    let mut post = load_post(&app_state, &post_id).await?;
    ensure_owner(&post, &auth)?;
    request.validate()?;

    if let Some(Some(category_id)) = &request.category_id {
        ensure_category_exists(&app_state, category_id).await?;
    }

    if let Some(title) = request.title {
        post.title = title;
    }
    if let Some(body) = request.body {
        post.body = body;
    }
    if let Some(category_id) = request.category_id {
        post.category_id = category_id;
    }
    if let Some(photo) = request.photo {
        post.photo = photo;
    }
    post.updated_at = Utc::now();

    let post = app_state.store.replace_post(post).await?;

    tracing::info!("Updated post {}", post.id);
    Ok(Json(post))
}

pub async fn delete_post(
    State(app_state): State<AppState>,
    auth: AuthUser,
    PathParam(post_id): PathParam<String>,
) -> Result<Json<Value>, AppError> {
    let post = load_post(&app_state, &post_id).await?;
    ensure_owner(&post, &auth)?;

    if !app_state.store.delete_post(&post_id).await? {
        return Err(AppError::not_found("Post", &post_id));
    }

    tracing::info!("Deleted post {} by {}", post_id, auth.username);
    Ok(Json(json!({
        "message": "Post has been deleted",
        "id": post_id
    })))
}

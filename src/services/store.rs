use async_trait::async_trait;

use crate::models::{
    category::Category,
    errors::AppError,
    post::{Post, PostFilter},
    user::User,
};

/// Persistence for the three blog collections.
///
/// Every method is a single-document operation except the list queries. Implementations
/// must reject a second user with the same `username` and a second category with the same
/// `name` with `AppError::Conflict`, both on insert and on replace.
#[async_trait]
pub trait BlogStore: Send + Sync {
    /// Round-trip to the backing database
    async fn ping(&self) -> Result<(), AppError>;

    async fn insert_user(&self, user: User) -> Result<User, AppError>;
    async fn find_user(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    async fn list_users(&self) -> Result<Vec<User>, AppError>;
    /// Returns `NotFound` when no user has `user.id`
    async fn replace_user(&self, user: User) -> Result<User, AppError>;
    /// Returns whether a document was removed
    async fn delete_user(&self, id: &str) -> Result<bool, AppError>;

    async fn insert_post(&self, post: Post) -> Result<Post, AppError>;
    async fn find_post(&self, id: &str) -> Result<Option<Post>, AppError>;
    /// Newest first
    async fn list_posts(&self, filter: &PostFilter) -> Result<Vec<Post>, AppError>;
    async fn replace_post(&self, post: Post) -> Result<Post, AppError>;
    async fn delete_post(&self, id: &str) -> Result<bool, AppError>;

    async fn insert_category(&self, category: Category) -> Result<Category, AppError>;
    async fn find_category(&self, id: &str) -> Result<Option<Category>, AppError>;
    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, AppError>;
    /// Sorted by name
    async fn list_categories(&self) -> Result<Vec<Category>, AppError>;
    async fn replace_category(&self, category: Category) -> Result<Category, AppError>;
    async fn delete_category(&self, id: &str) -> Result<bool, AppError>;
}

pub(crate) fn sort_posts_newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

pub(crate) fn sort_categories_by_name(categories: &mut [Category]) {
    categories.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
}

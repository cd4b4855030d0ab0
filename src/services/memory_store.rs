use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::{
    category::Category,
    errors::AppError,
    post::{Post, PostFilter},
    user::User,
};
use crate::services::store::{sort_categories_by_name, sort_posts_newest_first, BlogStore};

/// In-process store for tests and local runs without MongoDB.
///
/// Uniqueness checks happen under the collection's write lock, which gives the same
/// guarantee a unique index gives in the database.
#[derive(Clone, Default)]
pub struct MemoryStore {
    users: Arc<RwLock<HashMap<String, User>>>,
    posts: Arc<RwLock<HashMap<String, Post>>>,
    categories: Arc<RwLock<HashMap<String, Category>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlogStore for MemoryStore {
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn insert_user(&self, user: User) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == user.username) {
            return Err(AppError::conflict("Username already exists"));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    async fn replace_user(&self, user: User) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(AppError::not_found("User", &user.id));
        }
        if users
            .values()
            .any(|u| u.id != user.id && u.username == user.username)
        {
            return Err(AppError::conflict("Username already exists"));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn delete_user(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.users.write().await.remove(id).is_some())
    }

    async fn insert_post(&self, post: Post) -> Result<Post, AppError> {
        self.posts.write().await.insert(post.id.clone(), post.clone());
        Ok(post)
    }

    async fn find_post(&self, id: &str) -> Result<Option<Post>, AppError> {
        Ok(self.posts.read().await.get(id).cloned())
    }

    async fn list_posts(&self, filter: &PostFilter) -> Result<Vec<Post>, AppError> {
        let mut posts: Vec<Post> = self
            .posts
            .read()
            .await
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        sort_posts_newest_first(&mut posts);
        Ok(posts)
    }

    async fn replace_post(&self, post: Post) -> Result<Post, AppError> {
        let mut posts = self.posts.write().await;
        match posts.get_mut(&post.id) {
            Some(existing) => {
                *existing = post.clone();
                Ok(post)
            }
            None => Err(AppError::not_found("Post", &post.id)),
        }
    }

    async fn delete_post(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.posts.write().await.remove(id).is_some())
    }

    async fn insert_category(&self, category: Category) -> Result<Category, AppError> {
        let mut categories = self.categories.write().await;
        if categories.values().any(|c| c.name == category.name) {
            return Err(AppError::conflict("Category already exists"));
        }
        categories.insert(category.id.clone(), category.clone());
        Ok(category)
    }

    async fn find_category(&self, id: &str) -> Result<Option<Category>, AppError> {
        Ok(self.categories.read().await.get(id).cloned())
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, AppError> {
        let categories = self.categories.read().await;
        Ok(categories.values().find(|c| c.name == name).cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let mut categories: Vec<Category> =
            self.categories.read().await.values().cloned().collect();
        sort_categories_by_name(&mut categories);
        Ok(categories)
    }

    async fn replace_category(&self, category: Category) -> Result<Category, AppError> {
        let mut categories = self.categories.write().await;
        if !categories.contains_key(&category.id) {
            return Err(AppError::not_found("Category", &category.id));
        }
        if categories
            .values()
            .any(|c| c.id != category.id && c.name == category.name)
        {
            return Err(AppError::conflict("Category already exists"));
        }
        categories.insert(category.id.clone(), category.clone());
        Ok(category)
    }

    async fn delete_category(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.categories.write().await.remove(id).is_some())
    }
}

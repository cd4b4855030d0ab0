use async_trait::async_trait;
use std::time::Duration;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
    Client, Collection, Database, IndexModel,
};

use crate::models::{
    category::Category,
    errors::AppError,
    post::{Post, PostFilter},
    user::User,
};
use crate::services::store::{sort_categories_by_name, sort_posts_newest_first, BlogStore};

const USERS: &str = "users";
const POSTS: &str = "posts";
const CATEGORIES: &str = "categories";

const DUPLICATE_KEY_CODE: i32 = 11000;

const SETUP_RETRY_INITIAL: Duration = Duration::from_secs(1);
const SETUP_RETRY_MAX: Duration = Duration::from_secs(60);

/// MongoDB-backed store. The driver connects lazily, so construction succeeds while
/// the server is down and individual operations fail until it comes back.
#[derive(Clone)]
pub struct MongoStore {
    db: Database,
    users: Collection<User>,
    posts: Collection<Post>,
    categories: Collection<Category>,
}

impl MongoStore {
    /// Parses the connection URL and selects the database. Does not wait for the server.
    pub async fn connect(url: &str, db_name: &str) -> Result<Self, AppError> {
        let client = Client::with_uri_str(url)
            .await
            .map_err(|e| AppError::database_failed(format!("Invalid MongoDB URL: {}", e)))?;
        let db = client.database(db_name);

        Ok(Self {
            users: db.collection(USERS),
            posts: db.collection(POSTS),
            categories: db.collection(CATEGORIES),
            db,
        })
    }

    /// Creates the unique indexes backing username and category name uniqueness
    pub async fn ensure_indexes(&self) -> Result<(), AppError> {
        let unique = || IndexOptions::builder().unique(true).build();

        self.users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "username": 1 })
                    .options(unique())
                    .build(),
            )
            .await
            .map_err(db_error)?;

        self.categories
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "name": 1 })
                    .options(unique())
                    .build(),
            )
            .await
            .map_err(db_error)?;

        self.posts
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "author_id": 1, "category_id": 1 })
                    .build(),
            )
            .await
            .map_err(db_error)?;

        tracing::info!("MongoDB indexes ensured on database '{}'", self.db.name());
        Ok(())
    }

    /// Pings and creates indexes, retrying with capped exponential backoff until both
    /// succeed. Requests are served meanwhile and fail with 503 while the server is down.
    pub async fn initialize_with_retry(&self) {
        let mut delay = SETUP_RETRY_INITIAL;
        loop {
            let attempt = match self.ping().await {
                Ok(()) => self.ensure_indexes().await,
                Err(e) => Err(e),
            };
            match attempt {
                Ok(()) => {
                    tracing::info!("Connected to MongoDB");
                    return;
                }
                Err(e) => {
                    tracing::error!("MongoDB setup failed, retrying in {:?}: {}", delay, e);
                }
            }
            tokio::time::sleep(delay).await;
            delay = next_retry_delay(delay);
        }
    }
}

fn next_retry_delay(delay: Duration) -> Duration {
    (delay * 2).min(SETUP_RETRY_MAX)
}

fn db_error(error: mongodb::error::Error) -> AppError {
    AppError::database_failed(error.to_string())
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    matches!(
        error.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    )
}

/// Maps a duplicate-key write failure to a conflict, anything else to a database error
fn write_error(error: mongodb::error::Error, conflict_message: &str) -> AppError {
    if is_duplicate_key(&error) {
        AppError::conflict(conflict_message)
    } else {
        db_error(error)
    }
}

fn post_filter_document(filter: &PostFilter) -> Document {
    let mut query = Document::new();
    if let Some(author_id) = &filter.author_id {
        query.insert("author_id", author_id.as_str());
    }
    if let Some(category_id) = &filter.category_id {
        query.insert("category_id", category_id.as_str());
    }
    query
}

#[async_trait]
impl BlogStore for MongoStore {
    async fn ping(&self) -> Result<(), AppError> {
        self.db
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(db_error)
    }

    async fn insert_user(&self, user: User) -> Result<User, AppError> {
        self.users
            .insert_one(&user)
            .await
            .map_err(|e| write_error(e, "Username already exists"))?;
        Ok(user)
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>, AppError> {
        self.users.find_one(doc! { "_id": id }).await.map_err(db_error)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        self.users
            .find_one(doc! { "username": username })
            .await
            .map_err(db_error)
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let cursor = self.users.find(doc! {}).await.map_err(db_error)?;
        let mut users: Vec<User> = cursor.try_collect().await.map_err(db_error)?;
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    async fn replace_user(&self, user: User) -> Result<User, AppError> {
        let result = self
            .users
            .replace_one(doc! { "_id": user.id.as_str() }, &user)
            .await
            .map_err(|e| write_error(e, "Username already exists"))?;
        if result.matched_count == 0 {
            return Err(AppError::not_found("User", &user.id));
        }
        Ok(user)
    }

    async fn delete_user(&self, id: &str) -> Result<bool, AppError> {
        let result = self
            .users
            .delete_one(doc! { "_id": id })
            .await
            .map_err(db_error)?;
        Ok(result.deleted_count > 0)
    }

    async fn insert_post(&self, post: Post) -> Result<Post, AppError> {
        self.posts.insert_one(&post).await.map_err(db_error)?;
        Ok(post)
    }

    async fn find_post(&self, id: &str) -> Result<Option<Post>, AppError> {
        self.posts.find_one(doc! { "_id": id }).await.map_err(db_error)
    }

    async fn list_posts(&self, filter: &PostFilter) -> Result<Vec<Post>, AppError> {
        let cursor = self
            .posts
            .find(post_filter_document(filter))
            .await
            .map_err(db_error)?;
        let mut posts: Vec<Post> = cursor.try_collect().await.map_err(db_error)?;
        // created_at is stored as an RFC 3339 string, whose lexical order drifts with
        // fractional-second width, so order on the parsed value instead
        sort_posts_newest_first(&mut posts);
        Ok(posts)
    }

    async fn replace_post(&self, post: Post) -> Result<Post, AppError> {
        let result = self
            .posts
            .replace_one(doc! { "_id": post.id.as_str() }, &post)
            .await
            .map_err(db_error)?;
        if result.matched_count == 0 {
            return Err(AppError::not_found("Post", &post.id));
        }
        Ok(post)
    }

    async fn delete_post(&self, id: &str) -> Result<bool, AppError> {
        let result = self
            .posts
            .delete_one(doc! { "_id": id })
            .await
            .map_err(db_error)?;
        Ok(result.deleted_count > 0)
    }

    async fn insert_category(&self, category: Category) -> Result<Category, AppError> {
        self.categories
            .insert_one(&category)
            .await
            .map_err(|e| write_error(e, "Category already exists"))?;
        Ok(category)
    }

    async fn find_category(&self, id: &str) -> Result<Option<Category>, AppError> {
        self.categories
            .find_one(doc! { "_id": id })
            .await
            .map_err(db_error)
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, AppError> {
        self.categories
            .find_one(doc! { "name": name })
            .await
            .map_err(db_error)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let cursor = self.categories.find(doc! {}).await.map_err(db_error)?;
        let mut categories: Vec<Category> = cursor.try_collect().await.map_err(db_error)?;
        sort_categories_by_name(&mut categories);
        Ok(categories)
    }

    async fn replace_category(&self, category: Category) -> Result<Category, AppError> {
        let result = self
            .categories
            .replace_one(doc! { "_id": category.id.as_str() }, &category)
            .await
            .map_err(|e| write_error(e, "Category already exists"))?;
        if result.matched_count == 0 {
            return Err(AppError::not_found("Category", &category.id));
        }
        Ok(category)
    }

    async fn delete_category(&self, id: &str) -> Result<bool, AppError> {
        let result = self
            .categories
            .delete_one(doc! { "_id": id })
            .await
            .map_err(db_error)?;
        Ok(result.deleted_count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_filter_document() {
        assert!(post_filter_document(&PostFilter::default()).is_empty());

        let query = post_filter_document(&PostFilter {
            author_id: Some("u1".into()),
            category_id: Some("c1".into()),
        });
        assert_eq!(query, doc! { "author_id": "u1", "category_id": "c1" });
    }

    #[test]
    fn test_setup_retry_backoff_is_capped() {
        assert_eq!(next_retry_delay(SETUP_RETRY_INITIAL), Duration::from_secs(2));
        assert_eq!(next_retry_delay(Duration::from_secs(45)), SETUP_RETRY_MAX);
        assert_eq!(next_retry_delay(SETUP_RETRY_MAX), SETUP_RETRY_MAX);
    }

    #[tokio::test]
    async fn test_connect_rejects_malformed_url() {
        let result = MongoStore::connect("not-a-mongo-url", "blog").await;
        assert!(matches!(result, Err(AppError::DatabaseError { .. })));
    }
}

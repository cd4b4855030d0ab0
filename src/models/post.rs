use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::errors::AppError;

pub const MAX_TITLE_LENGTH: usize = 200;

/// Blog post document. Owned by `author_id`; `category_id` is a plain reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub body: String,
    pub author_id: String,
    pub author_username: String,
    pub category_id: Option<String>,
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(
        title: String,
        body: String,
        author_id: String,
        author_username: String,
        category_id: Option<String>,
        photo: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            body,
            author_id,
            author_username,
            category_id,
            photo,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.author_id == user_id
    }
}

/// Optional scoping for post listings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostFilter {
    pub author_id: Option<String>,
    pub category_id: Option<String>,
}

impl PostFilter {
    pub fn matches(&self, post: &Post) -> bool {
        let author_ok = self
            .author_id
            .as_deref()
            .map_or(true, |id| post.author_id == id);
        let category_ok = self
            .category_id
            .as_deref()
            .map_or(true, |id| post.category_id.as_deref() == Some(id));
        author_ok && category_ok
    }
}

pub fn validate_title(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::validation_failed("Title cannot be empty"));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(AppError::validation_failed(format!(
            "Title must be at most {} characters",
            MAX_TITLE_LENGTH
        )));
    }
    Ok(())
}

pub fn validate_body(body: &str) -> Result<(), AppError> {
    if body.trim().is_empty() {
        return Err(AppError::validation_failed("Body cannot be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(author: &str, category: Option<&str>) -> Post {
        Post::new(
            "Title".into(),
            "Body".into(),
            author.into(),
            "someone".into(),
            category.map(String::from),
            None,
        )
    }

    #[test]
    fn test_filter_matching() {
        let p = post("u1", Some("c1"));

        assert!(PostFilter::default().matches(&p));
        assert!(PostFilter { author_id: Some("u1".into()), category_id: None }.matches(&p));
        assert!(!PostFilter { author_id: Some("u2".into()), category_id: None }.matches(&p));
        assert!(PostFilter { author_id: None, category_id: Some("c1".into()) }.matches(&p));
        assert!(!PostFilter { author_id: None, category_id: Some("c1".into()) }
            .matches(&post("u1", None)));
    }

    #[test]
    fn test_title_and_body_rules() {
        assert!(validate_title("Hello").is_ok());
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"t".repeat(201)).is_err());
        assert!(validate_body("text").is_ok());
        assert!(validate_body("").is_err());
    }
}

// HTTP request handlers, one module per route group

pub mod auth;
pub mod categories;
pub mod health;
pub mod posts;
pub mod upload;
pub mod users;

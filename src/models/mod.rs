// Domain records and the error model shared by every route

pub mod category;
pub mod errors;
pub mod post;
pub mod user;
